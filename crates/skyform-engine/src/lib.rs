//! Skyform apply engine
//!
//! Realizes a dependency graph of declared resources against a
//! [`ResourceProvider`]: topological apply with skip-cascade on failure,
//! opt-in bounded parallelism across independent nodes, a reverse-order
//! destroy pass, and export resolution over the completed apply results.
//!
//! The provider owns every platform-specific concern (idempotent
//! create-or-update, retries, waits); this crate owns ordering, gating, and
//! reporting.

pub mod error;
pub mod export;
pub mod provider;
pub mod report;
pub mod scheduler;

// Re-exports
pub use error::{ExportError, ProviderError, Result};
pub use export::resolve_exports;
pub use provider::{Outputs, ProviderContext, ResourceProvider};
pub use report::{ApplyReport, DestroyFailure, DestroyReport, NodeReport, NodeStatus};
pub use scheduler::{ApplyOptions, Scheduler};
