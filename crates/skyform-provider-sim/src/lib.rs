//! Simulated resource provider
//!
//! Implements the engine's [`skyform_engine::ResourceProvider`] against an
//! in-process store instead of a real control plane. Outputs are synthesized
//! deterministically from project, type, and logical name, which makes the
//! idempotence contract trivial to honor: unchanged inputs return the stored
//! outputs, changed inputs update in place under the same platform id.
//!
//! With a project root the store persists to `.skyform/resources.json`, so
//! `up`, `preview`, and `down` compose across CLI invocations.

pub mod provider;
pub mod store;

// Re-exports
pub use provider::SimProvider;
pub use store::{SimResource, SimStore};
