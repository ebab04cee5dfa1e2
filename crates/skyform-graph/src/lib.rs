//! Skyform declaration model
//!
//! This crate defines the declaration surface of the engine: resource nodes,
//! the expressions that wire one node's inputs to another node's outputs, and
//! the dependency graph built from them.
//!
//! Construction is strict. A graph that builds is acyclic, every reference
//! points at a declared node, and a topological apply order (stable with
//! respect to declaration order) has already been computed.

pub mod error;
pub mod expr;
pub mod graph;
pub mod node;
pub mod stack;

// Re-exports
pub use error::{GraphError, Result};
pub use expr::{Expr, OutputRef, ResolveError};
pub use graph::Graph;
pub use node::ResourceNode;
pub use stack::Stack;
