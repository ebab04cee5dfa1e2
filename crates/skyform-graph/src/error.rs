//! Graph construction error types

use thiserror::Error;

/// Errors raised while building a dependency graph
///
/// All of these are detected during construction, before any resource is
/// touched. A graph that builds successfully is guaranteed acyclic with every
/// reference pointing at a declared node.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate resource node: {0}")]
    DuplicateNode(String),

    #[error("node '{node}' references unknown node '{reference}'")]
    UnknownReference { node: String, reference: String },

    #[error("dependency cycle involving: {0}")]
    Cycle(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
