//! Engine error types

use skyform_graph::OutputRef;
use thiserror::Error;

/// Errors returned by resource providers
///
/// Retry, backoff, and eventual-consistency handling belong behind the
/// provider interface; by the time an error surfaces here it is final for
/// this apply pass.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid input for {resource}: {message}")]
    InvalidInput { resource: String, message: String },

    #[error("platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// An export referenced a node that never reached `Applied`
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export '{export}' is unresolved: no applied output for {reference}")]
    Unresolved { export: String, reference: OutputRef },
}
