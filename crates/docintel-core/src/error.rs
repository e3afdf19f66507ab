//! Error taxonomy shared by every docintel layer.
//!
//! Internal functions return [`anyhow::Result`] and attach a [`RagError`]
//! wherever the *kind* of failure matters to the caller. Outer layers
//! (the facade, the HTTP server, the CLI) recover the kind with
//! [`classify`] instead of matching on message text.

use serde::Serialize;
use thiserror::Error;

/// Coarse failure category, stable across the API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Ingestion,
    Provider,
    Config,
    NotFound,
    EmptyRetrieval,
    PayloadTooLarge,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Ingestion => "ingestion",
            ErrorKind::Provider => "provider",
            ErrorKind::Config => "config",
            ErrorKind::NotFound => "not_found",
            ErrorKind::EmptyRetrieval => "empty_retrieval",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// docintel errors.
#[derive(Debug, Error)]
pub enum RagError {
    /// Caller supplied something unusable (empty question, wrong file type).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The document could not be read, parsed, or chunked.
    #[error("failed to ingest '{filename}': {message}")]
    Ingestion { filename: String, message: String },

    /// Embedding or generation backend failed (network, quota, bad response).
    #[error("provider error: {0}")]
    Provider(String),

    /// Missing credential or invalid setting.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Retrieval produced no usable context, so no answer is generated.
    #[error("no relevant context found: {0}")]
    EmptyRetrieval(String),

    #[error("upload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl RagError {
    pub fn ingestion(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            filename: filename.into(),
            message: message.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::InvalidInput(_) => ErrorKind::InvalidInput,
            RagError::Ingestion { .. } => ErrorKind::Ingestion,
            RagError::Provider(_) => ErrorKind::Provider,
            RagError::Config(_) => ErrorKind::Config,
            RagError::NotFound(_) => ErrorKind::NotFound,
            RagError::EmptyRetrieval(_) => ErrorKind::EmptyRetrieval,
            RagError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            RagError::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Find the outermost [`RagError`] in an error chain and return its kind.
///
/// A [`RagError`] may be the root cause or a `.context(..)` value; both
/// are found. Errors that carry no [`RagError`] anywhere in their chain
/// (sqlx, I/O) are reported as [`ErrorKind::Storage`].
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    err.downcast_ref::<RagError>()
        .or_else(|| err.chain().find_map(|cause| cause.downcast_ref::<RagError>()))
        .map(RagError::kind)
        .unwrap_or(ErrorKind::Storage)
}
