// src/error.rs
use thiserror::Error;

/// Configuration problems detected while merging host overrides.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid match pattern `{pattern}`: {source}")]
    InvalidMatchPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid plugin configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Failures reported by the paginated rendering engine.
///
/// These never leave the backend adapter. Library and document failures end
/// in the native embed; a page failure leaves the viewer as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("rendering library unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    #[error("failed to render page {page}: {reason}")]
    PageRender { page: u32, reason: String },
}
