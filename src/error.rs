//! Domain errors for the content pipeline

use thiserror::Error;

/// Errors raised while resolving and rendering documents
#[derive(Debug, Error)]
pub enum Error {
    /// The requested slug has no matching document in the store.
    ///
    /// Surfaced to the routing layer, which renders a dedicated
    /// not-found page. Never retried.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A compiled body payload could not be deserialized.
    #[error("invalid compiled body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl Error {
    /// True if this error maps to a not-found response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
