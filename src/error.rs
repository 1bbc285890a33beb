use thiserror::Error;

/// Failure reported by an image source while serving a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The query service rejected or failed the request.
    #[error("query failed: {0}")]
    Query(String),

    /// The catalog payload could not be decoded into rows.
    #[error("catalog decode failed: {0}")]
    Catalog(#[from] serde_json::Error),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
