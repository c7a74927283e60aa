use thiserror::Error;

/// Failure of a single fetch issued by a [`crate::catalog::MapSource`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("not found")]
    NotFound,
    #[error("fetch failed ({code} {text})")]
    Status { code: u16, text: String },
    #[error("network error: {0}")]
    Network(String),
}

/// Root index failures. These are fatal for the session.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load map index: {0}")]
    Index(#[source] SourceError),
    #[error("map index is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reasons a map cannot become the active one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivateError {
    #[error("map '{0}' does not exist")]
    NotFound(String),
    #[error("The map \"{0}\" is coming soon!")]
    ComingSoon(String),
    #[error("invalid dimensions or missing imageUrl for map '{0}'")]
    InvalidDescriptor(String),
}
