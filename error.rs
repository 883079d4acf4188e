use thiserror::Error;

/// Errors surfaced by the geo index and query layers.
#[derive(Debug, Error)]
pub enum GeoSearchError {
    /// The requested field is not registered for geo indexing.
    #[error("field '{field}' is not registered for geo search")]
    Configuration { field: String },

    /// Search parameters rejected before touching the index.
    #[error("invalid search request: {0}")]
    Validation(String),

    /// A stored value could not be read as a coordinate.
    #[error("invalid coordinate value: {0}")]
    Parse(String),

    /// The index or content storage failed the current operation.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoSearchError {
    pub fn validation(message: impl Into<String>) -> Self {
        GeoSearchError::Validation(message.into())
    }

    pub fn unregistered(field: impl Into<String>) -> Self {
        GeoSearchError::Configuration {
            field: field.into(),
        }
    }

    /// Whether the error only affects a single item and processing may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GeoSearchError::Parse(_))
    }
}
