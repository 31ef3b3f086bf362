//! Cache error types

/// Cache-related errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Memory tier error: {0}")]
    Memory(#[from] moka::PredicateError),
}
