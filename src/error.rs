//! Error types for the context cache
//!
//! Cache lookups never fail: a missing or expired entry is `None`. This
//! error type only covers configuration loading and (de)serialization of
//! structured values kept in the store.

use thiserror::Error;

/// Main error type for cache configuration and payload handling
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration error - invalid or unparsable settings
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::InvalidConfig("gc_interval must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: gc_interval must be greater than 0"
        );

        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: CacheError = json_error.into();
        assert!(error.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));
    }
}
