use thiserror::Error;

/// Top-level error type for the Squarium system.
///
/// Subsystem crates define their own error types where they need finer
/// detail and convert into `SquariumError` at crate boundaries so that `?`
/// works across the workspace.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SquariumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SquariumError {
    fn from(err: toml::de::Error) -> Self {
        SquariumError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SquariumError {
    fn from(err: toml::ser::Error) -> Self {
        SquariumError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SquariumError {
    fn from(err: serde_json::Error) -> Self {
        SquariumError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Squarium operations.
pub type Result<T> = std::result::Result<T, SquariumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(SquariumError, &str)> = vec![
            (
                SquariumError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                SquariumError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                SquariumError::Source("401 Unauthorized".to_string()),
                "Source error: 401 Unauthorized",
            ),
            (
                SquariumError::Generation("quota exceeded".to_string()),
                "Generation error: quota exceeded",
            ),
            (
                SquariumError::Embedding("model offline".to_string()),
                "Embedding error: model offline",
            ),
            (
                SquariumError::Api("unauthorized".to_string()),
                "API error: unauthorized",
            ),
            (
                SquariumError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SquariumError = io_err.into();
        assert!(matches!(err, SquariumError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let converted: SquariumError = err.unwrap_err().into();
        assert!(matches!(converted, SquariumError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let converted: SquariumError = err.unwrap_err().into();
        assert!(matches!(converted, SquariumError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
