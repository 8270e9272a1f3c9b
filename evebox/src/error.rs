use thiserror::Error;

/// Rejections raised while turning form input into an aggregation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field is required")]
    EmptyField,

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Size must be a whole number, got '{0}'")]
    InvalidSize(String),

    #[error("Size must be between 1 and {max}, got {size}")]
    SizeOutOfRange { size: u64, max: usize },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error (status {status}): {reason}")]
    Backend { status: u16, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(_) => "transport",
            Self::Backend { .. } => "backend",
            Self::Decode(_) | Self::Json(_) => "decode",
            Self::Cancelled => "cancelled",
            Self::InvalidUrl(_) => "url",
            Self::Config(_) | Self::TomlDe(_) | Self::TomlSer(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts_into_error() {
        let err: Error = ValidationError::EmptyField.into();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyField)));
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.to_string(), "Validation error: Field is required");
    }

    #[test]
    fn test_backend_error_message() {
        let err = Error::Backend {
            status: 500,
            reason: "index_not_found".to_string(),
        };
        assert_eq!(err.kind(), "backend");
        assert_eq!(
            err.to_string(),
            "Backend error (status 500): index_not_found"
        );
    }

    #[test]
    fn test_size_out_of_range_message() {
        let err = ValidationError::SizeOutOfRange { size: 0, max: 10_000 };
        assert_eq!(err.to_string(), "Size must be between 1 and 10000, got 0");
    }
}
