use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Provider Error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Fusion received no provider results")]
    FusionEmpty,
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

// Rejection reasons, first failing check wins
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Image payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("Image dimensions {width}x{height} exceed the {max_width}x{max_height} limit")]
    DimensionsExceeded {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("Unable to read image dimensions: {0}")]
    UnreadableImage(String),
}

// Provider failures are absorbed by the orchestrator, never surfaced individually
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider '{provider}' failed: {message}")]
    Backend { provider: String, message: String },
    #[error("Provider '{provider}' timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },
    #[error("Provider '{provider}' task panicked")]
    Panicked { provider: String },
}

impl ProviderError {
    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Backend {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_analysis_error() {
        let err: AnalysisError = ValidationError::PayloadTooLarge { size: 10, max: 5 }.into();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::PayloadTooLarge { size: 10, max: 5 })
        ));
        assert_eq!(
            err.to_string(),
            "Validation Error: Image payload of 10 bytes exceeds the 5 byte limit"
        );
    }

    #[test]
    fn provider_timeout_is_flagged() {
        let timeout = ProviderError::Timeout {
            provider: "vision-a".to_string(),
            after_ms: 250,
        };
        assert!(timeout.is_timeout());
        assert!(!ProviderError::backend("vision-a", "503").is_timeout());
    }
}
