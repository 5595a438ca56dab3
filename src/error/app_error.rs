use crate::config::error::ConfigError;
use crate::error::DeliveryError;
use thiserror::Error;

/// Application-wide error type returned across the host-facing API.
///
/// Configuration problems are raised when a service is built, so a backend
/// with bad credentials never becomes available. Delivery problems are
/// raised per send and wrap a [`DeliveryError`] describing what went wrong
/// on the wire.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required configuration key is missing or empty
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A configured or supplied value is present but malformed
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A notification could not be delivered
    #[error("Delivery failed: {source}")]
    DeliveryFailed {
        #[from]
        source: DeliveryError,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Builds a configuration error for a missing or empty key
    pub fn missing_key(key: impl Into<String>) -> Self {
        let key = key.into();
        AppError::Configuration {
            source: anyhow::anyhow!("required key '{}' is missing or empty", key),
            key,
        }
    }

    /// Whether this error was produced by a failed delivery attempt
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, AppError::DeliveryFailed { .. })
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

/// Missing or unusable settings become `Configuration`; a present but
/// malformed value becomes `Validation`
impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        if let ConfigError::InvalidValue { field, message } = error {
            return AppError::Validation {
                field,
                reason: message,
            };
        }

        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "configuration".to_string(),
        };
        AppError::Configuration {
            key,
            source: error.into(),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
