//! Error types for the Scaleway provider.

use crate::config::ConfigError;
use scaleway_rs::ScalewayError;
use thiserror::Error;

/// Errors raised by the Scaleway provider.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScalewayProviderError {
    /// Raised when the high-level configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Wrapper for SDK and transport level failures.
    #[error("provider error: {message}")]
    Provider {
        /// Message returned by the SDK or HTTP client.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("{resource} request failed with status {status}: {message}")]
    Api {
        /// Resource the request targeted.
        resource: &'static str,
        /// HTTP status code.
        status: u16,
        /// Error message returned by the API.
        message: String,
    },
    /// Raised when a response body does not match the expected shape.
    #[error("failed to parse {resource} response: {message}")]
    Decode {
        /// Resource the response describes.
        resource: &'static str,
        /// Parser error message.
        message: String,
    },
    /// Raised when a wait exceeds the configured timeout.
    #[error("timeout waiting for {action} on instance {instance_id}")]
    Timeout {
        /// Action being waited on.
        action: String,
        /// Provider instance identifier.
        instance_id: String,
    },
    /// Raised when an instance disappears while being waited on.
    #[error("instance {instance_id} not found in zone {zone}")]
    InstanceNotFound {
        /// Provider instance identifier.
        instance_id: String,
        /// Zone where lookup was attempted.
        zone: String,
    },
}

impl From<ScalewayError> for ScalewayProviderError {
    fn from(value: ScalewayError) -> Self {
        Self::Provider {
            message: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for ScalewayProviderError {
    fn from(value: reqwest::Error) -> Self {
        Self::Provider {
            message: value.to_string(),
        }
    }
}

impl From<ConfigError> for ScalewayProviderError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
