//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Weather provider unreachable, rate limited or answering non-2xx
    #[error("Weather provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider answered with missing or unexpected fields
    #[error("Malformed provider payload: {0}")]
    MalformedPayload(String),

    /// Message could not be delivered to the chat
    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),

    /// Place name could not be resolved to coordinates
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// User input could not be understood
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Snapshot storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Whether the error came from the weather provider
    ///
    /// Provider failures only skip the affected detection step.
    pub const fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::MalformedPayload(_)
        )
    }
}
