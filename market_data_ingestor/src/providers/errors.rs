use thiserror::Error;

use crate::models::timeframe::TimeFrameError;

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider's API returned a specific error message.
    #[error("API error: {0}")]
    Api(String),

    /// The provider refused the request (entitlement or plan restriction).
    ///
    /// Callers treat this as "no data for this window" and degrade to an
    /// empty series rather than aborting the batch.
    #[error("Request rejected by provider: {0}")]
    Rejected(String),

    /// The request parameters were invalid for this specific provider.
    #[error("Invalid parameters for provider: {0}")]
    Validation(String),

    /// An internal error occurred while processing data within the provider.
    #[error("Internal provider error: {0}")]
    Internal(String),
}

impl From<TimeFrameError> for ProviderError {
    fn from(err: TimeFrameError) -> Self {
        ProviderError::Validation(err.to_string())
    }
}

/// Errors that can occur while constructing a provider.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// A required credential was not present in the environment.
    #[error(transparent)]
    MissingEnvVar(#[from] shared_utils::env::MissingEnvVarError),

    /// A credential could not be used as an HTTP header value.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
