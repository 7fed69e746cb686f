use std::time::Duration;

use relay_core::LaunchError;
use thiserror::Error;

/// Errors specific to AWS backend operations.
#[derive(Debug, Error)]
pub enum AwsProviderError {
    /// The AWS service returned an error or refused the request.
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// The request was throttled by the AWS service.
    #[error("AWS request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with AWS.
    #[error("AWS connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("AWS request timed out")]
    Timeout,

    /// The request could not be assembled from the launch parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// AWS credential resolution failed.
    #[error("credential error: {0}")]
    CredentialError(String),
}

impl AwsProviderError {
    /// Convert into the backend-neutral [`LaunchError`].
    ///
    /// `operation_timeout` is the SDK timeout that was in force, reported
    /// when the request timed out.
    pub fn into_launch_error(self, operation_timeout: Duration) -> LaunchError {
        match self {
            Self::ServiceError(msg) | Self::InvalidRequest(msg) => LaunchError::Rejected(msg),
            Self::Throttled => LaunchError::Throttled,
            Self::Connection(msg) => LaunchError::Connection(msg),
            Self::Timeout => LaunchError::Timeout(operation_timeout),
            Self::CredentialError(msg) => LaunchError::Credentials(msg),
        }
    }
}

/// Classify an AWS SDK error string into the appropriate [`AwsProviderError`].
///
/// Inspects the message for common patterns (throttling, timeout,
/// credentials, connection) and falls back to a service error.
pub fn classify_sdk_error(error_str: &str) -> AwsProviderError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        AwsProviderError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AwsProviderError::Timeout
    } else if lower.contains("credential")
        || lower.contains("expiredtoken")
        || lower.contains("security token")
    {
        AwsProviderError::CredentialError(error_str.to_owned())
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
        || lower.contains("dispatch failure")
    {
        AwsProviderError::Connection(error_str.to_owned())
    } else {
        AwsProviderError::ServiceError(error_str.to_owned())
    }
}
