use std::time::Duration;

use thiserror::Error;

use crate::payload::PayloadField;

/// Errors that can occur while dispatching a single notification.
///
/// Every variant is surfaced to the invocation runtime as a failed
/// invocation. None of them is retried inside the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The envelope is missing the expected records or fields.
    #[error("malformed envelope: {0}")]
    Structural(String),

    /// The embedded message body is not a JSON object.
    #[error("unparsable message body: {0}")]
    Parse(String),

    /// Required payload fields are absent or empty.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The variant is unknown or its placement is malformed. Raised when a
    /// dispatcher is built, never while handling a notification.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The orchestration backend rejected or failed the launch.
    #[error("task launch failed: {0}")]
    Backend(#[from] LaunchError),
}

impl DispatchError {
    /// Short, stable name of the error kind, suitable for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structural(_) => "structural",
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Backend(_) => "backend",
        }
    }
}

/// One or more required payload fields are missing.
///
/// Fields are always reported in declaration order (`url` before
/// `fileName`), so the same payload yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field(s): {}", join_wire_names(.missing))]
pub struct ValidationError {
    missing: Vec<PayloadField>,
}

impl ValidationError {
    /// Create a validation error for the given missing fields.
    pub fn new(missing: Vec<PayloadField>) -> Self {
        Self { missing }
    }

    /// The fields that were absent, empty or not strings.
    pub fn missing(&self) -> &[PayloadField] {
        &self.missing
    }
}

fn join_wire_names(fields: &[PayloadField]) -> String {
    let names: Vec<&str> = fields.iter().map(|f| f.wire_name()).collect();
    names.join(", ")
}

/// The placement configuration failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// No variant with the requested name is configured.
    #[error("unknown deployment variant '{0}'")]
    UnknownVariant(String),

    /// A variant table contains settings that are not recognised.
    #[error("unknown setting(s): {}", .keys.join(", "))]
    UnknownSettings { keys: Vec<String> },

    /// A required setting is empty.
    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },

    /// An identifier does not have the shape expected for its role.
    #[error("'{field}' entry '{value}' is not a valid {expected} id")]
    Malformed {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// An identifier of one resource type was configured in a slot for another.
    #[error("'{field}' entry '{value}' is a {found} id, expected a {expected} id")]
    RoleMismatch {
        field: &'static str,
        value: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors reported by a [`TaskLauncher`](crate::launcher::TaskLauncher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    /// The backend refused the launch (invalid placement, missing task
    /// definition, no capacity, authorization failure).
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// The backend throttled the request.
    #[error("request throttled")]
    Throttled,

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// No response arrived within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Credentials could not be resolved for the backend call.
    #[error("credential error: {0}")]
    Credentials(String),
}

impl LaunchError {
    /// Returns `true` if the error is transient and a redelivery of the same
    /// notification may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Connection(_) | Self::Timeout(_))
    }
}
