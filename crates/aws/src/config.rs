use std::time::Duration;

use serde::Deserialize;

/// Session name used for assume-role when none is configured.
pub const DEFAULT_SESSION_NAME: &str = "relay-dispatcher";

/// Default upper bound on a single SDK operation, retries included.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Client settings for the ECS launcher.
///
/// ```toml
/// [aws]
/// region = "eu-north-1"
/// endpoint_url = "http://localhost:4566"
///
/// [aws.assume_role]
/// role_arn = "arn:aws:iam::123456789012:role/relay-dispatch"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AwsBaseConfig {
    /// Region of the target cluster. No fallback region is assumed.
    pub region: String,

    /// Endpoint override for local stacks.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_operation_timeout_seconds")]
    pub operation_timeout_seconds: u64,

    /// Launch into a cluster owned by another account.
    #[serde(default)]
    pub assume_role: Option<AssumeRole>,
}

fn default_operation_timeout_seconds() -> u64 {
    DEFAULT_OPERATION_TIMEOUT.as_secs()
}

/// STS assume-role parameters. The ARN and external ID never appear in
/// `Debug` output.
#[derive(Clone, Deserialize)]
pub struct AssumeRole {
    pub role_arn: String,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl std::fmt::Debug for AssumeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumeRole")
            .field("role_arn", &"[REDACTED]")
            .field("session_name", &self.session_name())
            .field("external_id", &self.external_id.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AssumeRole {
    /// Create assume-role settings for `role_arn` with the default session name.
    pub fn new(role_arn: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            session_name: None,
            external_id: None,
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// The configured session name, or [`DEFAULT_SESSION_NAME`].
    pub fn session_name(&self) -> &str {
        self.session_name.as_deref().unwrap_or(DEFAULT_SESSION_NAME)
    }
}

impl AwsBaseConfig {
    /// Create a new `AwsBaseConfig` for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
            operation_timeout_seconds: default_operation_timeout_seconds(),
            assume_role: None,
        }
    }

    /// Set an endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Assume an IAM role via STS before launching.
    #[must_use]
    pub fn with_assume_role(mut self, assume_role: AssumeRole) -> Self {
        self.assume_role = Some(assume_role);
        self
    }

    /// Whole seconds only; sub-second parts are dropped.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_seconds = timeout.as_secs();
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}
