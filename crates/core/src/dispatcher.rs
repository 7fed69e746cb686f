use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::envelope::NotificationEnvelope;
use crate::error::{DispatchError, LaunchError};
use crate::launcher::{DynTaskLauncher, LaunchReceipt};
use crate::payload::DispatchPayload;
use crate::placement::{PlacementCatalog, ResolvedVariant};
use crate::request::LaunchRequest;

/// Upper bound on the wait for the backend to acknowledge a launch.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Body returned to the invoker once the backend accepted the task.
pub const TASK_STARTED: &str = "Task started";

/// Success response handed back to the invocation runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl DispatchResponse {
    /// The `200 Task started` acknowledgment.
    pub fn task_started() -> Self {
        Self {
            status_code: 200,
            body: TASK_STARTED.to_owned(),
        }
    }
}

/// Turns one SNS notification into at most one task launch.
///
/// A dispatcher is built once per process from a validated variant and a
/// launcher, then shared read-only across invocations. It keeps no state
/// between calls to [`dispatch`](Self::dispatch).
pub struct Dispatcher {
    variant: ResolvedVariant,
    launcher: Arc<dyn DynTaskLauncher>,
    launch_timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("variant", &self.variant)
            .field("launcher", &self.launcher.name())
            .field("launch_timeout", &self.launch_timeout)
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher with the default launch timeout.
    pub fn new(variant: ResolvedVariant, launcher: Arc<dyn DynTaskLauncher>) -> Self {
        Self {
            variant,
            launcher,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
        }
    }

    /// Resolve `variant` in `catalog` and build a dispatcher for it.
    ///
    /// An unknown or invalid variant is a [`DispatchError::Configuration`].
    pub fn from_catalog(
        catalog: &PlacementCatalog,
        variant: &str,
        launcher: Arc<dyn DynTaskLauncher>,
    ) -> Result<Self, DispatchError> {
        Ok(Self::new(catalog.resolve(variant)?, launcher))
    }

    /// Bound the wait for the backend. Hitting the bound fails the dispatch.
    #[must_use]
    pub fn with_launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }

    pub fn variant(&self) -> &ResolvedVariant {
        &self.variant
    }

    pub fn launch_timeout(&self) -> Duration {
        self.launch_timeout
    }

    /// Parse, validate and assemble the launch request without submitting it.
    pub fn prepare(&self, event: serde_json::Value) -> Result<LaunchRequest, DispatchError> {
        let message = NotificationEnvelope::from_value(event)?.into_message()?;
        let payload = DispatchPayload::parse(&message, self.variant.schema())?;
        debug!(
            schema = ?self.variant.schema(),
            has_file_name = payload.file_name().is_some(),
            "payload validated"
        );
        Ok(LaunchRequest::build(&payload, self.variant.placement()))
    }

    /// Handle one notification: validate it and launch exactly one task.
    ///
    /// The backend is called only after validation succeeds, and at most
    /// once. Failures are returned as-is; nothing is retried here.
    #[instrument(
        skip(self, event),
        fields(variant = %self.variant.name(), launcher = %self.launcher.name())
    )]
    pub async fn dispatch(&self, event: serde_json::Value) -> Result<LaunchReceipt, DispatchError> {
        let request = self.prepare(event).inspect_err(|e| {
            error!(kind = e.kind(), error = %e, "notification rejected");
        })?;

        debug!(
            cluster = %request.cluster,
            task_definition = %request.task_definition,
            container = %request.container_override.name,
            "submitting task launch"
        );

        let outcome = tokio::time::timeout(self.launch_timeout, self.launcher.launch(&request))
            .await
            .unwrap_or(Err(LaunchError::Timeout(self.launch_timeout)));

        match outcome {
            Ok(receipt) => {
                info!(task_ids = ?receipt.task_ids, "task launch accepted");
                Ok(receipt)
            }
            Err(e) => {
                error!(
                    error = %e,
                    retryable = e.is_retryable(),
                    "task launch failed"
                );
                Err(e.into())
            }
        }
    }
}
