use async_trait::async_trait;

use crate::error::LaunchError;
use crate::request::LaunchRequest;

/// Acknowledgment that the backend accepted a launch.
///
/// Acceptance means the task was scheduled, not that it is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReceipt {
    /// Identifiers (ARNs) of the tasks the backend created.
    pub task_ids: Vec<String>,
}

impl LaunchReceipt {
    /// Create a receipt for the given task identifiers.
    pub fn new(task_ids: Vec<String>) -> Self {
        Self { task_ids }
    }
}

/// Strongly-typed launcher trait with native `async fn`.
///
/// Not object-safe; every `TaskLauncher` also implements [`DynTaskLauncher`]
/// through a blanket implementation for use behind `Arc<dyn _>`.
///
/// Implementations must not retry: the dispatcher makes at most one launch
/// call per notification and leaves redelivery to the upstream queue.
pub trait TaskLauncher: Send + Sync {
    /// Returns a short name identifying the backend, used in logs.
    fn name(&self) -> &str;

    /// Submit a launch request to the backend.
    fn launch(
        &self,
        request: &LaunchRequest,
    ) -> impl std::future::Future<Output = Result<LaunchReceipt, LaunchError>> + Send;
}

/// Object-safe launcher trait.
///
/// Implement [`TaskLauncher`] instead and rely on the blanket implementation.
#[async_trait]
pub trait DynTaskLauncher: Send + Sync {
    /// Returns a short name identifying the backend, used in logs.
    fn name(&self) -> &str;

    /// Submit a launch request to the backend.
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchReceipt, LaunchError>;
}

#[async_trait]
impl<T: TaskLauncher + Sync> DynTaskLauncher for T {
    fn name(&self) -> &str {
        TaskLauncher::name(self)
    }

    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchReceipt, LaunchError> {
        TaskLauncher::launch(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::payload::{DispatchPayload, PayloadSchema};
    use crate::placement::{AssignPublicIp, LaunchType, PlacementConfig};

    struct StaticLauncher {
        fail: bool,
    }

    impl TaskLauncher for StaticLauncher {
        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "static"
        }

        async fn launch(&self, request: &LaunchRequest) -> Result<LaunchReceipt, LaunchError> {
            if self.fail {
                return Err(LaunchError::Rejected("no capacity".into()));
            }
            Ok(LaunchReceipt::new(vec![format!(
                "arn:aws:ecs:us-east-1:123456789012:task/{}/abc",
                request.cluster
            )]))
        }
    }

    fn request() -> LaunchRequest {
        let payload = DispatchPayload::parse(r#"{"url":"https://x"}"#, PayloadSchema::Url).unwrap();
        let placement = PlacementConfig {
            cluster: "c".into(),
            task_definition: "td".into(),
            container_name: "mirobot".into(),
            launch_type: LaunchType::Fargate,
            platform_version: "LATEST".into(),
            subnets: vec!["subnet-07e4ce464f47fef6d".into()],
            security_groups: vec!["sg-0ca926c2de128a40d".into()],
            assign_public_ip: AssignPublicIp::Disabled,
        };
        LaunchRequest::build(&payload, &placement)
    }

    #[tokio::test]
    async fn blanket_dyn_launcher_impl() {
        let launcher: Arc<dyn DynTaskLauncher> = Arc::new(StaticLauncher { fail: false });
        assert_eq!(launcher.name(), "static");

        let receipt = launcher.launch(&request()).await.unwrap();
        assert_eq!(
            receipt.task_ids,
            vec!["arn:aws:ecs:us-east-1:123456789012:task/c/abc"]
        );
    }

    #[tokio::test]
    async fn dyn_launcher_propagates_failure() {
        let launcher: Arc<dyn DynTaskLauncher> = Arc::new(StaticLauncher { fail: true });
        let err = launcher.launch(&request()).await.unwrap_err();
        assert!(matches!(err, LaunchError::Rejected(_)));
    }
}
