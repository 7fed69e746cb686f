use std::time::Duration;

use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::operation::run_task::RunTaskOutput;
use aws_sdk_ecs::types::{
    AwsVpcConfiguration, ContainerOverride, KeyValuePair, NetworkConfiguration, TaskOverride,
};
use relay_core::{
    AssignPublicIp, LaunchError, LaunchReceipt, LaunchRequest, LaunchType, NetworkPlacement,
    TaskLauncher,
};
use tracing::{debug, error, info, instrument};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::{AwsProviderError, classify_sdk_error};

/// Launches tasks with the ECS `RunTask` API.
///
/// The SDK client is created once and reused for every launch. It is
/// internally reference-counted and holds no per-request state.
pub struct EcsTaskLauncher {
    client: aws_sdk_ecs::Client,
    operation_timeout: Duration,
}

impl std::fmt::Debug for EcsTaskLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcsTaskLauncher")
            .field("client", &"<EcsClient>")
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl EcsTaskLauncher {
    /// Create a new `EcsTaskLauncher` by building an AWS SDK client.
    pub async fn new(config: &AwsBaseConfig) -> Self {
        let sdk_config = build_sdk_config(config).await;
        let client = aws_sdk_ecs::Client::new(&sdk_config);
        Self {
            client,
            operation_timeout: config.operation_timeout(),
        }
    }

    /// Create an `EcsTaskLauncher` with a pre-built client.
    pub fn with_client(client: aws_sdk_ecs::Client, operation_timeout: Duration) -> Self {
        Self {
            client,
            operation_timeout,
        }
    }
}

impl TaskLauncher for EcsTaskLauncher {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "aws-ecs"
    }

    #[instrument(
        skip(self, request),
        fields(cluster = %request.cluster, task_definition = %request.task_definition)
    )]
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchReceipt, LaunchError> {
        let network = network_configuration(&request.network)
            .map_err(|e| e.into_launch_error(self.operation_timeout))?;

        let mut call = self
            .client
            .run_task()
            .cluster(&request.cluster)
            .task_definition(&request.task_definition)
            .launch_type(sdk_launch_type(request.launch_type))
            .count(request.count)
            .network_configuration(network)
            .overrides(task_override(request));

        if let Some(ref platform_version) = request.platform_version {
            call = call.platform_version(platform_version);
        }

        debug!("calling ECS RunTask");

        let output = call.send().await.map_err(|e| {
            let err_str = DisplayErrorContext(&e).to_string();
            error!(error = %err_str, "ECS RunTask failed");
            classify_sdk_error(&err_str).into_launch_error(self.operation_timeout)
        })?;

        let receipt =
            receipt_from_output(&output).map_err(|e| e.into_launch_error(self.operation_timeout))?;
        info!(task_ids = ?receipt.task_ids, "ECS accepted task");
        Ok(receipt)
    }
}

fn sdk_launch_type(launch_type: LaunchType) -> aws_sdk_ecs::types::LaunchType {
    match launch_type {
        LaunchType::Fargate => aws_sdk_ecs::types::LaunchType::Fargate,
        LaunchType::Ec2 => aws_sdk_ecs::types::LaunchType::Ec2,
    }
}

fn sdk_assign_public_ip(policy: AssignPublicIp) -> aws_sdk_ecs::types::AssignPublicIp {
    match policy {
        AssignPublicIp::Enabled => aws_sdk_ecs::types::AssignPublicIp::Enabled,
        AssignPublicIp::Disabled => aws_sdk_ecs::types::AssignPublicIp::Disabled,
    }
}

fn network_configuration(
    network: &NetworkPlacement,
) -> Result<NetworkConfiguration, AwsProviderError> {
    let vpc = AwsVpcConfiguration::builder()
        .set_subnets(Some(network.subnets.clone()))
        .set_security_groups(Some(network.security_groups.clone()))
        .assign_public_ip(sdk_assign_public_ip(network.assign_public_ip))
        .build()
        .map_err(|e| AwsProviderError::InvalidRequest(e.to_string()))?;

    Ok(NetworkConfiguration::builder()
        .awsvpc_configuration(vpc)
        .build())
}

fn task_override(request: &LaunchRequest) -> TaskOverride {
    let environment = request
        .container_override
        .environment
        .iter()
        .map(|var| KeyValuePair::builder().name(&var.name).value(&var.value).build())
        .collect();

    let container = ContainerOverride::builder()
        .name(&request.container_override.name)
        .set_environment(Some(environment))
        .build();

    TaskOverride::builder().container_overrides(container).build()
}

/// Interpret a `RunTask` response.
///
/// ECS reports placement problems (no capacity, missing resources) in
/// `failures` of an otherwise successful call, so a response with failures or
/// without tasks is a rejection.
fn receipt_from_output(output: &RunTaskOutput) -> Result<LaunchReceipt, AwsProviderError> {
    let failures: Vec<String> = output
        .failures()
        .iter()
        .map(|f| {
            let reason = f.reason().unwrap_or("unknown reason");
            match (f.arn(), f.detail()) {
                (Some(arn), Some(detail)) => format!("{arn}: {reason} ({detail})"),
                (Some(arn), None) => format!("{arn}: {reason}"),
                (None, Some(detail)) => format!("{reason} ({detail})"),
                (None, None) => reason.to_owned(),
            }
        })
        .collect();

    if !failures.is_empty() {
        return Err(AwsProviderError::ServiceError(format!(
            "RunTask reported failures: {}",
            failures.join("; ")
        )));
    }

    let task_ids: Vec<String> = output
        .tasks()
        .iter()
        .filter_map(|t| t.task_arn().map(str::to_owned))
        .collect();

    if task_ids.is_empty() {
        return Err(AwsProviderError::ServiceError(
            "RunTask returned no tasks".to_owned(),
        ));
    }

    Ok(LaunchReceipt::new(task_ids))
}
