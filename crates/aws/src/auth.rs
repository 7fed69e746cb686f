use aws_config::sts::AssumeRoleProvider;
use aws_config::timeout::TimeoutConfig;
use aws_config::{ConfigLoader, Region, SdkConfig};
use tracing::{debug, info};

use crate::config::AwsBaseConfig;

/// Load the SDK configuration for `config`.
///
/// Credentials come from the standard chain (inside Lambda, the execution
/// role). When `assume_role` is set those credentials are exchanged through
/// STS for the target role and refreshed before expiry. Every operation is
/// bounded by `operation_timeout_seconds`.
///
/// ```no_run
/// use relay_aws::auth::build_sdk_config;
/// use relay_aws::config::AwsBaseConfig;
///
/// # async fn example() {
/// let config = AwsBaseConfig::new("eu-north-1").with_endpoint_url("http://localhost:4566");
/// let sdk_config = build_sdk_config(&config).await;
/// # }
/// ```
pub async fn build_sdk_config(config: &AwsBaseConfig) -> SdkConfig {
    let base = base_loader(config).load().await;

    let Some(role) = &config.assume_role else {
        return base;
    };

    info!(session_name = %role.session_name(), "assuming IAM role for ECS launches");

    // The STS calls reuse the endpoint override and the ambient credentials.
    let mut provider = AssumeRoleProvider::builder(&role.role_arn)
        .session_name(role.session_name())
        .region(Region::new(config.region.clone()));
    if let Some(external_id) = &role.external_id {
        provider = provider.external_id(external_id);
    }
    let provider = provider.configure(&base).build().await;

    base_loader(config)
        .credentials_provider(provider)
        .load()
        .await
}

fn base_loader(config: &AwsBaseConfig) -> ConfigLoader {
    let timeouts = TimeoutConfig::builder()
        .operation_timeout(config.operation_timeout())
        .build();

    let loader = aws_config::from_env()
        .region(Region::new(config.region.clone()))
        .timeout_config(timeouts);

    match &config.endpoint_url {
        Some(endpoint) => {
            debug!(endpoint = %endpoint, "using custom AWS endpoint");
            loader.endpoint_url(endpoint)
        }
        None => loader,
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use std::time::Duration;

    use super::*;

    // Loading needs a system root certificate store, so these only run in
    // integration mode.

    #[tokio::test]
    async fn sets_region_and_operation_timeout() {
        let config =
            AwsBaseConfig::new("eu-north-1").with_operation_timeout(Duration::from_secs(7));
        let sdk_config = build_sdk_config(&config).await;
        assert_eq!(sdk_config.region().map(|r| r.as_ref()), Some("eu-north-1"));
        assert_eq!(
            sdk_config
                .timeout_config()
                .and_then(|t| t.operation_timeout()),
            Some(Duration::from_secs(7))
        );
    }

    #[tokio::test]
    async fn endpoint_override_is_applied() {
        let config = AwsBaseConfig::new("us-west-2").with_endpoint_url("http://localhost:4566");
        let sdk_config = build_sdk_config(&config).await;
        assert_eq!(sdk_config.endpoint_url(), Some("http://localhost:4566"));
    }
}
