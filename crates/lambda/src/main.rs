use std::path::PathBuf;
use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use relay_aws::EcsTaskLauncher;
use relay_core::Dispatcher;
use relay_lambda::config::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, LoggingConfig, RelayConfig, VARIANT_ENV,
};
use relay_lambda::{handler, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let config = match RelayConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            telemetry::init(&LoggingConfig::default());
            error!(error = %e, "failed to load configuration");
            return Err(e.into());
        }
    };

    telemetry::init(&config.logging);

    let variant_override = std::env::var(VARIANT_ENV).ok();
    let variant = config
        .active_variant(variant_override.as_deref())
        .inspect_err(|e| error!(error = %e, "no variant to serve"))?;

    let launcher = Arc::new(EcsTaskLauncher::new(&config.aws).await);
    let dispatcher = Dispatcher::from_catalog(&config.variants, variant, launcher)
        .inspect_err(|e| error!(variant = %variant, error = %e, "invalid placement configuration"))?
        .with_launch_timeout(config.launch_timeout());

    info!(
        variant = %dispatcher.variant().name(),
        region = %config.aws.region,
        launch_timeout = ?dispatcher.launch_timeout(),
        "relay dispatcher ready"
    );

    let dispatcher = Arc::new(dispatcher);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { handler::handle(&dispatcher, event).await }
    }))
    .await
}
