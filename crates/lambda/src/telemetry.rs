//! Tracing subscriber setup for the Lambda runtime.
//!
//! CloudWatch stamps every line with its ingestion time and does not render
//! ANSI colours, so both are switched off.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Must be called at most
/// once per process.
pub fn init(config: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .without_time()
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_ansi(false)
                    .with_target(false),
            )
            .init();
    }
}
