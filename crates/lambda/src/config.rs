use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_aws::AwsBaseConfig;
use relay_core::{DEFAULT_LAUNCH_TIMEOUT, PlacementCatalog};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the path of the TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "relay.toml";

/// Environment variable selecting the active variant; wins over
/// `dispatch.variant`.
pub const VARIANT_ENV: &str = "RELAY_VARIANT";

/// Errors raised while loading the configuration at cold start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no active variant: set RELAY_VARIANT or dispatch.variant")]
    NoActiveVariant,

    #[error("'{field}' must be at least one second")]
    ZeroTimeout { field: &'static str },
}

/// Top-level configuration, loaded from a TOML file.
///
/// # Example
///
/// ```toml
/// [aws]
/// region = "eu-north-1"
///
/// [dispatch]
/// variant = "recorder"
///
/// [variants.recorder]
/// schema = "url"
/// cluster = "miro-talk-bot-cluster"
/// task_definition = "miro-talk-bot-video-recorder"
/// subnets = ["subnet-07e4ce464f47fef6d"]
/// security_groups = ["sg-0ca926c2de128a40d"]
/// assign_public_ip = "ENABLED"
/// ```
#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// AWS client settings. The region must be set explicitly.
    pub aws: AwsBaseConfig,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Every deployment variant, keyed by name.
    #[serde(default)]
    pub variants: PlacementCatalog,
}

/// Which variant this deployment serves and how long a launch may take.
#[derive(Debug, Deserialize)]
pub struct DispatchSettings {
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default = "default_launch_timeout_seconds")]
    pub launch_timeout_seconds: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            variant: None,
            launch_timeout_seconds: default_launch_timeout_seconds(),
        }
    }
}

fn default_launch_timeout_seconds() -> u64 {
    DEFAULT_LAUNCH_TIMEOUT.as_secs()
}

/// Log output settings. `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit one JSON object per event instead of plain text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl RelayConfig {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and check a configuration. Variants are validated separately,
    /// when the active one is resolved.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.launch_timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "dispatch.launch_timeout_seconds",
            });
        }
        if self.aws.operation_timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "aws.operation_timeout_seconds",
            });
        }
        Ok(())
    }

    /// Name of the variant to serve: `env_override` if given, else
    /// `dispatch.variant`. There is no implicit default.
    pub fn active_variant<'a>(
        &'a self,
        env_override: Option<&'a str>,
    ) -> Result<&'a str, ConfigError> {
        env_override
            .filter(|v| !v.trim().is_empty())
            .or(self.dispatch.variant.as_deref())
            .ok_or(ConfigError::NoActiveVariant)
    }

    /// Upper bound on the wait for `RunTask` to answer.
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.launch_timeout_seconds)
    }
}
