//! AWS backends for the relay task dispatcher.
//!
//! - **ECS** (`ecs` feature): launch Fargate or EC2 tasks with `RunTask`
//!
//! Backends share a common [`AwsBaseConfig`](config::AwsBaseConfig) for
//! region, endpoint override, operation timeout and optional STS assume-role
//! credentials.

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "ecs")]
pub mod ecs;

// Re-exports for convenience.
pub use config::{AssumeRole, AwsBaseConfig};
pub use error::AwsProviderError;

#[cfg(feature = "ecs")]
pub use ecs::EcsTaskLauncher;
