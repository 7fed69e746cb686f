//! Dispatch logic for launching one containerized task per SNS notification.
//!
//! The flow is strictly linear: an SNS [`NotificationEnvelope`] is unwrapped,
//! its message body is validated into a [`DispatchPayload`] according to the
//! active variant's [`PayloadSchema`], combined with that variant's
//! [`PlacementConfig`] into a [`LaunchRequest`], and handed to a
//! [`TaskLauncher`]. The [`Dispatcher`] ties these steps together.

pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod launcher;
pub mod payload;
pub mod placement;
pub mod request;

pub use dispatcher::{DEFAULT_LAUNCH_TIMEOUT, DispatchResponse, Dispatcher};
pub use envelope::NotificationEnvelope;
pub use error::{ConfigurationError, DispatchError, LaunchError, ValidationError};
pub use launcher::{DynTaskLauncher, LaunchReceipt, TaskLauncher};
pub use payload::{DispatchPayload, PayloadField, PayloadSchema};
pub use placement::{
    AssignPublicIp, LaunchType, NetworkResource, PlacementCatalog, PlacementConfig,
    ResolvedVariant, VariantConfig,
};
pub use request::{
    ContainerOverride, ENV_FILENAME, ENV_URL, EnvVar, LaunchRequest, NetworkPlacement,
};
