use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::payload::PayloadSchema;

/// Container targeted by the environment overrides unless configured otherwise.
pub const DEFAULT_CONTAINER_NAME: &str = "mirobot";

/// Platform version requested for Fargate tasks unless configured otherwise.
pub const DEFAULT_PLATFORM_VERSION: &str = "LATEST";

/// VPC resource ids: a type prefix followed by 8 (legacy) or 17 hex digits.
static RESOURCE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(subnet|sg|vpc|eni)-(?:[0-9a-f]{8}|[0-9a-f]{17})$")
        .expect("resource id regex is valid")
});

/// The kind of VPC resource an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkResource {
    Subnet,
    SecurityGroup,
    Vpc,
    NetworkInterface,
}

impl NetworkResource {
    /// Classify an identifier by its prefix. Returns `None` if the id is not a
    /// well-formed VPC resource id.
    pub fn classify(id: &str) -> Option<Self> {
        let caps = RESOURCE_ID_RE.captures(id)?;
        match caps.get(1)?.as_str() {
            "subnet" => Some(Self::Subnet),
            "sg" => Some(Self::SecurityGroup),
            "vpc" => Some(Self::Vpc),
            "eni" => Some(Self::NetworkInterface),
            _ => None,
        }
    }

    /// Human-readable name used in configuration errors.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Subnet => "subnet",
            Self::SecurityGroup => "security group",
            Self::Vpc => "VPC",
            Self::NetworkInterface => "network interface",
        }
    }
}

/// How the task is placed on the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchType {
    #[default]
    Fargate,
    Ec2,
}

/// Whether the task's network interface receives a public IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignPublicIp {
    Enabled,
    Disabled,
}

/// Where a task runs: cluster, task definition and `awsvpc` network settings.
///
/// Placement is fixed per deployment variant and never derived from the
/// notification payload. Network settings have no defaults: subnets, security
/// groups and the public IP policy must all be configured explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Cluster name or ARN.
    pub cluster: String,

    /// Task definition family, `family:revision`, or full ARN.
    pub task_definition: String,

    /// Container inside the task definition that receives the overrides.
    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(default)]
    pub launch_type: LaunchType,

    /// Fargate platform version. Ignored for the EC2 launch type.
    #[serde(default = "default_platform_version")]
    pub platform_version: String,

    /// Subnet ids (`subnet-...`) for the task's network interface.
    pub subnets: Vec<String>,

    /// Security group ids (`sg-...`) attached to the task's network interface.
    pub security_groups: Vec<String>,

    pub assign_public_ip: AssignPublicIp,
}

fn default_container_name() -> String {
    DEFAULT_CONTAINER_NAME.to_owned()
}

fn default_platform_version() -> String {
    DEFAULT_PLATFORM_VERSION.to_owned()
}

impl PlacementConfig {
    /// Check that every setting is present and every network id is
    /// well-formed for the slot it is configured in.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_non_empty("cluster", &self.cluster)?;
        require_non_empty("task_definition", &self.task_definition)?;
        require_non_empty("container_name", &self.container_name)?;
        if self.launch_type == LaunchType::Fargate {
            require_non_empty("platform_version", &self.platform_version)?;
        }
        validate_ids("subnets", &self.subnets, NetworkResource::Subnet)?;
        validate_ids(
            "security_groups",
            &self.security_groups,
            NetworkResource::SecurityGroup,
        )?;
        Ok(())
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ConfigurationError> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::Empty { field });
    }
    Ok(())
}

fn validate_ids(
    field: &'static str,
    ids: &[String],
    expected: NetworkResource,
) -> Result<(), ConfigurationError> {
    if ids.is_empty() {
        return Err(ConfigurationError::Empty { field });
    }
    for id in ids {
        match NetworkResource::classify(id) {
            Some(found) if found == expected => {}
            Some(found) => {
                return Err(ConfigurationError::RoleMismatch {
                    field,
                    value: id.clone(),
                    expected: expected.describe(),
                    found: found.describe(),
                });
            }
            None => {
                return Err(ConfigurationError::Malformed {
                    field,
                    value: id.clone(),
                    expected: expected.describe(),
                });
            }
        }
    }
    Ok(())
}

/// A deployment variant: the payload schema it accepts and where its tasks run.
///
/// Unrecognised keys in a variant table are rejected, so a misspelled
/// optional setting fails instead of silently taking its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVariantConfig")]
pub struct VariantConfig {
    pub schema: PayloadSchema,

    #[serde(flatten)]
    pub placement: PlacementConfig,
}

/// Wire form of [`VariantConfig`]. `deny_unknown_fields` cannot be combined
/// with `flatten`, so leftover keys are collected and checked instead.
#[derive(Deserialize)]
struct RawVariantConfig {
    schema: PayloadSchema,

    #[serde(flatten)]
    placement: PlacementConfig,

    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

impl TryFrom<RawVariantConfig> for VariantConfig {
    type Error = ConfigurationError;

    fn try_from(raw: RawVariantConfig) -> Result<Self, Self::Error> {
        if !raw.unknown.is_empty() {
            return Err(ConfigurationError::UnknownSettings {
                keys: raw.unknown.into_keys().collect(),
            });
        }
        Ok(Self {
            schema: raw.schema,
            placement: raw.placement,
        })
    }
}

/// A variant that passed validation, ready to drive a dispatcher.
///
/// Only [`PlacementCatalog::resolve`] creates these, so holding one means the
/// placement has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    name: String,
    schema: PayloadSchema,
    placement: PlacementConfig,
}

impl ResolvedVariant {
    /// The catalog key this variant was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The payload schema notifications for this variant must satisfy.
    pub fn schema(&self) -> PayloadSchema {
        self.schema
    }

    /// The validated placement every task of this variant uses.
    pub fn placement(&self) -> &PlacementConfig {
        &self.placement
    }
}

/// Every deployment variant known to this deployment, keyed by name.
///
/// Resolution is an exact lookup: an unknown name is an error, never a
/// fallback to some other variant's cluster or network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementCatalog {
    variants: BTreeMap<String, VariantConfig>,
}

impl PlacementCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant, replacing any previous variant of the same name.
    #[must_use]
    pub fn with_variant(mut self, name: impl Into<String>, variant: VariantConfig) -> Self {
        self.variants.insert(name.into(), variant);
        self
    }

    /// Names of all configured variants, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Look up and validate the variant called `name`.
    pub fn resolve(&self, name: &str) -> Result<ResolvedVariant, ConfigurationError> {
        let variant = self
            .variants
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownVariant(name.to_owned()))?;
        variant.placement.validate()?;
        Ok(ResolvedVariant {
            name: name.to_owned(),
            schema: variant.schema,
            placement: variant.placement.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder_placement() -> PlacementConfig {
        PlacementConfig {
            cluster: "miro-talk-bot-cluster".into(),
            task_definition: "miro-talk-bot-video-recorder".into(),
            container_name: DEFAULT_CONTAINER_NAME.into(),
            launch_type: LaunchType::Fargate,
            platform_version: DEFAULT_PLATFORM_VERSION.into(),
            subnets: vec!["subnet-07e4ce464f47fef6d".into()],
            security_groups: vec!["sg-0ca926c2de128a40d".into()],
            assign_public_ip: AssignPublicIp::Enabled,
        }
    }

    fn catalog() -> PlacementCatalog {
        PlacementCatalog::new().with_variant(
            "recorder",
            VariantConfig {
                schema: PayloadSchema::Url,
                placement: recorder_placement(),
            },
        )
    }

    #[test]
    fn classify_resource_ids() {
        assert_eq!(
            NetworkResource::classify("subnet-07e4ce464f47fef6d"),
            Some(NetworkResource::Subnet)
        );
        assert_eq!(
            NetworkResource::classify("sg-0ca926c2de128a40d"),
            Some(NetworkResource::SecurityGroup)
        );
        assert_eq!(
            NetworkResource::classify("sg-12345678"),
            Some(NetworkResource::SecurityGroup)
        );
        assert_eq!(
            NetworkResource::classify("vpc-0a1b2c3d4e5f60718"),
            Some(NetworkResource::Vpc)
        );
        assert_eq!(NetworkResource::classify("sg-xyz"), None);
        assert_eq!(NetworkResource::classify("subnet-07E4CE464F47FEF6D"), None);
        assert_eq!(NetworkResource::classify(" subnet-07e4ce464f47fef6d"), None);
    }

    #[test]
    fn valid_placement_passes() {
        recorder_placement().validate().unwrap();
    }

    #[test]
    fn subnet_in_security_group_slot_is_rejected() {
        let mut placement = recorder_placement();
        placement.security_groups = vec!["subnet-07e4ce464f47fef6d".into()];
        let err = placement.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::RoleMismatch {
                field: "security_groups",
                value: "subnet-07e4ce464f47fef6d".into(),
                expected: "security group",
                found: "subnet",
            }
        );
    }

    #[test]
    fn security_group_in_subnet_slot_is_rejected() {
        let mut placement = recorder_placement();
        placement.subnets = vec![
            "subnet-07e4ce464f47fef6d".into(),
            "sg-0ca926c2de128a40d".into(),
        ];
        let err = placement.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::RoleMismatch { field: "subnets", found: "security group", .. }
        ));
    }

    #[test]
    fn malformed_id_is_rejected() {
        let mut placement = recorder_placement();
        placement.security_groups = vec!["default".into()];
        let err = placement.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::Malformed { field: "security_groups", .. }
        ));
    }

    #[test]
    fn empty_network_lists_are_rejected() {
        let mut placement = recorder_placement();
        placement.security_groups.clear();
        assert_eq!(
            placement.validate().unwrap_err(),
            ConfigurationError::Empty { field: "security_groups" }
        );

        let mut placement = recorder_placement();
        placement.subnets.clear();
        assert_eq!(
            placement.validate().unwrap_err(),
            ConfigurationError::Empty { field: "subnets" }
        );
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        let mut placement = recorder_placement();
        placement.cluster = "  ".into();
        assert_eq!(
            placement.validate().unwrap_err(),
            ConfigurationError::Empty { field: "cluster" }
        );
    }

    #[test]
    fn platform_version_not_required_for_ec2() {
        let mut placement = recorder_placement();
        placement.launch_type = LaunchType::Ec2;
        placement.platform_version = String::new();
        placement.validate().unwrap();
    }

    #[test]
    fn resolve_known_variant() {
        let resolved = catalog().resolve("recorder").unwrap();
        assert_eq!(resolved.name(), "recorder");
        assert_eq!(resolved.schema(), PayloadSchema::Url);
        assert_eq!(resolved.placement(), &recorder_placement());
    }

    #[test]
    fn resolve_is_idempotent() {
        let catalog = catalog();
        let first = catalog.resolve("recorder").unwrap();
        let second = catalog.resolve("recorder").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_variant_has_no_fallback() {
        let err = catalog().resolve("transcriber").unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownVariant("transcriber".into()));
    }

    #[test]
    fn resolve_validates_placement() {
        let mut placement = recorder_placement();
        placement.security_groups = vec!["subnet-07e4ce464f47fef6d".into()];
        let catalog = PlacementCatalog::new().with_variant(
            "broken",
            VariantConfig {
                schema: PayloadSchema::Url,
                placement,
            },
        );
        assert!(matches!(
            catalog.resolve("broken").unwrap_err(),
            ConfigurationError::RoleMismatch { .. }
        ));
    }

    #[test]
    fn variant_deserializes_with_defaults() {
        let json = serde_json::json!({
            "schema": "url_with_file_name",
            "cluster": "c",
            "task_definition": "td",
            "subnets": ["subnet-07e4ce464f47fef6d"],
            "security_groups": ["sg-0ca926c2de128a40d"],
            "assign_public_ip": "DISABLED"
        });
        let variant: VariantConfig = serde_json::from_value(json).unwrap();
        assert_eq!(variant.schema, PayloadSchema::UrlWithFileName);
        assert_eq!(variant.placement.container_name, "mirobot");
        assert_eq!(variant.placement.platform_version, "LATEST");
        assert_eq!(variant.placement.launch_type, LaunchType::Fargate);
        assert_eq!(variant.placement.assign_public_ip, AssignPublicIp::Disabled);
    }

    #[test]
    fn variant_requires_public_ip_policy() {
        let json = serde_json::json!({
            "schema": "url",
            "cluster": "c",
            "task_definition": "td",
            "subnets": ["subnet-07e4ce464f47fef6d"],
            "security_groups": ["sg-0ca926c2de128a40d"]
        });
        assert!(serde_json::from_value::<VariantConfig>(json).is_err());
    }

    #[test]
    fn misspelled_variant_keys_are_rejected() {
        let json = serde_json::json!({
            "schema": "url",
            "cluster": "c",
            "task_definition": "td",
            "container_nmae": "uploader",
            "lanch_type": "EC2",
            "subnets": ["subnet-07e4ce464f47fef6d"],
            "security_groups": ["sg-0ca926c2de128a40d"],
            "assign_public_ip": "ENABLED"
        });
        let err = serde_json::from_value::<VariantConfig>(json).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown setting(s): container_nmae, lanch_type"));
    }

    #[test]
    fn unknown_settings_error_lists_keys() {
        let err = VariantConfig::try_from(RawVariantConfig {
            schema: PayloadSchema::Url,
            placement: recorder_placement(),
            unknown: BTreeMap::from([("cluser".to_owned(), IgnoredAny)]),
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownSettings {
                keys: vec!["cluser".into()]
            }
        );
    }
}
