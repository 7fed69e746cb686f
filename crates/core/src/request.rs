use crate::payload::DispatchPayload;
use crate::placement::{AssignPublicIp, LaunchType, PlacementConfig};

/// Environment variable receiving the payload `url`.
pub const ENV_URL: &str = "URL";

/// Environment variable receiving the payload `fileName`.
pub const ENV_FILENAME: &str = "FILENAME";

/// One environment variable set on the target container.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for EnvVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvVar")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Environment overrides for the single container of the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOverride {
    pub name: String,
    pub environment: Vec<EnvVar>,
}

/// `awsvpc` network settings of the launched task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPlacement {
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: AssignPublicIp,
}

/// Fully assembled command to start exactly one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub cluster: String,
    pub task_definition: String,
    pub launch_type: LaunchType,
    /// Only set for Fargate launches.
    pub platform_version: Option<String>,
    pub count: i32,
    pub network: NetworkPlacement,
    pub container_override: ContainerOverride,
}

impl LaunchRequest {
    /// Bind a validated payload to the placement of the active variant.
    ///
    /// `url` always becomes `URL`; `fileName` becomes `FILENAME` only when the
    /// payload carries one. The override always targets the placement's
    /// container.
    pub fn build(payload: &DispatchPayload, placement: &PlacementConfig) -> Self {
        let mut environment = vec![EnvVar {
            name: ENV_URL.to_owned(),
            value: payload.url().to_owned(),
        }];
        if let Some(file_name) = payload.file_name() {
            environment.push(EnvVar {
                name: ENV_FILENAME.to_owned(),
                value: file_name.to_owned(),
            });
        }

        let platform_version = match placement.launch_type {
            LaunchType::Fargate => Some(placement.platform_version.clone()),
            LaunchType::Ec2 => None,
        };

        Self {
            cluster: placement.cluster.clone(),
            task_definition: placement.task_definition.clone(),
            launch_type: placement.launch_type,
            platform_version,
            count: 1,
            network: NetworkPlacement {
                subnets: placement.subnets.clone(),
                security_groups: placement.security_groups.clone(),
                assign_public_ip: placement.assign_public_ip,
            },
            container_override: ContainerOverride {
                name: placement.container_name.clone(),
                environment,
            },
        }
    }

    /// Look up an environment override by name.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.container_override
            .environment
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }
}
