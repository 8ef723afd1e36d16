// ABOUTME: Container records exchanged with the daemon.
// ABOUTME: Create config, host config, summaries, inspect details, state and change lists.

use super::{nullable, timestamp};
use crate::types::ContainerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `{}` value used as a set member in port and volume maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

/// Launch parameters submitted to create.
///
/// `image` is always sent; empty collections and zero limits are left out so
/// the daemon applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerConfig {
    /// Container name, sent as a query parameter rather than in the body.
    #[serde(skip)]
    pub name: Option<String>,

    pub image: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domainname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,

    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub working_dir: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub memory: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub memory_swap: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub cpu_shares: i64,

    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub tty: bool,
    pub open_stdin: bool,
    pub stdin_once: bool,

    /// `"port/proto"` keys, e.g. `"6900/tcp"`.
    #[serde(
        deserialize_with = "nullable",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub exposed_ports: BTreeMap<String, EmptyObject>,
    #[serde(
        deserialize_with = "nullable",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub volumes: BTreeMap<String, EmptyObject>,
    #[serde(
        deserialize_with = "nullable",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub network_disabled: bool,
    /// Sent as the create request's `HostConfig`.
    #[serde(skip)]
    pub host_config: Option<HostConfig>,
    /// Merged into `host_config` at create.
    #[serde(skip)]
    pub privileged: bool,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl ContainerConfig {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            attach_stdout: true,
            attach_stderr: true,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = cmd.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{key}={value}"));
        self
    }

    /// Declare `port/protocol` as exposed.
    pub fn expose(mut self, port: u16, protocol: &str) -> Self {
        self.exposed_ports
            .insert(format!("{port}/{protocol}"), EmptyObject {});
        self
    }

    /// Expose `port/protocol` and bind it to `host_port` on the host.
    pub fn publish(mut self, port: u16, protocol: &str, host_port: u16) -> Self {
        let host_config = self.host_config.take().unwrap_or_default();
        self.host_config = Some(host_config.bind_port(port, protocol, host_port));
        self.expose(port, protocol)
    }

    /// Mount `host_path` at `container_path`.
    pub fn bind_mount(mut self, host_path: &str, container_path: &str) -> Self {
        self.host_config
            .get_or_insert_with(HostConfig::default)
            .binds
            .push(format!("{host_path}:{container_path}"));
        self
    }

    pub fn with_host_config(mut self, host_config: HostConfig) -> Self {
        self.host_config = Some(host_config);
        self
    }
}

/// Binding of a container port to a host address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PortBinding {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host_ip: String,
    pub host_port: String,
}

impl PortBinding {
    pub fn host_port(port: u16) -> Self {
        Self {
            host_ip: String::new(),
            host_port: port.to_string(),
        }
    }
}

/// Host-side settings, passed at create or start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HostConfig {
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub binds: Vec<String>,
    #[serde(
        deserialize_with = "nullable",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub volumes_from: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network_mode: String,
    pub publish_all_ports: bool,
    pub privileged: bool,
}

impl HostConfig {
    /// Publish container `port/protocol` on `host_port`.
    pub fn bind_port(mut self, port: u16, protocol: &str, host_port: u16) -> Self {
        self.port_bindings
            .entry(format!("{port}/{protocol}"))
            .or_default()
            .push(PortBinding::host_port(host_port));
        self
    }
}

/// Result of create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerCreateResponse {
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub warnings: Vec<String>,
}

impl ContainerCreateResponse {
    pub fn container_id(&self) -> ContainerId {
        ContainerId::new(self.id.clone())
    }
}

/// A published or exposed port in a container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Port {
    #[serde(rename = "IP")]
    pub ip: String,
    pub private_port: u16,
    pub public_port: u16,
    #[serde(rename = "Type")]
    pub protocol: String,
}

/// One row of the container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSummary {
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub names: Vec<String>,
    pub image: String,
    #[serde(rename = "ImageID")]
    pub image_id: String,
    pub command: String,
    pub created: i64,
    pub state: String,
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub ports: Vec<Port>,
    #[serde(deserialize_with = "nullable")]
    pub labels: BTreeMap<String, String>,
    pub size_rw: i64,
    pub size_root_fs: i64,
}

impl ContainerSummary {
    pub fn container_id(&self) -> ContainerId {
        ContainerId::new(self.id.clone())
    }

    /// First name without the leading slash.
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(|n| n.trim_start_matches('/'))
    }
}

/// Lifecycle state as reported by inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Running => "running",
            LifecycleState::Paused => "paused",
            LifecycleState::Restarting => "restarting",
            LifecycleState::Removing => "removing",
            LifecycleState::Exited => "exited",
            LifecycleState::Dead => "dead",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerState {
    pub status: String,
    pub running: bool,
    pub paused: bool,
    pub restarting: bool,
    #[serde(rename = "OOMKilled")]
    pub oom_killed: bool,
    pub dead: bool,
    pub pid: i64,
    pub exit_code: i64,
    pub error: String,
    #[serde(deserialize_with = "timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ContainerState {
    /// Current lifecycle state.
    ///
    /// Daemons that omit `Status` are classified from the boolean flags.
    pub fn lifecycle(&self) -> LifecycleState {
        match self.status.as_str() {
            "created" => LifecycleState::Created,
            "running" => LifecycleState::Running,
            "paused" => LifecycleState::Paused,
            "restarting" => LifecycleState::Restarting,
            "removing" => LifecycleState::Removing,
            "exited" => LifecycleState::Exited,
            "dead" => LifecycleState::Dead,
            _ => {
                if self.dead {
                    LifecycleState::Dead
                } else if self.restarting {
                    LifecycleState::Restarting
                } else if self.paused {
                    LifecycleState::Paused
                } else if self.running {
                    LifecycleState::Running
                } else if self.started_at.is_none() {
                    LifecycleState::Created
                } else {
                    LifecycleState::Exited
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkSettings {
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "IPPrefixLen")]
    pub ip_prefix_len: u32,
    pub gateway: String,
    pub bridge: String,
    /// Keyed by `"port/proto"`; unpublished ports map to `None`.
    #[serde(deserialize_with = "nullable")]
    pub ports: BTreeMap<String, Option<Vec<PortBinding>>>,
}

impl NetworkSettings {
    /// Host bindings of `"port/proto"`, empty when not published.
    pub fn bindings(&self, port: &str) -> &[PortBinding] {
        self.ports
            .get(port)
            .and_then(|b| b.as_deref())
            .unwrap_or_default()
    }
}

/// Full inspect record of one container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerDetails {
    pub id: String,
    #[serde(deserialize_with = "timestamp")]
    pub created: Option<DateTime<Utc>>,
    pub path: String,
    #[serde(deserialize_with = "nullable")]
    pub args: Vec<String>,
    pub config: ContainerConfig,
    pub state: ContainerState,
    /// Id of the image the container runs.
    pub image: String,
    pub network_settings: NetworkSettings,
    pub name: String,
    pub driver: String,
    pub host_config: HostConfig,
    pub restart_count: i64,
}

impl ContainerDetails {
    pub fn container_id(&self) -> ContainerId {
        ContainerId::new(self.id.clone())
    }
}

/// Kind of a filesystem change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChangeKind {
    #[default]
    Modified,
    Added,
    Deleted,
}

impl TryFrom<u8> for ChangeKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChangeKind::Modified),
            1 => Ok(ChangeKind::Added),
            2 => Ok(ChangeKind::Deleted),
            other => Err(format!("unknown change kind {other}")),
        }
    }
}

impl From<ChangeKind> for u8 {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Modified => 0,
            ChangeKind::Added => 1,
            ChangeKind::Deleted => 2,
        }
    }
}

/// One entry of a container filesystem diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WaitError {
    pub message: String,
}

/// Result of wait.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WaitResponse {
    pub status_code: i64,
    pub error: Option<WaitError>,
}
