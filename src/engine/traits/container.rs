// ABOUTME: Container operations trait for the engine client.
// ABOUTME: Create, start, stop, kill, restart, wait, inspect, diff and remove containers.

use super::sealed::Sealed;
use crate::error::Result;
use crate::types::ContainerId;
use crate::wire::{
    Change, ContainerConfig, ContainerCreateResponse, ContainerDetails, ContainerSummary,
    HostConfig,
};
use async_trait::async_trait;
use std::time::Duration;

/// Container lifecycle operations.
///
/// Every by-id operation accepts a full id or an unambiguous prefix. The
/// client never caches container state; each call asks the daemon.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// List containers. Stopped ones are included only when `all` is set.
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    /// Resolve a full id, name or unique id prefix to the full container id.
    async fn resolve_container(&self, prefix: &str) -> Result<ContainerId>;

    /// Create a container from the given configuration.
    async fn create_container(&self, config: &ContainerConfig)
    -> Result<ContainerCreateResponse>;

    /// Start a created or stopped container.
    ///
    /// Starting a running container is a conflict.
    async fn start_container(
        &self,
        id: &ContainerId,
        host_config: Option<&HostConfig>,
    ) -> Result<()>;

    /// Stop a running container, killing it after the grace period
    /// (whole seconds, 10 when `None`). Stopping a stopped container succeeds.
    async fn stop_container(&self, id: &ContainerId, timeout: Option<Duration>) -> Result<()>;

    /// Restart a container with the same grace period rules as stop.
    async fn restart_container(&self, id: &ContainerId, timeout: Option<Duration>)
    -> Result<()>;

    /// Send a signal (default `SIGKILL`) to a running container.
    async fn kill_container(&self, id: &ContainerId, signal: Option<&str>) -> Result<()>;

    /// Block until the container exits and return its exit code.
    ///
    /// There is no client-side timeout; drop the future to give up.
    async fn wait_container(&self, id: &ContainerId) -> Result<i64>;

    /// Get the current daemon-reported details of a container.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerDetails>;

    /// Remove a container. Running containers are refused unless forced.
    async fn remove_container(
        &self,
        id: &ContainerId,
        opts: &RemoveContainerOptions,
    ) -> Result<()>;

    /// Remove several containers, attempting every one.
    ///
    /// Results are returned in the order of `ids`; one failure never stops
    /// the remaining attempts.
    async fn remove_containers(
        &self,
        ids: &[ContainerId],
        opts: &RemoveContainerOptions,
    ) -> Vec<Result<()>> {
        let attempts = ids.iter().map(|id| self.remove_container(id, opts));
        futures::future::join_all(attempts).await
    }

    /// Filesystem changes relative to the container's image.
    async fn container_changes(&self, id: &ContainerId) -> Result<Vec<Change>>;
}

/// Options for removing a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveContainerOptions {
    /// Kill and remove a running container.
    pub force: bool,
    /// Also remove anonymous volumes.
    pub remove_volumes: bool,
}

impl RemoveContainerOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            remove_volumes: false,
        }
    }
}
