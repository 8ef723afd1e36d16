// ABOUTME: ContainerOps for EngineClient.
// ABOUTME: Lifecycle calls, prefix resolution and per-operation status handling.

use super::EngineClient;
use super::traits::{ContainerOps, RemoveContainerOptions};
use crate::error::{Error, ErrorContext, Operation, Result};
use crate::request;
use crate::types::ContainerId;
use crate::wire::{
    Change, ContainerConfig, ContainerCreateResponse, ContainerDetails, ContainerSummary,
    DecodeError, HostConfig, WaitResponse,
};
use async_trait::async_trait;
use hyper::StatusCode;
use std::time::Duration;

#[async_trait]
impl ContainerOps for EngineClient {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        self.read_json(request::list_containers(all)).await
    }

    async fn resolve_container(&self, prefix: &str) -> Result<ContainerId> {
        let operation = Operation::ResolveContainer;
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::validation(
                ErrorContext::new(operation),
                "identifier is required",
            ));
        }

        let listing = request::list_containers(true).on_behalf_of(operation, prefix);
        let containers: Vec<ContainerSummary> = self.read_json(listing).await?;
        let context = ErrorContext::with_target(operation, prefix);

        // Same precedence as the daemon: full id, then name, then prefix.
        if let Some(found) = containers.iter().find(|c| c.id == prefix) {
            return Ok(found.container_id());
        }
        if let Some(found) = containers.iter().find(|c| c.name() == Some(prefix)) {
            return Ok(found.container_id());
        }

        let wanted = ContainerId::new(prefix);
        let matches: Vec<&ContainerSummary> = containers
            .iter()
            .filter(|c| wanted.is_prefix_of(&c.id))
            .collect();

        match matches.as_slice() {
            [only] => Ok(only.container_id()),
            [] => Err(Error::NotFound {
                context,
                message: format!("no container matches {prefix}"),
            }),
            many => Err(Error::validation(
                context,
                format!("{prefix} is ambiguous: matches {} containers", many.len()),
            )),
        }
    }

    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerCreateResponse> {
        let request = request::create_container(config)?;
        let context = request.context();
        let response: ContainerCreateResponse = self.read_json(request).await?;

        if response.id.trim().is_empty() {
            return Err(Error::Decode {
                context,
                source: DecodeError {
                    field: "Id".to_string(),
                    expected: "non-empty string".to_string(),
                    message: "daemon returned an empty container id".to_string(),
                },
            });
        }

        for warning in &response.warnings {
            tracing::warn!(container = %response.id, "create: {}", warning);
        }

        Ok(response)
    }

    async fn start_container(
        &self,
        id: &ContainerId,
        host_config: Option<&HostConfig>,
    ) -> Result<()> {
        // 304 (already running) maps to Conflict.
        self.send_unit(request::start_container(id, host_config)?)
            .await
    }

    async fn stop_container(&self, id: &ContainerId, timeout: Option<Duration>) -> Result<()> {
        let request = request::stop_container(id, timeout.map(|t| t.as_secs()))?;
        let (_, response) = self
            .execute_allowing(request, &[StatusCode::NOT_MODIFIED])
            .await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            tracing::debug!(container = %id, "already stopped");
        }
        Ok(())
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.send_unit(request::restart_container(id, timeout.map(|t| t.as_secs()))?)
            .await
    }

    async fn kill_container(&self, id: &ContainerId, signal: Option<&str>) -> Result<()> {
        self.send_unit(request::kill_container(id, signal)?).await
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64> {
        let response: WaitResponse = self.read_json(request::wait_container(id)?).await?;

        if let Some(error) = response.error.as_ref().filter(|e| !e.message.is_empty()) {
            tracing::warn!(container = %id, "wait: {}", error.message);
        }
        Ok(response.status_code)
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerDetails> {
        self.read_json(request::inspect_container(id)?).await
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        opts: &RemoveContainerOptions,
    ) -> Result<()> {
        self.send_unit(request::remove_container(id, opts)?).await
    }

    async fn container_changes(&self, id: &ContainerId) -> Result<Vec<Change>> {
        // Daemons answer `null` when nothing changed.
        let changes: Option<Vec<Change>> =
            self.read_json(request::container_changes(id)?).await?;
        Ok(changes.unwrap_or_default())
    }
}
