// ABOUTME: Log operations trait for the engine client.
// ABOUTME: Stream container logs and attach output as demultiplexed chunks.

use super::sealed::Sealed;
use crate::error::Result;
use crate::stream::LogStream;
use crate::types::ContainerId;
use async_trait::async_trait;

/// Log streaming operations.
#[async_trait]
pub trait LogOps: Sealed + Send + Sync {
    /// Stream logs from a container.
    async fn container_logs(&self, id: &ContainerId, opts: &LogOptions) -> Result<LogStream>;

    /// Attach to a container's output streams.
    async fn attach_container(&self, id: &ContainerId, opts: &AttachOptions)
    -> Result<LogStream>;
}

/// Options for log streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Include stdout.
    pub stdout: bool,
    /// Include stderr.
    pub stderr: bool,
    /// Follow log output (like `tail -f`).
    pub follow: bool,
    /// Prefix each line with its timestamp.
    pub timestamps: bool,
    /// Number of lines to show from the end (`None` = all).
    pub tail: Option<u64>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: false,
            tail: None,
        }
    }
}

impl LogOptions {
    /// Create options for following all logs.
    pub fn follow_all() -> Self {
        Self {
            follow: true,
            ..Self::default()
        }
    }

    /// Create options for tailing the last N lines.
    pub fn tail(n: u64) -> Self {
        Self {
            tail: Some(n),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachOptions {
    /// Keep streaming output until the container exits.
    pub stream: bool,
    /// Replay output produced before attaching.
    pub logs: bool,
    pub stdout: bool,
    pub stderr: bool,
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self {
            stream: true,
            logs: false,
            stdout: true,
            stderr: true,
        }
    }
}
