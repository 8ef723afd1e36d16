// ABOUTME: Engine error taxonomy surfaced to library callers.
// ABOUTME: Maps daemon status codes and transport failures to typed, context-carrying errors.

use crate::transport::TransportError;
use crate::wire::{DecodeError, ProgressRecord};
use hyper::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Every operation the client can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    Version,
    Info,
    ListContainers,
    ResolveContainer,
    CreateContainer,
    StartContainer,
    StopContainer,
    KillContainer,
    RestartContainer,
    WaitContainer,
    InspectContainer,
    RemoveContainer,
    ContainerLogs,
    AttachContainer,
    ContainerChanges,
    ListImages,
    InspectImage,
    RemoveImage,
    TagImage,
    PullImage,
    BuildImage,
    CommitContainer,
    SearchImages,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Ping => "ping",
            Operation::Version => "version",
            Operation::Info => "info",
            Operation::ListContainers => "list_containers",
            Operation::ResolveContainer => "resolve_container",
            Operation::CreateContainer => "create_container",
            Operation::StartContainer => "start_container",
            Operation::StopContainer => "stop_container",
            Operation::KillContainer => "kill_container",
            Operation::RestartContainer => "restart_container",
            Operation::WaitContainer => "wait_container",
            Operation::InspectContainer => "inspect_container",
            Operation::RemoveContainer => "remove_container",
            Operation::ContainerLogs => "container_logs",
            Operation::AttachContainer => "attach_container",
            Operation::ContainerChanges => "container_changes",
            Operation::ListImages => "list_images",
            Operation::InspectImage => "inspect_image",
            Operation::RemoveImage => "remove_image",
            Operation::TagImage => "tag_image",
            Operation::PullImage => "pull_image",
            Operation::BuildImage => "build_image",
            Operation::CommitContainer => "commit_container",
            Operation::SearchImages => "search_images",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attempted operation and the object it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub operation: Operation,
    pub target: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            target: None,
        }
    }

    pub fn with_target(operation: Operation, target: impl Into<String>) -> Self {
        Self {
            operation,
            target: Some(target.into()),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{} {}", self.operation, target),
            None => write!(f, "{}", self.operation),
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{context}: not found: {message}")]
    NotFound {
        context: ErrorContext,
        message: String,
    },

    #[error("{context}: conflict: {message}")]
    Conflict {
        context: ErrorContext,
        message: String,
    },

    #[error("{context}: invalid request: {message}")]
    Validation {
        context: ErrorContext,
        message: String,
    },

    #[error("{context}: daemon error ({status}): {message}")]
    Server {
        context: ErrorContext,
        status: u16,
        message: String,
    },

    #[error("{context}: malformed stream: {message}")]
    Stream {
        context: ErrorContext,
        message: String,
    },

    #[error("{context}: {source}")]
    Decode {
        context: ErrorContext,
        #[source]
        source: DecodeError,
    },

    #[error("{context}: {source}")]
    Transport {
        context: ErrorContext,
        #[source]
        source: TransportError,
    },

    #[error("{context}: build failed: {message}")]
    Build {
        context: ErrorContext,
        message: String,
    },

    /// A collected progress stream that reported errors. `records` holds
    /// every record decoded before and between them; the last entry in
    /// `errors` is the one that ended the stream, if any did.
    #[error("{}", incomplete_summary(.records, .errors))]
    Incomplete {
        context: ErrorContext,
        records: Vec<ProgressRecord>,
        errors: Vec<Error>,
    },
}

fn incomplete_summary(records: &[ProgressRecord], errors: &[Error]) -> String {
    let last = errors
        .last()
        .map_or_else(|| "stream error".to_string(), ToString::to_string);
    format!(
        "{last} ({} records received, {} stream errors)",
        records.len(),
        errors.len()
    )
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Server,
    Stream,
    Decode,
    Transport,
    Build,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Server { .. } => ErrorKind::Server,
            Error::Stream { .. } => ErrorKind::Stream,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Build { .. } => ErrorKind::Build,
            Error::Incomplete { errors, .. } => {
                errors.last().map_or(ErrorKind::Stream, Error::kind)
            }
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Error::NotFound { context, .. }
            | Error::Conflict { context, .. }
            | Error::Validation { context, .. }
            | Error::Server { context, .. }
            | Error::Stream { context, .. }
            | Error::Decode { context, .. }
            | Error::Transport { context, .. }
            | Error::Build { context, .. }
            | Error::Incomplete { context, .. } => context,
        }
    }

    pub fn operation(&self) -> Operation {
        self.context().operation
    }

    pub fn target(&self) -> Option<&str> {
        self.context().target.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Progress records received before a collected stream failed.
    pub fn partial_records(&self) -> &[ProgressRecord] {
        match self {
            Error::Incomplete { records, .. } => records,
            _ => &[],
        }
    }

    pub(crate) fn validation(context: ErrorContext, message: impl Into<String>) -> Self {
        Error::Validation {
            context,
            message: message.into(),
        }
    }

    pub(crate) fn stream(context: ErrorContext, message: impl Into<String>) -> Self {
        Error::Stream {
            context,
            message: message.into(),
        }
    }
}

/// Body the daemon sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct DaemonMessage {
    message: String,
}

/// Extract the daemon's message from an error body, falling back to raw text.
pub(crate) fn daemon_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<DaemonMessage>(body) {
        return parsed.message;
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no message")
            .to_string()
    } else {
        text
    }
}

/// Map a non-2xx daemon response onto the taxonomy.
pub(crate) fn from_status(context: ErrorContext, status: StatusCode, body: &[u8]) -> Error {
    let message = daemon_message(status, body);

    match status {
        StatusCode::BAD_REQUEST => Error::Validation { context, message },
        StatusCode::NOT_FOUND => Error::NotFound { context, message },
        // 304 means the requested state already holds (e.g. start on a running container).
        StatusCode::CONFLICT | StatusCode::NOT_MODIFIED => Error::Conflict { context, message },
        _ => Error::Server {
            context,
            status: status.as_u16(),
            message,
        },
    }
}
