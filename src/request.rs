// ABOUTME: Request builder: method, path, query and body for each engine operation.
// ABOUTME: Validates mandatory inputs before anything reaches the transport.

use crate::context::BuildContext;
use crate::engine::{
    AttachOptions, BuildOptions, LogOptions, RemoveContainerOptions, RemoveImageOptions,
};
use crate::error::{Error, ErrorContext, Operation, Result};
use crate::transport::{OutgoingBody, empty_body, full_body};
use crate::types::{ContainerId, ImageRef};
use crate::wire::{self, CommitConfig, ContainerConfig, EmptyObject, HostConfig};
use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request};
use serde::Serialize;
use std::collections::BTreeMap;

/// Grace period forwarded to stop and restart when the caller gives none.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

const JSON: &str = "application/json";
const TAR: &str = "application/x-tar";

/// Query parameters, rendered in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<&'static str, String>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.0.insert(key, value.to_string());
        self
    }

    /// Booleans go over the wire as `1`/`0`.
    pub fn flag(&mut self, key: &'static str, value: bool) -> &mut Self {
        self.set(key, if value { "1" } else { "0" })
    }

    pub fn set_opt(&mut self, key: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Body of an engine request.
#[derive(Debug)]
pub enum RequestBody {
    Empty,
    Json(Bytes),
    Archive(BuildContext),
}

/// A fully composed engine request, not yet bound to a connection.
#[derive(Debug)]
pub struct ApiRequest {
    pub operation: Operation,
    pub target: Option<String>,
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(operation: Operation, method: Method, path: impl Into<String>) -> Self {
        Self {
            operation,
            target: None,
            method,
            path: path.into(),
            query: Query::new(),
            body: RequestBody::Empty,
        }
    }

    fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn json<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let bytes = wire::encode(value).map_err(|e| {
            Error::validation(self.context(), format!("cannot encode request body: {e}"))
        })?;
        self.body = RequestBody::Json(bytes);
        Ok(self)
    }

    /// Report this request under another operation, e.g. a listing done
    /// on behalf of prefix resolution.
    pub fn on_behalf_of(mut self, operation: Operation, target: impl Into<String>) -> Self {
        self.operation = operation;
        self.target = Some(target.into());
        self
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext {
            operation: self.operation,
            target: self.target.clone(),
        }
    }

    /// Request target, optionally pinned to an API version (`/v1.43/...`).
    pub fn path_and_query(&self, api_version: Option<&str>) -> String {
        let mut uri = match api_version {
            Some(version) => format!("/v{version}{}", self.path),
            None => self.path.clone(),
        };
        if !self.query.is_empty() {
            uri.push('?');
            uri.push_str(&self.query.render());
        }
        uri
    }

    pub fn into_http(self, api_version: Option<&str>) -> Result<Request<OutgoingBody>> {
        let context = self.context();
        let uri = self.path_and_query(api_version);

        let (content_type, body): (Option<&str>, OutgoingBody) = match self.body {
            RequestBody::Empty => (None, empty_body()),
            RequestBody::Json(bytes) => (Some(JSON), full_body(bytes)),
            RequestBody::Archive(archive) => (Some(TAR), archive.into_body()),
        };

        let mut builder = Request::builder().method(self.method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        builder
            .body(body)
            .map_err(|e| Error::validation(context, format!("cannot build request: {e}")))
    }
}

/// Ids are opaque but never empty and never contain separators.
fn validate_id(operation: Operation, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::validation(
            ErrorContext::new(operation),
            "identifier is required",
        ));
    }
    if id.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(Error::validation(
            ErrorContext::with_target(operation, id),
            "identifier contains whitespace or '/'",
        ));
    }
    Ok(())
}

/// Image names may contain `/`, so each segment is encoded on its own.
fn image_path(operation: Operation, name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::validation(
            ErrorContext::new(operation),
            "image name is required",
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::validation(
            ErrorContext::with_target(operation, name),
            "image name contains whitespace",
        ));
    }

    Ok(name
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/"))
}

fn container_request(
    operation: Operation,
    method: Method,
    id: &ContainerId,
    suffix: &str,
) -> Result<ApiRequest> {
    validate_id(operation, id.as_str())?;
    let path = format!("/containers/{}{suffix}", id.as_str());
    Ok(ApiRequest::new(operation, method, path).target(id.as_str()))
}

pub fn ping() -> ApiRequest {
    ApiRequest::new(Operation::Ping, Method::GET, "/_ping")
}

pub fn version() -> ApiRequest {
    ApiRequest::new(Operation::Version, Method::GET, "/version")
}

pub fn info() -> ApiRequest {
    ApiRequest::new(Operation::Info, Method::GET, "/info")
}

pub fn list_containers(all: bool) -> ApiRequest {
    let mut req = ApiRequest::new(Operation::ListContainers, Method::GET, "/containers/json");
    req.query.flag("all", all);
    req
}

/// Create body: the config plus the host settings that moved out of it.
#[derive(Serialize)]
struct CreateBody<'a> {
    #[serde(flatten)]
    config: &'a ContainerConfig,
    #[serde(rename = "HostConfig", skip_serializing_if = "Option::is_none")]
    host_config: Option<HostConfig>,
}

pub fn create_container(config: &ContainerConfig) -> Result<ApiRequest> {
    let operation = Operation::CreateContainer;

    if config.image.trim().is_empty() {
        return Err(Error::validation(
            ErrorContext::new(operation),
            "image reference is required",
        ));
    }

    let mut req = ApiRequest::new(operation, Method::POST, "/containers/create")
        .target(config.image.as_str());

    if let Some(name) = &config.name {
        if !is_valid_container_name(name) {
            return Err(Error::validation(
                ErrorContext::with_target(operation, name.as_str()),
                "container names must match [a-zA-Z0-9][a-zA-Z0-9_.-]*",
            ));
        }
        req.query.set("name", name);
    }

    let mut host_config = config.host_config.clone();
    if config.privileged {
        host_config
            .get_or_insert_with(HostConfig::default)
            .privileged = true;
    }

    req.json(&CreateBody {
        config,
        host_config,
    })
}

fn is_valid_container_name(name: &str) -> bool {
    let name = name.strip_prefix('/').unwrap_or(name);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        _ => false,
    }
}

pub fn start_container(id: &ContainerId, host_config: Option<&HostConfig>) -> Result<ApiRequest> {
    let req = container_request(Operation::StartContainer, Method::POST, id, "/start")?;
    match host_config {
        Some(host_config) => req.json(host_config),
        None => Ok(req),
    }
}

pub fn stop_container(id: &ContainerId, timeout_secs: Option<u64>) -> Result<ApiRequest> {
    let mut req = container_request(Operation::StopContainer, Method::POST, id, "/stop")?;
    req.query
        .set("t", timeout_secs.unwrap_or(DEFAULT_STOP_TIMEOUT_SECS));
    Ok(req)
}

pub fn restart_container(id: &ContainerId, timeout_secs: Option<u64>) -> Result<ApiRequest> {
    let mut req = container_request(Operation::RestartContainer, Method::POST, id, "/restart")?;
    req.query
        .set("t", timeout_secs.unwrap_or(DEFAULT_STOP_TIMEOUT_SECS));
    Ok(req)
}

pub fn kill_container(id: &ContainerId, signal: Option<&str>) -> Result<ApiRequest> {
    let mut req = container_request(Operation::KillContainer, Method::POST, id, "/kill")?;
    if let Some(signal) = signal {
        if signal.trim().is_empty() {
            return Err(Error::validation(req.context(), "signal cannot be empty"));
        }
        req.query.set("signal", signal.trim());
    }
    Ok(req)
}

pub fn wait_container(id: &ContainerId) -> Result<ApiRequest> {
    container_request(Operation::WaitContainer, Method::POST, id, "/wait")
}

pub fn inspect_container(id: &ContainerId) -> Result<ApiRequest> {
    container_request(Operation::InspectContainer, Method::GET, id, "/json")
}

pub fn remove_container(id: &ContainerId, opts: &RemoveContainerOptions) -> Result<ApiRequest> {
    let mut req = container_request(Operation::RemoveContainer, Method::DELETE, id, "")?;
    req.query
        .flag("force", opts.force)
        .flag("v", opts.remove_volumes);
    Ok(req)
}

pub fn container_logs(id: &ContainerId, opts: &LogOptions) -> Result<ApiRequest> {
    let mut req = container_request(Operation::ContainerLogs, Method::GET, id, "/logs")?;
    if !opts.stdout && !opts.stderr {
        return Err(Error::validation(
            req.context(),
            "at least one of stdout or stderr must be selected",
        ));
    }
    req.query
        .flag("follow", opts.follow)
        .flag("stdout", opts.stdout)
        .flag("stderr", opts.stderr)
        .flag("timestamps", opts.timestamps)
        .set(
            "tail",
            opts.tail.map_or_else(|| "all".to_string(), |n| n.to_string()),
        );
    Ok(req)
}

pub fn attach_container(id: &ContainerId, opts: &AttachOptions) -> Result<ApiRequest> {
    let mut req = container_request(Operation::AttachContainer, Method::POST, id, "/attach")?;
    if !opts.stdout && !opts.stderr {
        return Err(Error::validation(
            req.context(),
            "at least one of stdout or stderr must be selected",
        ));
    }
    req.query
        .flag("stream", opts.stream)
        .flag("logs", opts.logs)
        .flag("stdout", opts.stdout)
        .flag("stderr", opts.stderr);
    Ok(req)
}

pub fn container_changes(id: &ContainerId) -> Result<ApiRequest> {
    container_request(Operation::ContainerChanges, Method::GET, id, "/changes")
}

pub fn list_images(all: bool) -> ApiRequest {
    let mut req = ApiRequest::new(Operation::ListImages, Method::GET, "/images/json");
    req.query.flag("all", all);
    req
}

pub fn inspect_image(name: &str) -> Result<ApiRequest> {
    let path = image_path(Operation::InspectImage, name)?;
    Ok(
        ApiRequest::new(Operation::InspectImage, Method::GET, format!("/images/{path}/json"))
            .target(name),
    )
}

pub fn remove_image(name: &str, opts: &RemoveImageOptions) -> Result<ApiRequest> {
    let path = image_path(Operation::RemoveImage, name)?;
    let mut req =
        ApiRequest::new(Operation::RemoveImage, Method::DELETE, format!("/images/{path}"))
            .target(name);
    req.query
        .flag("force", opts.force)
        .flag("noprune", opts.no_prune);
    Ok(req)
}

pub fn tag_image(name: &str, target: &ImageRef, force: bool) -> Result<ApiRequest> {
    let path = image_path(Operation::TagImage, name)?;
    let mut req =
        ApiRequest::new(Operation::TagImage, Method::POST, format!("/images/{path}/tag"))
            .target(name);

    let Some(tag) = target.effective_tag() else {
        return Err(Error::validation(
            req.context(),
            format!("cannot tag as digest reference {target}"),
        ));
    };

    req.query
        .set("repo", target.repository())
        .set("tag", tag)
        .flag("force", force);
    Ok(req)
}

pub fn pull_image(reference: &ImageRef) -> ApiRequest {
    let mut req = ApiRequest::new(Operation::PullImage, Method::POST, "/images/create")
        .target(reference.to_string());

    // A digest travels in the tag parameter.
    let tag = reference
        .digest()
        .or_else(|| reference.effective_tag())
        .unwrap_or(crate::types::DEFAULT_TAG);

    req.query
        .set("fromImage", reference.repository())
        .set("tag", tag);
    req
}

pub fn build_image(context: BuildContext, opts: &BuildOptions) -> Result<ApiRequest> {
    let mut req = ApiRequest::new(Operation::BuildImage, Method::POST, "/build");
    if let Some(tag) = &opts.tag {
        let parsed = ImageRef::parse(tag).map_err(|e| {
            let context = ErrorContext::with_target(Operation::BuildImage, tag.as_str());
            Error::validation(context, e.to_string())
        })?;
        req = req.target(parsed.to_string());
        req.query.set("t", parsed);
    }
    req.query
        .flag("q", opts.quiet)
        .flag("nocache", opts.no_cache)
        .flag("rm", opts.remove_intermediate);
    req.body = RequestBody::Archive(context);
    Ok(req)
}

pub fn commit_container(config: &CommitConfig) -> Result<ApiRequest> {
    let operation = Operation::CommitContainer;
    validate_id(operation, config.container.as_str())?;

    let mut req =
        ApiRequest::new(operation, Method::POST, "/commit").target(config.container.as_str());
    req.query
        .set("container", config.container.as_str())
        .set_opt("repo", config.repo.as_deref())
        .set_opt("tag", config.tag.as_deref())
        .set_opt("comment", config.message.as_deref())
        .set_opt("author", config.author.as_deref())
        .flag("pause", config.pause);

    if config.tag.is_some() && config.repo.is_none() {
        return Err(Error::validation(req.context(), "a tag requires a repository"));
    }

    match &config.run {
        Some(run) => req.json(run),
        None => req.json(&EmptyObject {}),
    }
}

pub fn search_images(term: &str) -> Result<ApiRequest> {
    let operation = Operation::SearchImages;
    if term.trim().is_empty() {
        return Err(Error::validation(
            ErrorContext::new(operation),
            "search term is required",
        ));
    }
    let mut req = ApiRequest::new(operation, Method::GET, "/images/search").target(term);
    req.query.set("term", term.trim());
    Ok(req)
}
