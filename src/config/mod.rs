// ABOUTME: Client connection configuration for dockwire.
// ABOUTME: Layers defaults, an optional dockwire.yml and DOCKER_* environment variables.

mod endpoint;

pub use endpoint::{DEFAULT_SOCKET, DEFAULT_TCP_PORT, Endpoint, EndpointError};

use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "dockwire.yml";
pub const CONFIG_FILENAME_ALT: &str = "dockwire.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dockwire/config.yml";

/// Environment variable naming the daemon endpoint.
pub const HOST_ENV: &str = "DOCKER_HOST";
/// Environment variable pinning the API version.
pub const API_VERSION_ENV: &str = "DOCKER_API_VERSION";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors loading client configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid configuration: {source}"))]
    Parse { source: serde_yaml::Error },

    #[snafu(display("invalid configuration in {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("invalid DOCKER_HOST: {source}"))]
    HostEnv { source: EndpointError },

    #[snafu(display("invalid API version {version:?} (expected e.g. 1.43)"))]
    ApiVersion { version: String },
}

/// How to reach one daemon. Holds no connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Daemon endpoint.
    pub host: Endpoint,
    /// API version to pin in request paths (`/v1.43/...`); unversioned if unset.
    pub api_version: Option<String>,
    /// Upper bound on establishing a connection. Reads are never timed out.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: Endpoint::default(),
            api_version: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    host: Option<Endpoint>,
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default, with = "humantime_serde")]
    connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = serde_yaml::from_str(yaml).context(ParseSnafu)?;
        Self::default().merge_file(file)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        let file: FileConfig = serde_yaml::from_str(&content).context(ParseFileSnafu { path })?;
        Self::default().merge_file(file)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Look for a config file in `dir`, then apply environment overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        let base = match candidates.iter().find(|path| path.exists()) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        base.merge_env()
    }

    pub fn with_host(mut self, host: Endpoint) -> Self {
        self.host = host;
        self
    }

    pub fn with_api_version(mut self, version: &str) -> Result<Self, ConfigError> {
        self.api_version = Some(normalize_api_version(version)?);
        Ok(self)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn merge_file(mut self, file: FileConfig) -> Result<Self, ConfigError> {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(version) = file.api_version {
            self.api_version = Some(normalize_api_version(&version)?);
        }
        if let Some(timeout) = file.connect_timeout {
            self.connect_timeout = timeout;
        }
        Ok(self)
    }

    fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Some(host) = non_empty_env(HOST_ENV) {
            self.host = Endpoint::parse(&host).context(HostEnvSnafu)?;
        }
        if let Some(version) = non_empty_env(API_VERSION_ENV) {
            self.api_version = Some(normalize_api_version(&version)?);
        }
        Ok(self)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Accepts `1.43` or `v1.43`, returns `1.43`.
fn normalize_api_version(version: &str) -> Result<String, ConfigError> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let valid = match bare.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    };

    if valid {
        Ok(bare.to_string())
    } else {
        ApiVersionSnafu { version }.fail()
    }
}
