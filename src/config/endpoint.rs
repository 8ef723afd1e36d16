// ABOUTME: Daemon endpoint addresses for the engine transport.
// ABOUTME: Parses "unix:///path", "tcp://host:port", "http://host:port" and bare socket paths.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Socket the daemon listens on by default.
pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Port used by the daemon's unencrypted TCP listener.
pub const DEFAULT_TCP_PORT: u16 = 2375;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint cannot be empty")]
    Empty,

    #[error("unsupported endpoint scheme {0:?} (expected unix, tcp or http)")]
    UnsupportedScheme(String),

    #[error("TLS endpoints are not supported: {0}")]
    TlsUnsupported(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("hostname cannot be empty")]
    EmptyHost,
}

/// Where the daemon can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local domain socket.
    Unix(PathBuf),
    /// Plain TCP listener.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EndpointError::Empty);
        }

        if s.starts_with('/') {
            return Ok(Endpoint::Unix(PathBuf::from(s)));
        }

        let Some((scheme, rest)) = s.split_once("://") else {
            return Err(EndpointError::UnsupportedScheme(s.to_string()));
        };

        match scheme {
            "unix" => {
                if rest.is_empty() {
                    return Err(EndpointError::Empty);
                }
                Ok(Endpoint::Unix(PathBuf::from(rest)))
            }
            "tcp" | "http" => parse_host_port(rest),
            "https" => Err(EndpointError::TlsUnsupported(s.to_string())),
            other => Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Value for the HTTP `Host` header.
    pub fn host_header(&self) -> String {
        match self {
            Endpoint::Unix(_) => "localhost".to_string(),
            Endpoint::Tcp { host, port } => authority(host, *port),
        }
    }
}

fn parse_host_port(rest: &str) -> Result<Endpoint, EndpointError> {
    let rest = rest.trim_end_matches('/');

    // IPv6 literals come bracketed: `[::1]:2375`.
    let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| EndpointError::InvalidPort(rest.to_string()))?;
        let port = match after.strip_prefix(':') {
            Some(port_str) => parse_port(port_str)?,
            None if after.is_empty() => DEFAULT_TCP_PORT,
            None => return Err(EndpointError::InvalidPort(after.to_string())),
        };
        (host, port)
    } else {
        match rest.rsplit_once(':') {
            Some((host, port_str)) => (host, parse_port(port_str)?),
            None => (rest, DEFAULT_TCP_PORT),
        }
    };

    if host.is_empty() {
        return Err(EndpointError::EmptyHost);
    }

    Ok(Endpoint::Tcp {
        host: host.to_string(),
        port,
    })
}

fn parse_port(port_str: &str) -> Result<u16, EndpointError> {
    port_str
        .parse::<u16>()
        .map_err(|_| EndpointError::InvalidPort(port_str.to_string()))
}

/// `host:port`, bracketing IPv6 literals.
fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Unix(PathBuf::from(DEFAULT_SOCKET))
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "tcp://{}", authority(host, *port)),
        }
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Endpoint::parse(&s).map_err(serde::de::Error::custom)
    }
}
