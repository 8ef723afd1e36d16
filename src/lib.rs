// ABOUTME: Library root for dockwire - a client for the container engine remote API.
// ABOUTME: The dockwire binary in main.rs is a thin CLI over this crate.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod request;
pub mod stream;
pub mod transport;
pub mod types;
pub mod wire;

pub use config::ClientConfig;
pub use context::BuildContext;
pub use engine::{ContainerOps, EngineClient, FullEngine, ImageOps, LogOps, SystemOps};
pub use error::{Error, ErrorContext, ErrorKind, Operation, Result};
pub use types::{ContainerId, ImageId, ImageRef};
