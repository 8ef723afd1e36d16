// ABOUTME: Phantom-typed engine identifiers for compile-time type safety.
// ABOUTME: Keeps container and image ids from being passed to the wrong operation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
pub enum ContainerMarker {}
pub enum ImageMarker {}

/// Length of the abbreviated id form printed by the engine CLI.
pub const SHORT_ID_LEN: usize = 12;

/// An opaque identifier assigned by the daemon.
///
/// The value may be a full id or any leading prefix of one; the daemon
/// resolves prefixes. The marker type only exists at compile time, so an
/// image id cannot be passed where a container id is expected:
///
/// ```compile_fail,E0308
/// use dockwire::types::{ContainerId, ImageId};
///
/// fn takes_container_id(_id: ContainerId) {}
///
/// takes_container_id(ImageId::new("sha256:abc123"));
/// ```
#[must_use = "IDs reference engine objects and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }

    /// The first twelve characters, without any `sha256:` prefix.
    pub fn short(&self) -> &str {
        let bare = self
            .value
            .strip_prefix("sha256:")
            .unwrap_or(&self.value);
        match bare.char_indices().nth(SHORT_ID_LEN) {
            Some((idx, _)) => &bare[..idx],
            None => bare,
        }
    }

    /// Whether `full` starts with this (possibly abbreviated) id.
    pub fn is_prefix_of(&self, full: &str) -> bool {
        !self.value.is_empty() && full.starts_with(&self.value)
    }
}

// Manual impls so that T needs no bounds; it is only a marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

pub type ContainerId = Id<ContainerMarker>;
pub type ImageId = Id<ImageMarker>;
