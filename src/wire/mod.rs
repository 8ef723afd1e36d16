// ABOUTME: Wire codec between typed records and the daemon's JSON documents.
// ABOUTME: Tolerates unknown/absent keys and reports the offending field on type mismatches.

mod container;
mod image;
mod progress;
mod system;

pub use container::{
    Change, ChangeKind, ContainerConfig, ContainerCreateResponse, ContainerDetails,
    ContainerState, ContainerSummary, EmptyObject, HostConfig, LifecycleState, NetworkSettings,
    Port, PortBinding, WaitError, WaitResponse,
};
pub use image::{CommitConfig, IdResponse, Image, ImageDetails, SearchItem};
pub use progress::{BUILD_SUCCESS_MARKER, ErrorDetail, ProgressDetail, ProgressRecord};
pub use system::{Info, Version};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A response body that does not fit the expected record shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot decode field `{field}` (expected {expected}): {message}")]
pub struct DecodeError {
    /// Path to the offending value, e.g. `State.ExitCode` or `[2].Names`.
    pub field: String,
    /// The kind of value the record expected there.
    pub expected: String,
    /// Underlying parser message.
    pub message: String,
}

impl DecodeError {
    fn malformed(err: &serde_json::Error) -> Self {
        Self {
            field: "$".to_string(),
            expected: "JSON document".to_string(),
            message: err.to_string(),
        }
    }
}

/// Serialize a record into a request body.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(value).map(Bytes::from)
}

/// Decode a response body into a record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| DecodeError::malformed(&e))?;
    decode_value(&value)
}

/// Decode an already-parsed JSON value into a record.
pub fn decode_value<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    match T::deserialize(value) {
        Ok(record) => Ok(record),
        Err(err) => Err(locate::<T>(value, &err)),
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Narrow a failed decode down to the field that caused it.
///
/// Every record field has a default, so a document pruned down to one
/// branch decodes unless that branch holds a wrongly-typed value. The search
/// stops at a node that fails even when emptied, since then the node itself
/// has the wrong shape; otherwise it descends into the first failing child.
fn locate<T: DeserializeOwned>(root: &Value, err: &serde_json::Error) -> DecodeError {
    let mut path: Vec<Segment> = Vec::new();
    let mut message = err.to_string();

    loop {
        let Some(node) = value_at(root, &path) else {
            break;
        };

        let (children, hollow): (Vec<Segment>, Value) = match node {
            Value::Object(map) => (
                map.keys().cloned().map(Segment::Key).collect(),
                Value::Object(serde_json::Map::new()),
            ),
            Value::Array(items) => (
                (0..items.len()).map(Segment::Index).collect(),
                Value::Array(Vec::new()),
            ),
            _ => break,
        };

        if let Err(e) = T::deserialize(&graft(root, &path, hollow)) {
            message = e.to_string();
            break;
        }

        let failing = children.into_iter().find_map(|segment| {
            let mut candidate = path.clone();
            candidate.push(segment.clone());
            let subtree = value_at(root, &candidate).cloned().unwrap_or(Value::Null);
            let pruned = graft(root, &candidate, subtree);
            T::deserialize(&pruned).err().map(|e| (segment, e.to_string()))
        });

        match failing {
            Some((segment, child_message)) => {
                path.push(segment);
                message = child_message;
            }
            None => break,
        }
    }

    DecodeError {
        field: render_path(&path),
        expected: expected_kind(&message),
        message,
    }
}

fn value_at<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Array(items), Segment::Index(idx)) => items.get(*idx),
        _ => None,
    })
}

/// Keep only the branch along `path`, ending in `leaf`.
fn graft(node: &Value, path: &[Segment], leaf: Value) -> Value {
    match path.split_first() {
        None => leaf,
        Some((Segment::Key(key), rest)) => {
            let mut map = serde_json::Map::new();
            if let Some(child) = node.get(key) {
                map.insert(key.clone(), graft(child, rest, leaf));
            }
            Value::Object(map)
        }
        Some((Segment::Index(idx), rest)) => match node.get(*idx) {
            Some(child) => Value::Array(vec![graft(child, rest, leaf)]),
            None => Value::Array(Vec::new()),
        },
    }
}

fn render_path(path: &[Segment]) -> String {
    if path.is_empty() {
        return "$".to_string();
    }

    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Index(idx) => out.push_str(&format!("[{idx}]")),
        }
    }
    out
}

/// Pull "i64" out of "invalid type: string \"x\", expected i64".
fn expected_kind(message: &str) -> String {
    match message.rsplit_once("expected ") {
        Some((_, rest)) => rest
            .split(" at line ")
            .next()
            .unwrap_or(rest)
            .trim()
            .to_string(),
        None => "a valid value".to_string(),
    }
}

/// Treat an explicit JSON `null` like an absent key.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 timestamps where empty strings and the zero time mean "never".
pub(crate) fn timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.starts_with("0001-01-01") => Ok(None),
        Some(s) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&chrono::Utc)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "PascalCase", default)]
    struct Inner {
        exit_code: i64,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "PascalCase", default)]
    struct Outer {
        id: String,
        state: Inner,
        names: Vec<String>,
    }

    #[test]
    fn locates_nested_field() {
        let err = decode::<Outer>(br#"{"Id":"x","State":{"ExitCode":"zero"}}"#).unwrap_err();
        assert_eq!(err.field, "State.ExitCode");
        assert_eq!(err.expected, "i64");
    }

    #[test]
    fn locates_array_element() {
        let err = decode::<Vec<Outer>>(br#"[{"Id":"a"},{"Id":7}]"#).unwrap_err();
        assert_eq!(err.field, "[1].Id");
        assert!(err.expected.contains("string"), "got {}", err.expected);
    }

    #[test]
    fn top_level_shape_mismatch_reports_root() {
        let err = decode::<Vec<Outer>>(br#"{"Id":"a"}"#).unwrap_err();
        assert_eq!(err.field, "$");
        assert!(err.expected.contains("sequence"), "got {}", err.expected);
    }

    #[test]
    fn nested_container_of_the_wrong_kind_stops_at_that_field() {
        let err = decode::<Outer>(br#"{"Id":"x","State":[{"ExitCode":1}]}"#).unwrap_err();
        assert_eq!(err.field, "State");
        assert!(err.expected.contains("struct Inner"), "got {}", err.expected);

        let err = decode::<Outer>(br#"{"Names":{"first":"web"}}"#).unwrap_err();
        assert_eq!(err.field, "Names");
        assert!(err.expected.contains("sequence"), "got {}", err.expected);
    }

    #[test]
    fn malformed_json_reports_document() {
        let err = decode::<Outer>(b"{not json").unwrap_err();
        assert_eq!(err.field, "$");
        assert_eq!(err.expected, "JSON document");
    }

    #[test]
    fn unknown_keys_and_absent_fields_use_defaults() {
        let outer: Outer = decode(br#"{"Id":"a","Brand":"new"}"#).unwrap();
        assert_eq!(outer.id, "a");
        assert_eq!(outer.state.exit_code, 0);
        assert!(outer.names.is_empty());
    }
}
