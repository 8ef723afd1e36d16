// ABOUTME: Status records carried by line-framed pull and build streams.
// ABOUTME: Also extracts the built image id from the builder's success line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text the builder prints once the image is committed.
pub const BUILD_SUCCESS_MARKER: &str = "Successfully built ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressDetail {
    pub current: Option<u64>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    pub code: Option<i64>,
    pub message: String,
}

/// One record of a pull or build stream.
///
/// Pull emits `status`/`progress`, build emits `stream`; either may end
/// with `error`/`errorDetail` when the daemon gives up mid-stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(rename = "progressDetail", skip_serializing_if = "Option::is_none")]
    pub progress_detail: Option<ProgressDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "errorDetail", skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Option<Value>,
}

impl ProgressRecord {
    /// The daemon's in-stream failure message, if this record reports one.
    pub fn error_message(&self) -> Option<&str> {
        self.error_detail
            .as_ref()
            .map(|d| d.message.as_str())
            .filter(|m| !m.is_empty())
            .or(self.error.as_deref())
    }

    /// Image id announced by a `Successfully built <id>` line.
    pub fn built_image_id(&self) -> Option<&str> {
        let text = self.stream.as_deref()?;
        let (_, rest) = text.rsplit_once(BUILD_SUCCESS_MARKER)?;
        rest.split_whitespace().next()
    }

    /// Human-readable rendering of the record, without a trailing newline.
    pub fn display_line(&self) -> String {
        if let Some(stream) = &self.stream {
            return stream.trim_end_matches('\n').to_string();
        }

        let mut line = String::new();
        if let Some(id) = &self.id {
            line.push_str(id);
            line.push_str(": ");
        }
        if let Some(status) = &self.status {
            line.push_str(status);
        }
        if let Some(progress) = &self.progress {
            line.push(' ');
            line.push_str(progress);
        }
        if let Some(error) = self.error_message() {
            line.push_str(error);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::decode;

    #[test]
    fn extracts_built_image_id() {
        let record: ProgressRecord =
            decode(br#"{"stream":"Successfully built 4f3c9e1a7b2d\n"}"#).unwrap();
        assert_eq!(record.built_image_id(), Some("4f3c9e1a7b2d"));
    }

    #[test]
    fn ordinary_lines_have_no_image_id() {
        let record: ProgressRecord = decode(br#"{"stream":"Step 1/2 : FROM busybox\n"}"#).unwrap();
        assert_eq!(record.built_image_id(), None);

        let record: ProgressRecord = decode(br#"{"stream":"Successfully built \n"}"#).unwrap();
        assert_eq!(record.built_image_id(), None);
    }

    #[test]
    fn error_detail_message_wins_over_error() {
        let record: ProgressRecord = decode(
            br#"{"error":"short","errorDetail":{"code":1,"message":"manifest unknown"}}"#,
        )
        .unwrap();
        assert_eq!(record.error_message(), Some("manifest unknown"));
    }

    #[test]
    fn pull_status_renders_with_layer_id() {
        let record: ProgressRecord = decode(
            br#"{"status":"Downloading","id":"a3ed95caeb02","progress":"[==>  ] 1kB/2kB","progressDetail":{"current":1024,"total":2048}}"#,
        )
        .unwrap();
        assert_eq!(record.display_line(), "a3ed95caeb02: Downloading [==>  ] 1kB/2kB");
        assert_eq!(record.progress_detail.unwrap().total, Some(2048));
    }
}
