// ABOUTME: Image records exchanged with the daemon.
// ABOUTME: Image listings, inspect details, search matches and commit parameters.

use super::container::ContainerConfig;
use super::{nullable, timestamp};
use crate::types::{ContainerId, ImageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNTAGGED: &str = "<none>:<none>";

/// One row of the image listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Image {
    pub id: String,
    pub parent_id: String,
    /// Only sent by old daemons; see [`Image::repository_and_tag`].
    pub repository: String,
    pub tag: String,
    #[serde(deserialize_with = "nullable")]
    pub repo_tags: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub repo_digests: Vec<String>,
    /// Unix seconds.
    pub created: i64,
    pub size: i64,
    pub virtual_size: i64,
    #[serde(deserialize_with = "nullable")]
    pub labels: BTreeMap<String, String>,
}

impl Image {
    pub fn image_id(&self) -> ImageId {
        ImageId::new(self.id.clone())
    }

    /// Repository and tag of the first real repo tag, falling back to the
    /// legacy `Repository`/`Tag` keys.
    pub fn repository_and_tag(&self) -> Option<(&str, &str)> {
        let tagged = self
            .repo_tags
            .iter()
            .filter(|t| t.as_str() != UNTAGGED)
            .filter_map(|t| t.rsplit_once(':'))
            .find(|(_, tag)| !tag.contains('/'));

        match tagged {
            Some(pair) => Some(pair),
            None if !self.repository.is_empty() => Some((self.repository.as_str(), self.tag.as_str())),
            None => None,
        }
    }
}

/// Full inspect record of one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageDetails {
    pub id: String,
    pub parent: String,
    pub comment: String,
    #[serde(deserialize_with = "timestamp")]
    pub created: Option<DateTime<Utc>>,
    /// Container the image was committed from, if any.
    pub container: String,
    pub container_config: ContainerConfig,
    pub docker_version: String,
    pub author: String,
    pub config: ContainerConfig,
    pub architecture: String,
    pub os: String,
    pub size: i64,
    pub virtual_size: i64,
    #[serde(deserialize_with = "nullable")]
    pub repo_tags: Vec<String>,
}

impl ImageDetails {
    pub fn image_id(&self) -> ImageId {
        ImageId::new(self.id.clone())
    }
}

/// A registry search match. The daemon uses snake_case keys here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchItem {
    pub name: String,
    pub description: String,
    pub star_count: u64,
    pub is_official: bool,
    pub is_automated: bool,
    pub is_trusted: bool,
}

/// `{"Id": ...}` bodies returned by commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IdResponse {
    pub id: String,
}

/// Parameters for committing a container to a new image.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitConfig {
    pub container: ContainerId,
    pub repo: Option<String>,
    pub tag: Option<String>,
    pub message: Option<String>,
    pub author: Option<String>,
    /// Pause the container while committing. The daemon default is true.
    pub pause: bool,
    /// Config baked into the new image, sent as the request body.
    pub run: Option<ContainerConfig>,
}

impl CommitConfig {
    pub fn new(container: ContainerId) -> Self {
        Self {
            container,
            repo: None,
            tag: None,
            message: None,
            author: None,
            pause: true,
            run: None,
        }
    }

    pub fn with_repo(mut self, repo: impl Into<String>, tag: Option<&str>) -> Self {
        self.repo = Some(repo.into());
        self.tag = tag.map(str::to_string);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::decode;

    #[test]
    fn repository_and_tag_from_repo_tags() {
        let image: Image =
            decode(br#"{"Id":"sha256:1","RepoTags":["<none>:<none>","localhost:5000/app:v2"]}"#)
                .unwrap();
        assert_eq!(image.repository_and_tag(), Some(("localhost:5000/app", "v2")));
    }

    #[test]
    fn repository_and_tag_from_legacy_keys() {
        let image: Image =
            decode(br#"{"Id":"1","Repository":"busybox","Tag":"latest","RepoTags":null}"#)
                .unwrap();
        assert_eq!(image.repository_and_tag(), Some(("busybox", "latest")));
    }

    #[test]
    fn search_items_use_snake_case_keys() {
        let items: Vec<SearchItem> = decode(
            br#"[{"name":"busybox","description":"tiny","star_count":42,"is_official":true}]"#,
        )
        .unwrap();
        assert_eq!(items[0].name, "busybox");
        assert_eq!(items[0].star_count, 42);
        assert!(items[0].is_official);
        assert!(!items[0].is_automated);
    }
}
