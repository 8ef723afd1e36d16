// ABOUTME: Daemon-wide records: system info and version.
// ABOUTME: Several keys break the capitalized convention and are renamed explicitly.

use super::nullable;
use serde::{Deserialize, Serialize};

/// Aggregate daemon counters and driver details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Info {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub server_version: String,
    pub containers: i64,
    pub containers_running: i64,
    pub containers_paused: i64,
    pub containers_stopped: i64,
    pub images: i64,
    pub driver: String,
    /// Pairs of `[label, value]`.
    #[serde(deserialize_with = "nullable")]
    pub driver_status: Vec<Vec<String>>,
    pub kernel_version: String,
    pub operating_system: String,
    #[serde(rename = "NCPU")]
    pub ncpu: i64,
    pub mem_total: i64,
    pub memory_limit: bool,
    pub swap_limit: bool,
    #[serde(rename = "IPv4Forwarding")]
    pub ipv4_forwarding: bool,
    pub debug: bool,
    pub n_fd: i64,
    pub n_goroutines: i64,
}

/// Daemon build and API version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Version {
    pub version: String,
    pub api_version: String,
    #[serde(rename = "MinAPIVersion")]
    pub min_api_version: String,
    pub git_commit: String,
    pub go_version: String,
    pub os: String,
    pub arch: String,
    pub kernel_version: String,
    pub build_time: String,
    pub experimental: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::decode;

    #[test]
    fn info_reads_irregular_keys() {
        let info: Info = decode(
            br#"{"ID":"X1","NCPU":8,"NFd":31,"NGoroutines":40,"IPv4Forwarding":true,
                 "Images":3,"Containers":2,"Driver":"overlay2",
                 "DriverStatus":[["Backing Filesystem","extfs"]],"Plugins":{}}"#,
        )
        .unwrap();
        assert_eq!(info.id, "X1");
        assert_eq!(info.ncpu, 8);
        assert_eq!(info.n_fd, 31);
        assert_eq!(info.n_goroutines, 40);
        assert!(info.ipv4_forwarding);
        assert_eq!(info.driver_status[0][1], "extfs");
    }
}
