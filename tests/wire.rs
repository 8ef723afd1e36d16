// ABOUTME: Integration tests for the wire codec.
// ABOUTME: Tests tolerant decoding, field localization and request body shapes.

use dockwire::wire::{self, *};
use serde_json::json;

#[test]
fn create_config_encodes_and_response_decodes_to_an_id() {
    let config = ContainerConfig::new("busybox:1.36")
        .with_cmd(["sh", "-c", "echo hi"])
        .with_env("MODE", "test")
        .expose(8080, "tcp");

    let body: serde_json::Value = serde_json::from_slice(&wire::encode(&config).unwrap()).unwrap();
    assert_eq!(body["Image"], "busybox:1.36");
    assert_eq!(body["Env"], json!(["MODE=test"]));
    assert_eq!(body["ExposedPorts"], json!({"8080/tcp": {}}));
    assert_eq!(body["AttachStdout"], true);
    // Left to daemon defaults.
    assert!(body.get("Memory").is_none());
    assert!(body.get("Hostname").is_none());

    let response: ContainerCreateResponse =
        wire::decode(br#"{"Id":"e90e34656806","Warnings":[]}"#).unwrap();
    assert!(!response.container_id().as_str().is_empty());
}

#[test]
fn unknown_keys_are_ignored() {
    let body = json!({
        "Id": "abc",
        "Names": ["/web"],
        "Image": "nginx",
        "Mounts": [{"Type": "volume"}],
        "NetworkSettings": {"Networks": {}},
        "SomethingFromTheFuture": 42
    });

    let summary: ContainerSummary = wire::decode(body.to_string().as_bytes()).unwrap();
    assert_eq!(summary.name(), Some("web"));
}

#[test]
fn nulls_decode_as_empty_collections() {
    let image: Image =
        wire::decode(br#"{"Id":"sha256:1","RepoTags":null,"RepoDigests":null,"Labels":null}"#)
            .unwrap();
    assert!(image.repo_tags.is_empty());
    assert!(image.labels.is_empty());
    assert_eq!(image.repository_and_tag(), None);
}

#[test]
fn legacy_repository_keys_are_used_when_tags_are_absent() {
    let image: Image =
        wire::decode(br#"{"Id":"sha256:1","Repository":"busybox","Tag":"1.36"}"#).unwrap();
    assert_eq!(image.repository_and_tag(), Some(("busybox", "1.36")));

    let tagged: Image = wire::decode(
        br#"{"Id":"sha256:2","RepoTags":["<none>:<none>","localhost:5000/app:v2"]}"#,
    )
    .unwrap();
    assert_eq!(tagged.repository_and_tag(), Some(("localhost:5000/app", "v2")));
}

#[test]
fn wrong_type_inside_a_list_is_localized() {
    let body = json!([
        {"Id": "a", "Created": 1},
        {"Id": "b", "Created": "yesterday"}
    ]);

    let err = wire::decode::<Vec<ContainerSummary>>(body.to_string().as_bytes()).unwrap_err();
    assert_eq!(err.field, "[1].Created");
    assert_eq!(err.expected, "i64");
}

#[test]
fn object_of_the_wrong_kind_is_reported_at_its_own_field() {
    let err = wire::decode::<ContainerDetails>(br#"{"Id":"abc","State":[{"Running":true}]}"#)
        .unwrap_err();
    assert_eq!(err.field, "State");
    assert!(err.expected.contains("ContainerState"), "got {}", err.expected);

    let err = wire::decode::<Vec<ContainerSummary>>(br#"{"Id":"a","Names":["/web"]}"#)
        .unwrap_err();
    assert_eq!(err.field, "$");
    assert!(err.expected.contains("sequence"), "got {}", err.expected);
}

#[test]
fn malformed_json_is_reported_at_the_root() {
    let err = wire::decode::<Info>(b"{\"ID\": ").unwrap_err();
    assert_eq!(err.field, "$");
    assert_eq!(err.expected, "JSON document");
}

#[test]
fn info_uses_irregular_key_names() {
    let body = json!({
        "ID": "7TRN:IPZB",
        "Containers": 4,
        "ContainersRunning": 1,
        "Images": 12,
        "NCPU": 8,
        "MemTotal": 16_000_000_000_i64,
        "IPv4Forwarding": true,
        "NFd": 33,
        "NGoroutines": 51,
        "DriverStatus": [["Backing Filesystem", "extfs"]]
    });

    let info: Info = wire::decode(body.to_string().as_bytes()).unwrap();
    assert_eq!(info.id, "7TRN:IPZB");
    assert_eq!(info.ncpu, 8);
    assert!(info.ipv4_forwarding);
    assert_eq!(info.n_fd, 33);
    assert_eq!(info.n_goroutines, 51);
    assert_eq!(info.driver_status[0], vec!["Backing Filesystem", "extfs"]);
}

#[test]
fn inspect_details_decode_ports_and_zero_times() {
    let body = json!({
        "Id": "abc",
        "Created": "2024-03-01T10:00:00.123456789Z",
        "State": {"Running": false, "StartedAt": "0001-01-01T00:00:00Z", "FinishedAt": ""},
        "NetworkSettings": {
            "IPAddress": "172.17.0.2",
            "Ports": {
                "80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "32768"}],
                "443/tcp": null
            }
        },
        "HostConfig": {"Binds": null, "PortBindings": {"80/tcp": [{"HostPort": "32768"}]}}
    });

    let details: ContainerDetails = wire::decode(body.to_string().as_bytes()).unwrap();
    assert!(details.created.is_some());
    assert_eq!(details.state.lifecycle(), LifecycleState::Created);
    assert_eq!(details.network_settings.bindings("80/tcp")[0].host_port, "32768");
    assert!(details.network_settings.bindings("443/tcp").is_empty());
    assert!(details.host_config.binds.is_empty());
}

#[test]
fn progress_records_render_for_humans() {
    let pulling: ProgressRecord = wire::decode(
        br#"{"status":"Downloading","progress":"[==>   ] 1MB/4MB","id":"a1b2c3"}"#,
    )
    .unwrap();
    assert_eq!(pulling.display_line(), "a1b2c3: Downloading [==>   ] 1MB/4MB");

    let step: ProgressRecord = wire::decode(br#"{"stream":"Step 1/3 : FROM busybox\n"}"#).unwrap();
    assert_eq!(step.display_line(), "Step 1/3 : FROM busybox");
    assert_eq!(step.built_image_id(), None);
}

#[test]
fn search_results_use_snake_case_keys() {
    let body = br#"[{"name":"redis","description":"In-memory store","star_count":12000,"is_official":true,"is_automated":false}]"#;

    let results: Vec<SearchItem> = wire::decode(body).unwrap();
    assert_eq!(results[0].name, "redis");
    assert!(results[0].is_official);
    assert_eq!(results[0].star_count, 12000);
}

#[test]
fn wait_response_tolerates_missing_error() {
    let response: WaitResponse = wire::decode(br#"{"StatusCode":137}"#).unwrap();
    assert_eq!(response.status_code, 137);
    assert!(response.error.is_none());
}
