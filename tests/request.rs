// ABOUTME: Integration tests for request composition.
// ABOUTME: Checks paths, query encoding, default values and local validation per operation.

use dockwire::engine::{AttachOptions, LogOptions, RemoveImageOptions};
use dockwire::request::{self, DEFAULT_STOP_TIMEOUT_SECS, RequestBody};
use dockwire::types::{ContainerId, ImageRef};
use dockwire::wire::{CommitConfig, ContainerConfig, HostConfig};
use dockwire::{ErrorKind, Operation};
use hyper::Method;

fn id(value: &str) -> ContainerId {
    ContainerId::new(value)
}

mod queries {
    use super::*;

    #[test]
    fn keys_render_in_sorted_order_regardless_of_insertion() {
        let mut query = request::Query::new();
        query.set("tag", "1.36").set("fromImage", "busybox").flag("all", true);

        assert_eq!(query.render(), "all=1&fromImage=busybox&tag=1.36");
    }

    #[test]
    fn values_are_percent_encoded() {
        let mut query = request::Query::new();
        query.set("filters", r#"{"label":["a=b c"]}"#);

        assert_eq!(
            query.render(),
            "filters=%7B%22label%22%3A%5B%22a%3Db%20c%22%5D%7D"
        );
    }

    #[test]
    fn identical_inputs_compose_identical_requests() {
        let opts = LogOptions::tail(50);
        let a = request::container_logs(&id("abc"), &opts).unwrap();
        let b = request::container_logs(&id("abc"), &opts).unwrap();

        assert_eq!(a.path_and_query(None), b.path_and_query(None));
    }
}

mod containers {
    use super::*;

    #[test]
    fn stop_defaults_grace_period_to_ten_seconds() {
        let req = request::stop_container(&id("abc"), None).unwrap();

        assert_eq!(DEFAULT_STOP_TIMEOUT_SECS, 10);
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path_and_query(None), "/containers/abc/stop?t=10");
    }

    #[test]
    fn restart_forwards_explicit_grace_period() {
        let req = request::restart_container(&id("abc"), Some(0)).unwrap();
        assert_eq!(req.path_and_query(None), "/containers/abc/restart?t=0");
    }

    #[test]
    fn kill_sends_signal_only_when_given() {
        let plain = request::kill_container(&id("abc"), None).unwrap();
        assert_eq!(plain.path_and_query(None), "/containers/abc/kill");

        let hup = request::kill_container(&id("abc"), Some("SIGHUP")).unwrap();
        assert_eq!(hup.query.get("signal"), Some("SIGHUP"));

        let empty = request::kill_container(&id("abc"), Some("  ")).unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::Validation);
    }

    #[test]
    fn empty_or_malformed_ids_are_rejected() {
        for bad in ["", "   ", "abc def", "../etc"] {
            let err = request::inspect_container(&id(bad)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "id {bad:?}");
            assert_eq!(err.operation(), Operation::InspectContainer);
        }
    }

    #[test]
    fn create_validates_name_and_image() {
        let err = request::create_container(&ContainerConfig::new("  ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = request::create_container(&ContainerConfig::new("nginx").with_name("-bad"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let ok = request::create_container(&ContainerConfig::new("nginx").with_name("web.1_a-b"))
            .unwrap();
        assert_eq!(ok.query.get("name"), Some("web.1_a-b"));
        assert_eq!(ok.target.as_deref(), Some("nginx"));
    }

    #[test]
    fn privileged_create_carries_host_config() {
        let mut config = ContainerConfig::new("busybox");
        config.privileged = true;

        let req = request::create_container(&config).unwrap();
        let RequestBody::Json(body) = &req.body else {
            panic!("create body should be JSON");
        };
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();

        assert_eq!(json["HostConfig"]["Privileged"], true);
        assert!(json.get("Privileged").is_none());
    }

    #[test]
    fn create_carries_port_bindings_and_binds() {
        let mut config = ContainerConfig::new("nginx")
            .publish(80, "tcp", 8080)
            .bind_mount("/srv/site", "/usr/share/nginx/html");
        config.privileged = true;

        let req = request::create_container(&config).unwrap();
        let RequestBody::Json(body) = &req.body else {
            panic!("create body should be JSON");
        };
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();

        assert_eq!(json["ExposedPorts"], serde_json::json!({"80/tcp": {}}));
        let host = &json["HostConfig"];
        assert_eq!(host["PortBindings"]["80/tcp"][0]["HostPort"], "8080");
        assert_eq!(host["Binds"], serde_json::json!(["/srv/site:/usr/share/nginx/html"]));
        assert_eq!(host["Privileged"], true);
        assert!(json.get("PortBindings").is_none());
    }

    #[test]
    fn create_without_host_settings_sends_no_host_config() {
        let req = request::create_container(&ContainerConfig::new("busybox")).unwrap();
        let RequestBody::Json(body) = &req.body else {
            panic!("create body should be JSON");
        };
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert!(json.get("HostConfig").is_none());
    }

    #[test]
    fn start_without_host_config_has_no_body() {
        let req = request::start_container(&id("abc"), None).unwrap();
        assert!(matches!(req.body, RequestBody::Empty));

        let host = HostConfig::default().bind_port(8080, "tcp", 18080);
        let req = request::start_container(&id("abc"), Some(&host)).unwrap();
        let RequestBody::Json(body) = &req.body else {
            panic!("start body should be JSON");
        };
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["PortBindings"]["8080/tcp"][0]["HostPort"], "18080");
    }

    #[test]
    fn attach_and_logs_send_all_flags() {
        let attach = request::attach_container(&id("abc"), &AttachOptions::default()).unwrap();
        assert_eq!(attach.method, Method::POST);
        assert_eq!(
            attach.path_and_query(None),
            "/containers/abc/attach?logs=0&stderr=1&stdout=1&stream=1"
        );

        let logs = request::container_logs(&id("abc"), &LogOptions::tail(5)).unwrap();
        assert_eq!(logs.query.get("tail"), Some("5"));
    }

    #[test]
    fn api_version_prefixes_the_path() {
        let req = request::list_containers(true);
        assert_eq!(
            req.path_and_query(Some("1.41")),
            "/v1.41/containers/json?all=1"
        );
    }
}

mod images {
    use super::*;

    #[test]
    fn image_names_keep_slashes_but_encode_segments() {
        let req = request::inspect_image("registry.local:5000/team/app").unwrap();
        assert_eq!(
            req.path_and_query(None),
            "/images/registry.local%3A5000/team/app/json"
        );
    }

    #[test]
    fn remove_image_sends_force_and_noprune() {
        let opts = RemoveImageOptions {
            force: true,
            no_prune: false,
        };
        let req = request::remove_image("busybox", &opts).unwrap();

        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.path_and_query(None), "/images/busybox?force=1&noprune=0");
    }

    #[test]
    fn tag_splits_repository_and_defaults_tag() {
        let target = ImageRef::parse("mirror.local/busybox").unwrap();
        let req = request::tag_image("busybox", &target, false).unwrap();

        assert_eq!(
            req.path_and_query(None),
            "/images/busybox/tag?force=0&repo=mirror.local%2Fbusybox&tag=latest"
        );
    }

    #[test]
    fn tag_to_digest_only_reference_is_rejected() {
        let target = ImageRef::parse("busybox@sha256:abcdef").unwrap();
        let err = request::tag_image("busybox", &target, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn pull_by_digest_sends_digest_as_tag() {
        let reference = ImageRef::parse("busybox@sha256:abcdef").unwrap();
        let req = request::pull_image(&reference);

        assert_eq!(req.query.get("fromImage"), Some("busybox"));
        assert_eq!(req.query.get("tag"), Some("sha256:abcdef"));
    }

    #[test]
    fn commit_requires_repository_for_tag() {
        let mut config = CommitConfig::new(id("abc"));
        config.tag = Some("v1".to_string());

        let err = request::commit_container(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.operation(), Operation::CommitContainer);
    }

    #[test]
    fn search_requires_a_term() {
        assert!(request::search_images(" ").is_err());

        let req = request::search_images("redis cache").unwrap();
        assert_eq!(req.path_and_query(None), "/images/search?term=redis%20cache");
    }
}
