//! Unit tests for Scaleway wire mappings and request helpers.

use std::cell::Cell;
use std::collections::VecDeque;
use std::future::ready;
use std::time::Duration;

use rstest::{fixture, rstest};

use super::http::{api_message, has_more_pages, zone_url};
use super::inventory::snapshot_query;
use super::power::{perform_unless, poll_until};
use super::snapshot::CREATED_BY_TAG;
use super::types::{ServerEnvelope, ServersPage, SnapshotEnvelope, SnapshotsPage, newest_first};
use super::*;
use crate::provider::SnapshotState;

const SERVERS_JSON: &str = r#"{
    "servers": [
        {
            "id": "srv-a",
            "name": "web-1",
            "state": "running",
            "commercial_type": "DEV1-S",
            "zone": "fr-par-2",
            "tags": ["Name=demo", "owner=ops", "ephemeral"],
            "public_ip": {"address": "51.15.0.10", "dynamic": false},
            "volumes": {}
        },
        {
            "id": "srv-b",
            "state": "stopped in place"
        }
    ],
    "total_count": 2
}"#;

#[fixture]
fn config() -> ScalewayConfig {
    ScalewayConfig {
        access_key: None,
        secret_key: String::from("dummy"),
        default_organization_id: None,
        default_project_id: String::from("proj"),
        default_zone: String::from("fr-par-1"),
    }
}

#[rstest]
fn servers_page_maps_into_instances() {
    let page: ServersPage = serde_json::from_str(SERVERS_JSON).expect("servers json");
    assert_eq!(page.total_count, 2);

    let instances: Vec<Instance> = page
        .servers
        .into_iter()
        .map(|server| server.into_instance("fr-par-1"))
        .collect();

    let [web, bare] = instances.as_slice() else {
        panic!("expected two instances, got {instances:?}");
    };
    assert_eq!(web.id, "srv-a");
    assert_eq!(web.zone, "fr-par-2");
    assert_eq!(web.state, InstanceState::Running);
    assert_eq!(web.instance_type, "DEV1-S");
    assert_eq!(web.public_address.as_deref(), Some("51.15.0.10"));
    assert_eq!(web.tags.get("Name"), Some("demo"));
    assert_eq!(web.tags.get("ephemeral"), Some(""));

    assert_eq!(bare.zone, "fr-par-1");
    assert_eq!(bare.state, InstanceState::Stopped);
    assert!(bare.tags.is_empty());
    assert!(bare.public_address.is_none());
}

#[rstest]
fn server_volumes_are_ordered_by_slot() {
    let body = r#"{"server": {
        "id": "srv-a",
        "state": "stopped",
        "volumes": {
            "10": {"id": "vol-ten", "size": 10000000000, "volume_type": "b_ssd",
                   "state": "available"},
            "0": {"id": "vol-root", "size": 20000000000, "volume_type": "l_ssd",
                  "state": "available"},
            "1": {"id": "vol-one", "volume_type": "sbs_volume"}
        }
    }}"#;
    let envelope: ServerEnvelope = serde_json::from_str(body).expect("server json");

    let volumes = envelope.server.into_volumes("fr-par-1");
    let ids: Vec<&str> = volumes.iter().map(|volume| volume.id.as_str()).collect();
    assert_eq!(ids, ["vol-root", "vol-one", "vol-ten"]);
    assert!(volumes.iter().all(|volume| volume.instance_id == "srv-a"));
    assert!(volumes.iter().all(|volume| volume.zone == "fr-par-1"));
    assert_eq!(volumes.first().map(|volume| volume.size_bytes), Some(20_000_000_000));
}

#[rstest]
fn snapshots_map_state_and_sort_newest_first() {
    let body = r#"{"snapshots": [
        {"id": "snap-old", "state": "available", "creation_date": "2024-01-01T10:00:00+00:00",
         "base_volume": {"id": "vol-a", "name": "root"}},
        {"id": "snap-new", "state": "snapshotting", "creation_date": "2024-03-01T10:00:00+00:00"}
    ], "total_count": 2}"#;
    let page: SnapshotsPage = serde_json::from_str(body).expect("snapshots json");

    let mut snapshots: Vec<Snapshot> = page
        .snapshots
        .into_iter()
        .map(|snapshot| snapshot.into_snapshot("vol-a"))
        .collect();
    newest_first(&mut snapshots);

    let [newest, oldest] = snapshots.as_slice() else {
        panic!("expected two snapshots, got {snapshots:?}");
    };
    assert_eq!(newest.id, "snap-new");
    assert_eq!(newest.state, SnapshotState::Pending);
    assert_eq!(newest.progress, None);
    assert_eq!(newest.volume_id, "vol-a");
    assert_eq!(oldest.state, SnapshotState::Completed);
    assert_eq!(oldest.progress, Some(100));
}

#[rstest]
fn created_snapshot_envelope_parses() {
    let body = r#"{"snapshot": {"id": "snap-1", "state": "snapshotting",
        "base_volume": {"id": "vol-a"}}, "task": {"id": "task-1"}}"#;
    let envelope: SnapshotEnvelope = serde_json::from_str(body).expect("snapshot json");
    let snapshot = envelope.snapshot.into_snapshot("vol-a");
    assert!(snapshot.is_pending());
    assert_eq!(snapshot.started_at, "");
}

#[rstest]
fn snapshot_request_carries_description_and_creator_tags(config: ScalewayConfig) {
    let provider = ScalewayProvider::new(config).expect("provider");
    let volume = Volume {
        id: String::from("vol-a"),
        instance_id: String::from("srv-a"),
        zone: String::from("fr-par-1"),
        state: String::from("in_use"),
        size_bytes: 0,
        volume_type: String::from("b_ssd"),
    };

    let request = provider.snapshot_request(&volume, "Created by shotty");

    assert_eq!(request.volume_id, "vol-a");
    assert_eq!(request.project, "proj");
    assert!(request.name.starts_with("shotty-vol-a-"));
    assert_eq!(
        request.tags,
        vec![
            String::from(CREATED_BY_TAG),
            String::from("description=Created by shotty")
        ]
    );
}

#[rstest]
fn provider_rejects_invalid_config(config: ScalewayConfig) {
    let invalid = ScalewayConfig {
        secret_key: String::from("  "),
        ..config
    };
    let Err(err) = ScalewayProvider::new(invalid) else {
        panic!("blank secret should be rejected");
    };
    assert!(matches!(err, ScalewayProviderError::Config(_)));
}

#[rstest]
#[case(100, 100, 250, true)]
#[case(250, 50, 250, false)]
#[case(0, 0, 10, false)]
#[case(2, 2, 2, false)]
fn pagination_stops_when_total_reached(
    #[case] collected: usize,
    #[case] received: usize,
    #[case] total: u64,
    #[case] expected: bool,
) {
    assert_eq!(has_more_pages(collected, received, total), expected);
}

#[rstest]
fn zone_urls_target_instances_api() {
    assert_eq!(
        zone_url("nl-ams-1", "snapshots"),
        "https://api.scaleway.com/instance/v1/zones/nl-ams-1/snapshots"
    );
}

#[rstest]
fn api_message_falls_back_to_raw_body() {
    assert_eq!(api_message(b"gateway timeout"), "gateway timeout");
}

#[rstest]
fn timeout_error_names_action_and_instance() {
    let err = ScalewayProviderError::Timeout {
        action: String::from("wait_until_stopped"),
        instance_id: String::from("srv-a"),
    };
    assert_eq!(
        err.to_string(),
        "timeout waiting for wait_until_stopped on instance srv-a"
    );
}

#[rstest]
fn latest_snapshot_query_asks_for_one_newest_item() {
    let query = snapshot_query("vol-a", 1, 1);
    assert_eq!(
        query,
        [
            ("base_volume_id", String::from("vol-a")),
            ("order", String::from("creation_date_desc")),
            ("page", String::from("1")),
            ("per_page", String::from("1")),
        ]
    );
}

#[fixture]
fn instance() -> Instance {
    Instance {
        id: String::from("srv-a"),
        zone: String::from("fr-par-1"),
        name: String::from("web-1"),
        state: InstanceState::Running,
        instance_type: String::from("DEV1-S"),
        public_address: None,
        tags: crate::tags::Tags::default(),
    }
}

const FAST: (Duration, Duration) = (Duration::from_millis(1), Duration::from_secs(5));

#[rstest]
#[tokio::test]
async fn poll_until_returns_once_target_is_reported(instance: Instance) {
    let mut script = VecDeque::from([
        Some(InstanceState::Stopping),
        Some(InstanceState::Stopping),
        Some(InstanceState::Stopped),
        Some(InstanceState::Running),
    ]);
    let mut polls = 0;

    let result = poll_until(
        &instance,
        &InstanceState::Stopped,
        "wait_until_stopped",
        FAST,
        || {
            polls += 1;
            ready(Ok(script.pop_front().flatten()))
        },
    )
    .await;

    assert!(result.is_ok(), "unexpected: {result:?}");
    assert_eq!(polls, 3);
}

#[rstest]
#[tokio::test]
async fn poll_until_times_out_naming_the_wait(instance: Instance) {
    let mut polls = 0;

    let result = poll_until(
        &instance,
        &InstanceState::Stopped,
        "wait_until_stopped",
        (Duration::from_millis(1), Duration::from_millis(10)),
        || {
            polls += 1;
            ready(Ok(Some(InstanceState::Running)))
        },
    )
    .await;

    let Err(ScalewayProviderError::Timeout {
        action,
        instance_id,
    }) = &result
    else {
        panic!("expected timeout, got {result:?}");
    };
    assert_eq!(action, "wait_until_stopped");
    assert_eq!(instance_id, "srv-a");
    assert!(polls >= 1);
}

#[rstest]
#[tokio::test]
async fn poll_until_reports_vanished_instance(instance: Instance) {
    let mut script = VecDeque::from([Some(InstanceState::Starting), None]);

    let result = poll_until(
        &instance,
        &InstanceState::Running,
        "wait_until_running",
        FAST,
        || ready(Ok(script.pop_front().flatten())),
    )
    .await;

    assert!(
        matches!(
            &result,
            Err(ScalewayProviderError::InstanceNotFound { instance_id, zone })
                if instance_id == "srv-a" && zone == "fr-par-1"
        ),
        "unexpected: {result:?}"
    );
}

#[rstest]
#[tokio::test]
async fn poll_until_rejects_unrepresentable_deadline(instance: Instance) {
    let mut polls = 0;

    let result = poll_until(
        &instance,
        &InstanceState::Running,
        "wait_until_running",
        (Duration::from_millis(1), Duration::MAX),
        || {
            polls += 1;
            ready(Ok(Some(InstanceState::Running)))
        },
    )
    .await;

    assert!(
        matches!(result, Err(ScalewayProviderError::Timeout { .. })),
        "unexpected: {result:?}"
    );
    assert_eq!(polls, 0);
}

#[rstest]
#[case(InstanceState::Stopped, 0)]
#[case(InstanceState::Running, 1)]
#[case(InstanceState::Stopping, 1)]
#[tokio::test]
async fn perform_unless_skips_action_when_already_settled(
    instance: Instance,
    #[case] current: InstanceState,
    #[case] expected_sends: u32,
) {
    let sends = Cell::new(0_u32);

    let result = perform_unless(
        &instance,
        "poweroff",
        &InstanceState::Stopped,
        || ready(Ok(Some(current))),
        || {
            sends.set(sends.get() + 1);
            ready(Ok(()))
        },
    )
    .await;

    assert!(result.is_ok(), "unexpected: {result:?}");
    assert_eq!(sends.get(), expected_sends);
}

#[rstest]
#[tokio::test]
async fn perform_unless_fails_for_missing_instance(instance: Instance) {
    let sends = Cell::new(0_u32);

    let result = perform_unless(
        &instance,
        "poweron",
        &InstanceState::Running,
        || ready(Ok(None)),
        || {
            sends.set(sends.get() + 1);
            ready(Ok(()))
        },
    )
    .await;

    assert!(
        matches!(result, Err(ScalewayProviderError::InstanceNotFound { .. })),
        "unexpected: {result:?}"
    );
    assert_eq!(sends.get(), 0);
}
