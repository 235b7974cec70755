//! BDD scenarios for the snapshot workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{SnapshotContext, snapshot_context};

#[scenario(
    path = "tests/features/snapshot.feature",
    name = "Snapshot every volume in a project"
)]
fn scenario_snapshot_project(snapshot_context: SnapshotContext) {
    drop(snapshot_context);
}

#[scenario(
    path = "tests/features/snapshot.feature",
    name = "Skip a volume whose newest snapshot is pending"
)]
fn scenario_skip_pending(snapshot_context: SnapshotContext) {
    drop(snapshot_context);
}

#[scenario(
    path = "tests/features/snapshot.feature",
    name = "Refuse an unscoped snapshot"
)]
fn scenario_refuse_unscoped(snapshot_context: SnapshotContext) {
    drop(snapshot_context);
}

#[scenario(
    path = "tests/features/snapshot.feature",
    name = "Continue after an instance fails to stop"
)]
fn scenario_stop_failure(snapshot_context: SnapshotContext) {
    drop(snapshot_context);
}

#[scenario(
    path = "tests/features/snapshot.feature",
    name = "Restart an instance after a snapshot failure"
)]
fn scenario_snapshot_failure(snapshot_context: SnapshotContext) {
    drop(snapshot_context);
}
