//! BDD step definitions for the snapshot workflow.

use rstest_bdd_macros::{given, then, when};
use shotty::fleet::FleetSettings;
use shotty::test_support::{FailurePoint, ProviderCall};
use shotty::{Fleet, FleetError, InstanceState, SnapshotState};
use tokio::runtime::Runtime;

use super::test_helpers::{SnapshotContext, SnapshotOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a fleet with projects \"{first}\" and \"{second}\"")]
fn fleet_with_projects(
    snapshot_context: SnapshotContext,
    first: String,
    second: String,
) -> SnapshotContext {
    let provider = &snapshot_context.provider;
    provider.add_instance("srv-a", &[&format!("Name={first}"), "owner=ops"]);
    provider.add_instance("srv-b", &[&format!("Name={first}")]);
    provider.add_instance("srv-c", &[&format!("Name={second}")]);
    provider.add_volume("srv-a", "vol-a1");
    provider.add_volume("srv-a", "vol-a2");
    provider.add_volume("srv-b", "vol-b1");
    provider.add_volume("srv-c", "vol-c1");
    snapshot_context
}

#[given("volume \"{volume}\" has a pending snapshot")]
fn volume_has_pending_snapshot(
    snapshot_context: SnapshotContext,
    volume: String,
) -> SnapshotContext {
    snapshot_context
        .provider
        .add_snapshot(&volume, "snap-busy", SnapshotState::Pending);
    snapshot_context
}

#[given("instance \"{instance}\" fails to stop")]
fn instance_fails_to_stop(
    snapshot_context: SnapshotContext,
    instance: String,
) -> SnapshotContext {
    snapshot_context.provider.fail_on(FailurePoint::Stop, &instance);
    snapshot_context
}

#[given("snapshots of volume \"{volume}\" fail")]
fn snapshots_fail(snapshot_context: SnapshotContext, volume: String) -> SnapshotContext {
    snapshot_context
        .provider
        .fail_on(FailurePoint::CreateSnapshot, &volume);
    snapshot_context
}

#[when("I snapshot project \"{project}\"")]
fn snapshot_project(
    snapshot_context: SnapshotContext,
    project: String,
) -> Result<SnapshotContext, StepError> {
    run_snapshot(snapshot_context, Some(project))
}

#[when("I snapshot without a project")]
fn snapshot_unscoped(snapshot_context: SnapshotContext) -> Result<SnapshotContext, StepError> {
    run_snapshot(snapshot_context, None)
}

fn run_snapshot(
    snapshot_context: SnapshotContext,
    project: Option<String>,
) -> Result<SnapshotContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let fleet = Fleet::new(snapshot_context.provider.clone(), FleetSettings::default());
    let observer = snapshot_context.observer.clone();

    let result = runtime.block_on(async {
        fleet
            .create_snapshots(project.as_deref(), false, &observer)
            .await
    });
    let outcome = match result {
        Ok(report) => SnapshotOutcome::Report(report),
        Err(err @ FleetError::MissingScope(_)) => SnapshotOutcome::Refused(err.to_string()),
        Err(err) => SnapshotOutcome::Failed(err.to_string()),
    };

    Ok(SnapshotContext {
        outcome: Some(outcome),
        ..snapshot_context
    })
}

#[then("snapshots are created for \"{volumes}\"")]
fn snapshots_created_for(
    snapshot_context: &SnapshotContext,
    volumes: String,
) -> Result<(), StepError> {
    let expected: Vec<&str> = volumes.split(',').map(str::trim).collect();
    let actual: Vec<String> = snapshot_context
        .provider
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            ProviderCall::CreateSnapshot { volume_id, .. } => Some(volume_id),
            _ => None,
        })
        .collect();
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected snapshots for {expected:?}, got {actual:?}"
        )))
    }
}

#[then("instance \"{instance}\" is running")]
fn instance_is_running(
    snapshot_context: &SnapshotContext,
    instance: String,
) -> Result<(), StepError> {
    match snapshot_context.provider.instance_state(&instance) {
        Some(InstanceState::Running) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {instance} to be running, got {other:?}"
        ))),
    }
}

#[then("the batch has no failures")]
fn batch_is_clean(snapshot_context: &SnapshotContext) -> Result<(), StepError> {
    let report = snapshot_context
        .report()
        .ok_or_else(|| StepError::Assertion(String::from("expected a batch report")))?;
    if report.is_clean() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected failures: {report}")))
    }
}

#[then("volume \"{volume}\" is skipped")]
fn volume_is_skipped(snapshot_context: &SnapshotContext, volume: String) -> Result<(), StepError> {
    let report = snapshot_context
        .report()
        .ok_or_else(|| StepError::Assertion(String::from("expected a batch report")))?;
    if report.skipped().any(|outcome| outcome.volume_id() == volume) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{volume} was not skipped")))
    }
}

#[then("the run is refused")]
fn run_is_refused(snapshot_context: &SnapshotContext) -> Result<(), StepError> {
    match &snapshot_context.outcome {
        Some(SnapshotOutcome::Refused(message)) if message.contains("--project") => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a refusal, got {other:?}"
        ))),
    }
}

#[then("the provider was not called")]
fn provider_not_called(snapshot_context: &SnapshotContext) -> Result<(), StepError> {
    let calls = snapshot_context.provider.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected calls: {calls:?}")))
    }
}

#[then("instance \"{instance}\" is reported as failed")]
fn instance_reported_failed(
    snapshot_context: &SnapshotContext,
    instance: String,
) -> Result<(), StepError> {
    let report = snapshot_context
        .report()
        .ok_or_else(|| StepError::Assertion(String::from("expected a batch report")))?;
    if report
        .failed_instances()
        .any(|outcome| outcome.instance_id == instance)
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "{instance} missing from failures: {report}"
        )))
    }
}
