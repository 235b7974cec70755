//! Shared fixtures for snapshot BDD scenarios.

use rstest::fixture;
use shotty::BatchReport;
use shotty::test_support::{FakeProvider, RecordingObserver};

#[derive(Clone, Debug)]
pub struct SnapshotContext {
    pub provider: FakeProvider,
    pub observer: RecordingObserver,
    pub outcome: Option<SnapshotOutcome>,
}

#[derive(Clone, Debug)]
pub enum SnapshotOutcome {
    Report(BatchReport),
    Refused(String),
    Failed(String),
}

impl SnapshotContext {
    pub fn report(&self) -> Option<&BatchReport> {
        match &self.outcome {
            Some(SnapshotOutcome::Report(report)) => Some(report),
            _ => None,
        }
    }
}

#[fixture]
pub fn snapshot_context() -> SnapshotContext {
    SnapshotContext {
        provider: FakeProvider::new(),
        observer: RecordingObserver::new(),
        outcome: None,
    }
}
