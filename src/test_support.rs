//! Test support utilities shared across unit and integration tests.
//!
//! [`FakeProvider`] keeps an in-memory inventory, records every call, and can
//! be told to fail specific operations. The binary also uses it for its
//! fake-fleet mode so CLI behaviour can be exercised without credentials.

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::fleet::{FleetEvent, FleetObserver};
use crate::provider::{
    Instance, InstanceState, Provider, ProviderFuture, Snapshot, SnapshotState, Volume,
};
use crate::tags::{TagFilter, Tags};

const FAKE_ZONE: &str = "fr-par-1";
const FAKE_VOLUME_SIZE: u64 = 20_000_000_000;

/// Provider operation that can be scripted to fail.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailurePoint {
    /// `list_instances`; the target id is ignored.
    ListInstances,
    /// `list_volumes` for an instance.
    ListVolumes,
    /// `list_snapshots` for a volume.
    ListSnapshots,
    /// `stop` for an instance.
    Stop,
    /// `wait_until_stopped` for an instance.
    WaitStopped,
    /// `start` for an instance.
    Start,
    /// `wait_until_running` for an instance.
    WaitRunning,
    /// `create_snapshot` for a volume.
    CreateSnapshot,
}

/// Call recorded by [`FakeProvider`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProviderCall {
    /// `list_instances` with its filter.
    ListInstances(Option<TagFilter>),
    /// `list_volumes` for an instance id.
    ListVolumes(String),
    /// `list_snapshots` for a volume id.
    ListSnapshots(String),
    /// `stop` for an instance id.
    Stop(String),
    /// `wait_until_stopped` for an instance id.
    WaitUntilStopped(String),
    /// `start` for an instance id.
    Start(String),
    /// `wait_until_running` for an instance id.
    WaitUntilRunning(String),
    /// `create_snapshot` for a volume id with its description.
    CreateSnapshot {
        /// Source volume.
        volume_id: String,
        /// Description passed by the caller.
        description: String,
    },
}

impl ProviderCall {
    /// Returns `true` for calls that change cloud state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Stop(_) | Self::Start(_) | Self::CreateSnapshot { .. }
        )
    }
}

/// Errors returned by [`FakeProvider`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FakeProviderError {
    /// Raised for operations scripted with [`FakeProvider::fail_on`].
    #[error("scripted {point:?} failure for {target}")]
    Scripted {
        /// Operation that failed.
        point: FailurePoint,
        /// Instance or volume id.
        target: String,
    },
    /// Raised when an instance id is not in the inventory.
    #[error("instance {0} not found")]
    UnknownInstance(String),
    /// Raised when a wait finds the instance in the wrong state.
    #[error("instance {instance_id} is {actual}, expected {expected}")]
    UnexpectedState {
        /// Instance waited on.
        instance_id: String,
        /// State the wait expected.
        expected: InstanceState,
        /// State found.
        actual: InstanceState,
    },
}

#[derive(Debug, Default)]
struct FakeState {
    instances: Vec<Instance>,
    volumes: Vec<Volume>,
    snapshots: Vec<Snapshot>,
    failures: HashSet<(FailurePoint, String)>,
    calls: Vec<ProviderCall>,
    created: u32,
}

impl FakeState {
    fn check(&self, point: FailurePoint, target: &str) -> Result<(), FakeProviderError> {
        if self.failures.contains(&(point, target.to_owned())) {
            return Err(FakeProviderError::Scripted {
                point,
                target: target.to_owned(),
            });
        }
        Ok(())
    }

    fn instance_mut(&mut self, id: &str) -> Result<&mut Instance, FakeProviderError> {
        self.instances
            .iter_mut()
            .find(|instance| instance.id == id)
            .ok_or_else(|| FakeProviderError::UnknownInstance(id.to_owned()))
    }

    fn transition(
        &mut self,
        point: FailurePoint,
        id: &str,
        state: InstanceState,
    ) -> Result<(), FakeProviderError> {
        self.check(point, id)?;
        self.instance_mut(id)?.state = state;
        Ok(())
    }

    fn expect_state(
        &mut self,
        point: FailurePoint,
        id: &str,
        expected: InstanceState,
    ) -> Result<(), FakeProviderError> {
        self.check(point, id)?;
        let actual = self.instance_mut(id)?.state.clone();
        if actual == expected {
            return Ok(());
        }
        Err(FakeProviderError::UnexpectedState {
            instance_id: id.to_owned(),
            expected,
            actual,
        })
    }
}

/// In-memory provider with scripted failures and a call log.
#[derive(Clone, Debug, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    /// Creates a provider with an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider holding one running instance `srv-<project>`
    /// tagged `<project_tag>=<project>` with one volume `vol-<project>`.
    #[must_use]
    pub fn demo_fleet(project_tag: &str, project: &str) -> Self {
        let provider = Self::new();
        let instance_id = format!("srv-{project}");
        provider.add_instance(&instance_id, &[&format!("{project_tag}={project}")]);
        provider.add_volume(&instance_id, &format!("vol-{project}"));
        provider
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a running instance with the given tag labels.
    pub fn add_instance(&self, id: &str, labels: &[&str]) {
        self.lock().instances.push(Instance {
            id: id.to_owned(),
            zone: String::from(FAKE_ZONE),
            name: id.to_owned(),
            state: InstanceState::Running,
            instance_type: String::from("DEV1-S"),
            public_address: None,
            tags: Tags::from_labels(labels.iter().copied()),
        });
    }

    /// Attaches a volume to an instance.
    pub fn add_volume(&self, instance_id: &str, volume_id: &str) {
        self.lock().volumes.push(Volume {
            id: volume_id.to_owned(),
            instance_id: instance_id.to_owned(),
            zone: String::from(FAKE_ZONE),
            state: String::from("in_use"),
            size_bytes: FAKE_VOLUME_SIZE,
            volume_type: String::from("b_ssd"),
        });
    }

    /// Records an existing snapshot. Call in newest-first order per volume.
    pub fn add_snapshot(&self, volume_id: &str, snapshot_id: &str, state: SnapshotState) {
        let progress = (state == SnapshotState::Completed).then_some(100);
        self.lock().snapshots.push(Snapshot {
            id: snapshot_id.to_owned(),
            volume_id: volume_id.to_owned(),
            state,
            started_at: String::from("2024-01-01T00:00:00Z"),
            progress,
        });
    }

    /// Makes `point` fail for the instance or volume `target`.
    pub fn fail_on(&self, point: FailurePoint, target: &str) {
        self.lock().failures.insert((point, target.to_owned()));
    }

    /// Returns every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }

    /// Returns the calls that change cloud state.
    #[must_use]
    pub fn mutations(&self) -> Vec<ProviderCall> {
        self.calls()
            .into_iter()
            .filter(ProviderCall::is_mutation)
            .collect()
    }

    /// Returns the current state of an instance.
    #[must_use]
    pub fn instance_state(&self, id: &str) -> Option<InstanceState> {
        self.lock()
            .instances
            .iter()
            .find(|instance| instance.id == id)
            .map(|instance| instance.state.clone())
    }

    fn record<T>(
        &self,
        call: ProviderCall,
        op: impl FnOnce(&mut FakeState) -> Result<T, FakeProviderError>,
    ) -> Result<T, FakeProviderError> {
        let mut state = self.lock();
        state.calls.push(call);
        op(&mut state)
    }
}

impl Provider for FakeProvider {
    type Error = FakeProviderError;

    fn list_instances<'a>(
        &'a self,
        filter: Option<&'a TagFilter>,
    ) -> ProviderFuture<'a, Vec<Instance>, Self::Error> {
        let result = self.record(ProviderCall::ListInstances(filter.cloned()), |state| {
            state.check(FailurePoint::ListInstances, "*")?;
            Ok(state
                .instances
                .iter()
                .filter(|instance| filter.is_none_or(|wanted| wanted.matches(&instance.tags)))
                .cloned()
                .collect())
        });
        Box::pin(ready(result))
    }

    fn list_volumes<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, Vec<Volume>, Self::Error> {
        let result = self.record(ProviderCall::ListVolumes(instance.id.clone()), |state| {
            state.check(FailurePoint::ListVolumes, &instance.id)?;
            Ok(state
                .volumes
                .iter()
                .filter(|volume| volume.instance_id == instance.id)
                .cloned()
                .collect())
        });
        Box::pin(ready(result))
    }

    fn list_snapshots<'a>(
        &'a self,
        volume: &'a Volume,
    ) -> ProviderFuture<'a, Vec<Snapshot>, Self::Error> {
        let result = self.record(ProviderCall::ListSnapshots(volume.id.clone()), |state| {
            state.check(FailurePoint::ListSnapshots, &volume.id)?;
            Ok(state
                .snapshots
                .iter()
                .filter(|snapshot| snapshot.volume_id == volume.id)
                .cloned()
                .collect())
        });
        Box::pin(ready(result))
    }

    fn stop<'a>(&'a self, instance: &'a Instance) -> ProviderFuture<'a, (), Self::Error> {
        let result = self.record(ProviderCall::Stop(instance.id.clone()), |state| {
            state.transition(FailurePoint::Stop, &instance.id, InstanceState::Stopped)
        });
        Box::pin(ready(result))
    }

    fn wait_until_stopped<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, (), Self::Error> {
        let result = self.record(ProviderCall::WaitUntilStopped(instance.id.clone()), |state| {
            state.expect_state(FailurePoint::WaitStopped, &instance.id, InstanceState::Stopped)
        });
        Box::pin(ready(result))
    }

    fn start<'a>(&'a self, instance: &'a Instance) -> ProviderFuture<'a, (), Self::Error> {
        let result = self.record(ProviderCall::Start(instance.id.clone()), |state| {
            state.transition(FailurePoint::Start, &instance.id, InstanceState::Running)
        });
        Box::pin(ready(result))
    }

    fn wait_until_running<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, (), Self::Error> {
        let result = self.record(ProviderCall::WaitUntilRunning(instance.id.clone()), |state| {
            state.expect_state(FailurePoint::WaitRunning, &instance.id, InstanceState::Running)
        });
        Box::pin(ready(result))
    }

    fn create_snapshot<'a>(
        &'a self,
        volume: &'a Volume,
        description: &'a str,
    ) -> ProviderFuture<'a, Snapshot, Self::Error> {
        let call = ProviderCall::CreateSnapshot {
            volume_id: volume.id.clone(),
            description: description.to_owned(),
        };
        let result = self.record(call, |state| {
            state.check(FailurePoint::CreateSnapshot, &volume.id)?;
            state.created += 1;
            let snapshot = Snapshot {
                id: format!("snap-{}-{}", volume.id, state.created),
                volume_id: volume.id.clone(),
                state: SnapshotState::Pending,
                started_at: String::from("2024-01-02T00:00:00Z"),
                progress: None,
            };
            state.snapshots.insert(0, snapshot.clone());
            Ok(snapshot)
        });
        Box::pin(ready(result))
    }
}

/// Observer that keeps every event for later assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<FleetEvent>>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events observed so far.
    #[must_use]
    pub fn events(&self) -> Vec<FleetEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FleetObserver for RecordingObserver {
    fn observe(&self, event: &FleetEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: AsyncMutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets `set` and removes `unset` while holding a global mutex.
    pub async fn scoped(set: &[(&str, &str)], unset: &[&str]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(set.len() + unset.len());
        for (key, value) in set {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
        }
        for key in unset {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::remove_var(key) };
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in self.previous.iter().rev() {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
