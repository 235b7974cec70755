//! Provider abstraction over instances, volumes, and snapshots.
//!
//! The fleet orchestrator only speaks to this trait, so the Scaleway
//! implementation and the in-memory fake used by tests are interchangeable.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::tags::{TagFilter, Tags};

/// Lifecycle state of an instance as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstanceState {
    /// Powered on.
    Running,
    /// Powered off.
    Stopped,
    /// Power-on in progress.
    Starting,
    /// Power-off in progress.
    Stopping,
    /// Any state `shotty` does not act on.
    Other(String),
}

impl InstanceState {
    /// Maps a provider state string onto a lifecycle state.
    #[must_use]
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim() {
            "running" => Self::Running,
            "stopped" | "stopped in place" => Self::Stopped,
            "starting" => Self::Starting,
            "stopping" => Self::Stopping,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the provider-facing name of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SnapshotState {
    /// The provider is still copying data.
    Pending,
    /// The snapshot is usable.
    Completed,
    /// The snapshot failed.
    Error,
    /// Any other provider state.
    Other(String),
}

impl SnapshotState {
    /// Maps a Scaleway snapshot state onto a lifecycle state.
    #[must_use]
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim() {
            "snapshotting" | "pending" => Self::Pending,
            "available" | "completed" => Self::Completed,
            "error" | "invalid_data" => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the display name of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute instance known to the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instance {
    /// Provider identifier.
    pub id: String,
    /// Availability zone.
    pub zone: String,
    /// Human-readable server name.
    pub name: String,
    /// Current lifecycle state.
    pub state: InstanceState,
    /// Commercial type (for example `DEV1-S`).
    pub instance_type: String,
    /// Public address, when one is assigned.
    pub public_address: Option<String>,
    /// Tags attached to the instance.
    pub tags: Tags,
}

/// Block-storage volume attached to an instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Volume {
    /// Provider identifier.
    pub id: String,
    /// Identifier of the owning instance.
    pub instance_id: String,
    /// Availability zone.
    pub zone: String,
    /// Provider volume state.
    pub state: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Provider volume type (for example `b_ssd`).
    pub volume_type: String,
}

/// Point-in-time copy of a volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// Provider identifier.
    pub id: String,
    /// Identifier of the source volume.
    pub volume_id: String,
    /// Lifecycle state.
    pub state: SnapshotState,
    /// Creation timestamp as reported by the provider.
    pub started_at: String,
    /// Completion percentage, when the provider reports one.
    pub progress: Option<u8>,
}

impl Snapshot {
    /// Returns `true` when the snapshot is still being taken.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == SnapshotState::Pending
    }
}

/// Future returned by provider operations.
pub type ProviderFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Operations the fleet orchestrator needs from a cloud provider.
///
/// Waits block until the post-condition holds; polling cadence and timeouts
/// belong to the implementation.
pub trait Provider {
    /// Provider specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists instances, restricted to those matching `filter` when given.
    fn list_instances<'a>(
        &'a self,
        filter: Option<&'a TagFilter>,
    ) -> ProviderFuture<'a, Vec<Instance>, Self::Error>;

    /// Lists the volumes attached to `instance`.
    fn list_volumes<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, Vec<Volume>, Self::Error>;

    /// Lists the snapshots of `volume`, newest first.
    fn list_snapshots<'a>(
        &'a self,
        volume: &'a Volume,
    ) -> ProviderFuture<'a, Vec<Snapshot>, Self::Error>;

    /// Returns the newest snapshot of `volume`, if any.
    ///
    /// Defaults to the head of [`Provider::list_snapshots`]; implementations
    /// that can ask for a single item should override it.
    fn latest_snapshot<'a>(
        &'a self,
        volume: &'a Volume,
    ) -> ProviderFuture<'a, Option<Snapshot>, Self::Error> {
        let snapshots = self.list_snapshots(volume);
        Box::pin(async move { Ok(snapshots.await?.into_iter().next()) })
    }

    /// Requests a power-off.
    fn stop<'a>(&'a self, instance: &'a Instance) -> ProviderFuture<'a, (), Self::Error>;

    /// Blocks until the instance reports a stopped state.
    fn wait_until_stopped<'a>(&'a self, instance: &'a Instance)
    -> ProviderFuture<'a, (), Self::Error>;

    /// Requests a power-on.
    fn start<'a>(&'a self, instance: &'a Instance) -> ProviderFuture<'a, (), Self::Error>;

    /// Blocks until the instance reports a running state.
    fn wait_until_running<'a>(&'a self, instance: &'a Instance)
    -> ProviderFuture<'a, (), Self::Error>;

    /// Requests a new snapshot of `volume` labelled with `description`.
    fn create_snapshot<'a>(
        &'a self,
        volume: &'a Volume,
        description: &'a str,
    ) -> ProviderFuture<'a, Snapshot, Self::Error>;
}
