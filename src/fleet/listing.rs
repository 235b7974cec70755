//! Read-only inventory rows.

use std::fmt;

use crate::provider::{Instance, InstanceState, Snapshot, SnapshotState, Volume};

const BYTES_PER_GB: u64 = 1_000_000_000;
const NO_OWNER: &str = "<no resource owner>";
const NO_PROJECT: &str = "<no project>";
const NO_ADDRESS: &str = "-";

/// One line of `instances list`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceRow {
    /// Instance identifier.
    pub id: String,
    /// Commercial type.
    pub instance_type: String,
    /// Availability zone.
    pub zone: String,
    /// Lifecycle state.
    pub state: InstanceState,
    /// Public address, if any.
    pub public_address: Option<String>,
    /// Value of the owner tag.
    pub owner: Option<String>,
    /// Value of the project tag.
    pub project: Option<String>,
}

impl InstanceRow {
    pub(super) fn new(instance: Instance, owner_tag: &str, project_tag: &str) -> Self {
        let owner = instance.tags.get(owner_tag).map(str::to_owned);
        let project = instance.tags.get(project_tag).map(str::to_owned);
        Self {
            id: instance.id,
            instance_type: instance.instance_type,
            zone: instance.zone,
            state: instance.state,
            public_address: instance.public_address,
            owner,
            project,
        }
    }
}

impl fmt::Display for InstanceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}",
            self.id,
            self.instance_type,
            self.zone,
            self.state,
            self.public_address.as_deref().unwrap_or(NO_ADDRESS),
            self.owner.as_deref().unwrap_or(NO_OWNER),
            self.project.as_deref().unwrap_or(NO_PROJECT),
        )
    }
}

/// One line of `volumes list`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeRow {
    /// Volume identifier.
    pub volume_id: String,
    /// Owning instance.
    pub instance_id: String,
    /// Provider volume state.
    pub state: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Provider volume type.
    pub volume_type: String,
}

impl From<Volume> for VolumeRow {
    fn from(volume: Volume) -> Self {
        Self {
            volume_id: volume.id,
            instance_id: volume.instance_id,
            state: volume.state,
            size_bytes: volume.size_bytes,
            volume_type: volume.volume_type,
        }
    }
}

impl fmt::Display for VolumeRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}GB, {}",
            self.volume_id,
            self.instance_id,
            self.state,
            self.size_bytes.div_euclid(BYTES_PER_GB),
            self.volume_type
        )
    }
}

/// One line of `snapshots list`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SnapshotRow {
    /// Snapshot identifier.
    pub snapshot_id: String,
    /// Source volume.
    pub volume_id: String,
    /// Instance the volume is attached to.
    pub instance_id: String,
    /// Lifecycle state.
    pub state: SnapshotState,
    /// Completion percentage, if reported.
    pub progress: Option<u8>,
    /// Creation timestamp.
    pub started_at: String,
}

impl SnapshotRow {
    pub(super) fn new(snapshot: &Snapshot, instance_id: &str) -> Self {
        Self {
            snapshot_id: snapshot.id.clone(),
            volume_id: snapshot.volume_id.clone(),
            instance_id: instance_id.to_owned(),
            state: snapshot.state.clone(),
            progress: snapshot.progress,
            started_at: snapshot.started_at.clone(),
        }
    }
}

impl fmt::Display for SnapshotRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, ",
            self.snapshot_id, self.volume_id, self.instance_id, self.state
        )?;
        match self.progress {
            Some(percent) => write!(f, "{percent}%")?,
            None => f.write_str(NO_ADDRESS)?,
        }
        write!(f, ", {}", self.started_at)
    }
}

/// Snapshots shown for one volume.
///
/// `snapshots` must be ordered newest first. Unless `all` is set the listing
/// stops after the first completed snapshot, which is included.
#[must_use]
pub fn visible_snapshots(snapshots: &[Snapshot], all: bool) -> &[Snapshot] {
    if all {
        return snapshots;
    }
    let end = snapshots
        .iter()
        .position(|snapshot| snapshot.state == SnapshotState::Completed)
        .map_or(snapshots.len(), |index| index + 1);
    snapshots.get(..end).unwrap_or(snapshots)
}
