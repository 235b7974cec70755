//! Wire types for the Scaleway Instances API and their domain mappings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::provider::{Instance, InstanceState, Snapshot, SnapshotState, Volume};
use crate::tags::Tags;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct ServersPage {
    pub(super) servers: Vec<ServerDto>,
    #[serde(default)]
    pub(super) total_count: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct ServerEnvelope {
    pub(super) server: ServerDto,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct ServerDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) name: String,
    pub(super) state: String,
    #[serde(default)]
    pub(super) commercial_type: String,
    #[serde(default)]
    pub(super) zone: Option<String>,
    #[serde(default)]
    pub(super) tags: Vec<String>,
    #[serde(default)]
    pub(super) public_ip: Option<PublicIpDto>,
    #[serde(default)]
    pub(super) volumes: HashMap<String, ServerVolumeDto>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct PublicIpDto {
    pub(super) address: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct ServerVolumeDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) state: String,
    #[serde(default)]
    pub(super) size: u64,
    #[serde(default)]
    pub(super) volume_type: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct SnapshotsPage {
    pub(super) snapshots: Vec<SnapshotDto>,
    #[serde(default)]
    pub(super) total_count: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct SnapshotEnvelope {
    pub(super) snapshot: SnapshotDto,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct SnapshotDto {
    pub(super) id: String,
    pub(super) state: String,
    #[serde(default)]
    pub(super) creation_date: Option<String>,
    #[serde(default)]
    pub(super) base_volume: Option<BaseVolumeDto>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct BaseVolumeDto {
    pub(super) id: String,
}

#[derive(Clone, Debug, Serialize)]
pub(super) struct CreateSnapshotRequest {
    pub(super) name: String,
    pub(super) volume_id: String,
    pub(super) project: String,
    pub(super) tags: Vec<String>,
}

impl ServerDto {
    /// Converts the wire server into a domain instance. `fallback_zone` is
    /// used when the API omits the zone field.
    pub(super) fn into_instance(self, fallback_zone: &str) -> Instance {
        Instance {
            zone: self.zone.unwrap_or_else(|| fallback_zone.to_owned()),
            state: InstanceState::from_provider(&self.state),
            tags: Tags::from_labels(&self.tags),
            public_address: self.public_ip.map(|ip| ip.address),
            instance_type: self.commercial_type,
            name: self.name,
            id: self.id,
        }
    }

    /// Returns the attached volumes ordered by slot index.
    pub(super) fn into_volumes(self, fallback_zone: &str) -> Vec<Volume> {
        let zone = self.zone.unwrap_or_else(|| fallback_zone.to_owned());
        let mut slots: Vec<(u32, ServerVolumeDto)> = self
            .volumes
            .into_iter()
            .map(|(slot, volume)| (slot.parse().unwrap_or(u32::MAX), volume))
            .collect();
        slots.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0).then_with(|| lhs.1.id.cmp(&rhs.1.id)));
        slots
            .into_iter()
            .map(|(_, volume)| Volume {
                id: volume.id,
                instance_id: self.id.clone(),
                zone: zone.clone(),
                state: volume.state,
                size_bytes: volume.size,
                volume_type: volume.volume_type,
            })
            .collect()
    }
}

impl SnapshotDto {
    /// Converts the wire snapshot, attributing it to `volume_id` when the API
    /// omits the base volume.
    pub(super) fn into_snapshot(self, volume_id: &str) -> Snapshot {
        let state = SnapshotState::from_provider(&self.state);
        let progress = (state == SnapshotState::Completed).then_some(100);
        Snapshot {
            volume_id: self
                .base_volume
                .map_or_else(|| volume_id.to_owned(), |base| base.id),
            started_at: self.creation_date.unwrap_or_default(),
            id: self.id,
            state,
            progress,
        }
    }
}

/// Orders snapshots newest first by creation date.
pub(super) fn newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|lhs, rhs| rhs.started_at.cmp(&lhs.started_at));
}
