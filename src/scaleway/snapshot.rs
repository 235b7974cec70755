//! Snapshot creation for the Scaleway provider.

use uuid::Uuid;

use crate::provider::{Snapshot, Volume};

use super::http::zone_url;
use super::types::{CreateSnapshotRequest, SnapshotEnvelope};
use super::{ScalewayProvider, ScalewayProviderError};

/// Tag marking snapshots requested by this tool.
pub(super) const CREATED_BY_TAG: &str = "created-by=shotty";

impl ScalewayProvider {
    pub(super) fn snapshot_request(
        &self,
        volume: &Volume,
        description: &str,
    ) -> CreateSnapshotRequest {
        CreateSnapshotRequest {
            name: format!("shotty-{}-{}", volume.id, Uuid::new_v4().simple()),
            volume_id: volume.id.clone(),
            project: self.config.default_project_id.clone(),
            tags: vec![
                String::from(CREATED_BY_TAG),
                format!("description={description}"),
            ],
        }
    }

    pub(super) async fn request_snapshot(
        &self,
        volume: &Volume,
        description: &str,
    ) -> Result<Snapshot, ScalewayProviderError> {
        let url = zone_url(&volume.zone, "snapshots");
        let payload = self.snapshot_request(volume, description);
        let envelope: SnapshotEnvelope = self.post_json(&url, &payload, "snapshot").await?;
        Ok(envelope.snapshot.into_snapshot(&volume.id))
    }
}
