//! Server, volume, and snapshot listing against the Instances API.

use tracing::debug;

use crate::provider::{Instance, Snapshot, Volume};
use crate::tags::TagFilter;

use super::http::{has_more_pages, zone_url};
use super::types::{ServerEnvelope, ServersPage, SnapshotsPage, newest_first};
use super::{ScalewayProvider, ScalewayProviderError};

const PAGE_SIZE: usize = 100;

impl ScalewayProvider {
    /// Lists servers in the configured project and zone.
    ///
    /// The filter is passed to the API as a tag query and re-checked against
    /// the parsed tags, since the API matches raw labels.
    pub(super) async fn fetch_instances(
        &self,
        filter: Option<&TagFilter>,
    ) -> Result<Vec<Instance>, ScalewayProviderError> {
        let zone = self.config.default_zone.as_str();
        let url = zone_url(zone, "servers");
        let mut servers = Vec::new();

        for page in 1_u32.. {
            let mut query = vec![
                ("project", self.config.default_project_id.clone()),
                ("page", page.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
            ];
            if let Some(wanted) = filter {
                query.push(("tags", wanted.as_label()));
            }

            let batch: ServersPage = self.get_json(&url, &query, "servers").await?;
            let received = batch.servers.len();
            servers.extend(batch.servers);
            if !has_more_pages(servers.len(), received, batch.total_count) {
                break;
            }
        }

        let instances: Vec<Instance> = servers
            .into_iter()
            .map(|server| server.into_instance(zone))
            .filter(|instance| filter.is_none_or(|wanted| wanted.matches(&instance.tags)))
            .collect();
        debug!(zone, count = instances.len(), "listed servers");
        Ok(instances)
    }

    pub(super) async fn fetch_volumes(
        &self,
        instance: &Instance,
    ) -> Result<Vec<Volume>, ScalewayProviderError> {
        let url = zone_url(&instance.zone, &format!("servers/{}", instance.id));
        let envelope: ServerEnvelope = self.get_json(&url, &[], "server").await?;
        Ok(envelope.server.into_volumes(&instance.zone))
    }

    pub(super) async fn fetch_snapshots(
        &self,
        volume: &Volume,
    ) -> Result<Vec<Snapshot>, ScalewayProviderError> {
        let url = zone_url(&volume.zone, "snapshots");
        let mut snapshots = Vec::new();

        for page in 1_u32.. {
            let query = snapshot_query(&volume.id, page, PAGE_SIZE);
            let batch: SnapshotsPage = self.get_json(&url, &query, "snapshots").await?;
            let received = batch.snapshots.len();
            snapshots.extend(
                batch
                    .snapshots
                    .into_iter()
                    .map(|snapshot| snapshot.into_snapshot(&volume.id)),
            );
            if !has_more_pages(snapshots.len(), received, batch.total_count) {
                break;
            }
        }

        newest_first(&mut snapshots);
        Ok(snapshots)
    }

    /// Fetches only the newest snapshot of `volume`.
    pub(super) async fn fetch_latest_snapshot(
        &self,
        volume: &Volume,
    ) -> Result<Option<Snapshot>, ScalewayProviderError> {
        let url = zone_url(&volume.zone, "snapshots");
        let query = snapshot_query(&volume.id, 1, 1);
        let batch: SnapshotsPage = self.get_json(&url, &query, "snapshots").await?;
        Ok(batch
            .snapshots
            .into_iter()
            .next()
            .map(|snapshot| snapshot.into_snapshot(&volume.id)))
    }
}

/// Query for one page of a volume's snapshots, newest first.
pub(super) fn snapshot_query(
    volume_id: &str,
    page: u32,
    per_page: usize,
) -> [(&'static str, String); 4] {
    [
        ("base_volume_id", volume_id.to_owned()),
        ("order", String::from("creation_date_desc")),
        ("page", page.to_string()),
        ("per_page", per_page.to_string()),
    ]
}
