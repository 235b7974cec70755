//! Stop, snapshot, and restart workflow.

use tracing::{info, warn};

use crate::provider::{Instance, Provider, Snapshot, Volume};

use super::events::{FleetEvent, FleetObserver};
use super::power::instance_failed;
use super::report::{BatchReport, InstanceOutcome, Stage, VolumeOutcome};
use super::{Fleet, FleetAction, FleetError};

/// Description attached to every snapshot this tool requests.
pub const SNAPSHOT_DESCRIPTION: &str = "Created by shotty";

impl<P: Provider> Fleet<P> {
    /// Snapshots every volume of every instance in scope.
    ///
    /// Each instance is stopped and waited on, its volumes are snapshotted
    /// unless their newest snapshot is still pending, and it is started and
    /// waited on again. An instance that fails to stop is not snapshotted.
    /// Once stopped, an instance is always restarted, even when some of its
    /// volumes failed.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::MissingScope`] for an unforced unscoped call and
    /// [`FleetError::Provider`] when the instances cannot be listed.
    /// Per-instance and per-volume failures are recorded in the report.
    pub async fn create_snapshots<O>(
        &self,
        project: Option<&str>,
        force: bool,
        observer: &O,
    ) -> Result<BatchReport, FleetError<P::Error>>
    where
        O: FleetObserver + ?Sized,
    {
        let scope = self.guarded_scope(project, force, FleetAction::Snapshot)?;
        let instances = self.resolve(&scope).await?;

        let mut report = BatchReport::default();
        for instance in &instances {
            report.push(self.snapshot_instance(instance, observer).await);
        }

        info!(summary = %report, "snapshot batch finished");
        Ok(report)
    }

    /// Returns the newest snapshot of `volume` when it is still pending.
    ///
    /// Older snapshots are not inspected.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the snapshots cannot be listed.
    pub async fn pending_snapshot(&self, volume: &Volume) -> Result<Option<Snapshot>, P::Error> {
        let newest = self.provider.latest_snapshot(volume).await?;
        Ok(newest.filter(Snapshot::is_pending))
    }

    async fn snapshot_instance<O>(&self, instance: &Instance, observer: &O) -> InstanceOutcome
    where
        O: FleetObserver + ?Sized,
    {
        let mut outcome = InstanceOutcome::new(instance.id.as_str());
        if let Err(failure) = self.power_off(instance, true, observer).await {
            outcome.failures.push(failure);
            return outcome;
        }

        match self.provider.list_volumes(instance).await {
            Ok(volumes) => {
                for volume in &volumes {
                    outcome
                        .volumes
                        .push(self.snapshot_volume(volume, observer).await);
                }
            }
            Err(err) => {
                outcome
                    .failures
                    .push(instance_failed(instance, Stage::ListVolumes, &err, observer));
            }
        }

        if let Err(failure) = self.power_on(instance, true, observer).await {
            outcome.failures.push(failure);
        }
        outcome
    }

    async fn snapshot_volume<O>(&self, volume: &Volume, observer: &O) -> VolumeOutcome
    where
        O: FleetObserver + ?Sized,
    {
        match self.pending_snapshot(volume).await {
            Ok(Some(pending)) => {
                observer.observe(&FleetEvent::SkippingVolume {
                    volume_id: volume.id.clone(),
                    snapshot_id: pending.id.clone(),
                });
                return VolumeOutcome::Skipped {
                    volume_id: volume.id.clone(),
                    snapshot_id: pending.id,
                };
            }
            Ok(None) => {}
            Err(err) => return volume_failed(volume, &err, observer),
        }

        observer.observe(&FleetEvent::CreatingSnapshot {
            volume_id: volume.id.clone(),
        });
        match self
            .provider
            .create_snapshot(volume, SNAPSHOT_DESCRIPTION)
            .await
        {
            Ok(snapshot) => VolumeOutcome::Created {
                volume_id: volume.id.clone(),
                snapshot_id: snapshot.id,
            },
            Err(err) => volume_failed(volume, &err, observer),
        }
    }
}

fn volume_failed<O>(volume: &Volume, error: &dyn std::error::Error, observer: &O) -> VolumeOutcome
where
    O: FleetObserver + ?Sized,
{
    let message = error.to_string();
    warn!(
        volume_id = %volume.id,
        instance_id = %volume.instance_id,
        error = %message,
        "snapshot step failed; continuing with the next volume"
    );
    observer.observe(&FleetEvent::VolumeFailed {
        volume_id: volume.id.clone(),
        message: message.clone(),
    });
    VolumeOutcome::Failed {
        volume_id: volume.id.clone(),
        message,
    }
}
