//! Progress events emitted while a batch runs.

use std::fmt;

use super::report::Stage;

/// Progress notification for a single step of a batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FleetEvent {
    /// A power-off is about to be requested.
    Stopping {
        /// Target instance.
        instance_id: String,
    },
    /// A power-on is about to be requested.
    Starting {
        /// Target instance.
        instance_id: String,
    },
    /// A snapshot is about to be requested.
    CreatingSnapshot {
        /// Source volume.
        volume_id: String,
    },
    /// The volume already has a snapshot in progress.
    SkippingVolume {
        /// Source volume.
        volume_id: String,
        /// Snapshot that is still pending.
        snapshot_id: String,
    },
    /// An instance step failed; the batch moves on.
    InstanceFailed {
        /// Target instance.
        instance_id: String,
        /// Step that failed.
        stage: Stage,
        /// Provider error message.
        message: String,
    },
    /// Snapshotting a volume failed; remaining volumes are still processed.
    VolumeFailed {
        /// Source volume.
        volume_id: String,
        /// Provider error message.
        message: String,
    },
}

impl fmt::Display for FleetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopping { instance_id } => write!(f, "Stopping {instance_id}..."),
            Self::Starting { instance_id } => write!(f, "Starting {instance_id}..."),
            Self::CreatingSnapshot { volume_id } => {
                write!(f, "  Creating snapshot of {volume_id}")
            }
            Self::SkippingVolume {
                volume_id,
                snapshot_id,
            } => write!(
                f,
                "  Skipping {volume_id}, snapshot {snapshot_id} already in progress"
            ),
            Self::InstanceFailed {
                instance_id,
                stage,
                message,
            } => write!(f, "  Could not {stage} {instance_id}: {message}"),
            Self::VolumeFailed { volume_id, message } => {
                write!(f, "  Could not snapshot {volume_id}: {message}")
            }
        }
    }
}

/// Receives progress events from fleet operations.
pub trait FleetObserver {
    /// Called once per event, in the order the steps run.
    fn observe(&self, event: &FleetEvent);
}

/// Observer that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl FleetObserver for NoopObserver {
    fn observe(&self, _event: &FleetEvent) {}
}
