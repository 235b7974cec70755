//! Batch outcomes returned by mutating fleet operations.

use std::fmt;

/// Step of the per-instance workflow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Power-off request.
    Stop,
    /// Waiting for the stopped state.
    WaitStopped,
    /// Listing the instance's volumes.
    ListVolumes,
    /// Power-on request.
    Start,
    /// Waiting for the running state.
    WaitRunning,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stop => "stop",
            Self::WaitStopped => "wait for stopped state on",
            Self::ListVolumes => "list volumes of",
            Self::Start => "start",
            Self::WaitRunning => "wait for running state on",
        };
        f.write_str(label)
    }
}

/// A failed step for one instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceFailure {
    /// Step that failed.
    pub stage: Stage,
    /// Provider error message.
    pub message: String,
}

impl InstanceFailure {
    /// Builds a failure from a provider error.
    #[must_use]
    pub fn new(stage: Stage, error: &impl fmt::Display) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

/// Result of the snapshot step for one volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VolumeOutcome {
    /// A new snapshot was requested.
    Created {
        /// Source volume.
        volume_id: String,
        /// Snapshot returned by the provider.
        snapshot_id: String,
    },
    /// The newest snapshot was still pending, so none was requested.
    Skipped {
        /// Source volume.
        volume_id: String,
        /// Pending snapshot.
        snapshot_id: String,
    },
    /// Listing or creating snapshots failed.
    Failed {
        /// Source volume.
        volume_id: String,
        /// Provider error message.
        message: String,
    },
}

impl VolumeOutcome {
    /// Returns the volume this outcome refers to.
    #[must_use]
    pub fn volume_id(&self) -> &str {
        match self {
            Self::Created { volume_id, .. }
            | Self::Skipped { volume_id, .. }
            | Self::Failed { volume_id, .. } => volume_id,
        }
    }
}

/// Everything that happened to one instance during a batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceOutcome {
    /// Target instance.
    pub instance_id: String,
    /// Per-volume snapshot outcomes (empty for power operations).
    pub volumes: Vec<VolumeOutcome>,
    /// Failed steps, in the order they happened.
    pub failures: Vec<InstanceFailure>,
}

impl InstanceOutcome {
    /// Starts an empty outcome for `instance_id`.
    #[must_use]
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            volumes: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Returns `true` when any step or volume failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
            || self
                .volumes
                .iter()
                .any(|volume| matches!(volume, VolumeOutcome::Failed { .. }))
    }
}

/// Outcome of a whole batch, one entry per targeted instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchReport {
    /// Per-instance outcomes in processing order.
    pub instances: Vec<InstanceOutcome>,
}

impl BatchReport {
    /// Appends an instance outcome.
    pub fn push(&mut self, outcome: InstanceOutcome) {
        self.instances.push(outcome);
    }

    /// Instances with at least one failure.
    pub fn failed_instances(&self) -> impl Iterator<Item = &InstanceOutcome> {
        self.instances
            .iter()
            .filter(|outcome| outcome.has_failures())
    }

    /// Snapshots requested during the batch.
    pub fn created(&self) -> impl Iterator<Item = &VolumeOutcome> {
        self.volumes()
            .filter(|volume| matches!(volume, VolumeOutcome::Created { .. }))
    }

    /// Volumes skipped because a snapshot was already pending.
    pub fn skipped(&self) -> impl Iterator<Item = &VolumeOutcome> {
        self.volumes()
            .filter(|volume| matches!(volume, VolumeOutcome::Skipped { .. }))
    }

    /// Returns `true` when nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_instances().next().is_none()
    }

    fn volumes(&self) -> impl Iterator<Item = &VolumeOutcome> {
        self.instances
            .iter()
            .flat_map(|outcome| outcome.volumes.iter())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instances={}, snapshots_created={}, volumes_skipped={}, failed_instances={}",
            self.instances.len(),
            self.created().count(),
            self.skipped().count(),
            self.failed_instances().count()
        )
    }
}
