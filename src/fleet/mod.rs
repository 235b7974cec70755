//! Project-scoped operations over a provider's instances.
//!
//! Every bulk mutation goes through a scope guard: without a project filter
//! the caller must pass `force`, otherwise the operation stops before the
//! provider is contacted. Per-instance failures are recorded in a
//! [`BatchReport`] and never abort the rest of the batch.

mod events;
mod listing;
mod power;
mod report;
mod snapshot;

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::provider::{Instance, Provider, Volume};
use crate::tags::TagFilter;

pub use events::{FleetEvent, FleetObserver, NoopObserver};
pub use listing::{InstanceRow, SnapshotRow, VolumeRow, visible_snapshots};
pub use report::{BatchReport, InstanceFailure, InstanceOutcome, Stage, VolumeOutcome};
pub use snapshot::SNAPSHOT_DESCRIPTION;

/// Tag key holding the project name unless configured otherwise.
pub const DEFAULT_PROJECT_TAG: &str = "Name";

/// Tag key holding the resource owner unless configured otherwise.
pub const DEFAULT_OWNER_TAG: &str = "owner";

/// Operation named in guard errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FleetAction {
    /// `instances list`.
    List,
    /// `instances start`.
    Start,
    /// `instances stop`.
    Stop,
    /// `instances reboot`.
    Reboot,
    /// `instances snapshot`.
    Snapshot,
}

impl fmt::Display for FleetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::List => "list",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reboot => "reboot",
            Self::Snapshot => "snapshot",
        };
        f.write_str(verb)
    }
}

/// Power transition requested by `instances start|stop|reboot`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerAction {
    /// Power on.
    Start,
    /// Power off.
    Stop,
    /// Power off, wait, power on, wait.
    Reboot,
}

impl From<PowerAction> for FleetAction {
    fn from(value: PowerAction) -> Self {
        match value {
            PowerAction::Start => Self::Start,
            PowerAction::Stop => Self::Stop,
            PowerAction::Reboot => Self::Reboot,
        }
    }
}

/// Raised when a bulk operation has neither a project filter nor `force`.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error(
    "refusing to {action} every instance: pass --project NAME to scope the command, \
     or --force to target all instances"
)]
pub struct MissingScope {
    /// Operation that was refused.
    pub action: FleetAction,
}

/// Errors that end a fleet operation before or while resolving targets.
#[derive(Debug, Error)]
pub enum FleetError<E>
where
    E: std::error::Error + 'static,
{
    /// The scope guard refused the operation.
    #[error(transparent)]
    MissingScope(#[from] MissingScope),
    /// Raised when the provider cannot list a resource.
    #[error("failed to list {resource}: {source}")]
    Provider {
        /// Resource being listed.
        resource: &'static str,
        /// Provider error.
        #[source]
        source: E,
    },
}

/// Tag keys used to interpret instance tags.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FleetSettings {
    /// Tag whose value names the project.
    pub project_tag: String,
    /// Tag whose value names the resource owner.
    pub owner_tag: String,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            project_tag: String::from(DEFAULT_PROJECT_TAG),
            owner_tag: String::from(DEFAULT_OWNER_TAG),
        }
    }
}

/// Instance selection derived from the `--project` option.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scope {
    filter: Option<TagFilter>,
}

impl Scope {
    /// Builds the scope for `project` matched against `project_tag`. Blank
    /// project names count as absent.
    #[must_use]
    pub fn new(project: Option<&str>, project_tag: &str) -> Self {
        let filter = project
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| TagFilter::new(project_tag, name));
        Self { filter }
    }

    /// Keeps the scope when it names a project or `force` is set.
    ///
    /// # Errors
    ///
    /// Returns [`MissingScope`] for an unscoped, unforced `action`.
    pub fn require(self, force: bool, action: FleetAction) -> Result<Self, MissingScope> {
        if self.filter.is_none() && !force {
            return Err(MissingScope { action });
        }
        Ok(self)
    }

    /// Returns the tag filter, or `None` when every instance is targeted.
    #[must_use]
    pub const fn filter(&self) -> Option<&TagFilter> {
        self.filter.as_ref()
    }
}

/// Runs listing, power, and snapshot workflows against a provider.
#[derive(Clone, Debug)]
pub struct Fleet<P> {
    provider: P,
    settings: FleetSettings,
}

impl<P: Provider> Fleet<P> {
    /// Creates an orchestrator over `provider`.
    #[must_use]
    pub const fn new(provider: P, settings: FleetSettings) -> Self {
        Self { provider, settings }
    }

    /// Returns the wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Builds the scope for `project`; blank names count as absent.
    #[must_use]
    pub fn scope(&self, project: Option<&str>) -> Scope {
        Scope::new(project, &self.settings.project_tag)
    }

    /// Builds the scope for a bulk operation, refusing an unscoped run unless
    /// `force` is set.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::MissingScope`] when no project is given and
    /// `force` is false.
    pub fn guarded_scope(
        &self,
        project: Option<&str>,
        force: bool,
        action: FleetAction,
    ) -> Result<Scope, FleetError<P::Error>> {
        self.scope(project)
            .require(force, action)
            .map_err(FleetError::from)
    }

    /// Lists instances with their owner and project tags.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::MissingScope`] for an unforced unscoped call and
    /// [`FleetError::Provider`] when listing fails.
    pub async fn list_instances(
        &self,
        project: Option<&str>,
        force: bool,
    ) -> Result<Vec<InstanceRow>, FleetError<P::Error>> {
        let scope = self.guarded_scope(project, force, FleetAction::List)?;
        let instances = self.resolve(&scope).await?;
        Ok(instances
            .into_iter()
            .map(|instance| {
                InstanceRow::new(
                    instance,
                    &self.settings.owner_tag,
                    &self.settings.project_tag,
                )
            })
            .collect())
    }

    /// Lists the volumes of every instance in scope.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Provider`] when any listing fails.
    pub async fn list_volumes(
        &self,
        project: Option<&str>,
    ) -> Result<Vec<VolumeRow>, FleetError<P::Error>> {
        let mut rows = Vec::new();
        for instance in self.resolve(&self.scope(project)).await? {
            let volumes = self.volumes_of(&instance).await?;
            rows.extend(volumes.into_iter().map(VolumeRow::from));
        }
        Ok(rows)
    }

    /// Lists snapshots per volume for every instance in scope.
    ///
    /// Unless `all` is set, each volume lists snapshots only up to and
    /// including its newest completed one.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Provider`] when any listing fails.
    pub async fn list_snapshots(
        &self,
        project: Option<&str>,
        all: bool,
    ) -> Result<Vec<SnapshotRow>, FleetError<P::Error>> {
        let mut rows = Vec::new();
        for instance in self.resolve(&self.scope(project)).await? {
            for volume in self.volumes_of(&instance).await? {
                let snapshots = self
                    .provider
                    .list_snapshots(&volume)
                    .await
                    .map_err(|source| FleetError::Provider {
                        resource: "snapshots",
                        source,
                    })?;
                rows.extend(
                    visible_snapshots(&snapshots, all)
                        .iter()
                        .map(|snapshot| SnapshotRow::new(snapshot, &instance.id)),
                );
            }
        }
        Ok(rows)
    }

    async fn resolve(&self, scope: &Scope) -> Result<Vec<Instance>, FleetError<P::Error>> {
        let instances = self
            .provider
            .list_instances(scope.filter())
            .await
            .map_err(|source| FleetError::Provider {
                resource: "instances",
                source,
            })?;
        debug!(
            count = instances.len(),
            filter = ?scope.filter(),
            "resolved target instances"
        );
        Ok(instances)
    }

    async fn volumes_of(
        &self,
        instance: &Instance,
    ) -> Result<Vec<Volume>, FleetError<P::Error>> {
        self.provider
            .list_volumes(instance)
            .await
            .map_err(|source| FleetError::Provider {
                resource: "volumes",
                source,
            })
    }
}
