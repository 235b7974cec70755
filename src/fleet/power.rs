//! Power transitions for instances in scope.

use tracing::{info, warn};

use crate::provider::{Instance, Provider};

use super::events::{FleetEvent, FleetObserver};
use super::report::{BatchReport, InstanceFailure, InstanceOutcome, Stage};
use super::{Fleet, FleetError, PowerAction};

impl<P: Provider> Fleet<P> {
    /// Starts, stops, or reboots every instance in scope.
    ///
    /// `wait` makes start and stop block until the target state is reached;
    /// reboot always waits for both transitions.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::MissingScope`] for an unforced unscoped call and
    /// [`FleetError::Provider`] when the instances cannot be listed.
    /// Per-instance failures are recorded in the report instead.
    pub async fn set_power<O>(
        &self,
        project: Option<&str>,
        force: bool,
        action: PowerAction,
        wait: bool,
        observer: &O,
    ) -> Result<BatchReport, FleetError<P::Error>>
    where
        O: FleetObserver + ?Sized,
    {
        let scope = self.guarded_scope(project, force, action.into())?;
        let instances = self.resolve(&scope).await?;

        let mut report = BatchReport::default();
        for instance in &instances {
            let mut outcome = InstanceOutcome::new(instance.id.as_str());
            let result = match action {
                PowerAction::Start => self.power_on(instance, wait, observer).await,
                PowerAction::Stop => self.power_off(instance, wait, observer).await,
                PowerAction::Reboot => match self.power_off(instance, true, observer).await {
                    Ok(()) => self.power_on(instance, true, observer).await,
                    Err(failure) => Err(failure),
                },
            };
            if let Err(failure) = result {
                outcome.failures.push(failure);
            }
            report.push(outcome);
        }

        info!(?action, summary = %report, "power batch finished");
        Ok(report)
    }

    pub(super) async fn power_off<O>(
        &self,
        instance: &Instance,
        wait: bool,
        observer: &O,
    ) -> Result<(), InstanceFailure>
    where
        O: FleetObserver + ?Sized,
    {
        observer.observe(&FleetEvent::Stopping {
            instance_id: instance.id.clone(),
        });
        if let Err(err) = self.provider.stop(instance).await {
            return Err(instance_failed(instance, Stage::Stop, &err, observer));
        }
        if wait && let Err(err) = self.provider.wait_until_stopped(instance).await {
            return Err(instance_failed(instance, Stage::WaitStopped, &err, observer));
        }
        Ok(())
    }

    pub(super) async fn power_on<O>(
        &self,
        instance: &Instance,
        wait: bool,
        observer: &O,
    ) -> Result<(), InstanceFailure>
    where
        O: FleetObserver + ?Sized,
    {
        observer.observe(&FleetEvent::Starting {
            instance_id: instance.id.clone(),
        });
        if let Err(err) = self.provider.start(instance).await {
            return Err(instance_failed(instance, Stage::Start, &err, observer));
        }
        if wait && let Err(err) = self.provider.wait_until_running(instance).await {
            return Err(instance_failed(instance, Stage::WaitRunning, &err, observer));
        }
        Ok(())
    }
}

pub(super) fn instance_failed<O>(
    instance: &Instance,
    stage: Stage,
    error: &dyn std::error::Error,
    observer: &O,
) -> InstanceFailure
where
    O: FleetObserver + ?Sized,
{
    let failure = InstanceFailure::new(stage, &error);
    warn!(
        instance_id = %instance.id,
        stage = %stage,
        error = %failure.message,
        "instance step failed; continuing with the batch"
    );
    observer.observe(&FleetEvent::InstanceFailed {
        instance_id: instance.id.clone(),
        stage,
        message: failure.message.clone(),
    });
    failure
}
