//! Power actions and state waits for the Scaleway provider.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::debug;

use crate::provider::{Instance, InstanceState};

use super::{ScalewayProvider, ScalewayProviderError};

const ACTION_POWER_ON: &str = "poweron";
const ACTION_POWER_OFF: &str = "poweroff";

impl ScalewayProvider {
    /// Fetches the live state of an instance, or `None` once it is gone.
    pub(super) async fn fetch_state(
        &self,
        instance: &Instance,
    ) -> Result<Option<InstanceState>, ScalewayProviderError> {
        let mut servers = self
            .api
            .list_instances(&instance.zone)
            .servers(&instance.id)
            .per_page(1)
            .run_async()
            .await?;

        Ok(servers
            .pop()
            .map(|server| InstanceState::from_provider(&server.state)))
    }

    async fn power_action(
        &self,
        instance: &Instance,
        action: &'static str,
        settled: &InstanceState,
    ) -> Result<(), ScalewayProviderError> {
        perform_unless(
            instance,
            action,
            settled,
            || self.fetch_state(instance),
            || async {
                self.api
                    .perform_instance_action_async(&instance.zone, &instance.id, action)
                    .await?;
                Ok(())
            },
        )
        .await
    }

    pub(super) async fn power_off(&self, instance: &Instance) -> Result<(), ScalewayProviderError> {
        self.power_action(instance, ACTION_POWER_OFF, &InstanceState::Stopped)
            .await
    }

    pub(super) async fn power_on(&self, instance: &Instance) -> Result<(), ScalewayProviderError> {
        self.power_action(instance, ACTION_POWER_ON, &InstanceState::Running)
            .await
    }

    pub(super) async fn wait_for_state(
        &self,
        instance: &Instance,
        target: &InstanceState,
        action: &str,
    ) -> Result<(), ScalewayProviderError> {
        poll_until(
            instance,
            target,
            action,
            (self.poll_interval, self.wait_timeout),
            || self.fetch_state(instance),
        )
        .await
    }
}

/// Runs `send` unless `fetch` reports the instance already in `settled`.
///
/// Scaleway rejects power-on for a running server and power-off for a
/// stopped one, so the live state is checked first.
pub(super) async fn perform_unless<F, FFut, S, SFut>(
    instance: &Instance,
    action: &str,
    settled: &InstanceState,
    fetch: F,
    send: S,
) -> Result<(), ScalewayProviderError>
where
    F: FnOnce() -> FFut,
    FFut: Future<Output = Result<Option<InstanceState>, ScalewayProviderError>>,
    S: FnOnce() -> SFut,
    SFut: Future<Output = Result<(), ScalewayProviderError>>,
{
    let current = fetch().await?.ok_or_else(|| not_found(instance))?;
    if &current == settled {
        debug!(instance_id = %instance.id, state = %current, action, "action not needed");
        return Ok(());
    }

    send().await?;
    debug!(instance_id = %instance.id, action, "action requested");
    Ok(())
}

/// Polls `fetch` every `poll_interval` until it reports `target`.
///
/// `timing` is `(poll_interval, wait_timeout)`. A timeout too large to form a
/// deadline fails straight away with [`ScalewayProviderError::Timeout`].
pub(super) async fn poll_until<F, Fut>(
    instance: &Instance,
    target: &InstanceState,
    action: &str,
    timing: (Duration, Duration),
    mut fetch: F,
) -> Result<(), ScalewayProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<InstanceState>, ScalewayProviderError>>,
{
    let (poll_interval, wait_timeout) = timing;
    let timeout = || ScalewayProviderError::Timeout {
        action: action.to_owned(),
        instance_id: instance.id.clone(),
    };
    let deadline = Instant::now()
        .checked_add(wait_timeout)
        .ok_or_else(timeout)?;

    while Instant::now() <= deadline {
        let Some(state) = fetch().await? else {
            return Err(not_found(instance));
        };
        if &state == target {
            return Ok(());
        }
        sleep(poll_interval).await;
    }

    Err(timeout())
}

fn not_found(instance: &Instance) -> ScalewayProviderError {
    ScalewayProviderError::InstanceNotFound {
        instance_id: instance.id.clone(),
        zone: instance.zone.clone(),
    }
}
