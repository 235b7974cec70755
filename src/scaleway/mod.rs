//! Scaleway implementation of the provider boundary.
//!
//! Power actions and state polling go through `scaleway-rs`. Listing servers
//! with tags, reading attached volumes, and snapshot endpoints use direct
//! JSON calls because the SDK does not expose them.

mod error;
mod http;
mod inventory;
mod power;
mod snapshot;
mod types;

use std::time::Duration;

use crate::config::ScalewayConfig;
use crate::provider::{Instance, InstanceState, Provider, ProviderFuture, Snapshot, Volume};
use crate::tags::TagFilter;
use scaleway_rs::ScalewayApi;

pub use error::ScalewayProviderError;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Provider backed by the Scaleway Instances API.
#[derive(Clone)]
pub struct ScalewayProvider {
    api: ScalewayApi,
    config: ScalewayConfig,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl ScalewayProvider {
    /// Constructs a new provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayProviderError::Config`] when the provided
    /// configuration fails validation.
    pub fn new(config: ScalewayConfig) -> Result<Self, ScalewayProviderError> {
        config.validate()?;
        Ok(Self {
            api: ScalewayApi::new(&config.secret_key),
            config,
            poll_interval: POLL_INTERVAL,
            wait_timeout: WAIT_TIMEOUT,
        })
    }

    /// Overrides the state polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides how long a state wait may take.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

impl Provider for ScalewayProvider {
    type Error = ScalewayProviderError;

    fn list_instances<'a>(
        &'a self,
        filter: Option<&'a TagFilter>,
    ) -> ProviderFuture<'a, Vec<Instance>, Self::Error> {
        Box::pin(async move { self.fetch_instances(filter).await })
    }

    fn list_volumes<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, Vec<Volume>, Self::Error> {
        Box::pin(async move { self.fetch_volumes(instance).await })
    }

    fn list_snapshots<'a>(
        &'a self,
        volume: &'a Volume,
    ) -> ProviderFuture<'a, Vec<Snapshot>, Self::Error> {
        Box::pin(async move { self.fetch_snapshots(volume).await })
    }

    fn latest_snapshot<'a>(
        &'a self,
        volume: &'a Volume,
    ) -> ProviderFuture<'a, Option<Snapshot>, Self::Error> {
        Box::pin(async move { self.fetch_latest_snapshot(volume).await })
    }

    fn stop<'a>(&'a self, instance: &'a Instance) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(async move { self.power_off(instance).await })
    }

    fn wait_until_stopped<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.wait_for_state(instance, &InstanceState::Stopped, "wait_until_stopped")
                .await
        })
    }

    fn start<'a>(&'a self, instance: &'a Instance) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(async move { self.power_on(instance).await })
    }

    fn wait_until_running<'a>(
        &'a self,
        instance: &'a Instance,
    ) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.wait_for_state(instance, &InstanceState::Running, "wait_until_running")
                .await
        })
    }

    fn create_snapshot<'a>(
        &'a self,
        volume: &'a Volume,
        description: &'a str,
    ) -> ProviderFuture<'a, Snapshot, Self::Error> {
        Box::pin(async move { self.request_snapshot(volume, description).await })
    }
}

#[cfg(test)]
mod tests;
