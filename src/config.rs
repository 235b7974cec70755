//! Configuration loading via `ortho-config`.

use std::time::Duration;

use crate::fleet::{DEFAULT_OWNER_TAG, DEFAULT_PROJECT_TAG, FleetSettings};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Scaleway specific configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SCW")]
pub struct ScalewayConfig {
    /// Access key assigned to the Scaleway application. Not needed for API
    /// calls; accepted so shared Scaleway profiles load cleanly.
    pub access_key: Option<String>,
    /// Secret key used for authentication. This value is required.
    pub secret_key: String,
    /// Organisation identifier used by some Scaleway endpoints.
    pub default_organization_id: Option<String>,
    /// Project identifier scoping every listing.
    pub default_project_id: String,
    /// Availability zone to operate in. Defaults to `fr-par-1`.
    #[ortho_config(default = "fr-par-1".to_owned())]
    pub default_zone: String,
}

/// Tag keys and wait tuning for fleet operations.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SHOTTY")]
pub struct FleetConfig {
    /// Tag key whose value names an instance's project.
    #[ortho_config(default = "Name".to_owned())]
    pub project_tag: String,
    /// Tag key whose value names an instance's owner.
    #[ortho_config(default = "owner".to_owned())]
    pub owner_tag: String,
    /// Seconds between state polls while waiting on an instance.
    #[ortho_config(default = 5)]
    pub poll_interval_secs: u64,
    /// Seconds before a state wait gives up.
    #[ortho_config(default = 300)]
    pub wait_timeout_secs: u64,
}

/// Longest state wait accepted, one day.
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 86_400;

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    section: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
        section: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            section,
        }
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to [{}] in shotty.toml",
            metadata.description, metadata.env_var, metadata.toml_key, metadata.section
        )));
    }
    Ok(())
}

impl ScalewayConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("shotty")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.secret_key,
            &FieldMetadata::new(
                "Scaleway API secret key",
                "SCW_SECRET_KEY",
                "secret_key",
                "scaleway",
            ),
        )?;
        require_field(
            &self.default_project_id,
            &FieldMetadata::new(
                "Scaleway project ID",
                "SCW_DEFAULT_PROJECT_ID",
                "default_project_id",
                "scaleway",
            ),
        )?;
        require_field(
            &self.default_zone,
            &FieldMetadata::new(
                "availability zone",
                "SCW_DEFAULT_ZONE",
                "default_zone",
                "scaleway",
            ),
        )?;
        Ok(())
    }
}

impl FleetConfig {
    /// Loads fleet settings without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("shotty")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks tag keys and wait tuning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for a blank tag key and
    /// [`ConfigError::Invalid`] for a zero poll interval, a timeout shorter
    /// than the interval, or a timeout above [`MAX_WAIT_TIMEOUT_SECS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.project_tag,
            &FieldMetadata::new(
                "project tag key",
                "SHOTTY_PROJECT_TAG",
                "project_tag",
                "fleet",
            ),
        )?;
        require_field(
            &self.owner_tag,
            &FieldMetadata::new("owner tag key", "SHOTTY_OWNER_TAG", "owner_tag", "fleet"),
        )?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_secs must be at least 1",
            )));
        }
        if self.wait_timeout_secs < self.poll_interval_secs {
            return Err(ConfigError::Invalid(String::from(
                "wait_timeout_secs must not be shorter than poll_interval_secs",
            )));
        }
        if self.wait_timeout_secs > MAX_WAIT_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "wait_timeout_secs must be at most {MAX_WAIT_TIMEOUT_SECS}: \
                 lower SHOTTY_WAIT_TIMEOUT_SECS or wait_timeout_secs in shotty.toml"
            )));
        }
        Ok(())
    }

    /// Tag keys handed to the fleet orchestrator.
    #[must_use]
    pub fn settings(&self) -> FleetSettings {
        FleetSettings {
            project_tag: self.project_tag.trim().to_owned(),
            owner_tag: self.owner_tag.trim().to_owned(),
        }
    }

    /// Interval between state polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Maximum duration of a state wait.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            project_tag: String::from(DEFAULT_PROJECT_TAG),
            owner_tag: String::from(DEFAULT_OWNER_TAG),
            poll_interval_secs: 5,
            wait_timeout_secs: 300,
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
