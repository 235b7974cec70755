//! Integration tests for configuration loading and validation.

use rstest::*;
use shotty::test_support::EnvGuard;
use shotty::{ConfigError, FleetConfig, ScalewayConfig};

#[fixture]
fn valid_config() -> ScalewayConfig {
    ScalewayConfig {
        access_key: Some(String::from("SCWACCESSKEYEXAMPLE")),
        secret_key: String::from("SCWSECRETKEYEXAMPLE"),
        default_organization_id: None,
        default_project_id: String::from("11111111-2222-3333-4444-555555555555"),
        default_zone: String::from("fr-par-1"),
    }
}

#[rstest]
fn config_validation_rejects_missing_secret_with_actionable_error(valid_config: ScalewayConfig) {
    let cfg = ScalewayConfig {
        secret_key: String::new(),
        ..valid_config
    };

    let error = cfg.validate().expect_err("secret is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error");
    };
    assert!(
        message.contains("SCW_SECRET_KEY"),
        "error should mention env var: {message}"
    );
    assert!(
        message.contains("shotty.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains("secret_key"),
        "error should mention TOML key: {message}"
    );
}

/// Each required field names its environment variable and TOML key.
#[rstest]
#[case::project(
    |cfg: &mut ScalewayConfig| cfg.default_project_id = String::from("  "),
    "SCW_DEFAULT_PROJECT_ID",
    "default_project_id"
)]
#[case::zone(
    |cfg: &mut ScalewayConfig| cfg.default_zone = String::new(),
    "SCW_DEFAULT_ZONE",
    "default_zone"
)]
fn config_validation_names_each_required_field(
    valid_config: ScalewayConfig,
    #[case] blank: fn(&mut ScalewayConfig),
    #[case] env_var: &str,
    #[case] toml_key: &str,
) {
    let mut cfg = valid_config;
    blank(&mut cfg);

    let Err(ConfigError::MissingField(message)) = cfg.validate() else {
        panic!("expected MissingField for {env_var}");
    };
    assert!(message.contains(env_var), "message: {message}");
    assert!(message.contains(toml_key), "message: {message}");
}

#[rstest]
fn config_accepts_missing_access_key(valid_config: ScalewayConfig) {
    let cfg = ScalewayConfig {
        access_key: None,
        ..valid_config
    };
    assert!(cfg.validate().is_ok());
}

#[tokio::test]
async fn scaleway_config_loads_from_environment() {
    let _guard = EnvGuard::scoped(
        &[
            ("SCW_SECRET_KEY", "env-secret"),
            ("SCW_DEFAULT_PROJECT_ID", "env-project"),
            ("SCW_DEFAULT_ZONE", "nl-ams-1"),
        ],
        &["SCW_ACCESS_KEY", "SCW_DEFAULT_ORGANIZATION_ID"],
    )
    .await;

    let cfg = ScalewayConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(cfg.secret_key, "env-secret");
    assert_eq!(cfg.default_project_id, "env-project");
    assert_eq!(cfg.default_zone, "nl-ams-1");
    assert!(cfg.validate().is_ok());
}

#[tokio::test]
async fn scaleway_zone_defaults_to_paris() {
    let _guard = EnvGuard::scoped(
        &[
            ("SCW_SECRET_KEY", "env-secret"),
            ("SCW_DEFAULT_PROJECT_ID", "env-project"),
        ],
        &["SCW_DEFAULT_ZONE"],
    )
    .await;

    let cfg = ScalewayConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(cfg.default_zone, "fr-par-1");
}

#[tokio::test]
async fn fleet_config_defaults_without_environment() {
    let _guard = EnvGuard::scoped(
        &[],
        &[
            "SHOTTY_PROJECT_TAG",
            "SHOTTY_OWNER_TAG",
            "SHOTTY_POLL_INTERVAL_SECS",
            "SHOTTY_WAIT_TIMEOUT_SECS",
        ],
    )
    .await;

    let cfg = FleetConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("fleet config should load: {err}"));

    assert_eq!(cfg, FleetConfig::default());
}

#[tokio::test]
async fn fleet_config_reads_project_tag_override() {
    let _guard = EnvGuard::scoped(
        &[("SHOTTY_PROJECT_TAG", "Project"), ("SHOTTY_WAIT_TIMEOUT_SECS", "60")],
        &["SHOTTY_OWNER_TAG", "SHOTTY_POLL_INTERVAL_SECS"],
    )
    .await;

    let cfg = FleetConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("fleet config should load: {err}"));

    assert_eq!(cfg.project_tag, "Project");
    assert_eq!(cfg.wait_timeout_secs, 60);
    assert_eq!(cfg.settings().project_tag, "Project");
    assert!(cfg.validate().is_ok());
}

#[tokio::test]
async fn fleet_config_rejects_wait_timeout_over_one_day() {
    let _guard = EnvGuard::scoped(
        &[("SHOTTY_WAIT_TIMEOUT_SECS", "86401")],
        &["SHOTTY_POLL_INTERVAL_SECS"],
    )
    .await;

    let cfg = FleetConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("fleet config should load: {err}"));

    assert_eq!(cfg.wait_timeout_secs, 86_401);
    let Err(ConfigError::Invalid(message)) = cfg.validate() else {
        panic!("a timeout over one day should be rejected");
    };
    assert!(message.contains("SHOTTY_WAIT_TIMEOUT_SECS"), "message: {message}");
}
