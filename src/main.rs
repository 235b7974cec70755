//! Binary entry point for the `shotty` CLI.

use std::env;
use std::fmt::Display;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use shotty::fleet::{BatchReport, FleetEvent, FleetObserver, Scope};
use shotty::test_support::{FailurePoint, FakeProvider};
use shotty::{
    Fleet, FleetAction, FleetConfig, FleetError, PowerAction, Provider, ScalewayConfig,
    ScalewayProvider,
};

mod cli;

use cli::{
    Cli, GuardedArgs, InstancesCommand, PowerCommand, SnapshotsCommand, VolumesCommand,
};

/// Serves every command from an in-memory fleet holding one instance tagged
/// with this project.
const FAKE_FLEET_ENV: &str = "SHOTTY_FAKE_FLEET";
/// Scripts a failure into the fake fleet: `stop`, `start`, or `snapshot`.
const FAKE_FAIL_ENV: &str = "SHOTTY_FAKE_FAIL";

const EXIT_FAILURE: i32 = 1;
const EXIT_MISSING_SCOPE: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("{0}")]
    MissingScope(String),
    #[error("{0}")]
    Fleet(String),
    #[error("{failed} instance(s) failed; see the messages above")]
    Batch { failed: usize },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingScope(_) => EXIT_MISSING_SCOPE,
            _ => EXIT_FAILURE,
        }
    }
}

impl<E> From<FleetError<E>> for CliError
where
    E: std::error::Error + 'static,
{
    fn from(value: FleetError<E>) -> Self {
        match value {
            FleetError::MissingScope(err) => Self::MissingScope(err.to_string()),
            other @ FleetError::Provider { .. } => Self::Fleet(other.to_string()),
        }
    }
}

/// Prints progress events as they happen.
struct StdoutObserver;

impl FleetObserver for StdoutObserver {
    fn observe(&self, event: &FleetEvent) {
        writeln!(io::stdout(), "{event}").ok();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let fleet_config =
        FleetConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    fleet_config
        .validate()
        .map_err(|err| CliError::Config(err.to_string()))?;

    // Refuse unscoped bulk commands before credentials are required.
    if let Some((project, force, action)) = guarded_request(&cli) {
        Scope::new(project, &fleet_config.project_tag)
            .require(force, action)
            .map_err(|err| CliError::MissingScope(err.to_string()))?;
    }

    if let Some(fleet) = fake_fleet_from_env(&fleet_config) {
        return execute(&fleet, cli).await;
    }

    let scaleway_config =
        ScalewayConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let provider = ScalewayProvider::new(scaleway_config)
        .map_err(|err| CliError::Provider(err.to_string()))?
        .with_poll_interval(fleet_config.poll_interval())
        .with_wait_timeout(fleet_config.wait_timeout());
    execute(&Fleet::new(provider, fleet_config.settings()), cli).await
}

/// Returns the scope options of commands guarded against unscoped runs.
fn guarded_request(cli: &Cli) -> Option<(Option<&str>, bool, FleetAction)> {
    let Cli::Instances(group) = cli else {
        return None;
    };
    let (guard, action) = match &group.command {
        InstancesCommand::List(guard) => (guard, FleetAction::List),
        InstancesCommand::Start(power) => (&power.guard, FleetAction::Start),
        InstancesCommand::Stop(power) => (&power.guard, FleetAction::Stop),
        InstancesCommand::Reboot(guard) => (guard, FleetAction::Reboot),
        InstancesCommand::Snapshot(guard) => (guard, FleetAction::Snapshot),
    };
    Some((guard.scope.project.as_deref(), guard.force, action))
}

async fn execute<P: Provider>(fleet: &Fleet<P>, cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Snapshots(group) => match group.command {
            SnapshotsCommand::List(args) => {
                let rows = fleet
                    .list_snapshots(args.scope.project.as_deref(), args.all)
                    .await?;
                write_rows(io::stdout(), &rows)
            }
        },
        Cli::Volumes(group) => match group.command {
            VolumesCommand::List(args) => {
                let rows = fleet.list_volumes(args.project.as_deref()).await?;
                write_rows(io::stdout(), &rows)
            }
        },
        Cli::Instances(group) => match group.command {
            InstancesCommand::List(args) => {
                let rows = fleet
                    .list_instances(args.scope.project.as_deref(), args.force)
                    .await?;
                write_rows(io::stdout(), &rows)
            }
            InstancesCommand::Start(args) => power(fleet, &args, PowerAction::Start).await,
            InstancesCommand::Stop(args) => power(fleet, &args, PowerAction::Stop).await,
            InstancesCommand::Reboot(args) => {
                let report = fleet
                    .set_power(
                        args.scope.project.as_deref(),
                        args.force,
                        PowerAction::Reboot,
                        true,
                        &StdoutObserver,
                    )
                    .await?;
                finish(io::stdout(), &report)
            }
            InstancesCommand::Snapshot(args) => {
                let report = fleet
                    .create_snapshots(args.scope.project.as_deref(), args.force, &StdoutObserver)
                    .await?;
                finish(io::stdout(), &report)
            }
        },
    }
}

async fn power<P: Provider>(
    fleet: &Fleet<P>,
    args: &PowerCommand,
    action: PowerAction,
) -> Result<(), CliError> {
    let GuardedArgs { scope, force } = &args.guard;
    let report = fleet
        .set_power(
            scope.project.as_deref(),
            *force,
            action,
            args.wait,
            &StdoutObserver,
        )
        .await?;
    finish(io::stdout(), &report)
}

fn write_rows(mut target: impl Write, rows: &[impl Display]) -> Result<(), CliError> {
    for row in rows {
        writeln!(target, "{row}")?;
    }
    Ok(())
}

/// Prints the batch summary and fails when any instance reported an error.
fn finish(mut target: impl Write, report: &BatchReport) -> Result<(), CliError> {
    writeln!(target, "Job's done! {report}")?;
    match report.failed_instances().count() {
        0 => Ok(()),
        failed => Err(CliError::Batch { failed }),
    }
}

fn fake_fleet_from_env(config: &FleetConfig) -> Option<Fleet<FakeProvider>> {
    let project = env::var(FAKE_FLEET_ENV).ok()?;
    let settings = config.settings();
    let provider = FakeProvider::demo_fleet(&settings.project_tag, &project);
    match env::var(FAKE_FAIL_ENV).ok().as_deref() {
        Some("stop") => provider.fail_on(FailurePoint::Stop, &format!("srv-{project}")),
        Some("start") => provider.fail_on(FailurePoint::Start, &format!("srv-{project}")),
        Some("snapshot") => {
            provider.fail_on(FailurePoint::CreateSnapshot, &format!("vol-{project}"));
        }
        _ => {}
    }
    Some(Fleet::new(provider, settings))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
