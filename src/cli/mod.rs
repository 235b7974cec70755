//! Command-line interface definitions for the `shotty` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `shotty` binary.
#[derive(Debug, Parser)]
#[command(
    name = "shotty",
    about = "List, power-cycle, and snapshot Scaleway instances by project tag",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Commands for volume snapshots.
    #[command(name = "snapshots", about = "Commands for volume snapshots")]
    Snapshots(SnapshotsArgs),
    /// Commands for instance volumes.
    #[command(name = "volumes", about = "Commands for instance volumes")]
    Volumes(VolumesArgs),
    /// Commands for instances.
    #[command(name = "instances", about = "Commands for instances")]
    Instances(InstancesArgs),
}

/// `shotty snapshots` group.
#[derive(Debug, Args)]
pub(crate) struct SnapshotsArgs {
    #[command(subcommand)]
    pub(crate) command: SnapshotsCommand,
}

/// Subcommands under `shotty snapshots`.
#[derive(Debug, Subcommand)]
pub(crate) enum SnapshotsCommand {
    /// List snapshots of every volume in scope.
    #[command(name = "list", about = "List snapshots of every volume in scope")]
    List(SnapshotListCommand),
}

/// Arguments for `shotty snapshots list`.
#[derive(Debug, Args)]
pub(crate) struct SnapshotListCommand {
    #[command(flatten)]
    pub(crate) scope: ProjectArg,
    /// List every snapshot instead of stopping at the newest completed one.
    #[arg(long)]
    pub(crate) all: bool,
}

/// `shotty volumes` group.
#[derive(Debug, Args)]
pub(crate) struct VolumesArgs {
    #[command(subcommand)]
    pub(crate) command: VolumesCommand,
}

/// Subcommands under `shotty volumes`.
#[derive(Debug, Subcommand)]
pub(crate) enum VolumesCommand {
    /// List volumes attached to instances in scope.
    #[command(name = "list", about = "List volumes attached to instances in scope")]
    List(ProjectArg),
}

/// `shotty instances` group.
#[derive(Debug, Args)]
pub(crate) struct InstancesArgs {
    #[command(subcommand)]
    pub(crate) command: InstancesCommand,
}

/// Subcommands under `shotty instances`.
#[derive(Debug, Subcommand)]
pub(crate) enum InstancesCommand {
    /// List instances with their owner and project tags.
    #[command(name = "list", about = "List instances with their owner and project tags")]
    List(GuardedArgs),
    /// Power on instances.
    #[command(name = "start", about = "Power on instances")]
    Start(PowerCommand),
    /// Power off instances.
    #[command(name = "stop", about = "Power off instances")]
    Stop(PowerCommand),
    /// Power off, then power on, waiting for each transition.
    #[command(name = "reboot", about = "Power off, then power on, waiting for each transition")]
    Reboot(GuardedArgs),
    /// Stop instances, snapshot their volumes, and start them again.
    #[command(
        name = "snapshot",
        about = "Stop instances, snapshot their volumes, and start them again"
    )]
    Snapshot(GuardedArgs),
}

/// `--project` option shared by every command.
#[derive(Debug, Args)]
pub(crate) struct ProjectArg {
    /// Only target instances whose project tag equals NAME.
    #[arg(long, value_name = "NAME")]
    pub(crate) project: Option<String>,
}

/// Scope options for commands that refuse to run unscoped.
#[derive(Debug, Args)]
pub(crate) struct GuardedArgs {
    #[command(flatten)]
    pub(crate) scope: ProjectArg,
    /// Target every instance when no project is given.
    #[arg(long)]
    pub(crate) force: bool,
}

/// Arguments for `shotty instances start|stop`.
#[derive(Debug, Args)]
pub(crate) struct PowerCommand {
    #[command(flatten)]
    pub(crate) guard: GuardedArgs,
    /// Block until each instance reaches the requested state.
    #[arg(long)]
    pub(crate) wait: bool,
}
