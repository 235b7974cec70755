//! Core library for the `shotty` fleet tool.
//!
//! The crate lists, power-cycles, and snapshots cloud instances selected by a
//! project tag. Workflows live in [`fleet`] and talk to the cloud through the
//! [`provider::Provider`] trait; [`scaleway`] implements it against the
//! Scaleway Instances API.

pub mod config;
pub mod fleet;
pub mod provider;
pub mod scaleway;
pub mod tags;
pub mod test_support;

pub use config::{ConfigError, FleetConfig, ScalewayConfig};
pub use fleet::{
    BatchReport, Fleet, FleetAction, FleetError, FleetEvent, FleetObserver, FleetSettings,
    MissingScope, PowerAction, Scope,
};
pub use provider::{Instance, InstanceState, Provider, Snapshot, SnapshotState, Volume};
pub use scaleway::{ScalewayProvider, ScalewayProviderError};
pub use tags::{TagFilter, Tags};
