#![deny(missing_docs)]

//! Replica-exchange (parallel tempering) engine.
//!
//! An [`ExchangeEngine`] owns one [`Replica`] per slot of a strictly
//! increasing [`TemperatureLadder`]. Each iteration advances every slot with a
//! caller-supplied [`LocalUpdate`], then proposes exchanges between
//! neighbouring slots using the generalized Metropolis-Hastings ratio of the
//! chosen [`Distribution`]. Temperatures belong to slots: exchanges move
//! configurations and energies, never inverse temperatures.

/// Caller-supplied energy and local-update capabilities.
pub mod capability;
/// YAML configuration schema and defaults.
pub mod config;
/// Random-number policies and seed derivation.
pub mod determinism;
/// Equilibrium distribution models.
pub mod distribution;
/// Exchange engine, swap acceptance and statistics.
pub mod exchange;
/// Temperature ladder construction.
pub mod ladder;
/// Replica records and initial-state handling.
pub mod replica;
/// Run loop, cancellation and run summaries.
pub mod run;

pub use capability::{EnergyFunction, LocalUpdate};
pub use config::{EngineConfig, ScheduleConfig, SeedPolicy};
pub use determinism::{RngPolicy, RngSource};
pub use distribution::{Distribution, DistributionKind};
pub use exchange::{
    acceptance_probability, log_acceptance, ExchangeEngine, PairStats, PairSummary,
    SwapOutcome, SwapScheme, SwapStatistics,
};
pub use ladder::{build_geometric, LadderKind, LadderSpec, TemperatureLadder};
pub use paratemp_core::{ErrorInfo, PtError, RngHandle};
pub use replica::{InitialStates, Replica};
pub use run::{CancellationFlag, RunOptions, RunSummary};
