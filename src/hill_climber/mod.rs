//! Strict hill climbing over a network's routes.
//!
//! Every iteration runs in two phases. While exploring, each route of the
//! working copy is mutated (drop an endpoint and/or extend at an endpoint).
//! While evaluating, the network is rescored and the mutation is kept only
//! if the score did not decrease; otherwise the touched routes are rolled
//! back. There is no tolerance for regressions.
//!
//! The run stops after the iteration budget, or earlier on an opt-in stall
//! limit, deadline, or cancellation flag.

mod config;
mod mutation;
mod runner;

pub use config::HillClimberConfig;
pub use mutation::{mutate_route, replace_lowest_route, MutationKind, MutationOutcome};
pub use runner::{
    HillClimbResult, HillClimber, ImprovementSink, NoopSink, ScoreRecord, SearchState, StepOutcome,
    StopReason,
};
