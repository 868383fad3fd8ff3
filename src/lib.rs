//! # rail-routing
//!
//! Rail network line planning: a station/connection graph, duration-capped
//! routes through it, a coverage-based score, and a strict hill climber that
//! searches for a high-scoring set of routes.
//!
//! ## Modules
//!
//! - [`models`]: Domain model types (Station, Connection, Route, RailNetwork)
//! - [`constructive`]: Random initial routes and solutions
//! - [`hill_climber`]: Strict hill climbing over a network's routes
//! - [`io`]: CSV network loading and solution/score export
//! - [`error`]: Error type shared by every module

pub mod constructive;
pub mod error;
pub mod hill_climber;
pub mod io;
pub mod models;

pub use error::{NetworkError, Result};
