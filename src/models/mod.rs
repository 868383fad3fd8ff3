//! Domain model types for rail network line planning.
//!
//! Stations and connections form an undirected graph owned by a
//! [`RailNetwork`]. Routes are ordered walks through that graph which refer
//! to stations and connections by handle only; every station and connection
//! keeps the set of routes currently using it.

mod connection;
mod graph;
mod ids;
mod moves;
mod network;
mod route;
mod station;

pub use connection::Connection;
pub use graph::RailGraph;
pub use ids::{ConnectionId, RouteId, StationId};
pub use moves::{Candidate, LegalMoves, MoveFilter, MoveOptions};
pub use network::{NetworkBuilder, RailNetwork, RouteCheckpoint, RouteListing};
pub use route::{Leg, Route};
pub use station::{Adjacent, Station};
