//! Per-route mutation moves.

use rand::Rng;

use crate::constructive::{extend_randomly, random_route};
use crate::error::Result;
use crate::models::{MoveOptions, RailNetwork, RouteId};

/// The three mutation actions, drawn uniformly per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Drop the last station, then extend.
    DropLastThenExtend,
    /// Drop the first station, then extend.
    DropFirstThenExtend,
    /// Extend without dropping.
    Extend,
}

impl MutationKind {
    /// Draws one of the three actions uniformly.
    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        match rng.random_range(0..3) {
            0 => MutationKind::DropLastThenExtend,
            1 => MutationKind::DropFirstThenExtend,
            _ => MutationKind::Extend,
        }
    }
}

/// What a mutation did to its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A station was added at an endpoint.
    Extended,
    /// No legal extension existed; the route keeps any drop already made.
    NoLegalMove,
    /// The route ran out of stations and was deleted from the network.
    Removed,
}

/// Applies `kind` to `route`.
///
/// Drops (if any) come first. A route left without stations is deleted.
/// A route without legal moves is skipped, never an error.
pub fn mutate_route<R: Rng>(
    network: &mut RailNetwork,
    route: RouteId,
    kind: MutationKind,
    max_duration: f64,
    options: &MoveOptions,
    rng: &mut R,
) -> Result<MutationOutcome> {
    if network.route(route)?.is_empty() {
        network.del_route(route)?;
        return Ok(MutationOutcome::Removed);
    }

    match kind {
        MutationKind::DropLastThenExtend => {
            network.pop_station(route, -1)?;
        }
        MutationKind::DropFirstThenExtend => {
            network.pop_station(route, 0)?;
        }
        MutationKind::Extend => {}
    }

    if network.route(route)?.is_empty() {
        network.del_route(route)?;
        return Ok(MutationOutcome::Removed);
    }

    match extend_randomly(network, route, max_duration, options, rng)? {
        Some(_) => Ok(MutationOutcome::Extended),
        None => Ok(MutationOutcome::NoLegalMove),
    }
}

/// Deletes the lowest-scoring route and lays a fresh random route rooted at
/// a uniformly random station. Returns the new route id, if one was made.
pub fn replace_lowest_route<R: Rng>(
    network: &mut RailNetwork,
    max_duration: f64,
    max_steps: usize,
    options: &MoveOptions,
    rng: &mut R,
) -> Result<Option<RouteId>> {
    if let Some(lowest) = network.lowest_scoring_route() {
        network.del_route(lowest)?;
    }

    let n = network.stations().len();
    if n == 0 {
        return Ok(None);
    }
    let root = network.stations()[rng.random_range(0..n)].id();
    random_route(network, root, max_duration, max_steps, options, rng).map(Some)
}
