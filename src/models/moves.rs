//! Legal move candidates for extending a route at its endpoints.

use std::collections::BTreeMap;

use super::{ConnectionId, StationId};

/// Restricts which neighbouring stations count as move candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveFilter {
    /// Every neighbour.
    #[default]
    All,
    /// Only neighbours whose shared connection no route uses yet.
    UnusedConnections,
    /// Only neighbours that no route visits yet.
    UnvisitedStations,
}

/// Candidate filter plus the optional annotations to compute per candidate.
///
/// # Examples
///
/// ```
/// use rail_routing::models::{MoveFilter, MoveOptions};
///
/// let opts = MoveOptions::default()
///     .with_filter(MoveFilter::UnusedConnections)
///     .with_degree()
///     .with_unused();
/// assert_eq!(opts.filter, MoveFilter::UnusedConnections);
/// assert!(opts.degree && opts.unused && !opts.unvisited);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOptions {
    /// Which neighbours are eligible.
    pub filter: MoveFilter,
    /// Annotate candidates with their degree.
    pub degree: bool,
    /// Annotate candidates with their number of unused connections.
    pub unused: bool,
    /// Annotate candidates with their number of unvisited neighbours.
    pub unvisited: bool,
}

impl MoveOptions {
    pub fn with_filter(mut self, filter: MoveFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_degree(mut self) -> Self {
        self.degree = true;
        self
    }

    pub fn with_unused(mut self) -> Self {
        self.unused = true;
        self
    }

    pub fn with_unvisited(mut self) -> Self {
        self.unvisited = true;
        self
    }
}

/// A station that may be added next to a route endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The station to add.
    pub station: StationId,
    /// The connection from the endpoint to `station`.
    pub connection: ConnectionId,
    /// Duration of that connection.
    pub duration: f64,
    /// Degree of `station`, if requested.
    pub degree: Option<usize>,
    /// Unused connections at `station`, if requested.
    pub unused: Option<usize>,
    /// Unvisited neighbours of `station`, if requested.
    pub unvisited: Option<usize>,
}

/// Eligible candidates keyed by the endpoint position (0 or last) they attach to.
///
/// Only endpoints with at least one candidate appear as keys.
pub type LegalMoves = BTreeMap<usize, Vec<Candidate>>;
