//! Route type: an ordered walk through the station graph.
//!
//! A route keeps `n` stations and `n - 1` link slots. A slot is `None` when
//! two consecutive stations share no connection (a broken link). Every
//! structural change re-derives only the slots touching the changed
//! position, looking the connection up in the stations' adjacency.
//!
//! Registration on stations and connections is reference counted per
//! route: a route stays registered on a station or connection as long as it
//! occurs at least once in the route's own sequence.

use std::collections::BTreeMap;

use crate::error::{NetworkError, Result};

use super::{ConnectionId, LegalMoves, MoveOptions, RailGraph, RouteId, StationId};

/// A present link between two consecutive route stations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    /// The connection travelled.
    pub connection: ConnectionId,
    /// Its duration, cached from the network.
    pub duration: f64,
}

/// An ordered sequence of stations and the links between them.
///
/// Routes only hold handles; all mutating operations take the
/// [`RailGraph`] that owns the referenced stations and connections so the
/// route can keep their registration sets current. Most callers go through
/// [`RailNetwork`](super::RailNetwork), which pairs each route with its graph.
#[derive(Debug, Clone)]
pub struct Route {
    id: RouteId,
    stations: Vec<StationId>,
    legs: Vec<Option<Leg>>,
    station_refs: BTreeMap<StationId, usize>,
    connection_refs: BTreeMap<ConnectionId, usize>,
}

impl Route {
    /// Creates a route holding only `root`, registered on it.
    pub(crate) fn new(id: RouteId, root: StationId, graph: &mut RailGraph) -> Result<Self> {
        graph.station(root)?;
        let mut route = Self {
            id,
            stations: vec![root],
            legs: Vec::new(),
            station_refs: BTreeMap::new(),
            connection_refs: BTreeMap::new(),
        };
        route.retain_station(graph, root);
        Ok(route)
    }

    /// Route id.
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Stations in visiting order.
    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    /// Link slots between consecutive stations; `None` marks a broken link.
    pub fn legs(&self) -> &[Option<Leg>] {
        &self.legs
    }

    /// Connection handles of the link slots, `None` for broken links.
    pub fn connections(&self) -> Vec<Option<ConnectionId>> {
        self.legs.iter().map(|l| l.map(|l| l.connection)).collect()
    }

    /// The station at `index` (negative counts from the end).
    pub fn station(&self, index: isize) -> Result<StationId> {
        let pos = resolve_position(index, self.stations.len())?;
        Ok(self.stations[pos])
    }

    /// Number of stations.
    pub fn n_stations(&self) -> usize {
        self.stations.len()
    }

    /// Number of link slots (edge count).
    pub fn length(&self) -> usize {
        self.legs.len()
    }

    /// Returns `true` if the route holds no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Total duration of the present links. Broken links count as zero.
    pub fn duration(&self) -> f64 {
        self.legs.iter().flatten().map(|l| l.duration).sum()
    }

    /// Number of distinct stations in the route.
    pub fn unique_station_count(&self) -> usize {
        self.station_refs.len()
    }

    /// Number of distinct connections in the route.
    pub fn unique_connection_count(&self) -> usize {
        self.connection_refs.len()
    }

    /// Distinct connections in the route.
    pub fn unique_connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connection_refs.keys().copied()
    }

    /// Returns `true` if the route visits `station` at least once.
    pub fn contains_station(&self, station: StationId) -> bool {
        self.station_refs.contains_key(&station)
    }

    /// Returns `true` if the route travels `connection` at least once.
    pub fn contains_connection(&self, connection: ConnectionId) -> bool {
        self.connection_refs.contains_key(&connection)
    }

    /// A route is valid if it has at least one link, no broken links, and,
    /// when `max_duration` is non-zero, a duration below `max_duration`.
    pub fn is_valid(&self, max_duration: f64) -> bool {
        if self.legs.is_empty() || self.legs.iter().any(Option::is_none) {
            return false;
        }
        max_duration == 0.0 || self.duration() < max_duration
    }

    /// Pairs of `(position, station)` bracketing each broken link.
    pub fn broken_connections(&self) -> Vec<((usize, StationId), (usize, StationId))> {
        self.legs
            .iter()
            .enumerate()
            .filter(|(_, leg)| leg.is_none())
            .map(|(i, _)| ((i, self.stations[i]), (i + 1, self.stations[i + 1])))
            .collect()
    }

    /// The route endpoints as `(position, station)`.
    ///
    /// These are the only positions where extending the route cannot break
    /// an existing link. A single-station route has one endpoint.
    pub fn open_stations(&self) -> Vec<(usize, StationId)> {
        match self.stations.as_slice() {
            [] => Vec::new(),
            [only] => vec![(0, *only)],
            [first, .., last] => vec![(0, *first), (self.stations.len() - 1, *last)],
        }
    }

    /// Candidates at each endpoint whose connection keeps the route duration
    /// strictly below `max_duration`.
    pub fn legal_moves(&self, graph: &RailGraph, max_duration: f64, options: &MoveOptions) -> LegalMoves {
        let mut moves = LegalMoves::new();
        let current = self.duration();
        if current >= max_duration {
            return moves;
        }

        for (position, station) in self.open_stations() {
            let candidates: Vec<_> = graph
                .neighbours(station, options)
                .into_iter()
                .filter(|c| current + c.duration < max_duration)
                .collect();
            if !candidates.is_empty() {
                moves.insert(position, candidates);
            }
        }
        moves
    }

    /// Returns `true` if [`legal_moves`](Self::legal_moves) would be non-empty.
    pub fn has_legal_moves(&self, graph: &RailGraph, max_duration: f64, options: &MoveOptions) -> bool {
        let current = self.duration();
        if current >= max_duration {
            return false;
        }
        self.open_stations().into_iter().any(|(_, station)| {
            graph
                .neighbours(station, options)
                .iter()
                .any(|c| current + c.duration < max_duration)
        })
    }

    /// `(unique connections / total connections) * 10000 - (100 + duration)`.
    ///
    /// Returns only the cost term when the network has no connections.
    pub fn route_score(&self, total_connections: usize) -> f64 {
        let coverage = if total_connections == 0 {
            0.0
        } else {
            self.unique_connection_count() as f64 / total_connections as f64
        };
        coverage * 10_000.0 - (100.0 + self.duration())
    }

    /// Appends `station` after the current last station.
    pub fn append(&mut self, graph: &mut RailGraph, station: StationId) -> Result<()> {
        self.insert(graph, self.stations.len() as isize, station)
    }

    /// Inserts `station` before position `index`.
    ///
    /// Negative indices count from the end, so `-1` inserts before the last
    /// station. Inserting strictly inside the route replaces the link that
    /// spanned the gap by two links, either of which may be broken.
    pub fn insert(&mut self, graph: &mut RailGraph, index: isize, station: StationId) -> Result<()> {
        graph.station(station)?;
        let len = self.stations.len();
        let pos = resolve_insert_position(index, len)?;

        self.stations.insert(pos, station);
        self.retain_station(graph, station);

        if len == 0 {
            return Ok(());
        }

        if pos == 0 {
            let leg = find_leg(graph, station, self.stations[1]);
            self.legs.insert(0, leg);
            self.retain_leg(graph, leg);
        } else if pos == len {
            let leg = find_leg(graph, self.stations[pos - 1], station);
            self.legs.push(leg);
            self.retain_leg(graph, leg);
        } else {
            let before = find_leg(graph, self.stations[pos - 1], station);
            let after = find_leg(graph, station, self.stations[pos + 1]);
            let superseded = std::mem::replace(&mut self.legs[pos - 1], before);
            self.legs.insert(pos, after);
            self.retain_leg(graph, before);
            self.retain_leg(graph, after);
            self.release_leg(graph, superseded);
        }
        Ok(())
    }

    /// Removes and returns the last station.
    pub fn pop(&mut self, graph: &mut RailGraph) -> Result<StationId> {
        self.pop_station(graph, -1)
    }

    /// Removes and returns the station at `index` (negative counts from the end).
    ///
    /// Removing an interior station drops both adjacent links and bridges
    /// the new neighbours with their direct connection, or a broken link if
    /// there is none.
    pub fn pop_station(&mut self, graph: &mut RailGraph, index: isize) -> Result<StationId> {
        let len = self.stations.len();
        let pos = resolve_position(index, len)?;
        let station = self.stations.remove(pos);

        if len > 1 {
            if pos == 0 {
                let leg = self.legs.remove(0);
                self.release_leg(graph, leg);
            } else if pos == len - 1 {
                let leg = self.legs.remove(pos - 1);
                self.release_leg(graph, leg);
            } else {
                let before = self.legs.remove(pos - 1);
                let after = self.legs.remove(pos - 1);
                let bridge = find_leg(graph, self.stations[pos - 1], self.stations[pos]);
                self.legs.insert(pos - 1, bridge);
                self.retain_leg(graph, bridge);
                self.release_leg(graph, before);
                self.release_leg(graph, after);
            }
        }

        self.release_station(graph, station);
        Ok(station)
    }

    /// Unregisters the route everywhere and clears it.
    pub fn empty(&mut self, graph: &mut RailGraph) {
        for &station in self.station_refs.keys() {
            if let Some(s) = graph.station_mut(station) {
                s.remove_route(self.id);
            }
        }
        for &connection in self.connection_refs.keys() {
            if let Some(c) = graph.connection_mut(connection) {
                c.remove_route(self.id);
            }
        }
        self.stations.clear();
        self.legs.clear();
        self.station_refs.clear();
        self.connection_refs.clear();
    }

    /// Re-registers a detached copy of this route on everything it touches.
    pub(crate) fn attach(&self, graph: &mut RailGraph) {
        for &station in self.station_refs.keys() {
            if let Some(s) = graph.station_mut(station) {
                s.add_route(self.id);
            }
        }
        for &connection in self.connection_refs.keys() {
            if let Some(c) = graph.connection_mut(connection) {
                c.add_route(self.id);
            }
        }
    }

    /// Checks the link-count invariant and that registrations match the
    /// route's own sequence exactly.
    pub fn check_consistency(&self, graph: &RailGraph) -> Result<()> {
        let inconsistent = |message: String| NetworkError::Inconsistent {
            route: self.id,
            message,
        };

        let expected_legs = self.stations.len().saturating_sub(1);
        if self.legs.len() != expected_legs {
            return Err(inconsistent(format!(
                "{} links for {} stations",
                self.legs.len(),
                self.stations.len()
            )));
        }

        for (i, leg) in self.legs.iter().enumerate() {
            if let Some(leg) = leg {
                let connection = graph.connection(leg.connection)?;
                if !connection.joins(self.stations[i], self.stations[i + 1]) {
                    return Err(inconsistent(format!(
                        "link {i} does not join its stations"
                    )));
                }
            }
        }

        let mut station_counts: BTreeMap<StationId, usize> = BTreeMap::new();
        for &s in &self.stations {
            *station_counts.entry(s).or_default() += 1;
        }
        let mut connection_counts: BTreeMap<ConnectionId, usize> = BTreeMap::new();
        for leg in self.legs.iter().flatten() {
            *connection_counts.entry(leg.connection).or_default() += 1;
        }
        if station_counts != self.station_refs || connection_counts != self.connection_refs {
            return Err(inconsistent("reference counts out of date".into()));
        }

        for station in graph.stations() {
            if station.in_route(self.id) != self.contains_station(station.id()) {
                return Err(inconsistent(format!(
                    "registration mismatch at station {}",
                    station.name()
                )));
            }
        }
        for connection in graph.connections() {
            if connection.routes().contains(&self.id) != self.contains_connection(connection.id()) {
                return Err(inconsistent(format!(
                    "registration mismatch at connection {}",
                    connection.id()
                )));
            }
        }
        Ok(())
    }

    fn retain_station(&mut self, graph: &mut RailGraph, station: StationId) {
        let count = self.station_refs.entry(station).or_insert(0);
        *count += 1;
        if *count == 1 {
            if let Some(s) = graph.station_mut(station) {
                s.add_route(self.id);
            }
        }
    }

    fn release_station(&mut self, graph: &mut RailGraph, station: StationId) {
        let Some(count) = self.station_refs.get_mut(&station) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.station_refs.remove(&station);
            if let Some(s) = graph.station_mut(station) {
                s.remove_route(self.id);
            }
        }
    }

    fn retain_leg(&mut self, graph: &mut RailGraph, leg: Option<Leg>) {
        let Some(leg) = leg else { return };
        let count = self.connection_refs.entry(leg.connection).or_insert(0);
        *count += 1;
        if *count == 1 {
            if let Some(c) = graph.connection_mut(leg.connection) {
                c.add_route(self.id);
            }
        }
    }

    fn release_leg(&mut self, graph: &mut RailGraph, leg: Option<Leg>) {
        let Some(leg) = leg else { return };
        let Some(count) = self.connection_refs.get_mut(&leg.connection) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.connection_refs.remove(&leg.connection);
            if let Some(c) = graph.connection_mut(leg.connection) {
                c.remove_route(self.id);
            }
        }
    }
}

/// Direct link between `a` and `b` from `a`'s adjacency.
fn find_leg(graph: &RailGraph, a: StationId, b: StationId) -> Option<Leg> {
    let connection = graph.station(a).ok()?.connection_to(b)?;
    let duration = graph.connection(connection).ok()?.duration();
    Some(Leg {
        connection,
        duration,
    })
}

/// Resolves an existing-element index; negative counts from the end.
fn resolve_position(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    if resolved < 0 || resolved >= len as isize {
        return Err(NetworkError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Resolves an insertion index in `0..=len`; negative counts from the end.
fn resolve_insert_position(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    if resolved < 0 || resolved > len as isize {
        return Err(NetworkError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}
