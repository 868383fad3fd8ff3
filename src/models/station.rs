//! Station (graph vertex) type.

use std::collections::BTreeSet;

use super::{ConnectionId, RouteId, StationId};

/// One entry of a station's adjacency: the neighbouring station and the
/// connection shared with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    /// The neighbouring station.
    pub station: StationId,
    /// The connection joining both stations.
    pub connection: ConnectionId,
}

/// A station in the rail network.
///
/// The adjacency is fixed once the network is built. Only the set of routes
/// visiting the station changes afterwards, and only through route
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct Station {
    id: StationId,
    name: String,
    x: f64,
    y: f64,
    adjacency: Vec<Adjacent>,
    routes: BTreeSet<RouteId>,
}

impl Station {
    pub(crate) fn new(id: StationId, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            adjacency: Vec::new(),
            routes: BTreeSet::new(),
        }
    }

    /// Station handle.
    pub fn id(&self) -> StationId {
        self.id
    }

    /// Unique station name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(x, y)` coordinates, used for display only.
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Neighbouring stations in the order their connections were added.
    pub fn adjacency(&self) -> &[Adjacent] {
        &self.adjacency
    }

    /// Number of connections at this station.
    pub fn degree(&self) -> usize {
        self.adjacency.len()
    }

    /// The connection to `neighbour`, if the two stations are adjacent.
    pub fn connection_to(&self, neighbour: StationId) -> Option<ConnectionId> {
        self.adjacency
            .iter()
            .find(|adj| adj.station == neighbour)
            .map(|adj| adj.connection)
    }

    /// Returns `true` if the station is adjacent to `neighbour`.
    pub fn is_adjacent(&self, neighbour: StationId) -> bool {
        self.connection_to(neighbour).is_some()
    }

    /// Ids of the routes currently visiting this station.
    pub fn routes(&self) -> &BTreeSet<RouteId> {
        &self.routes
    }

    /// Returns `true` if route `route` visits this station.
    pub fn in_route(&self, route: RouteId) -> bool {
        self.routes.contains(&route)
    }

    /// Returns `true` if at least one route visits this station.
    pub fn is_visited(&self) -> bool {
        !self.routes.is_empty()
    }

    pub(crate) fn add_connection(&mut self, neighbour: StationId, connection: ConnectionId) {
        self.adjacency.push(Adjacent {
            station: neighbour,
            connection,
        });
    }

    /// Registers a route. Registering twice is a no-op.
    pub(crate) fn add_route(&mut self, route: RouteId) {
        self.routes.insert(route);
    }

    /// Unregisters a route. Removing an absent route is a no-op.
    pub(crate) fn remove_route(&mut self, route: RouteId) {
        self.routes.remove(&route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_new() {
        let s = Station::new(StationId(3), "Alkmaar", 4.7, 52.6);
        assert_eq!(s.id(), StationId(3));
        assert_eq!(s.name(), "Alkmaar");
        assert_eq!(s.position(), (4.7, 52.6));
        assert_eq!(s.degree(), 0);
        assert!(!s.is_visited());
    }

    #[test]
    fn test_adjacency_lookup() {
        let mut s = Station::new(StationId(0), "A", 0.0, 0.0);
        s.add_connection(StationId(1), ConnectionId(0));
        s.add_connection(StationId(2), ConnectionId(1));
        assert_eq!(s.degree(), 2);
        assert_eq!(s.connection_to(StationId(2)), Some(ConnectionId(1)));
        assert_eq!(s.connection_to(StationId(5)), None);
        assert!(s.is_adjacent(StationId(1)));
    }

    #[test]
    fn test_route_registration_idempotent() {
        let mut s = Station::new(StationId(0), "A", 0.0, 0.0);
        s.add_route(RouteId(1));
        s.add_route(RouteId(1));
        assert_eq!(s.routes().len(), 1);
        assert!(s.in_route(RouteId(1)));

        s.remove_route(RouteId(9));
        assert_eq!(s.routes().len(), 1);

        s.remove_route(RouteId(1));
        s.remove_route(RouteId(1));
        assert!(!s.is_visited());
    }
}
