//! Connection (graph edge) type.

use std::collections::BTreeSet;

use super::{ConnectionId, RouteId, StationId};

/// An undirected rail connection between two distinct stations.
///
/// Both endpoint stations refer to the same connection through their
/// adjacency; the network owns the instance. The duration never changes
/// after construction.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    stations: [StationId; 2],
    duration: f64,
    routes: BTreeSet<RouteId>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, a: StationId, b: StationId, duration: f64) -> Self {
        Self {
            id,
            stations: [a, b],
            duration,
            routes: BTreeSet::new(),
        }
    }

    /// Connection handle.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The two joined stations, in the order they were given at import.
    pub fn endpoints(&self) -> [StationId; 2] {
        self.stations
    }

    /// Travel time along this connection.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns `true` if this connection joins `a` and `b`, in either order.
    pub fn joins(&self, a: StationId, b: StationId) -> bool {
        (self.stations[0] == a && self.stations[1] == b)
            || (self.stations[0] == b && self.stations[1] == a)
    }

    /// The endpoint opposite `station`, or `None` if `station` is not an endpoint.
    pub fn other(&self, station: StationId) -> Option<StationId> {
        match self.stations {
            [a, b] if a == station => Some(b),
            [a, b] if b == station => Some(a),
            _ => None,
        }
    }

    /// Ids of the routes whose path uses this connection.
    pub fn routes(&self) -> &BTreeSet<RouteId> {
        &self.routes
    }

    /// Returns `true` if at least one route uses this connection.
    pub fn is_used(&self) -> bool {
        !self.routes.is_empty()
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
