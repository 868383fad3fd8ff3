//! Rail network: owner of the graph arenas and of all routes.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{NetworkError, Result};

use super::{
    Connection, ConnectionId, LegalMoves, MoveOptions, RailGraph, Route, RouteId, Station,
    StationId,
};

/// One-shot importer for stations and connections.
///
/// # Examples
///
/// ```
/// use rail_routing::models::RailNetwork;
///
/// let mut builder = RailNetwork::builder();
/// builder.add_station("Den Helder", 52.96, 4.76).unwrap();
/// builder.add_station("Alkmaar", 52.64, 4.74).unwrap();
/// builder.add_connection("Den Helder", "Alkmaar", 36.0).unwrap();
/// let network = builder.build();
///
/// assert_eq!(network.graph().num_stations(), 2);
/// assert_eq!(network.num_connections(), 1);
/// ```
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    graph: RailGraph,
}

impl NetworkBuilder {
    /// Adds a station at `(x, y)`. Names must be unique.
    pub fn add_station(&mut self, name: &str, x: f64, y: f64) -> Result<StationId> {
        self.graph.add_station(name, x, y)
    }

    /// Connects two previously added stations.
    pub fn add_connection(&mut self, from: &str, to: &str, duration: f64) -> Result<ConnectionId> {
        self.graph.add_connection(from, to, duration)
    }

    /// Finishes the import. The station and connection sets are fixed from here on.
    pub fn build(self) -> RailNetwork {
        debug!(
            stations = self.graph.num_stations(),
            connections = self.graph.num_connections(),
            "Rail network built"
        );
        RailNetwork {
            graph: self.graph,
            routes: BTreeMap::new(),
            next_route_id: 0,
        }
    }
}

/// A route as an ordered list of station names.
///
/// Displays in the export format `<id>,"[<station>, <station>, ...]"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteListing {
    /// Route id.
    pub id: RouteId,
    /// Station names in visiting order.
    pub stations: Vec<String>,
}

impl RouteListing {
    /// Station names as a bracketed, comma separated list.
    pub fn stations_field(&self) -> String {
        format!("[{}]", self.stations.join(", "))
    }
}

impl fmt::Display for RouteListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},\"{}\"", self.id, self.stations_field())
    }
}

/// Saved state of selected routes, restorable with [`RailNetwork::restore`].
///
/// Only routes explicitly saved are copied; routes created after the
/// checkpoint are dropped on restore.
#[derive(Debug, Clone)]
pub struct RouteCheckpoint {
    saved: BTreeMap<RouteId, Option<Route>>,
    next_route_id: usize,
}

impl RouteCheckpoint {
    /// Records the current state of `route` unless it was already recorded.
    ///
    /// A route that does not exist yet is recorded as absent.
    pub fn save(&mut self, network: &RailNetwork, route: RouteId) {
        self.saved
            .entry(route)
            .or_insert_with(|| network.routes.get(&route).cloned());
    }

    /// Number of routes recorded.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Returns `true` if no route was recorded.
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}

/// A rail network: stations, connections, and the routes laid over them.
///
/// The network is the sole owner of every station, connection, and route.
/// All route edits go through it so that registration sets stay in sync.
///
/// # Examples
///
/// ```
/// use rail_routing::models::RailNetwork;
///
/// let mut builder = RailNetwork::builder();
/// for (name, x) in [("A", 0.0), ("B", 1.0), ("C", 2.0)] {
///     builder.add_station(name, x, 0.0).unwrap();
/// }
/// builder.add_connection("A", "B", 10.0).unwrap();
/// builder.add_connection("B", "C", 15.0).unwrap();
/// let mut network = builder.build();
///
/// let a = network.station_id("A").unwrap();
/// let route = network.create_route(a).unwrap();
/// network.append_station(route, network.station_id("B").unwrap()).unwrap();
/// network.append_station(route, network.station_id("C").unwrap()).unwrap();
///
/// let r = network.route(route).unwrap();
/// assert_eq!(r.duration(), 25.0);
/// assert!(r.is_valid(30.0));
/// assert!(!r.is_valid(20.0));
/// assert!((network.coverage() - 100.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct RailNetwork {
    graph: RailGraph,
    routes: BTreeMap<RouteId, Route>,
    next_route_id: usize,
}

impl RailNetwork {
    /// Starts a network import.
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder {
            graph: RailGraph::new(),
        }
    }

    /// The station/connection arena.
    pub fn graph(&self) -> &RailGraph {
        &self.graph
    }

    /// All stations.
    pub fn stations(&self) -> &[Station] {
        self.graph.stations()
    }

    /// All connections.
    pub fn connections(&self) -> &[Connection] {
        self.graph.connections()
    }

    /// Total number of connections in the network.
    pub fn num_connections(&self) -> usize {
        self.graph.num_connections()
    }

    /// Looks up a station by handle.
    pub fn station(&self, id: StationId) -> Result<&Station> {
        self.graph.station(id)
    }

    /// Looks up a station by name.
    pub fn station_by_name(&self, name: &str) -> Result<&Station> {
        self.graph.station_by_name(name)
    }

    /// Resolves a station name to its handle.
    pub fn station_id(&self, name: &str) -> Result<StationId> {
        self.graph.station_id(name)
    }

    /// Looks up a connection by handle.
    pub fn connection(&self, id: ConnectionId) -> Result<&Connection> {
        self.graph.connection(id)
    }

    /// The connection joining the stations named `a` and `b`.
    pub fn connection_between(&self, a: &str, b: &str) -> Result<&Connection> {
        self.graph.connection_between(a, b)
    }

    /// Creates a route holding only `root` and returns its fresh id.
    pub fn create_route(&mut self, root: StationId) -> Result<RouteId> {
        let id = RouteId(self.next_route_id);
        let route = Route::new(id, root, &mut self.graph)?;
        self.next_route_id += 1;
        self.routes.insert(id, route);
        trace!(route = %id, station = %root, "Route created");
        Ok(id)
    }

    /// Looks up a route.
    pub fn route(&self, id: RouteId) -> Result<&Route> {
        self.routes.get(&id).ok_or(NetworkError::RouteNotFound(id))
    }

    /// Empties a route, releasing all its registrations, and removes it.
    pub fn del_route(&mut self, id: RouteId) -> Result<()> {
        let mut route = self
            .routes
            .remove(&id)
            .ok_or(NetworkError::RouteNotFound(id))?;
        route.empty(&mut self.graph);
        trace!(route = %id, "Route deleted");
        Ok(())
    }

    /// All routes in id order.
    pub fn list_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Ids of all routes in ascending order.
    pub fn route_ids(&self) -> Vec<RouteId> {
        self.routes.keys().copied().collect()
    }

    /// Number of routes.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Appends `station` to route `id`.
    pub fn append_station(&mut self, id: RouteId, station: StationId) -> Result<()> {
        let route = self.routes.get_mut(&id).ok_or(NetworkError::RouteNotFound(id))?;
        route.append(&mut self.graph, station)
    }

    /// Inserts `station` into route `id` before position `index`.
    pub fn insert_station(&mut self, id: RouteId, index: isize, station: StationId) -> Result<()> {
        let route = self.routes.get_mut(&id).ok_or(NetworkError::RouteNotFound(id))?;
        route.insert(&mut self.graph, index, station)
    }

    /// Removes the station at `index` from route `id`.
    pub fn pop_station(&mut self, id: RouteId, index: isize) -> Result<StationId> {
        let route = self.routes.get_mut(&id).ok_or(NetworkError::RouteNotFound(id))?;
        route.pop_station(&mut self.graph, index)
    }

    /// Removes the last station from route `id`.
    pub fn pop_last(&mut self, id: RouteId) -> Result<StationId> {
        self.pop_station(id, -1)
    }

    /// Clears route `id` without removing it from the network.
    pub fn empty_route(&mut self, id: RouteId) -> Result<()> {
        let route = self.routes.get_mut(&id).ok_or(NetworkError::RouteNotFound(id))?;
        route.empty(&mut self.graph);
        Ok(())
    }

    /// Legal endpoint extensions of route `id`.
    pub fn legal_moves(&self, id: RouteId, max_duration: f64, options: &MoveOptions) -> Result<LegalMoves> {
        Ok(self.route(id)?.legal_moves(&self.graph, max_duration, options))
    }

    /// Returns `true` if route `id` has at least one legal extension.
    pub fn has_legal_moves(&self, id: RouteId, max_duration: f64, options: &MoveOptions) -> Result<bool> {
        Ok(self.route(id)?.has_legal_moves(&self.graph, max_duration, options))
    }

    /// Score of a single route against the whole network.
    pub fn route_score(&self, id: RouteId) -> Result<f64> {
        Ok(self.route(id)?.route_score(self.num_connections()))
    }

    /// Sum of every route's score.
    pub fn score(&self) -> f64 {
        let total = self.num_connections();
        self.routes
            .values()
            .fold(0.0, |acc, r| acc + r.route_score(total))
    }

    /// The route with the lowest score, if any. Ties go to the lowest id.
    pub fn lowest_scoring_route(&self) -> Option<RouteId> {
        let total = self.num_connections();
        self.routes
            .values()
            .map(|r| (r.id(), r.route_score(total)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Number of connections used by at least one route.
    pub fn unique_connection_count(&self) -> usize {
        self.graph.connections().iter().filter(|c| c.is_used()).count()
    }

    /// Percentage of network connections covered by the routes.
    pub fn coverage(&self) -> f64 {
        let total = self.num_connections();
        if total == 0 {
            return 0.0;
        }
        self.unique_connection_count() as f64 / total as f64 * 100.0
    }

    /// Routes as ordered station-name lists.
    pub fn route_listing(&self) -> Vec<RouteListing> {
        self.routes
            .values()
            .map(|r| RouteListing {
                id: r.id(),
                stations: r
                    .stations()
                    .iter()
                    .filter_map(|&s| self.graph.station(s).ok())
                    .map(|s| s.name().to_string())
                    .collect(),
            })
            .collect()
    }

    /// Raw station coordinates.
    pub fn station_points(&self) -> Vec<(f64, f64)> {
        self.graph.stations().iter().map(Station::position).collect()
    }

    /// Endpoint coordinate pairs of every connection.
    pub fn connection_points(&self) -> Vec<((f64, f64), (f64, f64))> {
        self.graph
            .connections()
            .iter()
            .filter_map(|c| self.point_pair(c.id()))
            .collect()
    }

    /// Endpoint coordinate pairs of each route's present links.
    pub fn route_point_lists(&self) -> Vec<Vec<((f64, f64), (f64, f64))>> {
        self.routes
            .values()
            .map(|r| {
                r.legs()
                    .iter()
                    .flatten()
                    .filter_map(|leg| self.point_pair(leg.connection))
                    .collect()
            })
            .collect()
    }

    fn point_pair(&self, id: ConnectionId) -> Option<((f64, f64), (f64, f64))> {
        let [a, b] = self.graph.connection(id).ok()?.endpoints();
        Some((
            self.graph.station(a).ok()?.position(),
            self.graph.station(b).ok()?.position(),
        ))
    }

    /// Verifies that every route only references connections owned by this
    /// network and that all registration sets match the routes.
    pub fn check_invariants(&self) -> Result<()> {
        for route in self.routes.values() {
            for leg in route.legs().iter().flatten() {
                self.graph
                    .connection(leg.connection)
                    .map_err(|_| NetworkError::ForeignConnection(leg.connection))?;
            }
            route.check_consistency(&self.graph)?;
        }
        for station in self.graph.stations() {
            if let Some(&id) = station.routes().iter().find(|id| !self.routes.contains_key(id)) {
                return Err(NetworkError::Inconsistent {
                    route: id,
                    message: format!("unknown route registered at station {}", station.name()),
                });
            }
        }
        for connection in self.graph.connections() {
            if let Some(&id) = connection.routes().iter().find(|id| !self.routes.contains_key(id)) {
                return Err(NetworkError::Inconsistent {
                    route: id,
                    message: format!("unknown route registered at connection {}", connection.id()),
                });
            }
        }
        Ok(())
    }

    /// Starts a checkpoint; save routes into it before editing them.
    pub fn checkpoint(&self) -> RouteCheckpoint {
        RouteCheckpoint {
            saved: BTreeMap::new(),
            next_route_id: self.next_route_id,
        }
    }

    /// Rolls saved routes back to their checkpointed state and drops routes
    /// created since the checkpoint.
    pub fn restore(&mut self, checkpoint: RouteCheckpoint) {
        for (id, saved) in checkpoint.saved {
            if let Some(mut current) = self.routes.remove(&id) {
                current.empty(&mut self.graph);
            }
            if let Some(route) = saved {
                route.attach(&mut self.graph);
                self.routes.insert(id, route);
            }
        }

        let created: Vec<RouteId> = self
            .routes
            .range(RouteId(checkpoint.next_route_id)..)
            .map(|(&id, _)| id)
            .collect();
        for id in created {
            if let Some(mut route) = self.routes.remove(&id) {
                route.empty(&mut self.graph);
            }
        }
        self.next_route_id = checkpoint.next_route_id;
    }
}
