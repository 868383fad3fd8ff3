//! Station and connection arenas.

use std::collections::HashMap;

use crate::error::{NetworkError, Result};

use super::{Candidate, Connection, ConnectionId, MoveFilter, MoveOptions, Station, StationId};

/// Arena of stations and connections addressed by stable handles.
///
/// Routes store [`StationId`] and [`ConnectionId`] handles into this arena,
/// never references, so copying a network is a plain structural clone.
#[derive(Debug, Clone, Default)]
pub struct RailGraph {
    stations: Vec<Station>,
    connections: Vec<Connection>,
    by_name: HashMap<String, StationId>,
}

impl RailGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_station(&mut self, name: &str, x: f64, y: f64) -> Result<StationId> {
        if self.by_name.contains_key(name) {
            return Err(NetworkError::DuplicateStation(name.to_string()));
        }
        let id = StationId(self.stations.len());
        self.stations.push(Station::new(id, name, x, y));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub(crate) fn add_connection(&mut self, from: &str, to: &str, duration: f64) -> Result<ConnectionId> {
        let a = self.station_id(from)?;
        let b = self.station_id(to)?;
        if a == b {
            return Err(NetworkError::SelfConnection(from.to_string()));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(NetworkError::InvalidDuration {
                from: from.to_string(),
                to: to.to_string(),
                duration,
            });
        }
        if self.stations[a.0].is_adjacent(b) {
            return Err(NetworkError::DuplicateConnection {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection::new(id, a, b, duration));
        self.stations[a.0].add_connection(b, id);
        self.stations[b.0].add_connection(a, id);
        Ok(id)
    }

    /// Number of stations.
    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    /// Number of connections.
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }

    /// All stations, indexed by [`StationId`].
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// All connections, indexed by [`ConnectionId`].
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Looks up a station by handle.
    pub fn station(&self, id: StationId) -> Result<&Station> {
        self.stations
            .get(id.0)
            .ok_or(NetworkError::StationIdNotFound(id))
    }

    /// Looks up a connection by handle.
    pub fn connection(&self, id: ConnectionId) -> Result<&Connection> {
        self.connections
            .get(id.0)
            .ok_or(NetworkError::ConnectionIdNotFound(id))
    }

    /// Resolves a station name to its handle.
    pub fn station_id(&self, name: &str) -> Result<StationId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::StationNotFound(name.to_string()))
    }

    /// Looks up a station by name.
    pub fn station_by_name(&self, name: &str) -> Result<&Station> {
        let id = self.station_id(name)?;
        self.station(id)
    }

    /// The connection from `station` to its neighbour called `neighbour`.
    pub fn neighbour_connection(&self, station: StationId, neighbour: &str) -> Result<&Connection> {
        let from = self.station(station)?;
        let to = self.station_id(neighbour)?;
        let id = from
            .connection_to(to)
            .ok_or_else(|| NetworkError::ConnectionNotFound {
                from: from.name().to_string(),
                to: neighbour.to_string(),
            })?;
        self.connection(id)
    }

    /// The connection joining the stations called `a` and `b`.
    pub fn connection_between(&self, a: &str, b: &str) -> Result<&Connection> {
        let from = self.station_id(a)?;
        self.neighbour_connection(from, b)
    }

    /// Number of neighbours of `station` that no route visits.
    pub fn unvisited_neighbour_count(&self, station: StationId) -> usize {
        self.stations.get(station.0).map_or(0, |s| {
            s.adjacency()
                .iter()
                .filter(|adj| {
                    self.stations
                        .get(adj.station.0)
                        .is_some_and(|n| !n.is_visited())
                })
                .count()
        })
    }

    /// Number of connections at `station` that no route uses.
    pub fn unused_connection_count(&self, station: StationId) -> usize {
        self.stations.get(station.0).map_or(0, |s| {
            s.adjacency()
                .iter()
                .filter(|adj| {
                    self.connections
                        .get(adj.connection.0)
                        .is_some_and(|c| !c.is_used())
                })
                .count()
        })
    }

    /// Neighbours of `station` that pass `options.filter`, with the
    /// requested annotations filled in.
    pub fn neighbours(&self, station: StationId, options: &MoveOptions) -> Vec<Candidate> {
        let Some(s) = self.stations.get(station.0) else {
            return Vec::new();
        };

        s.adjacency()
            .iter()
            .filter_map(|adj| {
                let neighbour = self.stations.get(adj.station.0)?;
                let connection = self.connections.get(adj.connection.0)?;
                let eligible = match options.filter {
                    MoveFilter::All => true,
                    MoveFilter::UnusedConnections => !connection.is_used(),
                    MoveFilter::UnvisitedStations => !neighbour.is_visited(),
                };
                if !eligible {
                    return None;
                }
                Some(Candidate {
                    station: adj.station,
                    connection: adj.connection,
                    duration: connection.duration(),
                    degree: options.degree.then(|| neighbour.degree()),
                    unused: options
                        .unused
                        .then(|| self.unused_connection_count(adj.station)),
                    unvisited: options
                        .unvisited
                        .then(|| self.unvisited_neighbour_count(adj.station)),
                })
            })
            .collect()
    }

    pub(crate) fn station_mut(&mut self, id: StationId) -> Option<&mut Station> {
        self.stations.get_mut(id.0)
    }

    pub(crate) fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id.0)
    }
}
