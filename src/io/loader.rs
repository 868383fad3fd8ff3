//! CSV network loader.
//!
//! Expects two files with header rows:
//!
//! ```text
//! station,y,x
//! Alkmaar,52.63777924,4.739999771
//!
//! station1,station2,distance
//! Alkmaar,Hoorn,24
//! ```
//!
//! Station coordinates are given latitude first.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::models::RailNetwork;

#[derive(Debug, Deserialize)]
struct StationRecord {
    station: String,
    y: f64,
    x: f64,
}

#[derive(Debug, Deserialize)]
struct ConnectionRecord {
    station1: String,
    station2: String,
    distance: f64,
}

/// Loads a network from a stations file and a connections file.
pub fn load_network(stations: impl AsRef<Path>, connections: impl AsRef<Path>) -> Result<RailNetwork> {
    let stations = stations.as_ref();
    let connections = connections.as_ref();
    debug!(stations = %stations.display(), connections = %connections.display(), "Loading network");
    read_network(File::open(stations)?, File::open(connections)?)
}

/// Reads a network from station and connection CSV sources.
///
/// # Examples
///
/// ```
/// use rail_routing::io::read_network;
///
/// let stations = "station,y,x\nA,52.0,4.0\nB,52.1,4.2\n";
/// let connections = "station1,station2,distance\nA,B,12\n";
/// let network = read_network(stations.as_bytes(), connections.as_bytes()).unwrap();
/// assert_eq!(network.connection_between("B", "A").unwrap().duration(), 12.0);
/// ```
pub fn read_network<S: Read, C: Read>(stations: S, connections: C) -> Result<RailNetwork> {
    let mut builder = RailNetwork::builder();

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(stations);
    for record in reader.deserialize() {
        let record: StationRecord = record?;
        builder.add_station(&record.station, record.x, record.y)?;
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(connections);
    for record in reader.deserialize() {
        let record: ConnectionRecord = record?;
        builder.add_connection(&record.station1, &record.station2, record.distance)?;
    }

    Ok(builder.build())
}
