//! Solution and score history writers.
//!
//! The solution file lists one route per record, followed by the network
//! coverage and total score:
//!
//! ```text
//! train,stations
//! 0,"[Alkmaar, Hoorn, Zaandam]"
//! 3,"[Den Helder, Alkmaar]"
//! coverage,7.142857142857143
//! score,1234.5
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::hill_climber::{ImprovementSink, ScoreRecord};
use crate::models::{RailNetwork, RouteListing};

/// Writes the route listing, coverage, and score of `network` as CSV.
///
/// # Examples
///
/// ```
/// use rail_routing::io::write_solution;
/// use rail_routing::models::RailNetwork;
///
/// let mut b = RailNetwork::builder();
/// b.add_station("A", 0.0, 0.0).unwrap();
/// b.add_station("B", 1.0, 0.0).unwrap();
/// b.add_connection("A", "B", 20.0).unwrap();
/// let mut network = b.build();
/// let r = network.create_route(network.station_id("A").unwrap()).unwrap();
/// network.append_station(r, network.station_id("B").unwrap()).unwrap();
///
/// let mut out = Vec::new();
/// write_solution(&mut out, &network).unwrap();
/// let text = String::from_utf8(out).unwrap();
/// assert!(text.starts_with("train,stations\n0,\"[A, B]\"\n"));
/// assert!(text.ends_with("score,9880\n"));
/// ```
pub fn write_solution<W: Write>(writer: W, network: &RailNetwork) -> Result<()> {
    // The station list is always quoted, even for a single station, so the
    // writer must not apply its own quoting on top.
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);
    wtr.write_record(["train", "stations"])?;
    for listing in network.route_listing() {
        wtr.write_record([listing.id.to_string(), quoted(&listing.stations_field())])?;
    }
    wtr.write_record(["coverage".to_string(), network.coverage().to_string()])?;
    wtr.write_record(["score".to_string(), network.score().to_string()])?;
    wtr.flush()?;
    Ok(())
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Writes an `iteration,score` record stream.
pub fn write_scores<W: Write>(writer: W, history: &[ScoreRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in history {
        wtr.serialize(record)?;
    }
    if history.is_empty() {
        wtr.write_record(["iteration", "score"])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Machine-readable summary of a solution.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    pub score: f64,
    /// Percent of network connections used by at least one route.
    pub coverage: f64,
    pub routes: Vec<RouteListing>,
    pub history: Vec<ScoreRecord>,
}

impl SolutionReport {
    pub fn new(network: &RailNetwork, history: &[ScoreRecord]) -> Self {
        Self {
            score: network.score(),
            coverage: network.coverage(),
            routes: network.route_listing(),
            history: history.to_vec(),
        }
    }
}

/// Writes `network` and its score history as pretty-printed JSON.
pub fn write_report<W: Write>(writer: W, network: &RailNetwork, history: &[ScoreRecord]) -> Result<()> {
    serde_json::to_writer_pretty(writer, &SolutionReport::new(network, history))?;
    Ok(())
}

/// Improvement sink that rewrites a solution file on every accepted
/// iteration, so the file always holds the best network found so far.
#[derive(Debug, Clone)]
pub struct SolutionExporter {
    path: PathBuf,
    writes: usize,
}

impl SolutionExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the file was written.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ImprovementSink for SolutionExporter {
    fn record(&mut self, iteration: usize, score: f64, network: &RailNetwork) -> Result<()> {
        trace!(iteration, score, path = %self.path.display(), "Exporting solution");
        let file = File::create(&self.path)?;
        write_solution(BufWriter::new(file), network)?;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hill_climber::{HillClimber, HillClimberConfig};
    use crate::models::StationId;

    /// A - B - C line (AB=10, BC=15).
    fn line() -> RailNetwork {
        let mut b = RailNetwork::builder();
        b.add_station("A", 0.0, 0.0).expect("A");
        b.add_station("B", 1.0, 0.0).expect("B");
        b.add_station("C", 2.0, 0.0).expect("C");
        b.add_connection("A", "B", 10.0).expect("AB");
        b.add_connection("B", "C", 15.0).expect("BC");
        b.build()
    }

    #[test]
    fn test_write_solution() {
        let mut n = line();
        let r0 = n.create_route(StationId(0)).expect("r0");
        n.append_station(r0, StationId(1)).expect("B");
        let r1 = n.create_route(StationId(2)).expect("r1");
        n.append_station(r1, StationId(1)).expect("B");

        let mut out = Vec::new();
        write_solution(&mut out, &n).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "train,stations");
        assert_eq!(lines[1], "0,\"[A, B]\"");
        assert_eq!(lines[2], "1,\"[C, B]\"");
        assert_eq!(lines[3], "coverage,100");
        // (5000 - 110) + (5000 - 115)
        assert_eq!(lines[4], "score,9775");
    }

    #[test]
    fn test_write_solution_single_station_route() {
        let mut b = RailNetwork::builder();
        b.add_station("Den Helder", 4.76, 52.96).expect("station");
        let mut n = b.build();
        n.create_route(StationId(0)).expect("route");

        let mut out = Vec::new();
        write_solution(&mut out, &n).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "0,\"[Den Helder]\"");
        assert_eq!(lines[1], n.route_listing()[0].to_string());
    }

    #[test]
    fn test_write_solution_round_trips_through_csv() {
        let mut b = RailNetwork::builder();
        b.add_station("Hoorn \"Kersenboogerd\"", 0.0, 0.0).expect("station");
        let mut n = b.build();
        n.create_route(StationId(0)).expect("route");

        let mut out = Vec::new();
        write_solution(&mut out, &n).expect("write");
        let mut reader = csv::Reader::from_reader(out.as_slice());
        let first = reader
            .records()
            .next()
            .expect("record")
            .expect("valid csv");
        assert_eq!(&first[0], "0");
        assert_eq!(&first[1], "[Hoorn \"Kersenboogerd\"]");
    }

    #[test]
    fn test_write_solution_without_routes() {
        let mut out = Vec::new();
        write_solution(&mut out, &line()).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "train,stations\ncoverage,0\nscore,0\n");
    }

    #[test]
    fn test_write_scores() {
        let history = [
            ScoreRecord { iteration: 0, score: 10.0 },
            ScoreRecord { iteration: 4, score: 12.5 },
        ];
        let mut out = Vec::new();
        write_scores(&mut out, &history).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "iteration,score\n0,10.0\n4,12.5\n"
        );

        let mut out = Vec::new();
        write_scores(&mut out, &[]).expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "iteration,score\n");
    }

    #[test]
    fn test_write_report() {
        let mut n = line();
        let r = n.create_route(StationId(0)).expect("route");
        n.append_station(r, StationId(1)).expect("B");
        let history = [ScoreRecord { iteration: 2, score: n.score() }];

        let mut out = Vec::new();
        write_report(&mut out, &n, &history).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["coverage"], 50.0);
        assert_eq!(value["routes"][0]["id"], 0);
        assert_eq!(value["routes"][0]["stations"][1], "B");
        assert_eq!(value["history"][0]["iteration"], 2);
    }

    #[test]
    fn test_exporter_tracks_best() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("output.csv");
        let mut n = line();
        n.create_route(StationId(1)).expect("route");

        let config = HillClimberConfig::default()
            .with_max_duration(60.0)
            .with_iterations(50)
            .with_seed(3);
        let mut exporter = SolutionExporter::new(&path);
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut exporter)
            .expect("run");

        assert_eq!(exporter.writes(), result.accepted);
        assert!(exporter.writes() > 0);
        let text = std::fs::read_to_string(exporter.path()).expect("read");
        assert!(text.ends_with(&format!("score,{}\n", result.best_score)));
    }

    #[test]
    fn test_exporter_bad_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut exporter = SolutionExporter::new(dir.path().join("missing").join("out.csv"));
        assert!(exporter.record(0, 0.0, &line()).is_err());
        assert_eq!(exporter.writes(), 0);
    }
}
