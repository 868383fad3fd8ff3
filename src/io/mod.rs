//! File adapters around the core model.
//!
//! - [`loader`]: stations and connections from CSV
//! - [`export`]: solution, score history, and JSON report writers

pub mod export;
pub mod loader;

pub use export::{write_report, write_scores, write_solution, SolutionExporter, SolutionReport};
pub use loader::{load_network, read_network};
