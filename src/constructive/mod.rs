//! Constructive heuristics for building initial route sets.
//!
//! - [`random_route`]: one route grown by uniformly random legal moves
//! - [`random_solution`]: `n` random routes rooted at random stations
//! - [`extend_randomly`]: a single random endpoint extension, shared with
//!   the hill climber's mutation step

mod random;

pub use random::{extend_randomly, random_route, random_solution};
