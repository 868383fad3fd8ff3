//! Hill climber configuration.

use std::time::Duration;

use crate::error::{NetworkError, Result};
use crate::models::{MoveFilter, MoveOptions};

/// Configuration for the [`HillClimber`](super::HillClimber).
///
/// Defaults reproduce the plain strict hill climb: a 180 minute route cap,
/// 500 000 iterations, every route mutated every iteration, and no early
/// stopping.
///
/// # Examples
///
/// ```
/// use rail_routing::hill_climber::HillClimberConfig;
///
/// let config = HillClimberConfig::default()
///     .with_max_duration(120.0)
///     .with_iterations(10_000)
///     .with_stall_limit(2_000)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HillClimberConfig {
    /// Route duration cap. Extensions must keep the duration strictly below it.
    pub max_duration: f64,

    /// Iteration budget.
    pub iterations: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,

    /// Stop after this many iterations without a strict improvement.
    pub stall_limit: Option<usize>,

    /// Stop once this much wall-clock time has elapsed.
    pub time_limit: Option<Duration>,

    /// Which neighbours count as extension candidates.
    pub move_filter: MoveFilter,

    /// Probability that an iteration replaces the lowest-scoring route with
    /// a fresh random route instead of mutating every route.
    pub replace_rate: f64,

    /// Extension budget for a replacement route.
    pub replacement_steps: usize,

    /// Emit a progress event every this many iterations.
    pub log_every: usize,
}

impl Default for HillClimberConfig {
    fn default() -> Self {
        Self {
            max_duration: 180.0,
            iterations: 500_000,
            seed: None,
            stall_limit: None,
            time_limit: None,
            move_filter: MoveFilter::All,
            replace_rate: 0.0,
            replacement_steps: 50,
            log_every: 10_000,
        }
    }
}

impl HillClimberConfig {
    pub fn with_max_duration(mut self, max_duration: f64) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_stall_limit(mut self, n: usize) -> Self {
        self.stall_limit = Some(n);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_move_filter(mut self, filter: MoveFilter) -> Self {
        self.move_filter = filter;
        self
    }

    pub fn with_replace_rate(mut self, rate: f64) -> Self {
        self.replace_rate = rate;
        self
    }

    pub fn with_replacement_steps(mut self, n: usize) -> Self {
        self.replacement_steps = n;
        self
    }

    pub fn with_log_every(mut self, n: usize) -> Self {
        self.log_every = n;
        self
    }

    /// Move options derived from the configured filter.
    pub fn move_options(&self) -> MoveOptions {
        MoveOptions::default().with_filter(self.move_filter)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.max_duration.is_finite() || self.max_duration <= 0.0 {
            return Err(NetworkError::InvalidConfig(format!(
                "max_duration must be positive, got {}",
                self.max_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.replace_rate) {
            return Err(NetworkError::InvalidConfig(format!(
                "replace_rate must be in [0, 1], got {}",
                self.replace_rate
            )));
        }
        if self.log_every == 0 {
            return Err(NetworkError::InvalidConfig(
                "log_every must be at least 1".into(),
            ));
        }
        if self.stall_limit == Some(0) {
            return Err(NetworkError::InvalidConfig(
                "stall_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HillClimberConfig::default();
        assert!((config.max_duration - 180.0).abs() < 1e-10);
        assert_eq!(config.iterations, 500_000);
        assert!(config.seed.is_none());
        assert!(config.stall_limit.is_none());
        assert_eq!(config.replace_rate, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_duration() {
        assert!(HillClimberConfig::default()
            .with_max_duration(0.0)
            .validate()
            .is_err());
        assert!(HillClimberConfig::default()
            .with_max_duration(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_bad_replace_rate() {
        let config = HillClimberConfig::default().with_replace_rate(1.5);
        assert!(matches!(
            config.validate(),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_zero_limits() {
        assert!(HillClimberConfig::default().with_log_every(0).validate().is_err());
        assert!(HillClimberConfig::default().with_stall_limit(0).validate().is_err());
    }

    #[test]
    fn test_move_options() {
        let config = HillClimberConfig::default().with_move_filter(MoveFilter::UnvisitedStations);
        assert_eq!(config.move_options().filter, MoveFilter::UnvisitedStations);
    }
}
