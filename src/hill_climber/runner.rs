//! Hill climbing execution loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::HillClimberConfig;
use super::mutation::{mutate_route, replace_lowest_route, MutationKind, MutationOutcome};
use crate::error::Result;
use crate::models::{MoveOptions, RailNetwork};

/// One accepted iteration: `(iteration, score)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub iteration: usize,
    pub score: f64,
}

/// Receives every accepted candidate network.
///
/// The climber calls [`record`](Self::record) right after accepting an
/// iteration. An error aborts the run.
pub trait ImprovementSink {
    fn record(&mut self, iteration: usize, score: f64, network: &RailNetwork) -> Result<()>;
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ImprovementSink for NoopSink {
    fn record(&mut self, _iteration: usize, _score: f64, _network: &RailNetwork) -> Result<()> {
        Ok(())
    }
}

impl<F> ImprovementSink for F
where
    F: FnMut(usize, f64, &RailNetwork) -> Result<()>,
{
    fn record(&mut self, iteration: usize, score: f64, network: &RailNetwork) -> Result<()> {
        self(iteration, score, network)
    }
}

/// The two phases of every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Mutating the working copy.
    Exploring,
    /// Scoring the mutated copy and accepting or rejecting it.
    Evaluating,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration budget was used up.
    IterationBudget,
    /// No strict improvement within the stall limit.
    Stalled,
    /// The time limit elapsed.
    Deadline,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Result of a single iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Score of the mutated candidate.
    pub score: f64,
    /// Whether the candidate was kept.
    pub accepted: bool,
    /// Whether the candidate scored strictly higher than the previous best.
    pub improved: bool,
}

/// Result of a hill climbing run.
#[derive(Debug, Clone)]
pub struct HillClimbResult {
    /// The best network found.
    pub best: RailNetwork,

    /// Score of `best`.
    pub best_score: f64,

    /// Iterations performed.
    pub iterations: usize,

    /// Accepted candidates (including equal-score ones).
    pub accepted: usize,

    /// Candidates that strictly improved the score.
    pub improving: usize,

    /// Why the run stopped.
    pub stop_reason: StopReason,

    /// `(iteration, score)` for every accepted candidate.
    pub score_history: Vec<ScoreRecord>,
}

/// Strict hill climber over the routes of a [`RailNetwork`].
///
/// Each iteration mutates every route of the working copy (or, with
/// `replace_rate`, replaces the weakest route) and keeps the result if its
/// score is at least the best score so far. Rejected iterations are rolled
/// back from a checkpoint of the routes they touched, so every iteration
/// starts from the best-known state.
///
/// # Examples
///
/// ```
/// use rail_routing::models::RailNetwork;
/// use rail_routing::hill_climber::{HillClimber, HillClimberConfig, NoopSink};
///
/// let mut b = RailNetwork::builder();
/// for (name, x) in [("A", 0.0), ("B", 1.0), ("C", 2.0), ("D", 3.0)] {
///     b.add_station(name, x, 0.0).unwrap();
/// }
/// b.add_connection("A", "B", 10.0).unwrap();
/// b.add_connection("B", "C", 15.0).unwrap();
/// b.add_connection("C", "D", 12.0).unwrap();
/// let mut network = b.build();
/// network.create_route(network.station_id("B").unwrap()).unwrap();
///
/// let config = HillClimberConfig::default()
///     .with_max_duration(60.0)
///     .with_iterations(200)
///     .with_seed(42);
/// let start = network.score();
/// let result = HillClimber::new(&network, config).unwrap().run(&mut NoopSink).unwrap();
/// assert!(result.best_score >= start);
/// ```
#[derive(Debug)]
pub struct HillClimber {
    config: HillClimberConfig,
    options: MoveOptions,
    working: RailNetwork,
    best_score: f64,
    score_history: Vec<ScoreRecord>,
    iteration: usize,
    accepted: usize,
    improving: usize,
    state: SearchState,
    rng: StdRng,
}

impl HillClimber {
    /// Creates a climber working on a copy of `network`.
    pub fn new(network: &RailNetwork, config: HillClimberConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        let working = network.clone();
        let best_score = working.score();
        Ok(Self {
            options: config.move_options(),
            config,
            working,
            best_score,
            score_history: Vec::new(),
            iteration: 0,
            accepted: 0,
            improving: 0,
            state: SearchState::Exploring,
            rng,
        })
    }

    /// The working copy, which equals the best state between iterations.
    pub fn network(&self) -> &RailNetwork {
        &self.working
    }

    /// Best score retained so far.
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    /// Accepted `(iteration, score)` pairs so far.
    pub fn score_history(&self) -> &[ScoreRecord] {
        &self.score_history
    }

    /// Iterations performed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current phase.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// The active configuration.
    pub fn config(&self) -> &HillClimberConfig {
        &self.config
    }

    /// Performs one mutate-and-evaluate iteration.
    pub fn step<S: ImprovementSink + ?Sized>(&mut self, sink: &mut S) -> Result<StepOutcome> {
        self.state = SearchState::Exploring;
        let mut checkpoint = self.working.checkpoint();

        let replace = self.config.replace_rate > 0.0 && self.rng.random_bool(self.config.replace_rate);
        if replace {
            if let Some(lowest) = self.working.lowest_scoring_route() {
                checkpoint.save(&self.working, lowest);
            }
            replace_lowest_route(
                &mut self.working,
                self.config.max_duration,
                self.config.replacement_steps,
                &self.options,
                &mut self.rng,
            )?;
        } else {
            for route in self.working.route_ids() {
                checkpoint.save(&self.working, route);
                let kind = MutationKind::sample(&mut self.rng);
                let outcome = mutate_route(
                    &mut self.working,
                    route,
                    kind,
                    self.config.max_duration,
                    &self.options,
                    &mut self.rng,
                )?;
                if outcome == MutationOutcome::Removed {
                    debug!(route = %route, iteration = self.iteration, "Route emptied and removed");
                }
            }
        }

        self.state = SearchState::Evaluating;
        let score = self.working.score();
        let previous = self.best_score;
        let accepted = score >= previous;
        let improved = score > previous;

        if accepted {
            self.best_score = score;
            self.accepted += 1;
            if improved {
                self.improving += 1;
                debug!(iteration = self.iteration, score, previous, "Improved solution");
            }
            self.score_history.push(ScoreRecord {
                iteration: self.iteration,
                score,
            });
            sink.record(self.iteration, score, &self.working)?;
        } else {
            self.working.restore(checkpoint);
        }

        self.iteration += 1;
        self.state = SearchState::Exploring;
        Ok(StepOutcome {
            score,
            accepted,
            improved,
        })
    }

    /// Runs until the iteration budget or an opt-in stopping condition.
    pub fn run<S: ImprovementSink + ?Sized>(self, sink: &mut S) -> Result<HillClimbResult> {
        self.run_with_cancel(sink, None)
    }

    /// Runs with an optional cancellation flag checked before every iteration.
    pub fn run_with_cancel<S: ImprovementSink + ?Sized>(
        mut self,
        sink: &mut S,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<HillClimbResult> {
        let started = Instant::now();
        let mut since_improvement = 0usize;
        let mut stop_reason = StopReason::IterationBudget;

        info!(
            routes = self.working.num_routes(),
            score = self.best_score,
            iterations = self.config.iterations,
            "Hill climb started"
        );

        while self.iteration < self.config.iterations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    stop_reason = StopReason::Cancelled;
                    break;
                }
            }
            if let Some(limit) = self.config.time_limit {
                if started.elapsed() >= limit {
                    stop_reason = StopReason::Deadline;
                    break;
                }
            }

            let outcome = self.step(sink)?;
            if outcome.improved {
                since_improvement = 0;
            } else {
                since_improvement += 1;
            }

            if self.iteration % self.config.log_every == 0 {
                info!(
                    iteration = self.iteration,
                    score = self.best_score,
                    routes = self.working.num_routes(),
                    coverage = self.working.coverage(),
                    "Hill climb progress"
                );
            }

            if self
                .config
                .stall_limit
                .is_some_and(|limit| since_improvement >= limit)
            {
                stop_reason = StopReason::Stalled;
                break;
            }
        }

        info!(
            iterations = self.iteration,
            score = self.best_score,
            accepted = self.accepted,
            improving = self.improving,
            reason = ?stop_reason,
            "Hill climb finished"
        );

        Ok(HillClimbResult {
            best: self.working,
            best_score: self.best_score,
            iterations: self.iteration,
            accepted: self.accepted,
            improving: self.improving,
            stop_reason,
            score_history: self.score_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::random_solution;
    use crate::error::NetworkError;
    use crate::models::RouteId;

    /// 3x3 grid, horizontal links 10, vertical links 15.
    fn grid() -> RailNetwork {
        let mut b = RailNetwork::builder();
        for r in 0..3 {
            for c in 0..3 {
                b.add_station(&format!("G{r}{c}"), c as f64, r as f64)
                    .expect("station");
            }
        }
        for r in 0..3 {
            for c in 0..3 {
                if c + 1 < 3 {
                    b.add_connection(&format!("G{r}{c}"), &format!("G{r}{}", c + 1), 10.0)
                        .expect("horizontal");
                }
                if r + 1 < 3 {
                    b.add_connection(&format!("G{r}{c}"), &format!("G{}{c}", r + 1), 15.0)
                        .expect("vertical");
                }
            }
        }
        b.build()
    }

    fn seeded_grid(routes: usize) -> RailNetwork {
        let mut n = grid();
        let mut rng = StdRng::seed_from_u64(7);
        random_solution(&mut n, routes, 60.0, 3, &mut rng).expect("solution");
        n
    }

    #[test]
    fn test_new_validates_config() {
        let n = grid();
        let config = HillClimberConfig::default().with_replace_rate(2.0);
        assert!(matches!(
            HillClimber::new(&n, config),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_never_decreases_score() {
        let n = seeded_grid(3);
        let start = n.score();
        let config = HillClimberConfig::default()
            .with_max_duration(60.0)
            .with_iterations(500)
            .with_seed(42);
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut NoopSink)
            .expect("run");

        assert_eq!(result.iterations, 500);
        assert_eq!(result.stop_reason, StopReason::IterationBudget);
        assert!(result.best_score >= start);
        assert!((result.best.score() - result.best_score).abs() < 1e-9);
        for w in result.score_history.windows(2) {
            assert!(w[1].score >= w[0].score);
            assert!(w[1].iteration > w[0].iteration);
        }
        assert_eq!(result.accepted, result.score_history.len());
        result.best.check_invariants().expect("invariants");
    }

    #[test]
    fn test_input_network_untouched() {
        let n = seeded_grid(2);
        let before = n.route_listing();
        let config = HillClimberConfig::default()
            .with_max_duration(60.0)
            .with_iterations(50)
            .with_seed(1);
        HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut NoopSink)
            .expect("run");
        assert_eq!(n.route_listing(), before);
    }

    #[test]
    fn test_rejected_step_restores_working_copy() {
        let n = seeded_grid(3);
        let config = HillClimberConfig::default()
            .with_max_duration(60.0)
            .with_seed(3);
        let mut climber = HillClimber::new(&n, config).expect("climber");
        for _ in 0..200 {
            let listing = climber.network().route_listing();
            let best = climber.best_score();
            let outcome = climber.step(&mut NoopSink).expect("step");
            if !outcome.accepted {
                assert_eq!(climber.network().route_listing(), listing);
                assert!((climber.network().score() - best).abs() < 1e-9);
            }
            assert!(climber.best_score() >= best);
            assert_eq!(climber.state(), SearchState::Exploring);
            climber.network().check_invariants().expect("invariants");
        }
        assert_eq!(climber.iteration(), 200);
    }

    #[test]
    fn test_sink_receives_accepted_candidates() {
        let n = seeded_grid(2);
        let config = HillClimberConfig::default()
            .with_max_duration(60.0)
            .with_iterations(100)
            .with_seed(5);
        let mut recorded = Vec::new();
        let mut sink = |iteration: usize, score: f64, network: &RailNetwork| -> Result<()> {
            assert!((network.score() - score).abs() < 1e-9);
            recorded.push(iteration);
            Ok(())
        };
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut sink)
            .expect("run");
        let history: Vec<usize> = result.score_history.iter().map(|r| r.iteration).collect();
        assert_eq!(recorded, history);
    }

    #[test]
    fn test_sink_error_aborts_run() {
        // without routes every candidate ties at 0 and is accepted
        let n = grid();
        let config = HillClimberConfig::default().with_iterations(100).with_seed(5);
        let mut sink = |_: usize, _: f64, _: &RailNetwork| -> Result<()> {
            Err(NetworkError::RouteNotFound(RouteId(99)))
        };
        let result = HillClimber::new(&n, config).expect("climber").run(&mut sink);
        assert!(matches!(result, Err(NetworkError::RouteNotFound(_))));
    }

    #[test]
    fn test_cancel_before_start() {
        let n = seeded_grid(2);
        let config = HillClimberConfig::default().with_iterations(1_000).with_seed(1);
        let flag = Arc::new(AtomicBool::new(true));
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run_with_cancel(&mut NoopSink, Some(flag))
            .expect("run");
        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_zero_time_limit() {
        let n = seeded_grid(2);
        let config = HillClimberConfig::default()
            .with_time_limit(std::time::Duration::ZERO)
            .with_seed(1);
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut NoopSink)
            .expect("run");
        assert_eq!(result.stop_reason, StopReason::Deadline);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_stall_limit_stops_early() {
        // a network without routes can never improve on 0
        let n = grid();
        let config = HillClimberConfig::default()
            .with_iterations(1_000)
            .with_stall_limit(25)
            .with_seed(1);
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut NoopSink)
            .expect("run");
        assert_eq!(result.stop_reason, StopReason::Stalled);
        assert_eq!(result.iterations, 25);
        assert_eq!(result.improving, 0);
        assert_eq!(result.accepted, 25);
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let n = seeded_grid(3);
        let run = || {
            let config = HillClimberConfig::default()
                .with_max_duration(60.0)
                .with_iterations(300)
                .with_seed(11);
            HillClimber::new(&n, config)
                .expect("climber")
                .run(&mut NoopSink)
                .expect("run")
        };
        let (a, b) = (run(), run());
        assert_eq!(a.best.route_listing(), b.best.route_listing());
        assert_eq!(a.score_history, b.score_history);
    }

    #[test]
    fn test_replace_rate_keeps_invariants() {
        let n = seeded_grid(4);
        let start = n.score();
        let config = HillClimberConfig::default()
            .with_max_duration(60.0)
            .with_iterations(300)
            .with_replace_rate(0.5)
            .with_replacement_steps(5)
            .with_seed(21);
        let result = HillClimber::new(&n, config)
            .expect("climber")
            .run(&mut NoopSink)
            .expect("run");
        assert!(result.best_score >= start);
        for route in result.best.list_routes() {
            assert!(!route.is_empty());
        }
        result.best.check_invariants().expect("invariants");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::constructive::random_solution;
    use proptest::prelude::*;

    fn line(n: usize) -> RailNetwork {
        let mut b = RailNetwork::builder();
        for i in 0..n {
            b.add_station(&format!("L{i}"), i as f64, 0.0).expect("station");
        }
        for i in 1..n {
            b.add_connection(&format!("L{}", i - 1), &format!("L{i}"), 5.0 + i as f64)
                .expect("connection");
        }
        b.build()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Retained best scores never decrease, for any seed and size.
        #[test]
        fn retained_score_is_monotone(seed in any::<u64>(), size in 2usize..8, routes in 1usize..4) {
            let mut n = line(size);
            let mut rng = StdRng::seed_from_u64(seed);
            random_solution(&mut n, routes, 40.0, 3, &mut rng).expect("solution");

            let config = HillClimberConfig::default()
                .with_max_duration(40.0)
                .with_seed(seed);
            let mut climber = HillClimber::new(&n, config).expect("climber");
            let mut best = climber.best_score();
            for _ in 0..30 {
                climber.step(&mut NoopSink).expect("step");
                prop_assert!(climber.best_score() >= best);
                best = climber.best_score();
            }
            prop_assert!(climber.network().check_invariants().is_ok());
        }
    }
}
