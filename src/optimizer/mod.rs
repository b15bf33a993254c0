pub mod mutation;
pub mod runner;
pub mod schedule;

pub use self::mutation::Mutator;
pub use self::runner::{OptimizationOptions, OptimizationResult, Optimizer};
pub use self::schedule::{AnnealSchedule, Decision};
use crate::layouts::Layout;
use crate::scorer::Scorer;
use std::time::{Duration, Instant};
use tracing::trace;

/// Throughput is reported to the observer once per this many iterations.
pub const RATE_INTERVAL: u64 = 32_768;

/// An accepted move, as seen by an [`AnnealObserver`].
#[derive(Debug)]
pub struct Transition<'a> {
    pub iteration: u64,
    pub previous_score: f64,
    pub score: f64,
    pub delta: f64,
    pub probability: f64,
    pub temperature: f64,
    pub decision: Decision,
    pub previous: &'a Layout,
    pub layout: &'a Layout,
}

/// Hooks into a running search. Both default to doing nothing.
pub trait AnnealObserver {
    fn on_transition(&mut self, _transition: &Transition<'_>) {}

    fn on_rate(&mut self, _iteration: u64, _layouts_per_sec: f64) {}
}

pub struct Silent;

impl AnnealObserver for Silent {}

/// Current (last accepted) and best layouts of one search.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub current: Layout,
    pub current_score: f64,
    pub best: Layout,
    pub best_score: f64,
    pub iteration: u64,
}

impl SearchState {
    fn new(initial: Layout, score: f64) -> Self {
        Self {
            best: initial.clone(),
            current: initial,
            current_score: score,
            best_score: score,
            iteration: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_layout: Layout,
    pub best_score: f64,
    pub initial_score: f64,
    pub iterations: u64,
    pub accepted: u64,
    pub improvements: u64,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn layouts_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.iterations as f64 / secs
        } else {
            0.0
        }
    }
}

/// Single-threaded simulated annealing over layouts.
#[derive(Clone)]
pub struct Annealer {
    scorer: Scorer,
    mutator: Mutator,
    schedule: AnnealSchedule,
    rng: fastrand::Rng,
}

impl Annealer {
    pub fn new(
        scorer: Scorer,
        mutator: Mutator,
        schedule: AnnealSchedule,
        seed: Option<u64>,
    ) -> Self {
        let rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };
        Self {
            scorer,
            mutator,
            schedule,
            rng,
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
    }

    pub fn scorer_mut(&mut self) -> &mut Scorer {
        &mut self.scorer
    }

    pub fn schedule(&self) -> &AnnealSchedule {
        &self.schedule
    }

    pub fn run(&mut self, initial: &Layout, iterations: u64) -> SearchOutcome {
        self.run_with(initial, iterations, &mut Silent)
    }

    pub fn run_with<O: AnnealObserver>(
        &mut self,
        initial: &Layout,
        iterations: u64,
        observer: &mut O,
    ) -> SearchOutcome {
        let start = Instant::now();
        let initial_score = self.scorer.score(initial);
        let mut state = SearchState::new(initial.clone(), initial_score);
        let mut accepted = 0u64;
        let mut improvements = 0u64;

        if iterations == 0 {
            return SearchOutcome {
                best_layout: state.best,
                best_score: state.best_score,
                initial_score,
                iterations: 0,
                accepted,
                improvements,
                elapsed: start.elapsed(),
            };
        }

        let mut proposal = state.current.clone();
        self.mutator.mutate(&mut proposal, &mut self.rng);
        let mut window_start = Instant::now();

        for i in 0..iterations {
            state.iteration = i;
            let proposed_score = self.scorer.score(&proposal);
            let delta = proposed_score - state.current_score;
            let t = self.schedule.temperature(i, iterations);
            let (decision, p) = self.schedule.decide(delta, t, &mut self.rng);

            if decision.is_accept() {
                observer.on_transition(&Transition {
                    iteration: i,
                    previous_score: state.current_score,
                    score: proposed_score,
                    delta,
                    probability: p,
                    temperature: t,
                    decision,
                    previous: &state.current,
                    layout: &proposal,
                });

                state.current.clone_from(&proposal);
                state.current_score = proposed_score;
                accepted += 1;

                if proposed_score < state.best_score {
                    state.best.clone_from(&proposal);
                    state.best_score = proposed_score;
                    improvements += 1;
                    trace!("iteration {}: new best {:.6}", i, proposed_score);
                }
            } else {
                proposal.clone_from(&state.current);
            }

            self.mutator.mutate(&mut proposal, &mut self.rng);

            if (i + 1) % RATE_INTERVAL == 0 {
                let secs = window_start.elapsed().as_secs_f64();
                if secs > 0.0 {
                    observer.on_rate(i + 1, RATE_INTERVAL as f64 / secs);
                }
                window_start = Instant::now();
            }
        }

        SearchOutcome {
            best_layout: state.best,
            best_score: state.best_score,
            initial_score,
            iterations,
            accepted,
            improvements,
            elapsed: start.elapsed(),
        }
    }
}
