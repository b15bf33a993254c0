use super::{AnnealObserver, Annealer, SearchOutcome, Silent};
use crate::config::SearchParams;
use crate::layouts::Layout;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationOptions {
    pub rounds: usize,
    pub iterations: u64,
    pub seed: Option<u64>,
}

impl From<&SearchParams> for OptimizationOptions {
    fn from(params: &SearchParams) -> Self {
        Self {
            rounds: params.rounds.max(1),
            iterations: params.iterations,
            seed: params.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub score: f64,
    pub layout: String,
    pub initial_score: f64,
    pub rounds: usize,
    pub best_round: usize,
    pub round_scores: Vec<f64>,
    pub iterations_per_round: u64,
    pub elapsed_secs: f64,
    pub layouts_per_sec: f64,
}

/// Independent annealing rounds from the same start, run in parallel.
pub struct Optimizer {
    template: Annealer,
    options: OptimizationOptions,
}

impl Optimizer {
    pub fn new(template: Annealer, options: OptimizationOptions) -> Self {
        Self { template, options }
    }

    pub fn run(&self, start: &Layout) -> OptimizationResult {
        self.run_with(start, |_| Silent)
    }

    /// `make_observer` is called once per round with the round index.
    pub fn run_with<O, F>(&self, start: &Layout, make_observer: F) -> OptimizationResult
    where
        O: AnnealObserver,
        F: Fn(usize) -> O + Sync + Send,
    {
        let opts = &self.options;
        let rounds = opts.rounds.max(1);
        let started = Instant::now();

        // Each round owns a clone of the annealer (and so its own effort cache).
        let outcomes: Vec<SearchOutcome> = (0..rounds)
            .into_par_iter()
            .map(|round| {
                let mut annealer = self.template.clone();
                let seed = match opts.seed {
                    Some(s) => s.wrapping_add(round as u64),
                    None => fastrand::u64(..),
                };
                annealer.reseed(seed);
                let mut observer = make_observer(round);
                let outcome = annealer.run_with(start, opts.iterations, &mut observer);
                info!(
                    "🏁 Round {} finished: best {:.6} ({} accepted)",
                    round + 1,
                    outcome.best_score,
                    outcome.accepted
                );
                outcome
            })
            .collect();

        let elapsed = started.elapsed().as_secs_f64();
        let round_scores: Vec<f64> = outcomes.iter().map(|o| o.best_score).collect();

        // At least one round ran; ties go to the earliest.
        let best_round = (1..outcomes.len()).fold(0, |best, i| {
            if outcomes[i].best_score.total_cmp(&outcomes[best].best_score).is_lt() {
                i
            } else {
                best
            }
        });
        let best = &outcomes[best_round];

        let total_iterations = opts.iterations * rounds as u64;
        OptimizationResult {
            score: best.best_score,
            layout: best.best_layout.to_string(),
            initial_score: best.initial_score,
            rounds,
            best_round,
            round_scores,
            iterations_per_round: opts.iterations,
            elapsed_secs: elapsed,
            layouts_per_sec: if elapsed > 0.0 {
                total_iterations as f64 / elapsed
            } else {
                0.0
            },
        }
    }
}
