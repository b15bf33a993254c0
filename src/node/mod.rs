pub mod transport;

use self::transport::NodeLink;
use crate::error::{TfResult, TriadForgeError};
use crate::layouts::Layout;
use crate::optimizer::Annealer;
use crate::protocol::{HiveMessage, JobResult, WorkerId};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    AwaitSeed,
    AwaitJob,
    Running,
    Reporting,
    Terminated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSummary {
    pub worker_id: Option<WorkerId>,
    pub jobs: usize,
    pub best_score: Option<f64>,
}

/// Runs one annealing job at a time for the coordinator. Every job starts
/// from the same layout; the RNG carries on, so jobs explore different paths.
pub struct Worker {
    annealer: Annealer,
    start: Layout,
    state: NodeState,
}

impl Worker {
    pub fn new(annealer: Annealer, start: Layout) -> Self {
        Self {
            annealer,
            start,
            state: NodeState::AwaitSeed,
        }
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    fn set_state(&mut self, next: NodeState) {
        debug!("node: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Serves jobs until the coordinator sends shutdown.
    pub fn run<L: NodeLink>(&mut self, link: &mut L) -> TfResult<WorkerSummary> {
        let mut summary = WorkerSummary {
            worker_id: None,
            jobs: 0,
            best_score: None,
        };

        loop {
            let msg = link.recv()?;
            match (self.state, msg) {
                (NodeState::AwaitSeed, HiveMessage::Seed { worker_id, seed }) => {
                    debug!("worker {} seeded with {}", worker_id, seed);
                    self.annealer.reseed(seed as u64);
                    summary.worker_id = Some(worker_id);
                    self.set_state(NodeState::AwaitJob);
                }
                (NodeState::AwaitJob, HiveMessage::Job { iterations }) => {
                    let worker_id = summary.worker_id.unwrap_or_default();

                    self.set_state(NodeState::Running);
                    let outcome = self.annealer.run(&self.start, iterations as u64);

                    self.set_state(NodeState::Reporting);
                    info!(
                        "📤 Worker {}: job of {} iterations done, best {:.6}",
                        worker_id, iterations, outcome.best_score
                    );
                    link.send_result(&JobResult {
                        worker_id,
                        score: outcome.best_score,
                        layout: outcome.best_layout,
                    })?;

                    summary.jobs += 1;
                    summary.best_score = Some(match summary.best_score {
                        Some(best) => best.min(outcome.best_score),
                        None => outcome.best_score,
                    });
                    self.set_state(NodeState::AwaitJob);
                }
                (_, HiveMessage::Shutdown) => {
                    self.set_state(NodeState::Terminated);
                    return Ok(summary);
                }
                (state, other) => {
                    return Err(TriadForgeError::Protocol(format!(
                        "unexpected {:?} while in state {:?}",
                        other, state
                    )));
                }
            }
        }
    }
}
