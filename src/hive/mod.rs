pub mod transport;

use self::transport::{HiveEvent, HiveTransport};
use crate::config::HiveParams;
use crate::error::{TfResult, TriadForgeError};
use crate::protocol::{HiveMessage, JobResult, WorkerId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Seeds are drawn from `0..SEED_LIMIT`.
pub const SEED_LIMIT: u32 = i32::MAX as u32;

pub const MAX_JOB_ITERATIONS: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPlan {
    pub total_jobs: usize,
    pub iterations_per_job: u32,
    pub result_timeout: Duration,
    pub requeue_lost: bool,
}

impl JobPlan {
    /// Jobs travel as a signed 32-bit count on the wire.
    pub fn validate(&self) -> TfResult<()> {
        if self.iterations_per_job > MAX_JOB_ITERATIONS {
            return Err(TriadForgeError::Config(format!(
                "layouts per job must be at most {} (got {})",
                MAX_JOB_ITERATIONS, self.iterations_per_job
            )));
        }
        Ok(())
    }
}

impl TryFrom<&HiveParams> for JobPlan {
    type Error = TriadForgeError;

    fn try_from(params: &HiveParams) -> TfResult<Self> {
        let plan = Self {
            total_jobs: params.jobs,
            iterations_per_job: params.layouts_per_job,
            result_timeout: params.result_timeout(),
            requeue_lost: params.requeue_lost,
        };
        plan.validate()?;
        Ok(plan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveState {
    Idle,
    Dispatching,
    AwaitingAll,
    Draining,
    ShuttingDown,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HiveReport {
    pub best: Option<JobResult>,
    pub completed: usize,
    /// Jobs that never produced a result.
    pub lost: usize,
    /// Times the global best improved.
    pub improvements: usize,
    pub workers: usize,
}

/// Hands out fixed-size jobs, one at a time per worker, and keeps the best
/// result. All bookkeeping lives here and is only touched by [`run`](Self::run).
pub struct JobCoordinator<T: HiveTransport> {
    transport: T,
    plan: JobPlan,
    rng: fastrand::Rng,
    state: HiveState,

    live: BTreeSet<WorkerId>,
    /// Workers whose link is known to be dead.
    disconnected: BTreeSet<WorkerId>,
    idle: VecDeque<WorkerId>,
    /// Result deadline of the one job each busy worker holds.
    outstanding: HashMap<WorkerId, Instant>,
    remaining: usize,

    best: Option<JobResult>,
    completed: usize,
    lost: usize,
    improvements: usize,
}

impl<T: HiveTransport> JobCoordinator<T> {
    pub fn new(transport: T, plan: JobPlan, seed: Option<u64>) -> Self {
        let rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };
        Self {
            transport,
            remaining: plan.total_jobs,
            plan,
            rng,
            state: HiveState::Idle,
            live: BTreeSet::new(),
            disconnected: BTreeSet::new(),
            idle: VecDeque::new(),
            outstanding: HashMap::new(),
            best: None,
            completed: 0,
            lost: 0,
            improvements: 0,
        }
    }

    pub fn state(&self) -> HiveState {
        self.state
    }

    pub fn best(&self) -> Option<&JobResult> {
        self.best.as_ref()
    }

    fn set_state(&mut self, next: HiveState) {
        if self.state != next {
            debug!("hive: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    pub fn run(mut self) -> TfResult<HiveReport> {
        self.plan.validate()?;
        let workers = self.transport.workers();
        if workers.is_empty() {
            return Err(TriadForgeError::Transport(
                "no workers to coordinate".to_string(),
            ));
        }
        info!(
            "🐝 Hive: {} jobs of {} iterations across {} workers",
            self.plan.total_jobs,
            self.plan.iterations_per_job,
            workers.len()
        );

        // 1. Seeds, pairwise distinct
        self.set_state(HiveState::Dispatching);
        let mut used = HashSet::new();
        for &worker in &workers {
            let seed = loop {
                let s = self.rng.u32(0..SEED_LIMIT);
                if used.insert(s) {
                    break s;
                }
            };
            match self.transport.send(
                worker,
                &HiveMessage::Seed {
                    worker_id: worker,
                    seed,
                },
            ) {
                Ok(()) => {
                    debug!("worker {} seeded with {}", worker, seed);
                    self.live.insert(worker);
                }
                Err(e) => {
                    warn!("⚠️  Could not seed worker {}: {}", worker, e);
                    self.disconnected.insert(worker);
                }
            }
        }

        // 2. First round of jobs
        let seeded: Vec<WorkerId> = self.live.iter().copied().collect();
        for worker in seeded {
            self.idle.push_back(worker);
        }
        self.dispatch_idle();

        // 3. Collect, redispatch, drain
        self.set_state(HiveState::AwaitingAll);
        while !self.outstanding.is_empty() {
            if self.remaining == 0 {
                self.set_state(HiveState::Draining);
            }

            let now = Instant::now();
            let wait = self
                .outstanding
                .values()
                .min()
                .map(|deadline| deadline.saturating_duration_since(now))
                .unwrap_or(Duration::ZERO);

            match self.transport.recv_timeout(wait) {
                Ok(Some(HiveEvent::Result(result))) => self.on_result(result),
                Ok(Some(HiveEvent::Lost { worker_id, reason })) => {
                    self.on_lost(worker_id, &reason);
                }
                Ok(None) => self.expire_overdue(),
                Err(e) => {
                    warn!("⚠️  {}; giving up on outstanding jobs.", e);
                    let stranded: Vec<WorkerId> = self.outstanding.keys().copied().collect();
                    for worker in stranded {
                        self.retire(worker);
                    }
                    break;
                }
            }
            self.dispatch_idle();
        }

        if self.remaining > 0 {
            warn!(
                "⚠️  {} job(s) never dispatched: no live workers left.",
                self.remaining
            );
            self.lost += self.remaining;
            self.remaining = 0;
        }

        // 4. Shutdown, including workers retired for being slow
        self.set_state(HiveState::ShuttingDown);
        for &worker in &workers {
            if self.disconnected.contains(&worker) {
                continue;
            }
            if let Err(e) = self.transport.send(worker, &HiveMessage::Shutdown) {
                warn!("⚠️  Could not send shutdown to worker {}: {}", worker, e);
            }
        }

        self.set_state(HiveState::Done);
        info!(
            "🏁 Hive done: {} completed, {} lost",
            self.completed, self.lost
        );

        Ok(HiveReport {
            best: self.best,
            completed: self.completed,
            lost: self.lost,
            improvements: self.improvements,
            workers: workers.len(),
        })
    }

    fn on_result(&mut self, result: JobResult) {
        let worker = result.worker_id;
        if !self.outstanding.contains_key(&worker) {
            warn!(
                "⚠️  Ignoring result from worker {} with no job outstanding",
                worker
            );
            return;
        }
        if !result.score.is_finite() {
            warn!(
                "⚠️  Worker {} reported a non-finite score ({}); retiring it",
                worker, result.score
            );
            self.retire(worker);
            return;
        }
        self.outstanding.remove(&worker);
        self.completed += 1;
        debug!(
            "worker {} finished a job: {:.6} ({}/{})",
            worker, result.score, self.completed, self.plan.total_jobs
        );

        let improved = match &self.best {
            Some(best) => result.score < best.score,
            None => true,
        };
        if improved {
            info!(
                "⭐ New best from worker {}: {:.6} {}",
                worker, result.score, result.layout
            );
            self.best = Some(result);
            self.improvements += 1;
        }

        self.idle.push_back(worker);
    }

    fn on_lost(&mut self, worker: WorkerId, reason: &str) {
        if self.disconnected.contains(&worker) {
            return;
        }
        warn!("⚠️  Worker {} lost: {}", worker, reason);
        self.disconnected.insert(worker);
        self.retire(worker);
    }

    fn expire_overdue(&mut self) {
        let now = Instant::now();
        let overdue: Vec<WorkerId> = self
            .outstanding
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(&w, _)| w)
            .collect();
        for worker in overdue {
            warn!(
                "⚠️  Worker {} sent no result within {:?}",
                worker, self.plan.result_timeout
            );
            self.retire(worker);
        }
    }

    /// Drops a worker for good. Its job, if any, is requeued or written off.
    fn retire(&mut self, worker: WorkerId) {
        self.live.remove(&worker);
        self.idle.retain(|&w| w != worker);
        if self.outstanding.remove(&worker).is_some() {
            if self.plan.requeue_lost {
                debug!("requeueing the job of worker {}", worker);
                self.remaining += 1;
            } else {
                self.lost += 1;
            }
        }
    }

    fn dispatch_idle(&mut self) {
        while self.remaining > 0 {
            let Some(worker) = self.idle.pop_front() else {
                break;
            };
            if !self.live.contains(&worker) {
                continue;
            }
            let job = HiveMessage::Job {
                iterations: self.plan.iterations_per_job,
            };
            match self.transport.send(worker, &job) {
                Ok(()) => {
                    self.remaining -= 1;
                    self.outstanding
                        .insert(worker, deadline_after(self.plan.result_timeout));
                    debug!(
                        "job sent to worker {} ({} left to dispatch)",
                        worker, self.remaining
                    );
                }
                Err(e) => {
                    warn!("⚠️  Could not send job to worker {}: {}", worker, e);
                    self.disconnected.insert(worker);
                    self.retire(worker);
                }
            }
        }
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365))
}
