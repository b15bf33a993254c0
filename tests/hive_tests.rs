use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use triadforge::error::{TfResult, TriadForgeError};
use triadforge::hive::transport::{HiveEvent, HiveTransport};
use triadforge::hive::{JobCoordinator, JobPlan};
use triadforge::layouts::Layout;
use triadforge::protocol::{HiveMessage, JobResult, WorkerId};

/// How a scripted worker responds to jobs.
#[derive(Clone)]
enum Script {
    /// Answers each job with the next score in the list (then repeats the last).
    Answer(Vec<f64>),
    /// Takes jobs and never answers.
    Silent,
    /// Connection drops as soon as a job arrives.
    Vanish,
    /// Seed cannot even be delivered.
    Unreachable,
}

#[derive(Default)]
struct Log {
    sent: Vec<(WorkerId, HiveMessage)>,
    in_flight: HashSet<WorkerId>,
    max_in_flight_violation: bool,
}

struct FakeHive {
    scripts: BTreeMap<WorkerId, Script>,
    answered: BTreeMap<WorkerId, usize>,
    pending: VecDeque<HiveEvent>,
    log: Arc<Mutex<Log>>,
}

impl FakeHive {
    fn new(scripts: Vec<Script>) -> (Self, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let scripts = scripts
            .into_iter()
            .enumerate()
            .map(|(i, s)| (i as WorkerId + 1, s))
            .collect();
        let hive = Self {
            scripts,
            answered: BTreeMap::new(),
            pending: VecDeque::new(),
            log: log.clone(),
        };
        (hive, log)
    }
}

impl HiveTransport for FakeHive {
    fn workers(&self) -> Vec<WorkerId> {
        self.scripts.keys().copied().collect()
    }

    fn send(&mut self, worker: WorkerId, msg: &HiveMessage) -> TfResult<()> {
        let script = self.scripts[&worker].clone();
        if let Script::Unreachable = script {
            return Err(TriadForgeError::Transport("unreachable".to_string()));
        }

        let mut log = self.log.lock().unwrap();
        log.sent.push((worker, *msg));

        if let HiveMessage::Job { .. } = msg {
            if !log.in_flight.insert(worker) {
                log.max_in_flight_violation = true;
            }
            match script {
                Script::Answer(scores) => {
                    let n = self.answered.entry(worker).or_default();
                    let score = scores[(*n).min(scores.len() - 1)];
                    *n += 1;
                    self.pending.push_back(HiveEvent::Result(JobResult {
                        worker_id: worker,
                        score,
                        layout: Layout::qwerty(),
                    }));
                }
                Script::Vanish => self.pending.push_back(HiveEvent::Lost {
                    worker_id: worker,
                    reason: "connection reset".to_string(),
                }),
                Script::Silent | Script::Unreachable => {}
            }
        }
        Ok(())
    }

    fn recv_timeout(&mut self, timeout: Duration) -> TfResult<Option<HiveEvent>> {
        match self.pending.pop_front() {
            Some(event) => {
                let worker = match &event {
                    HiveEvent::Result(r) => r.worker_id,
                    HiveEvent::Lost { worker_id, .. } => *worker_id,
                };
                self.log.lock().unwrap().in_flight.remove(&worker);
                Ok(Some(event))
            }
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

fn plan(jobs: usize, timeout_ms: u64, requeue_lost: bool) -> JobPlan {
    JobPlan {
        total_jobs: jobs,
        iterations_per_job: 1_000,
        result_timeout: Duration::from_millis(timeout_ms),
        requeue_lost,
    }
}

fn messages_to(log: &Log, worker: WorkerId) -> Vec<HiveMessage> {
    log.sent
        .iter()
        .filter(|(w, _)| *w == worker)
        .map(|(_, m)| *m)
        .collect()
}

#[test]
fn test_four_jobs_two_workers_keeps_minimum() {
    let (hive, log) = FakeHive::new(vec![
        Script::Answer(vec![5.0, 3.0]),
        Script::Answer(vec![4.0, 6.0]),
    ]);
    let report = JobCoordinator::new(hive, plan(4, 5_000, false), Some(11))
        .run()
        .unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.lost, 0);
    assert_eq!(report.workers, 2);
    assert_eq!(report.best.as_ref().map(|b| b.score), Some(3.0));
    // 5.0, then 4.0, then 3.0 each beat the previous best; 6.0 does not
    assert_eq!(report.improvements, 3);

    let log = log.lock().unwrap();
    assert!(!log.max_in_flight_violation);
    let jobs = log
        .sent
        .iter()
        .filter(|(_, m)| matches!(m, HiveMessage::Job { iterations: 1_000 }))
        .count();
    assert_eq!(jobs, 4);
}

#[test]
fn test_message_order_per_worker() {
    let (hive, log) = FakeHive::new(vec![
        Script::Answer(vec![1.0]),
        Script::Answer(vec![2.0]),
        Script::Answer(vec![3.0]),
    ]);
    JobCoordinator::new(hive, plan(7, 5_000, false), Some(2))
        .run()
        .unwrap();

    let log = log.lock().unwrap();
    let mut seeds = HashSet::new();
    for worker in 1..=3 {
        let msgs = messages_to(&log, worker);
        match msgs.first() {
            Some(HiveMessage::Seed { worker_id, seed }) => {
                assert_eq!(*worker_id, worker);
                assert!(seeds.insert(*seed), "seed {} handed out twice", seed);
            }
            other => panic!("worker {} first got {:?}", worker, other),
        }
        assert_eq!(msgs.last(), Some(&HiveMessage::Shutdown));
        let seeds_sent = msgs
            .iter()
            .filter(|m| matches!(m, HiveMessage::Seed { .. }))
            .count();
        assert_eq!(seeds_sent, 1);
    }
}

#[test]
fn test_more_workers_than_jobs() {
    let (hive, log) = FakeHive::new(vec![
        Script::Answer(vec![9.0]),
        Script::Answer(vec![8.0]),
        Script::Answer(vec![7.0]),
    ]);
    let report = JobCoordinator::new(hive, plan(1, 5_000, false), Some(3))
        .run()
        .unwrap();
    assert_eq!(report.completed, 1);

    let log = log.lock().unwrap();
    for worker in 1..=3 {
        assert_eq!(messages_to(&log, worker).last(), Some(&HiveMessage::Shutdown));
    }
}

#[test]
fn test_silent_worker_times_out() {
    let (hive, log) = FakeHive::new(vec![Script::Answer(vec![2.0]), Script::Silent]);
    let report = JobCoordinator::new(hive, plan(3, 50, false), Some(4))
        .run()
        .unwrap();

    assert_eq!(report.completed, 2);
    assert_eq!(report.lost, 1);
    // A slow worker is still told to stop
    let log = log.lock().unwrap();
    assert_eq!(messages_to(&log, 2).last(), Some(&HiveMessage::Shutdown));
}

#[test]
fn test_timed_out_job_can_be_requeued() {
    let (hive, _log) = FakeHive::new(vec![Script::Answer(vec![2.0]), Script::Silent]);
    let report = JobCoordinator::new(hive, plan(3, 50, true), Some(4))
        .run()
        .unwrap();

    assert_eq!(report.completed, 3);
    assert_eq!(report.lost, 0);
}

#[test]
fn test_lost_worker_gets_no_shutdown() {
    let (hive, log) = FakeHive::new(vec![Script::Answer(vec![1.5]), Script::Vanish]);
    let report = JobCoordinator::new(hive, plan(2, 5_000, false), Some(5))
        .run()
        .unwrap();

    assert_eq!(report.completed, 1);
    assert_eq!(report.lost, 1);
    let log = log.lock().unwrap();
    assert!(!messages_to(&log, 2).contains(&HiveMessage::Shutdown));
    assert_eq!(messages_to(&log, 1).last(), Some(&HiveMessage::Shutdown));
}

#[test]
fn test_unreachable_worker_is_skipped() {
    let (hive, log) = FakeHive::new(vec![Script::Unreachable, Script::Answer(vec![4.0])]);
    let report = JobCoordinator::new(hive, plan(3, 5_000, false), Some(6))
        .run()
        .unwrap();

    assert_eq!(report.completed, 3);
    let log = log.lock().unwrap();
    assert!(messages_to(&log, 1).is_empty());
}

#[test]
fn test_jobs_without_workers_are_lost() {
    let (hive, _log) = FakeHive::new(vec![Script::Vanish]);
    let report = JobCoordinator::new(hive, plan(4, 5_000, false), Some(7))
        .run()
        .unwrap();

    assert_eq!(report.completed, 0);
    assert_eq!(report.lost, 4);
    assert!(report.best.is_none());
}

#[test]
fn test_no_workers_is_an_error() {
    let (hive, _log) = FakeHive::new(vec![]);
    let err = JobCoordinator::new(hive, plan(4, 5_000, false), None)
        .run()
        .unwrap_err();
    assert!(matches!(err, TriadForgeError::Transport(_)));
}

#[test]
fn test_non_finite_score_retires_worker() {
    let (hive, log) = FakeHive::new(vec![
        Script::Answer(vec![f64::NAN]),
        Script::Answer(vec![3.0, 1.0, 2.0]),
    ]);
    let report = JobCoordinator::new(hive, plan(4, 5_000, false), Some(12))
        .run()
        .unwrap();

    assert_eq!(report.completed, 3);
    assert_eq!(report.lost, 1);
    assert_eq!(report.best.as_ref().map(|b| b.score), Some(1.0));
    assert_eq!(report.improvements, 2);

    // Still reachable, so it is told to stop
    let log = log.lock().unwrap();
    let to_first = messages_to(&log, 1);
    assert_eq!(to_first.last(), Some(&HiveMessage::Shutdown));
    let jobs = to_first
        .iter()
        .filter(|m| matches!(m, HiveMessage::Job { .. }))
        .count();
    assert_eq!(jobs, 1);
}

#[test]
fn test_non_finite_job_is_requeued() {
    let (hive, _log) = FakeHive::new(vec![
        Script::Answer(vec![f64::INFINITY]),
        Script::Answer(vec![3.0, 1.0, 2.0]),
    ]);
    let report = JobCoordinator::new(hive, plan(4, 5_000, true), Some(12))
        .run()
        .unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.lost, 0);
    assert_eq!(report.best.map(|b| b.score), Some(1.0));
}

#[test]
fn test_oversized_job_is_a_config_error() {
    let (hive, log) = FakeHive::new(vec![Script::Answer(vec![1.0]), Script::Answer(vec![2.0])]);
    let plan = JobPlan {
        iterations_per_job: 3_000_000_000,
        ..plan(3, 5_000, false)
    };
    let err = JobCoordinator::new(hive, plan, Some(1)).run().unwrap_err();

    assert!(matches!(err, TriadForgeError::Config(_)));
    assert!(log.lock().unwrap().sent.is_empty());
}
