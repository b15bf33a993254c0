use std::collections::VecDeque;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use triadforge::corpus::{CorpusMode, TriadIndex};
use triadforge::error::{TfResult, TriadForgeError};
use triadforge::geometry::LayoutMask;
use triadforge::hive::transport::{local_cluster, TcpHive};
use triadforge::hive::{JobCoordinator, JobPlan};
use triadforge::layouts::Layout;
use triadforge::node::transport::{NodeLink, TcpNode};
use triadforge::node::{NodeState, Worker};
use triadforge::optimizer::{AnnealSchedule, Annealer, Mutator};
use triadforge::protocol::{HiveMessage, JobResult};
use triadforge::scorer::{BaseEffort, Scorer};

fn scorer() -> Scorer {
    let index = TriadIndex::from_text(
        "the quick brown fox jumps over the lazy dog and then some more text",
        CorpusMode::LETTERS,
    );
    let base = BaseEffort::load_from_file("data/base_effort.conf").unwrap();
    Scorer::new(base, &index).unwrap()
}

fn template() -> Annealer {
    let mutator = Mutator::new(&LayoutMask::standard(), 1, 3).unwrap();
    let schedule = AnnealSchedule::new(0.5, 0.3, 500.0).unwrap();
    Annealer::new(scorer(), mutator, schedule, None)
}

fn plan(jobs: usize) -> JobPlan {
    JobPlan {
        total_jobs: jobs,
        iterations_per_job: 200,
        result_timeout: Duration::from_secs(30),
        requeue_lost: false,
    }
}

/// Replays a fixed list of coordinator messages and records what comes back.
struct ScriptedLink {
    inbox: VecDeque<HiveMessage>,
    results: Vec<JobResult>,
}

impl ScriptedLink {
    fn new(msgs: Vec<HiveMessage>) -> Self {
        Self {
            inbox: msgs.into(),
            results: Vec::new(),
        }
    }
}

impl NodeLink for ScriptedLink {
    fn recv(&mut self) -> TfResult<HiveMessage> {
        self.inbox
            .pop_front()
            .ok_or_else(|| TriadForgeError::Transport("script exhausted".to_string()))
    }

    fn send_result(&mut self, result: &JobResult) -> TfResult<()> {
        self.results.push(result.clone());
        Ok(())
    }
}

#[test]
fn test_worker_serves_jobs_until_shutdown() {
    let mut link = ScriptedLink::new(vec![
        HiveMessage::Seed { worker_id: 7, seed: 99 },
        HiveMessage::Job { iterations: 100 },
        HiveMessage::Job { iterations: 0 },
        HiveMessage::Shutdown,
    ]);
    let start = Layout::qwerty();
    let mut worker = Worker::new(template(), start.clone());
    assert_eq!(worker.state(), NodeState::AwaitSeed);

    let summary = worker.run(&mut link).unwrap();
    assert_eq!(worker.state(), NodeState::Terminated);
    assert_eq!(summary.worker_id, Some(7));
    assert_eq!(summary.jobs, 2);
    assert_eq!(link.results.len(), 2);
    assert!(link.results.iter().all(|r| r.worker_id == 7));

    // A zero-iteration job reports the start layout as is
    let mut scorer = scorer();
    assert_eq!(link.results[1].layout, start);
    assert_eq!(link.results[1].score, scorer.score(&start));
    assert!(link.results[0].score <= link.results[1].score);
}

#[test]
fn test_worker_rejects_job_before_seed() {
    let mut link = ScriptedLink::new(vec![HiveMessage::Job { iterations: 10 }]);
    let mut worker = Worker::new(template(), Layout::qwerty());
    assert!(matches!(
        worker.run(&mut link),
        Err(TriadForgeError::Protocol(_))
    ));
    assert!(link.results.is_empty());
}

#[test]
fn test_worker_rejects_second_seed() {
    let mut link = ScriptedLink::new(vec![
        HiveMessage::Seed { worker_id: 1, seed: 1 },
        HiveMessage::Seed { worker_id: 1, seed: 2 },
    ]);
    let mut worker = Worker::new(template(), Layout::qwerty());
    assert!(matches!(
        worker.run(&mut link),
        Err(TriadForgeError::Protocol(_))
    ));
}

#[test]
fn test_shutdown_before_any_job() {
    let mut link = ScriptedLink::new(vec![HiveMessage::Shutdown]);
    let summary = Worker::new(template(), Layout::qwerty())
        .run(&mut link)
        .unwrap();
    assert_eq!(summary.jobs, 0);
    assert_eq!(summary.best_score, None);
}

#[test]
fn test_local_cluster_end_to_end() {
    let (hive, nodes) = local_cluster(3);
    let template = template();
    let start = Layout::qwerty();

    let (report, summaries) = thread::scope(|s| {
        let handles: Vec<_> = nodes
            .into_iter()
            .map(|mut node| {
                let mut worker = Worker::new(template.clone(), start.clone());
                s.spawn(move || worker.run(&mut node))
            })
            .collect();
        let report = JobCoordinator::new(hive, plan(7), Some(21)).run().unwrap();
        let summaries: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        (report, summaries)
    });

    assert_eq!(report.completed, 7);
    assert_eq!(report.lost, 0);
    assert_eq!(summaries.iter().map(|s| s.jobs).sum::<usize>(), 7);

    let best = report.best.expect("a best result");
    assert!(best.layout.is_permutation());
    let lowest = summaries
        .iter()
        .filter_map(|s| s.best_score)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.score, lowest);
}

#[test]
fn test_tcp_cluster_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let template = template();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let annealer = template.clone();
            thread::spawn(move || -> TfResult<usize> {
                let mut link = TcpNode::connect(addr, 50, Duration::from_millis(20))?;
                let summary = Worker::new(annealer, Layout::qwerty()).run(&mut link)?;
                Ok(summary.jobs)
            })
        })
        .collect();

    let hive = TcpHive::accept(&listener, 2, Duration::from_secs(10)).unwrap();
    let report = JobCoordinator::new(hive, plan(5), Some(8)).run().unwrap();

    let jobs: usize = handles.into_iter().map(|h| h.join().unwrap().unwrap()).sum();
    assert_eq!(report.completed, 5);
    assert_eq!(report.workers, 2);
    assert_eq!(jobs, 5);
    assert!(report.best.is_some());
}

#[test]
fn test_tcp_accept_without_workers_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let result = TcpHive::accept(&listener, 1, Duration::from_millis(100));
    assert!(matches!(result, Err(TriadForgeError::Transport(_))));
}
