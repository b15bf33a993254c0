use crate::reports;
use clap::Args;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use triadforge::config::{CorpusParams, HiveParams, SearchParams};
use triadforge::error::{TfResult, TriadForgeError};
use triadforge::hive::transport::{local_cluster, TcpHive};
use triadforge::hive::{JobCoordinator, JobPlan};
use triadforge::node::Worker;

#[derive(Args, Debug, Clone)]
pub struct HiveArgs {
    #[command(flatten)]
    pub corpus: CorpusParams,

    #[command(flatten)]
    pub search: SearchParams,

    #[command(flatten)]
    pub hive: HiveParams,

    #[arg(long, default_value = "127.0.0.1:7878")]
    pub listen: String,

    /// Workers to wait for
    #[arg(long, default_value_t = 2)]
    pub workers: usize,

    /// Launch this many local `node` processes (overrides --workers)
    #[arg(long)]
    pub spawn: Option<usize>,

    /// Seconds to wait for workers to connect
    #[arg(long, default_value_t = 60)]
    pub accept_timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct LocalArgs {
    #[command(flatten)]
    pub corpus: CorpusParams,

    #[command(flatten)]
    pub search: SearchParams,

    #[command(flatten)]
    pub hive: HiveParams,

    /// Worker threads
    #[arg(long, default_value_t = 2)]
    pub workers: usize,
}

pub fn run_hive(args: HiveArgs, debug: bool) -> TfResult<()> {
    // The coordinator never scores, but nodes would reject what it can check here.
    args.corpus.load_index()?;
    args.search.start_layout()?;
    args.search.mutator()?;
    args.search.schedule()?;
    let plan = JobPlan::try_from(&args.hive)?;

    let listener = TcpListener::bind(&args.listen)?;
    let addr = listener.local_addr()?;
    info!("🐝 Hive listening on {}", addr);

    let expected = args.spawn.unwrap_or(args.workers);
    let mut children = Vec::new();
    if let Some(n) = args.spawn {
        let exe = std::env::current_exe()?;
        for i in 0..n {
            let mut command = Command::new(&exe);
            command
                .arg("node")
                .arg("--connect")
                .arg(addr.to_string())
                .args(args.corpus.to_cli_args())
                .args(args.search.to_cli_args())
                .stdin(Stdio::null());
            if debug {
                command.arg("--debug");
            }
            let child = command.spawn()?;
            info!("🚀 Spawned node {} (pid {})", i + 1, child.id());
            children.push(child);
        }
    }

    let transport = TcpHive::accept(
        &listener,
        expected,
        Duration::from_secs(args.accept_timeout),
    )?;
    let coordinator = JobCoordinator::new(transport, plan, args.search.seed);
    let report = coordinator.run();

    reap(children);
    let report = report?;
    reports::print_hive_report(&report);
    Ok(())
}

/// Gives spawned nodes a moment to exit after shutdown, then kills stragglers.
fn reap(children: Vec<Child>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    for mut child in children {
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(50));
                }
                Ok(None) => {
                    warn!("⚠️  Node {} did not exit; killing it", child.id());
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                }
                Err(e) => {
                    warn!("⚠️  Could not wait for node {}: {}", child.id(), e);
                    break;
                }
            }
        }
    }
}

pub fn run_local(args: LocalArgs) -> TfResult<()> {
    if args.workers == 0 {
        return Err(TriadForgeError::Config(
            "at least one worker is needed".to_string(),
        ));
    }
    let start = args.search.start_layout()?;
    let scorer = args.corpus.build_scorer(args.search.stroke_model)?;
    let template = args.search.annealer(scorer, None)?;
    let plan = JobPlan::try_from(&args.hive)?;

    info!("🐝 Local hive with {} worker thread(s)", args.workers);
    let (transport, nodes) = local_cluster(args.workers);

    let report = thread::scope(|s| {
        let handles: Vec<_> = nodes
            .into_iter()
            .map(|mut node| {
                let mut worker = Worker::new(template.clone(), start.clone());
                s.spawn(move || worker.run(&mut node))
            })
            .collect();

        let report = JobCoordinator::new(transport, plan, args.search.seed).run();

        for handle in handles {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("Worker failed: {}", e),
                Err(_) => error!("Worker thread panicked"),
            }
        }
        report
    })?;

    reports::print_hive_report(&report);
    Ok(())
}
