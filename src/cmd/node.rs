use clap::Args;
use std::time::Duration;
use tracing::info;
use triadforge::config::{CorpusParams, SearchParams};
use triadforge::error::TfResult;
use triadforge::node::transport::TcpNode;
use triadforge::node::Worker;

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    #[command(flatten)]
    pub corpus: CorpusParams,

    #[command(flatten)]
    pub search: SearchParams,

    /// Hive address
    #[arg(long, default_value = "127.0.0.1:7878")]
    pub connect: String,

    #[arg(long, default_value_t = 30)]
    pub connect_attempts: usize,
}

pub fn run(args: NodeArgs) -> TfResult<()> {
    // Corpus and config problems end the worker before it ever connects.
    let start = args.search.start_layout()?;
    let scorer = args.corpus.build_scorer(args.search.stroke_model)?;
    let annealer = args.search.annealer(scorer, None)?;

    let mut link = TcpNode::connect(
        args.connect.as_str(),
        args.connect_attempts,
        Duration::from_secs(1),
    )?;
    let mut worker = Worker::new(annealer, start);
    let summary = worker.run(&mut link)?;

    info!(
        "🤖 Worker {} shutting down after {} job(s)",
        summary.worker_id.unwrap_or_default(),
        summary.jobs
    );
    Ok(())
}
