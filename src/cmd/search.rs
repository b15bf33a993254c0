use crate::reports;
use clap::Args;
use std::fs;
use tracing::info;
use triadforge::config::{CorpusParams, SearchParams};
use triadforge::error::TfResult;
use triadforge::layouts::Layout;
use triadforge::optimizer::{AnnealObserver, OptimizationOptions, Optimizer, Transition};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub corpus: CorpusParams,

    #[command(flatten)]
    pub search: SearchParams,

    /// JSON file of search parameters; replaces the command-line values
    #[arg(long)]
    pub params: Option<String>,

    /// Write the result as JSON
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print every accepted move
    #[arg(long, default_value_t = false)]
    pub trace_transitions: bool,
}

struct CliObserver {
    round: usize,
    trace: bool,
}

impl AnnealObserver for CliObserver {
    fn on_transition(&mut self, transition: &Transition<'_>) {
        if self.trace {
            reports::print_transition(transition);
        }
    }

    fn on_rate(&mut self, iteration: u64, layouts_per_sec: f64) {
        info!(
            "   .. round {} | iteration {} | {:.0} layouts/s",
            self.round + 1,
            iteration,
            layouts_per_sec
        );
    }
}

pub fn run(args: SearchArgs) -> TfResult<()> {
    let search = match &args.params {
        Some(path) => {
            info!("📂 Loading search parameters from: {}", path);
            SearchParams::load_from_file(path)?
        }
        None => args.search.clone(),
    };

    let start = search.start_layout()?;
    let scorer = args.corpus.build_scorer(search.stroke_model)?;
    let template = search.annealer(scorer, search.seed)?;

    info!(
        "🔥 {} round(s) of {} iterations (t0 {}, p0 {}, k {})",
        search.rounds.max(1),
        search.iterations,
        search.t0,
        search.p0,
        search.cooling
    );
    reports::print_layout_grid("START", &start);

    let optimizer = Optimizer::new(template, OptimizationOptions::from(&search));
    let trace = args.trace_transitions;
    let result = optimizer.run_with(&start, |round| CliObserver { round, trace });

    reports::print_search_result(&result);
    let best: Layout = result.layout.parse()?;
    reports::print_layout_grid("OPTIMIZED", &best);

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&result)?)?;
        info!("💾 Result written to: {}", path);
    }
    Ok(())
}
