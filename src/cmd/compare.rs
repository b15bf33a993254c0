use crate::reports;
use clap::Args;
use strum::IntoEnumIterator;
use tracing::info;
use triadforge::config::CorpusParams;
use triadforge::error::TfResult;
use triadforge::layouts::{KnownLayout, Layout};
use triadforge::scorer::StrokeModel;

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub corpus: CorpusParams,

    #[arg(long, value_enum, default_value_t = StrokeModel::FirstKey)]
    pub stroke_model: StrokeModel,

    /// Layouts to score (known names or 47-character layouts); all known layouts when omitted
    #[arg(short, long)]
    pub layout: Vec<String>,

    /// Also draw each layout
    #[arg(long, default_value_t = false)]
    pub grid: bool,
}

pub fn run(args: CompareArgs) -> TfResult<()> {
    let mut scorer = args.corpus.build_scorer(args.stroke_model)?;

    let candidates: Vec<(String, Layout)> = if args.layout.is_empty() {
        KnownLayout::iter()
            .map(|k| (k.to_string(), k.layout()))
            .collect()
    } else {
        args.layout
            .iter()
            .map(|name| Layout::resolve(name).map(|l| (name.clone(), l)))
            .collect::<TfResult<_>>()?
    };

    info!("⚖️  Scoring {} layout(s)", candidates.len());
    let mut results = Vec::with_capacity(candidates.len());
    for (name, layout) in &candidates {
        let score = scorer.score(layout);
        if args.grid {
            reports::print_layout_grid(name, layout);
        }
        results.push((name.clone(), score));
    }

    let qwerty = KnownLayout::Qwerty.layout();
    let baseline = scorer.score(&qwerty);
    reports::print_comparison(&results, Some(("qwerty", baseline)));
    Ok(())
}
