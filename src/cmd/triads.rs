use crate::reports;
use clap::Args;
use tracing::info;
use triadforge::config::CorpusParams;
use triadforge::corpus::TriadOrder;
use triadforge::error::TfResult;

#[derive(Args, Debug, Clone)]
pub struct TriadsArgs {
    #[command(flatten)]
    pub corpus: CorpusParams,

    /// Hide triads seen fewer times than this
    #[arg(long, default_value_t = 10)]
    pub min_count: u64,

    #[arg(long, value_enum, default_value_t = TriadOrder::Frequency)]
    pub sort: TriadOrder,

    /// Rows to print
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Also print digraph counts
    #[arg(long, default_value_t = false)]
    pub digraphs: bool,

    /// Write the full triad table as TSV
    #[arg(long)]
    pub export: Option<String>,
}

pub fn run(args: TriadsArgs) -> TfResult<()> {
    let index = args.corpus.load_index()?;

    let entries = index.top_triads(args.min_count, args.sort);
    reports::print_triads(&entries, index.total(), args.limit);

    if args.digraphs {
        reports::print_digraphs(&index.digraphs(), args.limit);
    }

    if let Some(path) = &args.export {
        index.save_tsv(path)?;
        info!("💾 {} triads written to: {}", index.len(), path);
    }
    Ok(())
}
