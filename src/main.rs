use clap::{Parser, Subcommand};
use std::process;
use tracing::{error, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Anneal a layout in this process
    Search(cmd::search::SearchArgs),
    /// Score the known layouts (or given ones) against a corpus
    Compare(cmd::compare::CompareArgs),
    /// Show triad and digraph statistics of a corpus
    Triads(cmd::triads::TriadsArgs),
    /// Coordinate workers connecting over TCP
    Hive(cmd::hive::HiveArgs),
    /// Work for a hive
    Node(cmd::node::NodeArgs),
    /// Coordinator plus worker threads in this process
    Local(cmd::hive::LocalArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Search(args) => cmd::search::run(args),
        Commands::Compare(args) => cmd::compare::run(args),
        Commands::Triads(args) => cmd::triads::run(args),
        Commands::Hive(args) => cmd::hive::run_hive(args, cli.debug),
        Commands::Node(args) => cmd::node::run(args),
        Commands::Local(args) => cmd::hive::run_local(args),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
