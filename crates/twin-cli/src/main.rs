//! # twin CLI entry point
//!
//! Parses arguments, replays the journal, and dispatches to a subcommand.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use twin_cli::inspect::{run_events, run_history, run_product, InspectArgs};
use twin_cli::verify::{run_verify, VerifyArgs};

/// Inspect and verify a digital twin registry journal.
#[derive(Parser, Debug)]
#[command(name = "twin", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Registry journal to read.
    #[arg(long, global = true, default_value = "twin.journal")]
    journal: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a product's current record.
    Product(InspectArgs),

    /// Print a product's lifecycle events.
    Events(InspectArgs),

    /// Print a product's ownership transfers.
    History(InspectArgs),

    /// Recompute event digest chains. Exits 2 if any chain is broken.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = match twin_cli::load_journal(&cli.journal) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            return ExitCode::from(1);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Product(args) => run_product(&store, &args, &mut stdout),
        Commands::Events(args) => run_events(&store, &args, &mut stdout),
        Commands::History(args) => run_history(&store, &args, &mut stdout),
        Commands::Verify(args) => run_verify(&store, &args, &mut stdout),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
