//! mtgdocs CLI - meeting-notes renderer.
//!
//! Provides commands for:
//! - `render`: Render markdown documents with graph blocks to HTML
//! - `extract`: Print a document's extracted graph blocks as JSON

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExtractArgs, RenderArgs};
use output::Output;

/// mtgdocs - Meeting-notes renderer.
#[derive(Parser)]
#[command(name = "mtgdocs", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render documents to HTML.
    Render(RenderArgs),
    /// Extract graph blocks as JSON.
    Extract(ExtractArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = match &cli.command {
        Commands::Render(args) => args.verbose,
        Commands::Extract(args) => args.verbose,
    };
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Extract(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
