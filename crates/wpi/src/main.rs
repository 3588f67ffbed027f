//! WPI CLI - Interactivity directive processor.
//!
//! Provides commands for:
//! - `process`: Run a directive pass over an HTML document
//! - `eval`: Evaluate one reference expression against the store

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{EvalArgs, ProcessArgs};
use output::Output;

/// WPI - Interactivity directive processor.
#[derive(Parser)]
#[command(name = "wpi", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite directive-bearing tags in an HTML document.
    Process(ProcessArgs),
    /// Evaluate a reference expression and print the result as JSON.
    Eval(EvalArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Process(args) => args.verbose,
        Commands::Eval(args) => args.verbose,
    };

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to ERROR
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Process(args) => args.execute(&output),
        Commands::Eval(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
