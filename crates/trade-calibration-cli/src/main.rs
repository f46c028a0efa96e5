mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::history::{CalibrateArgs, NormalizeArgs};

/// Calibrate risk and target parameters from a historical trade log
#[derive(Parser)]
#[command(
    name = "tcal",
    version,
    about = "Calibrate risk and target parameters from a historical trade log",
    long_about = "Reads a trade log (CSV, JSON or YAML) with DATE IN, INVESTMENT (EURO) \
                  and RESULT columns and derives win rate, average investment per \
                  operation, trades per month and suggested ROI / loss targets."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log parsing diagnostics to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute historical performance averages from a trade log
    Calibrate(CalibrateArgs),
    /// Show how each row of a trade log is coerced
    Normalize(NormalizeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calibrate(args) => commands::history::run_calibrate(args),
        Commands::Normalize(args) => commands::history::run_normalize(args),
        Commands::Version => {
            println!("tcal {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
