mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::stamp_duty::{CalculateArgs, JurisdictionsArgs, RulesArgs};

/// Indian incorporation stamp duty and registration fee calculator
#[derive(Parser)]
#[command(
    name = "stampduty",
    version,
    about = "Indian incorporation stamp duty and registration fee calculator",
    long_about = "Computes the stamp duty payable on SPICe+ Part B, the Memorandum and the \
                  Articles of Association for a company incorporated in any Indian state or \
                  union territory, together with the fixed registration fees. Rates come from \
                  a versioned rule table that can be replaced with --rules."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log rule resolution to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate registration fees and stamp duty for an incorporation
    Calculate(CalculateArgs),
    /// List the jurisdictions in the rule table
    Jurisdictions(JurisdictionsArgs),
    /// Show the rule table, or the rule one jurisdiction uses
    Rules(RulesArgs),
    /// Print the option lists a request form offers
    Options,
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

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::stamp_duty::run_calculate(args),
        Commands::Jurisdictions(args) => commands::stamp_duty::run_jurisdictions(args),
        Commands::Rules(args) => commands::stamp_duty::run_rules(args),
        Commands::Options => commands::stamp_duty::run_options(),
        Commands::Version => {
            println!("stampduty {}", env!("CARGO_PKG_VERSION"));
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
