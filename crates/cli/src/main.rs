// capledger CLI - point-in-time capital structure from anchors + event log

mod commands;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "capledger")]
#[command(about = "Reconstruct, verify and schedule a company's capital structure")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log filter (e.g. "debug", "capledger_recon=debug"). Overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset and check ordering and settings
    #[command(after_help = "\
Examples:
  capledger validate issuer.toml
  capledger validate issuer.json")]
    Validate {
        /// Dataset file (.toml or .json)
        dataset: PathBuf,
    },

    /// Capital structure on a single date (exit 5 if before the first anchor)
    #[command(after_help = "\
Examples:
  capledger at issuer.toml 2024-05-31
  capledger at issuer.toml 2024-06-30 --json")]
    At {
        dataset: PathBuf,

        /// Target date (YYYY-MM-DD)
        date: NaiveDate,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Sample the capital structure between two dates
    #[command(after_help = "\
Examples:
  capledger range issuer.toml 2024-01-01 2024-12-31
  capledger range issuer.toml 2024-01-31 2024-12-31 --interval monthly --json
  capledger range issuer.toml --timeline")]
    Range {
        dataset: PathBuf,

        /// First sample date (YYYY-MM-DD)
        #[arg(required_unless_present = "timeline")]
        start: Option<NaiveDate>,

        /// Last sample date, inclusive (YYYY-MM-DD)
        #[arg(required_unless_present = "timeline")]
        end: Option<NaiveDate>,

        /// Sampling step
        #[arg(long, value_enum, default_value = "quarterly")]
        interval: IntervalArg,

        /// Emit every anchor instead of sampling
        #[arg(long, conflicts_with_all = ["start", "end"])]
        timeline: bool,

        #[arg(long)]
        json: bool,
    },

    /// Cross-check the event log against anchor deltas (exit 3 on warn/fail)
    #[command(after_help = "\
Examples:
  capledger verify issuer.toml
  capledger verify issuer.toml --json
  capledger verify issuer.toml --output report.json
  capledger verify issuer.toml --discrepancies-only --json
  capledger verify issuer.toml --period-end 2024-09-30")]
    Verify {
        dataset: PathBuf,

        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Only intervals with at least one warn or fail
        #[arg(long)]
        discrepancies_only: bool,

        /// Verify only the interval ending at this anchor date
        #[arg(long, value_name = "DATE", conflicts_with = "discrepancies_only")]
        period_end: Option<NaiveDate>,
    },

    /// Upcoming maturities and obligations awaiting confirmation
    #[command(after_help = "\
Examples:
  capledger scheduled issuer.toml --as-of 2025-01-10
  capledger scheduled issuer.toml --as-of 2025-01-10 --price 300 --json")]
    Scheduled {
        dataset: PathBuf,

        /// Reference date; nothing reads the system clock
        #[arg(long, value_name = "DATE")]
        as_of: NaiveDate,

        /// Market price per share, for conversion likelihood
        #[arg(long)]
        price: Option<Decimal>,

        #[arg(long)]
        json: bool,
    },

    /// Capital raised and deployed over a date range
    #[command(after_help = "\
Examples:
  capledger flows issuer.toml 2024-04-01 2024-06-30
  capledger flows issuer.toml 2024-01-01 2024-12-31 --json")]
    Flows {
        dataset: PathBuf,
        start: NaiveDate,
        end: NaiveDate,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IntervalArg {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl From<IntervalArg> for capledger_recon::Interval {
    fn from(arg: IntervalArg) -> Self {
        match arg {
            IntervalArg::Daily => Self::Daily,
            IntervalArg::Weekly => Self::Weekly,
            IntervalArg::Monthly => Self::Monthly,
            IntervalArg::Quarterly => Self::Quarterly,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  capledger-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Install the stderr subscriber. Library `log` records are bridged through it.
fn init_tracing(level: Option<&str>) {
    let filter = level
        .and_then(|l| tracing_subscriber::EnvFilter::try_new(l).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Validate { dataset } => commands::cmd_validate(dataset),
        Commands::At { dataset, date, json } => commands::cmd_at(dataset, date, json),
        Commands::Range { dataset, start, end, interval, timeline, json } => {
            commands::cmd_range(dataset, start, end, interval.into(), timeline, json)
        }
        Commands::Verify { dataset, json, output, discrepancies_only, period_end } => {
            commands::cmd_verify(dataset, json, output, discrepancies_only, period_end)
        }
        Commands::Scheduled { dataset, as_of, price, json } => {
            commands::cmd_scheduled(dataset, as_of, price, json)
        }
        Commands::Flows { dataset, start, end, json } => commands::cmd_flows(dataset, start, end, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<capledger_recon::LedgerError> for CliError {
    fn from(err: capledger_recon::LedgerError) -> Self {
        Self::new(exit_codes::ledger_exit_code(&err), err.to_string())
    }
}
