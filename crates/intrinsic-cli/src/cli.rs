//! CLI argument definitions for intrinsic.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `evaluate` | Value a list of tickers against their current price (default) |
//! | `value` | Run the DCF model on figures given on the command line |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Exit with code 3 when any ticker failed |
//! | `-v` | warn | Raise log verbosity (`-v` info, `-vv` debug) |
//! | `--log-format` | `text` | Log format on stderr (text, json) |
//!
//! # Examples
//!
//! ```bash
//! # Reference ticker list with default parameters
//! intrinsic
//!
//! # Selected tickers, custom parameters, JSON report
//! intrinsic --format json evaluate KO AAPL --discount-rate 0.08 --growth-rate 0.02
//!
//! # Offline run against a fixture file
//! intrinsic evaluate --fixtures snapshots.json --tickers '["KO","CB"]'
//!
//! # Single valuation from raw figures
//! intrinsic value --operating-cash-flow 1000 --shares 100 --price 650
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Intrinsic - discounted cash flow value estimates
///
/// Estimates the intrinsic value per share of listed companies with a
/// constant-growth DCF model and compares it to the latest close.
#[derive(Debug, Parser)]
#[command(
    name = "intrinsic",
    author,
    version,
    about = "Discounted cash flow value estimates for listed companies",
    long_about = "Intrinsic estimates the value per share of listed companies from their latest \
free cash flow, using a constant-growth DCF model with a Gordon Growth terminal value, \
and compares it with the current market price.\n\
\n\
Running without a command evaluates the reference ticker list.\n\
\n\
Use 'intrinsic <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - text: One line per ticker (default)
    /// - json: Single JSON object keyed by ticker
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Exit with code 3 when any ticker could not be valued.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Increase log verbosity (-v info, -vv debug). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log record format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Value tickers with market data and compare with their latest close.
    Evaluate(EvaluateArgs),
    /// Run the DCF model on figures given on the command line.
    Value(ValueArgs),
}

/// DCF parameter overrides. Unset flags keep the configured value.
#[derive(Debug, Clone, Default, Args)]
pub struct ParameterArgs {
    /// Annual discount rate, e.g. 0.044 for 4.4%.
    #[arg(long)]
    pub discount_rate: Option<f64>,

    /// Perpetual annual growth rate; must be below the discount rate.
    #[arg(long)]
    pub growth_rate: Option<f64>,

    /// Years in the explicit projection window.
    #[arg(long)]
    pub horizon_years: Option<u32>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EvaluateArgs {
    /// Tickers to value. Defaults to the reference list.
    #[arg(value_name = "TICKER", conflicts_with_all = ["tickers", "tickers_file"])]
    pub symbols: Vec<String>,

    /// Tickers as a JSON array literal, e.g. '["AAPL","KO"]'.
    #[arg(long, conflicts_with = "tickers_file")]
    pub tickers: Option<String>,

    /// File containing a JSON array of tickers.
    #[arg(long)]
    pub tickers_file: Option<PathBuf>,

    /// JSON config file with tickers, parameters, concurrency and timeout.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub parameters: ParameterArgs,

    /// Tickers evaluated at once; 1 runs strictly sequentially.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Serve market data from a JSON fixture file instead of Yahoo Finance.
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ValueArgs {
    /// Operating cash flow of the latest period.
    #[arg(long, allow_negative_numbers = true)]
    pub operating_cash_flow: f64,

    /// Capital expenditure of the latest period; the sign is ignored.
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    pub capital_expenditure: f64,

    /// Shares outstanding.
    #[arg(long)]
    pub shares: f64,

    /// Current market price, for the value-to-price ratio.
    #[arg(long)]
    pub price: Option<f64>,

    #[command(flatten)]
    pub parameters: ParameterArgs,
}
