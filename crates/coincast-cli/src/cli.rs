//! CLI argument definitions for coincast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `predict` | Linear forecast for a date or horizon |
//! | `stats` | Current market figures |
//! | `history` | Raw daily closes |
//! | `moving-average` | Mean of the last N closes |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--provider` | `cryptocompare` | Active price source |
//! | `--timeout-ms` | `8000` | Upstream timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! coincast predict BTC --days 7
//! coincast predict eth --date 2025-04-01 --pretty
//! coincast --provider coingecko stats SOL
//! ```

use clap::{Args, Parser, Subcommand};
use coincast_core::ProviderId;

/// Naive linear-regression crypto price forecasts.
#[derive(Debug, Parser)]
#[command(name = "coincast", author, version, about = "Naive crypto price forecasts")]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Price source: cryptocompare, coingecko or coinmarketcap.
    #[arg(long, global = true, env = "COINCAST_PROVIDER")]
    pub provider: Option<ProviderId>,

    /// Upstream timeout in milliseconds (1000-10000).
    #[arg(long, global = true, env = "COINCAST_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast the USD price on a future day.
    ///
    /// # Examples
    ///
    ///   coincast predict BTC --days 7
    ///   coincast predict ETH --date 2025-04-01
    Predict(PredictArgs),

    /// Current price, 24h range, change percentages, market cap and volume.
    Stats(SymbolArgs),

    /// Daily closing prices for the last N days.
    History(HistoryArgs),

    /// Mean of the last N daily closes.
    MovingAverage(MovingAverageArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PredictArgs {
    pub symbol: String,

    /// Target date, YYYY-MM-DD.
    #[arg(long, conflicts_with = "days", required_unless_present = "days")]
    pub date: Option<String>,

    /// Days after today.
    #[arg(long, allow_negative_numbers = true)]
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Args)]
pub struct SymbolArgs {
    pub symbol: String,
}

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    pub symbol: String,

    #[arg(long, default_value_t = 30)]
    pub days: u32,
}

#[derive(Debug, Clone, Args)]
pub struct MovingAverageArgs {
    pub symbol: String,

    #[arg(long, default_value_t = 7)]
    pub window: usize,
}
