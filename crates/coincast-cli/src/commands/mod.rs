mod history;
mod moving_average;
mod predict;
mod stats;

use std::sync::Arc;
use std::time::Instant;

use coincast_core::{
    build_source, AppConfig, CmcHistoryMode, Envelope, EnvelopeError, ForecastError,
    PredictionService, ProviderId, ReqwestHttpClient,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;

/// Outcome of one command before it is wrapped in an envelope.
pub struct CommandResult {
    pub data: Value,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self { data }
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let config = load_config(cli)?;
    let provider = config.provider;
    debug!(%provider, timeout_ms = config.timeout.as_millis() as u64, "cli configuration loaded");

    let source = build_source(&config, Arc::new(ReqwestHttpClient::new()))?;
    let service = PredictionService::new(source, config.min_samples);

    let started = Instant::now();
    let outcome = match &cli.command {
        Command::Predict(args) => predict::run(args, &service).await,
        Command::Stats(args) => stats::run(args, &service).await,
        Command::History(args) => history::run(args, &service).await,
        Command::MovingAverage(args) => moving_average::run(args, &service).await,
    };
    let latency_ms = started.elapsed().as_millis() as u64;

    let mut metadata = Metadata::new(provider, latency_ms);
    if uses_sampled_history(&config) && !matches!(cli.command, Command::Stats(_)) {
        metadata.push_warning(
            "CoinMarketCap history is sampled from repeated latest-quote reads; the series is synthetic",
        );
    }
    match outcome {
        Ok(Ok(result)) => Ok(Envelope::success(metadata.into_envelope_meta()?, result.data)),
        Ok(Err(error)) => failure(metadata, &error),
        Err(error) => Err(error),
    }
}

fn failure(metadata: Metadata, error: &ForecastError) -> Result<Envelope<Value>, CliError> {
    let provider = metadata.provider;
    let envelope_error = EnvelopeError::from(error).with_source(provider);
    Ok(Envelope::failure(metadata.into_envelope_meta()?, envelope_error)?)
}

fn uses_sampled_history(config: &AppConfig) -> bool {
    config.provider == ProviderId::Coinmarketcap
        && matches!(config.cmc_history_mode, CmcHistoryMode::Sampled { .. })
}

/// Environment configuration with CLI flags layered on top. The lookup is
/// overlaid rather than patched afterwards so the credential read matches
/// the provider actually selected.
fn load_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let provider = cli.provider.map(|provider| provider.as_str().to_owned());
    let timeout_ms = cli.timeout_ms.map(|timeout| timeout.to_string());

    let config = AppConfig::from_lookup(|key| match key {
        "COINCAST_PROVIDER" if provider.is_some() => provider.clone(),
        "COINCAST_TIMEOUT_MS" if timeout_ms.is_some() => timeout_ms.clone(),
        _ => std::env::var(key).ok(),
    })?;
    Ok(config)
}

/// Commands report pipeline failures as data so they land in the envelope;
/// the outer `Result` is reserved for CLI plumbing failures.
type CommandOutcome = Result<Result<CommandResult, ForecastError>, CliError>;
