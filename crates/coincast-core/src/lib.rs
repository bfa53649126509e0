//! # Coincast Core
//!
//! Price sources, request validation and linear forecasting for the
//! `coincast` web service and CLI.
//!
//! ## Overview
//!
//! - **Domain models** for symbols, timestamps, daily price series and
//!   market snapshots
//! - **Price source trait** with adapters for CryptoCompare, CoinGecko and
//!   CoinMarketCap
//! - **Forecast engine** fitting ordinary least squares over day indices
//! - **Prediction service** wiring validation, fetch, fit and formatting
//! - **Response envelope** for machine-readable CLI output
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters and source selection |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Domain models |
//! | [`envelope`] | CLI response envelope |
//! | [`error`] | Validation and configuration errors |
//! | [`forecast`] | Least-squares fit and moving average |
//! | [`http_client`] | HTTP client abstraction |
//! | [`price_source`] | Source trait and pipeline error taxonomy |
//! | [`provider_policy`] | Per-provider lookback, ceiling and timeout |
//! | [`response`] | Outward-facing result shapes |
//! | [`service`] | Request pipeline |
//! | [`source`] | Provider identifiers |
//! | [`validation`] | Symbol and horizon validation |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coincast_core::{build_source, AppConfig, PredictionRequest, PredictionService,
//!     ReqwestHttpClient, TargetSpec, UtcDateTime};
//!
//! let config = AppConfig::from_env()?;
//! let source = build_source(&config, Arc::new(ReqwestHttpClient::new()))?;
//! let service = PredictionService::new(source, config.min_samples);
//!
//! let request = PredictionRequest::new("BTC", TargetSpec::Horizon(7));
//! let result = service.predict(UtcDateTime::now().date(), &request).await?;
//! println!("{}: ${}", result.target_date, result.predicted_price_usd);
//! ```
//!
//! ## Error Handling
//!
//! Every pipeline stage reports a [`ForecastError`]; callers branch on its
//! kind rather than its message:
//!
//! ```rust
//! use coincast_core::{ForecastError, ForecastErrorKind};
//!
//! fn describe(error: &ForecastError) -> &'static str {
//!     match error.kind() {
//!         ForecastErrorKind::SymbolNotFound => "unknown coin",
//!         ForecastErrorKind::UpstreamUnavailable => "try again later",
//!         kind if kind.is_validation() => "fix the request",
//!         _ => "something went wrong",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from the environment only and are redacted from
//!   `Debug` output and logs

pub mod adapters;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod forecast;
pub mod http_client;
pub mod price_source;
pub mod provider_policy;
pub mod response;
pub mod service;
pub mod source;
pub mod validation;

pub use adapters::{
    build_source, CmcHistoryMode, CoinGeckoAdapter, CoinMarketCapAdapter, CryptoCompareAdapter,
};

pub use config::{ApiKey, AppConfig, DEFAULT_MIN_SAMPLES};

pub use domain::{
    CoinSnapshot, PriceSample, PriceSeries, RawObservation, SeriesProvenance, Symbol, UtcDateTime,
};

pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

pub use error::{ConfigError, ValidationError};

pub use forecast::{forecast, round_to_cents, simple_moving_average, FittedModel, Forecast};

pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

pub use price_source::{
    ForecastError, ForecastErrorKind, HistoryRequest, PriceSource, SourceFuture,
};

pub use provider_policy::ProviderPolicy;

pub use response::{
    CoinStatsResult, ErrorBody, ErrorDetail, MovingAverageResult, PredictionResult,
    PriceHistoryResult,
};

pub use service::PredictionService;

pub use source::ProviderId;

pub use validation::{validate, PredictionRequest, TargetSpec, ValidatedRequest};
