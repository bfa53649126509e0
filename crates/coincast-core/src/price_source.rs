//! Price source trait, request types and the pipeline error taxonomy.
//!
//! This module defines the adapter contract (`PriceSource`) that every
//! provider implementation follows, and [`ForecastError`], the value-typed
//! error every stage of the prediction pipeline reports.
//!
//! # Operations
//!
//! | Operation | Request | Response | Description |
//! |-----------|---------|----------|-------------|
//! | History | [`HistoryRequest`] | [`PriceSeries`] | Daily closes, oldest first |
//! | Snapshot | [`Symbol`] | [`CoinSnapshot`] | Current USD market figures |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CoinSnapshot, PriceSeries, ProviderId, ProviderPolicy, Symbol, ValidationError};

/// Pipeline error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastErrorKind {
    InvalidRequest,
    InvalidDateFormat,
    HorizonOutOfRange,
    UpstreamUnavailable,
    SymbolNotFound,
    InsufficientHistory,
    InternalError,
}

impl ForecastErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidDateFormat => "invalid_date_format",
            Self::HorizonOutOfRange => "horizon_out_of_range",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::SymbolNotFound => "symbol_not_found",
            Self::InsufficientHistory => "insufficient_history",
            Self::InternalError => "internal_error",
        }
    }

    /// True for kinds detected before any upstream call is made.
    pub const fn is_validation(self) -> bool {
        matches!(
            self,
            Self::InvalidRequest | Self::InvalidDateFormat | Self::HorizonOutOfRange
        )
    }
}

impl Display for ForecastErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error surfaced to callers as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastError {
    kind: ForecastErrorKind,
    message: String,
}

impl ForecastError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ForecastErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn invalid_date_format(raw: &str) -> Self {
        Self {
            kind: ForecastErrorKind::InvalidDateFormat,
            message: format!("target date '{raw}' is not a valid YYYY-MM-DD calendar date"),
        }
    }

    pub fn horizon_out_of_range(horizon_days: i64, ceiling_days: u32) -> Self {
        Self {
            kind: ForecastErrorKind::HorizonOutOfRange,
            message: format!(
                "only 1-{ceiling_days} day predictions are supported; requested {horizon_days}"
            ),
        }
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ForecastErrorKind::UpstreamUnavailable,
            message: message.into(),
        }
    }

    pub fn symbol_not_found(symbol: &Symbol, provider: ProviderId) -> Self {
        Self {
            kind: ForecastErrorKind::SymbolNotFound,
            message: format!(
                "{} has no USD market data for symbol '{symbol}'",
                provider.display_name()
            ),
        }
    }

    pub fn insufficient_history(available: usize, required: usize) -> Self {
        Self {
            kind: ForecastErrorKind::InsufficientHistory,
            message: format!(
                "insufficient historical data: {available} valid samples, at least {required} required"
            ),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ForecastErrorKind::InternalError,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ForecastErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl Display for ForecastError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ForecastError {}

impl From<ValidationError> for ForecastError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Request payload for the daily history operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub lookback_days: u32,
    /// Fewer valid samples than this fails with `InsufficientHistory`.
    pub min_samples: usize,
}

impl HistoryRequest {
    pub fn new(
        symbol: Symbol,
        lookback_days: u32,
        min_samples: usize,
    ) -> Result<Self, ForecastError> {
        if lookback_days == 0 {
            return Err(ForecastError::invalid_request(
                "history lookback must be at least one day",
            ));
        }
        Ok(Self {
            symbol,
            lookback_days,
            min_samples: min_samples.max(1),
        })
    }
}

/// Boxed future returned by [`PriceSource`] operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ForecastError>> + Send + 'a>>;

/// Upstream price provider contract.
///
/// Implementations make exactly one attempt per call: transport failures,
/// timeouts and non-success statuses surface immediately as
/// `UpstreamUnavailable`, never retried.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`id`](PriceSource::id) | Provider identifier |
/// | [`policy`](PriceSource::policy) | Lookback, horizon ceiling, timeout |
/// | [`daily_history`](PriceSource::daily_history) | Normalized daily closes |
/// | [`snapshot`](PriceSource::snapshot) | Current market figures |
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one instance serves every request.
pub trait PriceSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn policy(&self) -> &ProviderPolicy;

    /// Fetches daily closing prices, oldest first.
    ///
    /// # Errors
    ///
    /// - `UpstreamUnavailable` on transport failure, timeout or bad status
    /// - `SymbolNotFound` when the provider has no data for the symbol
    /// - `InsufficientHistory` when fewer than `req.min_samples` remain
    /// - `InternalError` when the payload shape is unrecognized
    fn daily_history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries>;

    /// Fetches the current USD market snapshot.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`daily_history`](PriceSource::daily_history),
    /// minus `InsufficientHistory`.
    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, CoinSnapshot>;
}
