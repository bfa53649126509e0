//! Outward-facing result shapes.
//!
//! These are the JSON bodies returned by the web service and embedded in
//! CLI envelopes. Optional figures serialize as `null`; keys are never
//! omitted so the schema is stable across partial upstream data.

use serde::{Deserialize, Serialize};

use crate::forecast::{round_to_cents, Forecast};
use crate::validation::ValidatedRequest;
use crate::{
    CoinSnapshot, ForecastError, ForecastErrorKind, PriceSeries, ProviderId, SeriesProvenance,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub symbol: String,
    pub target_date: String,
    pub horizon_days: u32,
    pub predicted_price_usd: f64,
    pub note: String,
    pub samples_used: usize,
    pub provider: ProviderId,
}

impl PredictionResult {
    pub fn new(request: &ValidatedRequest, series: &PriceSeries, forecast: &Forecast) -> Self {
        Self {
            symbol: request.symbol.to_string(),
            target_date: request.target_date.to_string(),
            horizon_days: request.horizon_days,
            predicted_price_usd: round_to_cents(forecast.price),
            note: provenance_note(series.provider(), series.provenance(), forecast.samples_used),
            samples_used: forecast.samples_used,
            provider: series.provider(),
        }
    }
}

/// Human-readable note naming the sample count, so callers can judge how
/// much to trust the number.
pub fn provenance_note(
    provider: ProviderId,
    provenance: SeriesProvenance,
    samples_used: usize,
) -> String {
    match provenance {
        SeriesProvenance::Historical => format!(
            "Prediction based on {samples_used} real days of historical data from {}.",
            provider.display_name()
        ),
        SeriesProvenance::SampledSnapshots => format!(
            "Prediction based on {samples_used} repeated current-price samples from {}; \
             the series is synthetic, not real daily history.",
            provider.display_name()
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinStatsResult {
    pub symbol: String,
    pub current_price_usd: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_percentage_1h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d: Option<f64>,
    pub price_change_percentage_1y: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
}

impl From<CoinSnapshot> for CoinStatsResult {
    fn from(snapshot: CoinSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol.into(),
            current_price_usd: snapshot.price,
            high_24h: snapshot.high_24h,
            low_24h: snapshot.low_24h,
            price_change_percentage_1h: snapshot.change_pct_1h,
            price_change_percentage_24h: snapshot.change_pct_24h,
            price_change_percentage_7d: snapshot.change_pct_7d,
            price_change_percentage_1y: snapshot.change_pct_1y,
            market_cap: snapshot.market_cap,
            volume_24h: snapshot.volume_24h,
        }
    }
}

/// Raw close series, `[unix_millis, close]` pairs oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryResult {
    pub symbol: String,
    pub days: u32,
    pub provenance: SeriesProvenance,
    pub prices: Vec<(i64, f64)>,
}

impl PriceHistoryResult {
    pub fn new(days: u32, series: &PriceSeries) -> Self {
        Self {
            symbol: series.symbol().to_string(),
            days,
            provenance: series.provenance(),
            prices: series
                .samples()
                .iter()
                .map(|sample| (sample.observed_at.unix_millis(), sample.price))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageResult {
    pub symbol: String,
    pub window: usize,
    pub provenance: SeriesProvenance,
    pub moving_average_usd: f64,
    pub samples_used: usize,
}

impl MovingAverageResult {
    pub fn new(window: usize, average: f64, series: &PriceSeries) -> Self {
        Self {
            symbol: series.symbol().to_string(),
            window,
            provenance: series.provenance(),
            moving_average_usd: round_to_cents(average),
            samples_used: window,
        }
    }
}

/// Error body: `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ForecastErrorKind,
    pub message: String,
}

impl From<&ForecastError> for ErrorBody {
    fn from(error: &ForecastError) -> Self {
        Self {
            error: ErrorDetail {
                kind: error.kind(),
                message: error.message().to_owned(),
            },
        }
    }
}
