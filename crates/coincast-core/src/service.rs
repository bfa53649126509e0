//! Request pipeline: validate, fetch, fit, format.
//!
//! Every operation validates its inputs before touching the active
//! [`PriceSource`], so malformed requests never cost an upstream call.

use std::sync::Arc;
use std::time::Instant;

use time::Date;
use tracing::{info, warn};

use crate::forecast::{forecast, simple_moving_average};
use crate::price_source::HistoryRequest;
use crate::response::{CoinStatsResult, MovingAverageResult, PredictionResult, PriceHistoryResult};
use crate::validation::{validate, PredictionRequest};
use crate::{ForecastError, PriceSource, ProviderId, ProviderPolicy, Symbol};

#[derive(Clone)]
pub struct PredictionService {
    source: Arc<dyn PriceSource>,
    min_samples: usize,
}

impl PredictionService {
    pub fn new(source: Arc<dyn PriceSource>, min_samples: usize) -> Self {
        Self {
            source,
            min_samples: min_samples.max(2),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.source.id()
    }

    pub fn policy(&self) -> &ProviderPolicy {
        self.source.policy()
    }

    pub const fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Forecast the USD price of `request.symbol` on the requested day.
    pub async fn predict(
        &self,
        today: Date,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, ForecastError> {
        let started = Instant::now();
        let policy = self.source.policy();
        let validated = validate(today, request, policy.horizon_ceiling_days)
            .inspect_err(|error| info!(code = error.code(), "prediction request rejected"))?;

        let history = HistoryRequest::new(
            validated.symbol.clone(),
            policy.lookback_days,
            self.min_samples,
        )?;
        let series = self
            .source
            .daily_history(history)
            .await
            .inspect_err(|error| log_upstream_failure("daily_history", error))?
            .require_samples(self.min_samples)?;

        let fitted = forecast(&series, validated.horizon_days)?;
        let result = PredictionResult::new(&validated, &series, &fitted);

        info!(
            provider = %self.provider(),
            symbol = %validated.symbol,
            horizon_days = validated.horizon_days,
            samples = fitted.samples_used,
            slope = fitted.model.slope,
            latency_ms = started.elapsed().as_millis() as u64,
            "prediction served"
        );
        Ok(result)
    }

    /// Current market figures for one symbol.
    pub async fn coin_stats(&self, raw_symbol: &str) -> Result<CoinStatsResult, ForecastError> {
        let symbol = Symbol::parse(raw_symbol)?;
        let snapshot = self
            .source
            .snapshot(symbol.clone())
            .await
            .inspect_err(|error| log_upstream_failure("snapshot", error))?
            .sanitized();

        info!(provider = %self.provider(), %symbol, "coin stats served");
        Ok(CoinStatsResult::from(snapshot))
    }

    /// Raw daily closes for the last `days` days.
    pub async fn history(
        &self,
        raw_symbol: &str,
        days: u32,
    ) -> Result<PriceHistoryResult, ForecastError> {
        let symbol = Symbol::parse(raw_symbol)?;
        let max_days = self.source.policy().max_history_days;
        if days == 0 || days > max_days {
            return Err(ForecastError::invalid_request(format!(
                "days must be between 1 and {max_days} for {}",
                self.provider().display_name()
            )));
        }

        let series = self
            .source
            .daily_history(HistoryRequest::new(symbol, days, 1)?)
            .await
            .inspect_err(|error| log_upstream_failure("daily_history", error))?
            .require_samples(1)?;

        info!(provider = %self.provider(), symbol = %series.symbol(), days, samples = series.len(), "history served");
        Ok(PriceHistoryResult::new(days, &series))
    }

    /// Mean of the last `window` daily closes.
    pub async fn moving_average(
        &self,
        raw_symbol: &str,
        window: usize,
    ) -> Result<MovingAverageResult, ForecastError> {
        let symbol = Symbol::parse(raw_symbol)?;
        let max_days = self.source.policy().max_history_days;
        let lookback = match u32::try_from(window) {
            Ok(days) if (1..=max_days).contains(&days) => days,
            _ => {
                return Err(ForecastError::invalid_request(format!(
                    "window must be between 1 and {max_days} for {}",
                    self.provider().display_name()
                )))
            }
        };

        let series = self
            .source
            .daily_history(HistoryRequest::new(symbol, lookback, window)?)
            .await
            .inspect_err(|error| log_upstream_failure("daily_history", error))?
            .require_samples(window)?;
        let average = simple_moving_average(&series, window)?;

        info!(provider = %self.provider(), symbol = %series.symbol(), window, "moving average served");
        Ok(MovingAverageResult::new(window, average, &series))
    }
}

fn log_upstream_failure(operation: &'static str, error: &ForecastError) {
    warn!(operation, code = error.code(), message = error.message(), "source operation failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CoinSnapshot, ForecastErrorKind, PriceSeries, RawObservation, SeriesProvenance,
        UtcDateTime,
    };
    use crate::price_source::SourceFuture;
    use crate::validation::TargetSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::date;

    struct FixedSource {
        policy: ProviderPolicy,
        prices: Vec<f64>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(prices: Vec<f64>) -> Self {
            Self {
                policy: ProviderPolicy::default_for(ProviderId::Cryptocompare),
                prices,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PriceSource for FixedSource {
        fn id(&self) -> ProviderId {
            ProviderId::Cryptocompare
        }

        fn policy(&self) -> &ProviderPolicy {
            &self.policy
        }

        fn daily_history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let observations = self.prices.iter().enumerate().map(|(day, price)| {
                    let at = UtcDateTime::from_unix_seconds(1_700_000_000 + day as i64 * 86_400)
                        .expect("valid timestamp");
                    RawObservation::new(at, Some(*price))
                });
                Ok(PriceSeries::from_observations(
                    req.symbol,
                    ProviderId::Cryptocompare,
                    SeriesProvenance::Historical,
                    observations,
                ))
            })
        }

        fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, CoinSnapshot> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let mut snapshot = CoinSnapshot::empty(symbol, ProviderId::Cryptocompare);
                snapshot.price = Some(f64::NAN);
                Ok(snapshot)
            })
        }
    }

    const TODAY: Date = date!(2025 - 03 - 10);

    #[tokio::test]
    async fn predicts_linear_trend_and_rounds_once() {
        let prices = (0..10).map(|i| 100.0 + 2.0 * i as f64).collect();
        let service = PredictionService::new(Arc::new(FixedSource::new(prices)), 10);

        let request = PredictionRequest::new("btc", TargetSpec::Horizon(1));
        let result = service.predict(TODAY, &request).await.expect("prediction");

        assert_eq!(result.symbol, "BTC");
        assert_eq!(result.predicted_price_usd, 120.0);
        assert_eq!(result.target_date, "2025-03-11");
        assert_eq!(result.samples_used, 10);
    }

    #[tokio::test]
    async fn short_series_is_insufficient_history() {
        let source = Arc::new(FixedSource::new(vec![1.0, 2.0, 3.0]));
        let service = PredictionService::new(source, 10);

        let request = PredictionRequest::new("BTC", TargetSpec::Horizon(3));
        let err = service.predict(TODAY, &request).await.expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::InsufficientHistory);
    }

    #[tokio::test]
    async fn history_rejects_days_beyond_provider_limit_without_calling() {
        let source = Arc::new(FixedSource::new(vec![1.0; 5]));
        let service = PredictionService::new(source.clone(), 10);

        let err = service.history("BTC", 5_000).await.expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::InvalidRequest);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn moving_average_uses_trailing_window() {
        let source = Arc::new(FixedSource::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        let service = PredictionService::new(source, 10);

        let result = service.moving_average("eth", 2).await.expect("average");
        assert_eq!(result.moving_average_usd, 4.5);
        assert_eq!(result.symbol, "ETH");
    }

    #[tokio::test]
    async fn stats_drop_non_finite_figures() {
        let service = PredictionService::new(Arc::new(FixedSource::new(Vec::new())), 10);

        let stats = service.coin_stats("sol").await.expect("stats");
        assert_eq!(stats.current_price_usd, None);
    }
}
