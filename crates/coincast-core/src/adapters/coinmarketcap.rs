use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{parse_body, send_once, status_unavailable};
use crate::config::ApiKey;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::price_source::{HistoryRequest, PriceSource, SourceFuture};
use crate::{
    CoinSnapshot, ConfigError, ForecastError, PriceSeries, ProviderId, ProviderPolicy,
    RawObservation, SeriesProvenance, Symbol, UtcDateTime,
};

const QUOTES_LATEST_URL: &str = "https://pro-api.coinmarketcap.com/v2/cryptocurrency/quotes/latest";
const OHLCV_HISTORICAL_URL: &str =
    "https://pro-api.coinmarketcap.com/v2/cryptocurrency/ohlcv/historical";
const QUOTE_CURRENCY: &str = "USD";

/// How the CoinMarketCap adapter obtains a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmcHistoryMode {
    /// Daily closes from the OHLCV history endpoint (paid plans).
    #[default]
    Historical,
    /// Repeated reads of the latest quote, for plans without history
    /// access. The resulting series is synthetic.
    Sampled {
        samples: usize,
        interval: Duration,
    },
}

impl CmcHistoryMode {
    pub const DEFAULT_SAMPLES: usize = 10;

    pub fn sampled_default() -> Self {
        Self::Sampled {
            samples: Self::DEFAULT_SAMPLES,
            interval: Duration::ZERO,
        }
    }
}

impl FromStr for CmcHistoryMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "historical" => Ok(Self::Historical),
            "sampled" => Ok(Self::sampled_default()),
            other => Err(ConfigError::InvalidChoice {
                key: "COINCAST_CMC_HISTORY",
                value: other.to_owned(),
                expected: "historical, sampled",
            }),
        }
    }
}

/// CoinMarketCap adapter (`pro-api.coinmarketcap.com`).
#[derive(Clone)]
pub struct CoinMarketCapAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    policy: ProviderPolicy,
    history_mode: CmcHistoryMode,
}

impl CoinMarketCapAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: ApiKey, policy: ProviderPolicy) -> Self {
        Self {
            http_client,
            auth: HttpAuth::Header {
                name: String::from("X-CMC_PRO_API_KEY"),
                value: api_key.expose().to_owned(),
            },
            policy,
            history_mode: CmcHistoryMode::Historical,
        }
    }

    pub fn with_defaults(http_client: Arc<dyn HttpClient>, api_key: ApiKey) -> Self {
        Self::new(http_client, api_key, ProviderPolicy::coinmarketcap_default())
    }

    pub fn with_history_mode(mut self, history_mode: CmcHistoryMode) -> Self {
        self.history_mode = history_mode;
        self
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest::get(url)
            .with_auth(&self.auth)
            .with_timeout_ms(self.policy.timeout_ms())
    }

    /// Map a response to its parsed body, recognizing CoinMarketCap's
    /// "invalid symbol" 400 as an unknown ticker.
    fn checked_body<T>(&self, symbol: &Symbol, response: HttpResponse) -> Result<T, ForecastError>
    where
        T: serde::de::DeserializeOwned,
    {
        if response.status == 400 {
            let status = serde_json::from_str::<CmcEnvelope>(&response.body)
                .ok()
                .and_then(|envelope| envelope.status.error_message)
                .unwrap_or_default();
            if status.contains("symbol") {
                return Err(ForecastError::symbol_not_found(symbol, self.id()));
            }
        }
        if !response.is_success() {
            return Err(status_unavailable(self.id(), response.status));
        }
        parse_body(self.id(), &response.body)
    }

    async fn fetch_latest_quote(&self, symbol: &Symbol) -> Result<CmcUsdQuote, ForecastError> {
        let request = self
            .request(QUOTES_LATEST_URL)
            .with_query("symbol", symbol.as_str())
            .with_query("convert", QUOTE_CURRENCY);
        let response = send_once(self.http_client.as_ref(), self.id(), request).await?;
        let payload: CmcQuotesLatest = self.checked_body(symbol, response)?;

        payload
            .data
            .get(symbol.as_str())
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.quote.get(QUOTE_CURRENCY))
            .cloned()
            .ok_or_else(|| ForecastError::symbol_not_found(symbol, self.id()))
    }

    async fn fetch_historical(&self, req: &HistoryRequest) -> Result<PriceSeries, ForecastError> {
        debug!(symbol = %req.symbol, lookback_days = req.lookback_days, "coinmarketcap ohlcv");

        let request = self
            .request(OHLCV_HISTORICAL_URL)
            .with_query("symbol", req.symbol.as_str())
            .with_query("convert", QUOTE_CURRENCY)
            .with_query("time_period", "daily")
            .with_query("count", req.lookback_days.to_string());
        let response = send_once(self.http_client.as_ref(), self.id(), request).await?;
        let payload: CmcOhlcvHistorical = self.checked_body(&req.symbol, response)?;

        let quotes = payload
            .data
            .get(req.symbol.as_str())
            .and_then(|entries| entries.first())
            .map(|entry| entry.quotes.as_slice())
            .unwrap_or_default();

        let observations = quotes
            .iter()
            .map(|day| {
                UtcDateTime::parse(&day.time_close)
                    .or_else(|_| UtcDateTime::parse(&day.time_open))
                    .map(|observed_at| {
                        let close = day.quote.get(QUOTE_CURRENCY).and_then(|usd| usd.close);
                        RawObservation::new(observed_at, close)
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ForecastError::internal(format!("coinmarketcap timestamp: {e}")))?;

        PriceSeries::from_observations(
            req.symbol.clone(),
            self.id(),
            SeriesProvenance::Historical,
            observations,
        )
        .require_samples(req.min_samples)
    }

    /// Build a synthetic series from repeated latest-quote reads. The read
    /// count never exceeds `samples`; a request needing more is refused
    /// before any call is made. Any failed read aborts the whole series.
    async fn fetch_sampled(
        &self,
        req: &HistoryRequest,
        samples: usize,
        interval: Duration,
    ) -> Result<PriceSeries, ForecastError> {
        if req.min_samples > samples {
            return Err(ForecastError::insufficient_history(samples, req.min_samples));
        }
        warn!(
            symbol = %req.symbol,
            samples,
            "coinmarketcap history unavailable on this plan; sampling latest quotes"
        );

        let mut observations = Vec::with_capacity(samples);
        for index in 0..samples {
            if index > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            let quote = self.fetch_latest_quote(&req.symbol).await?;
            observations.push(RawObservation::new(UtcDateTime::now(), quote.price));
        }

        PriceSeries::from_observations(
            req.symbol.clone(),
            self.id(),
            SeriesProvenance::SampledSnapshots,
            observations,
        )
        .require_samples(req.min_samples)
    }

    async fn fetch_snapshot(&self, symbol: &Symbol) -> Result<CoinSnapshot, ForecastError> {
        let quote = self.fetch_latest_quote(symbol).await?;

        let mut snapshot = CoinSnapshot::empty(symbol.clone(), self.id());
        snapshot.price = quote.price;
        snapshot.change_pct_1h = quote.percent_change_1h;
        snapshot.change_pct_24h = quote.percent_change_24h;
        snapshot.change_pct_7d = quote.percent_change_7d;
        snapshot.market_cap = quote.market_cap;
        snapshot.volume_24h = quote.volume_24h;
        Ok(snapshot.sanitized())
    }
}

impl PriceSource for CoinMarketCapAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coinmarketcap
    }

    fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn daily_history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move {
            match self.history_mode {
                CmcHistoryMode::Historical => self.fetch_historical(&req).await,
                CmcHistoryMode::Sampled { samples, interval } => {
                    self.fetch_sampled(&req, samples, interval).await
                }
            }
        })
    }

    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, CoinSnapshot> {
        Box::pin(async move { self.fetch_snapshot(&symbol).await })
    }
}

// CoinMarketCap API response structures
#[derive(Debug, Clone, Default, Deserialize)]
struct CmcEnvelope {
    #[serde(default)]
    status: CmcStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CmcStatus {
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcQuotesLatest {
    #[serde(default)]
    data: HashMap<String, Vec<CmcLatestEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcLatestEntry {
    #[serde(default)]
    quote: HashMap<String, CmcUsdQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcUsdQuote {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    volume_24h: Option<f64>,
    #[serde(default)]
    percent_change_1h: Option<f64>,
    #[serde(default)]
    percent_change_24h: Option<f64>,
    #[serde(default)]
    percent_change_7d: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcOhlcvHistorical {
    #[serde(default)]
    data: HashMap<String, Vec<CmcOhlcvEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcOhlcvEntry {
    #[serde(default)]
    quotes: Vec<CmcOhlcvDay>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcOhlcvDay {
    #[serde(default)]
    time_open: String,
    #[serde(default)]
    time_close: String,
    #[serde(default)]
    quote: HashMap<String, CmcOhlcvQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct CmcOhlcvQuote {
    #[serde(default)]
    close: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::ScriptedHttpClient;
    use crate::ForecastErrorKind;

    fn latest_body(symbol: &str, price: f64) -> String {
        format!(
            r#"{{"status":{{"error_code":0,"error_message":null}},"data":{{"{symbol}":[{{"symbol":"{symbol}","quote":{{"USD":{{"price":{price},"volume_24h":1000.0,"percent_change_1h":0.5,"percent_change_24h":-2.0,"percent_change_7d":3.0,"market_cap":5000.0}}}}}}]}}}}"#
        )
    }

    fn ohlcv_body(symbol: &str, closes: &[f64]) -> String {
        let days = closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                format!(
                    r#"{{"time_open":"2024-01-{:02}T00:00:00.000Z","time_close":"2024-01-{:02}T23:59:59.999Z","quote":{{"USD":{{"close":{close}}}}}}}"#,
                    i + 1,
                    i + 1
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        format!(r#"{{"data":{{"{symbol}":[{{"symbol":"{symbol}","quotes":[{days}]}}]}}}}"#)
    }

    #[tokio::test]
    async fn historical_mode_reads_daily_closes_with_key_header() {
        let closes = (0..15).map(|i| 10.0 + i as f64).collect::<Vec<_>>();
        let client = Arc::new(ScriptedHttpClient::new().with_json(ohlcv_body("SOL", &closes)));
        let source = CoinMarketCapAdapter::with_defaults(client.clone(), ApiKey::new("cmc-key"));
        let req = HistoryRequest::new(Symbol::parse("sol").expect("valid"), 30, 10)
            .expect("valid request");

        let series = source.daily_history(req).await.expect("history should load");

        assert_eq!(series.len(), 15);
        assert_eq!(series.provenance(), SeriesProvenance::Historical);
        let recorded = client.recorded_requests();
        assert_eq!(recorded[0].query_value("count"), Some("30"));
        assert_eq!(
            recorded[0].headers.get("x-cmc_pro_api_key").map(String::as_str),
            Some("cmc-key")
        );
    }

    #[tokio::test]
    async fn sampled_mode_reads_latest_quote_once_per_sample() {
        let mut client = ScriptedHttpClient::new();
        for i in 0..10 {
            client = client.with_json(latest_body("BTC", 100.0 + i as f64));
        }
        let client = Arc::new(client);
        let source = CoinMarketCapAdapter::with_defaults(client.clone(), ApiKey::new("k"))
            .with_history_mode(CmcHistoryMode::sampled_default());
        let req = HistoryRequest::new(Symbol::parse("BTC").expect("valid"), 30, 10)
            .expect("valid request");

        let series = source.daily_history(req).await.expect("sampled series");

        assert_eq!(series.len(), 10);
        assert_eq!(series.provenance(), SeriesProvenance::SampledSnapshots);
        assert_eq!(client.call_count(), 10);
    }

    #[tokio::test]
    async fn sampled_mode_refuses_requests_larger_than_the_sample_cap() {
        let client = Arc::new(ScriptedHttpClient::new().with_json(latest_body("BTC", 100.0)));
        let source = CoinMarketCapAdapter::with_defaults(client.clone(), ApiKey::new("k"))
            .with_history_mode(CmcHistoryMode::sampled_default());
        let req = HistoryRequest::new(Symbol::parse("BTC").expect("valid"), 30, 25)
            .expect("valid request");

        let err = source.daily_history(req).await.expect_err("must fail");

        assert_eq!(err.kind(), ForecastErrorKind::InsufficientHistory);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn sampled_mode_reads_at_most_the_cap_for_small_requests() {
        let mut client = ScriptedHttpClient::new();
        for i in 0..CmcHistoryMode::DEFAULT_SAMPLES {
            client = client.with_json(latest_body("BTC", 100.0 + i as f64));
        }
        let client = Arc::new(client);
        let source = CoinMarketCapAdapter::with_defaults(client.clone(), ApiKey::new("k"))
            .with_history_mode(CmcHistoryMode::sampled_default());
        let req = HistoryRequest::new(Symbol::parse("BTC").expect("valid"), 365, 1)
            .expect("valid request");

        let series = source.daily_history(req).await.expect("sampled series");

        assert_eq!(series.len(), CmcHistoryMode::DEFAULT_SAMPLES);
        assert_eq!(client.call_count(), CmcHistoryMode::DEFAULT_SAMPLES);
    }

    #[tokio::test]
    async fn invalid_symbol_status_is_symbol_not_found() {
        let body = r#"{"status":{"error_code":400,"error_message":"Invalid value for \"symbol\": \"ZZZQ\""}}"#;
        let client = Arc::new(ScriptedHttpClient::new().with_status(400, body));
        let source = CoinMarketCapAdapter::with_defaults(client, ApiKey::new("k"));

        let err = source
            .snapshot(Symbol::parse("ZZZQ").expect("valid"))
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::SymbolNotFound);
    }

    #[tokio::test]
    async fn unauthorized_status_is_unavailable() {
        let body = r#"{"status":{"error_code":1002,"error_message":"API key missing."}}"#;
        let client = Arc::new(ScriptedHttpClient::new().with_status(401, body));
        let source = CoinMarketCapAdapter::with_defaults(client, ApiKey::new("k"));

        let err = source
            .snapshot(Symbol::parse("BTC").expect("valid"))
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn snapshot_has_no_high_low_figures() {
        let client = Arc::new(ScriptedHttpClient::new().with_json(latest_body("ETH", 2500.0)));
        let source = CoinMarketCapAdapter::with_defaults(client, ApiKey::new("k"));

        let snapshot = source
            .snapshot(Symbol::parse("ETH").expect("valid"))
            .await
            .expect("snapshot should load");

        assert_eq!(snapshot.price, Some(2500.0));
        assert_eq!(snapshot.change_pct_7d, Some(3.0));
        assert_eq!(snapshot.high_24h, None);
        assert_eq!(snapshot.low_24h, None);
    }

    #[test]
    fn parses_history_mode_names() {
        assert_eq!(
            "Historical".parse::<CmcHistoryMode>().expect("valid"),
            CmcHistoryMode::Historical
        );
        assert!(matches!(
            "sampled".parse::<CmcHistoryMode>().expect("valid"),
            CmcHistoryMode::Sampled { samples: 10, .. }
        ));
        assert!("weekly".parse::<CmcHistoryMode>().is_err());
    }
}
