use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{parse_body, send_once, status_unavailable};
use crate::config::ApiKey;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::price_source::{HistoryRequest, PriceSource, SourceFuture};
use crate::{
    CoinSnapshot, ForecastError, PriceSeries, ProviderId, ProviderPolicy, RawObservation,
    SeriesProvenance, Symbol, UtcDateTime,
};

const API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Tickers whose CoinGecko id is not simply the lower-cased ticker.
const COIN_IDS: &[(&str, &str)] = &[
    ("ADA", "cardano"),
    ("ATOM", "cosmos"),
    ("AVAX", "avalanche-2"),
    ("BCH", "bitcoin-cash"),
    ("BNB", "binancecoin"),
    ("BTC", "bitcoin"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("ETC", "ethereum-classic"),
    ("ETH", "ethereum"),
    ("LINK", "chainlink"),
    ("LTC", "litecoin"),
    ("MATIC", "matic-network"),
    ("SHIB", "shiba-inu"),
    ("SOL", "solana"),
    ("TRX", "tron"),
    ("UNI", "uniswap"),
    ("USDC", "usd-coin"),
    ("USDT", "tether"),
    ("XLM", "stellar"),
    ("XMR", "monero"),
    ("XRP", "ripple"),
];

/// CoinGecko adapter (`api.coingecko.com`, public or demo tier).
#[derive(Clone)]
pub struct CoinGeckoAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    policy: ProviderPolicy,
}

impl CoinGeckoAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<ApiKey>,
        policy: ProviderPolicy,
    ) -> Self {
        let auth = match api_key {
            Some(key) => HttpAuth::Header {
                name: String::from("x-cg-demo-api-key"),
                value: key.expose().to_owned(),
            },
            None => HttpAuth::None,
        };
        Self {
            http_client,
            auth,
            policy,
        }
    }

    pub fn with_defaults(http_client: Arc<dyn HttpClient>, api_key: Option<ApiKey>) -> Self {
        Self::new(http_client, api_key, ProviderPolicy::coingecko_default())
    }

    fn request(&self, path: &str) -> HttpRequest {
        HttpRequest::get(format!("{API_BASE}{path}"))
            .with_auth(&self.auth)
            .with_timeout_ms(self.policy.timeout_ms())
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<PriceSeries, ForecastError> {
        let coin_id = coin_id(&req.symbol);
        debug!(symbol = %req.symbol, %coin_id, lookback_days = req.lookback_days, "coingecko market_chart");

        let request = self
            .request(&format!(
                "/coins/{}/market_chart",
                urlencoding::encode(&coin_id)
            ))
            .with_query("vs_currency", "usd")
            .with_query("days", req.lookback_days.to_string())
            .with_query("interval", "daily");
        let response = send_once(self.http_client.as_ref(), self.id(), request).await?;
        if response.status == 404 {
            return Err(ForecastError::symbol_not_found(&req.symbol, self.id()));
        }
        if !response.is_success() {
            return Err(status_unavailable(self.id(), response.status));
        }

        let payload: GeckoMarketChart = parse_body(self.id(), &response.body)?;
        if payload.error.is_some() {
            return Err(ForecastError::symbol_not_found(&req.symbol, self.id()));
        }

        let observations = payload
            .prices
            .into_iter()
            .map(|(millis, price)| {
                UtcDateTime::from_unix_millis(millis as i64)
                    .map(|observed_at| RawObservation::new(observed_at, price))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ForecastError::internal(format!("coingecko timestamp: {e}")))?;

        PriceSeries::from_observations(
            req.symbol.clone(),
            self.id(),
            SeriesProvenance::Historical,
            observations,
        )
        .require_samples(req.min_samples)
    }

    async fn fetch_snapshot(&self, symbol: &Symbol) -> Result<CoinSnapshot, ForecastError> {
        let request = self
            .request("/coins/markets")
            .with_query("vs_currency", "usd")
            .with_query("ids", coin_id(symbol))
            .with_query("price_change_percentage", "1h,24h,7d,1y");
        let response = send_once(self.http_client.as_ref(), self.id(), request).await?;
        if response.status == 404 {
            return Err(ForecastError::symbol_not_found(symbol, self.id()));
        }
        if !response.is_success() {
            return Err(status_unavailable(self.id(), response.status));
        }

        let markets: Vec<GeckoMarket> = parse_body(self.id(), &response.body)?;
        let market = markets
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::symbol_not_found(symbol, self.id()))?;

        let mut snapshot = CoinSnapshot::empty(symbol.clone(), self.id());
        snapshot.price = market.current_price;
        snapshot.high_24h = market.high_24h;
        snapshot.low_24h = market.low_24h;
        snapshot.change_pct_1h = market.change_pct_1h;
        snapshot.change_pct_24h = market.change_pct_24h;
        snapshot.change_pct_7d = market.change_pct_7d;
        snapshot.change_pct_1y = market.change_pct_1y;
        snapshot.market_cap = market.market_cap;
        snapshot.volume_24h = market.total_volume;
        Ok(snapshot.sanitized())
    }
}

impl PriceSource for CoinGeckoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coingecko
    }

    fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn daily_history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move { self.fetch_history(&req).await })
    }

    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, CoinSnapshot> {
        Box::pin(async move { self.fetch_snapshot(&symbol).await })
    }
}

/// Resolve a ticker to a CoinGecko coin id.
fn coin_id(symbol: &Symbol) -> String {
    COIN_IDS
        .iter()
        .find(|(ticker, _)| *ticker == symbol.as_str())
        .map_or_else(|| symbol.as_str().to_ascii_lowercase(), |(_, id)| (*id).to_owned())
}

// CoinGecko API response structures
#[derive(Debug, Clone, Deserialize)]
struct GeckoMarketChart {
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeckoMarket {
    #[serde(default)]
    current_price: Option<f64>,
    #[serde(default)]
    high_24h: Option<f64>,
    #[serde(default)]
    low_24h: Option<f64>,
    #[serde(rename = "price_change_percentage_1h_in_currency", default)]
    change_pct_1h: Option<f64>,
    #[serde(rename = "price_change_percentage_24h_in_currency", default)]
    change_pct_24h: Option<f64>,
    #[serde(rename = "price_change_percentage_7d_in_currency", default)]
    change_pct_7d: Option<f64>,
    #[serde(rename = "price_change_percentage_1y_in_currency", default)]
    change_pct_1y: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    total_volume: Option<f64>,
}
