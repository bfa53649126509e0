use std::collections::HashMap;
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

const HISTODAY_URL: &str = "https://min-api.cryptocompare.com/data/v2/histoday";
const PRICE_MULTI_FULL_URL: &str = "https://min-api.cryptocompare.com/data/pricemultifull";
const QUOTE_CURRENCY: &str = "USD";

/// CryptoCompare adapter (`min-api.cryptocompare.com`).
#[derive(Clone)]
pub struct CryptoCompareAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    policy: ProviderPolicy,
}

impl CryptoCompareAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<ApiKey>,
        policy: ProviderPolicy,
    ) -> Self {
        let auth = match api_key {
            Some(key) => HttpAuth::Header {
                name: String::from("authorization"),
                value: format!("Apikey {}", key.expose()),
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
        Self::new(http_client, api_key, ProviderPolicy::cryptocompare_default())
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest::get(url)
            .with_auth(&self.auth)
            .with_timeout_ms(self.policy.timeout_ms())
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<PriceSeries, ForecastError> {
        debug!(symbol = %req.symbol, lookback_days = req.lookback_days, "cryptocompare histoday");

        let request = self
            .request(HISTODAY_URL)
            .with_query("fsym", req.symbol.as_str())
            .with_query("tsym", QUOTE_CURRENCY)
            .with_query("limit", req.lookback_days.to_string());
        let response = send_once(self.http_client.as_ref(), self.id(), request).await?;
        if !response.is_success() {
            return Err(status_unavailable(self.id(), response.status));
        }

        let payload: CcHistoryResponse = parse_body(self.id(), &response.body)?;
        self.check_envelope(&req.symbol, &payload.status)?;

        let observations = payload
            .data
            .data
            .into_iter()
            .map(|day| {
                UtcDateTime::from_unix_seconds(day.time)
                    .map(|observed_at| RawObservation::new(observed_at, day.close))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ForecastError::internal(format!("cryptocompare timestamp: {e}")))?;

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
            .request(PRICE_MULTI_FULL_URL)
            .with_query("fsyms", symbol.as_str())
            .with_query("tsyms", QUOTE_CURRENCY);
        let response = send_once(self.http_client.as_ref(), self.id(), request).await?;
        if !response.is_success() {
            return Err(status_unavailable(self.id(), response.status));
        }

        let payload: CcPriceMultiFullResponse = parse_body(self.id(), &response.body)?;
        self.check_envelope(symbol, &payload.status)?;

        let raw = payload
            .raw
            .get(symbol.as_str())
            .and_then(|quotes| quotes.get(QUOTE_CURRENCY))
            .ok_or_else(|| ForecastError::symbol_not_found(symbol, self.id()))?;

        let mut snapshot = CoinSnapshot::empty(symbol.clone(), self.id());
        snapshot.price = raw.price;
        snapshot.high_24h = raw.high_24h;
        snapshot.low_24h = raw.low_24h;
        snapshot.change_pct_1h = raw.change_pct_hour;
        snapshot.change_pct_24h = raw.change_pct_24h;
        snapshot.market_cap = raw.market_cap;
        snapshot.volume_24h = raw.total_volume_24h_to;
        Ok(snapshot.sanitized())
    }

    /// CryptoCompare reports errors inside a 200 body.
    fn check_envelope(&self, symbol: &Symbol, status: &CcStatus) -> Result<(), ForecastError> {
        if status.response.as_deref() != Some("Error") {
            return Ok(());
        }

        let unknown_pair = status.param_with_error.as_deref() == Some("fsym")
            || status.param_with_error.as_deref() == Some("fsyms")
            || status.message.contains("does not exist");
        if unknown_pair {
            return Err(ForecastError::symbol_not_found(symbol, self.id()));
        }

        Err(ForecastError::upstream_unavailable(format!(
            "CryptoCompare error: {}",
            status.message
        )))
    }
}

impl PriceSource for CryptoCompareAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Cryptocompare
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

// CryptoCompare API response structures
#[derive(Debug, Clone, Default, Deserialize)]
struct CcStatus {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "ParamWithError", default)]
    param_with_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CcHistoryResponse {
    #[serde(flatten)]
    status: CcStatus,
    #[serde(rename = "Data", default)]
    data: CcHistoryData,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CcHistoryData {
    #[serde(rename = "Data", default)]
    data: Vec<CcDay>,
}

#[derive(Debug, Clone, Deserialize)]
struct CcDay {
    time: i64,
    #[serde(default)]
    close: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct CcPriceMultiFullResponse {
    #[serde(flatten)]
    status: CcStatus,
    #[serde(rename = "RAW", default)]
    raw: HashMap<String, HashMap<String, CcRawQuote>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CcRawQuote {
    #[serde(rename = "PRICE", default)]
    price: Option<f64>,
    #[serde(rename = "HIGH24HOUR", default)]
    high_24h: Option<f64>,
    #[serde(rename = "LOW24HOUR", default)]
    low_24h: Option<f64>,
    #[serde(rename = "CHANGEPCTHOUR", default)]
    change_pct_hour: Option<f64>,
    #[serde(rename = "CHANGEPCT24HOUR", default)]
    change_pct_24h: Option<f64>,
    #[serde(rename = "MKTCAP", default)]
    market_cap: Option<f64>,
    #[serde(rename = "TOTALVOLUME24HTO", default)]
    total_volume_24h_to: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::ScriptedHttpClient;
    use crate::ForecastErrorKind;

    fn histoday_body(closes: &[Option<f64>]) -> String {
        let days = closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let close = close.map_or(String::from("null"), |c| c.to_string());
                format!("{{\"time\":{},\"close\":{close}}}", 1_700_000_000 + i * 86_400)
            })
            .collect::<Vec<_>>()
            .join(",");
        format!("{{\"Response\":\"Success\",\"Message\":\"\",\"Data\":{{\"Data\":[{days}]}}}}")
    }

    fn adapter(client: Arc<ScriptedHttpClient>, key: Option<&str>) -> CryptoCompareAdapter {
        CryptoCompareAdapter::with_defaults(client, key.map(ApiKey::new))
    }

    #[tokio::test]
    async fn history_request_carries_symbol_window_and_apikey_header() {
        let closes = (0..31).map(|i| Some(100.0 + i as f64)).collect::<Vec<_>>();
        let client = Arc::new(ScriptedHttpClient::new().with_json(histoday_body(&closes)));
        let source = adapter(Arc::clone(&client), Some("cc-key"));
        let req = HistoryRequest::new(Symbol::parse("btc").expect("valid"), 30, 10)
            .expect("valid request");

        let series = source.daily_history(req).await.expect("history should load");
        assert_eq!(series.len(), 31);

        let recorded = client.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].query_value("fsym"), Some("BTC"));
        assert_eq!(recorded[0].query_value("tsym"), Some("USD"));
        assert_eq!(recorded[0].query_value("limit"), Some("30"));
        assert_eq!(
            recorded[0].headers.get("authorization").map(String::as_str),
            Some("Apikey cc-key")
        );
    }

    #[tokio::test]
    async fn unknown_pair_maps_to_symbol_not_found() {
        let body = r#"{"Response":"Error","Message":"cccagg_or_exchange market does not exist for this coin pair (ZZZQ-USD)","Type":2,"Data":{},"ParamWithError":"fsym"}"#;
        let client = Arc::new(ScriptedHttpClient::new().with_json(body));
        let source = adapter(client, None);
        let req = HistoryRequest::new(Symbol::parse("ZZZQ").expect("valid"), 30, 10)
            .expect("valid request");

        let err = source.daily_history(req).await.expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::SymbolNotFound);
    }

    #[tokio::test]
    async fn rate_limit_envelope_is_unavailable_not_unknown_symbol() {
        let body = r#"{"Response":"Error","Message":"You are over your rate limit please upgrade your account!","Type":99,"Data":{}}"#;
        let client = Arc::new(ScriptedHttpClient::new().with_json(body));
        let source = adapter(client, None);
        let req = HistoryRequest::new(Symbol::parse("BTC").expect("valid"), 30, 10)
            .expect("valid request");

        let err = source.daily_history(req).await.expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::UpstreamUnavailable);
        assert!(err.message().contains("rate limit"));
    }

    #[tokio::test]
    async fn snapshot_maps_raw_fields_and_leaves_missing_ones_empty() {
        let body = r#"{"RAW":{"ETH":{"USD":{"PRICE":3000.5,"HIGH24HOUR":3100.0,"LOW24HOUR":2900.0,"CHANGEPCTHOUR":-0.4,"CHANGEPCT24HOUR":1.2,"MKTCAP":360000000000.0}}}}"#;
        let client = Arc::new(ScriptedHttpClient::new().with_json(body));
        let source = adapter(client, None);

        let snapshot = source
            .snapshot(Symbol::parse("eth").expect("valid"))
            .await
            .expect("snapshot should load");

        assert_eq!(snapshot.price, Some(3000.5));
        assert_eq!(snapshot.change_pct_1h, Some(-0.4));
        assert_eq!(snapshot.volume_24h, None);
        assert_eq!(snapshot.change_pct_7d, None);
    }

    #[tokio::test]
    async fn snapshot_without_raw_entry_is_symbol_not_found() {
        let client = Arc::new(ScriptedHttpClient::new().with_json(r#"{"RAW":{}}"#));
        let source = adapter(client, None);

        let err = source
            .snapshot(Symbol::parse("NOPE").expect("valid"))
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::SymbolNotFound);
    }
}
