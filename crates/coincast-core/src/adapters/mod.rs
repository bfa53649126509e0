//! Provider adapters implementing [`PriceSource`].
//!
//! Every adapter shares the same transport discipline: one request per
//! operation, the policy timeout on every request, and no retry.

mod coingecko;
mod coinmarketcap;
mod cryptocompare;

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use coingecko::CoinGeckoAdapter;
pub use coinmarketcap::{CmcHistoryMode, CoinMarketCapAdapter};
pub use cryptocompare::CryptoCompareAdapter;

use crate::config::AppConfig;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::{ConfigError, ForecastError, PriceSource, ProviderId};

/// Build the adapter selected by configuration.
pub fn build_source(
    config: &AppConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn PriceSource>, ConfigError> {
    let policy = config.policy();
    let api_key = config.api_key.clone();

    let source: Arc<dyn PriceSource> = match config.provider {
        ProviderId::Cryptocompare => {
            Arc::new(CryptoCompareAdapter::new(http_client, api_key, policy))
        }
        ProviderId::Coingecko => Arc::new(CoinGeckoAdapter::new(http_client, api_key, policy)),
        ProviderId::Coinmarketcap => {
            let api_key = api_key.ok_or(ConfigError::MissingApiKey {
                key: ProviderId::Coinmarketcap.api_key_var(),
                provider: ProviderId::Coinmarketcap.display_name(),
            })?;
            Arc::new(
                CoinMarketCapAdapter::new(http_client, api_key, policy)
                    .with_history_mode(config.cmc_history_mode),
            )
        }
    };
    Ok(source)
}

/// Execute a single upstream request. Transport failures, including
/// timeouts, become `UpstreamUnavailable`; status handling is left to the
/// caller because some providers signal unknown symbols via status codes.
async fn send_once(
    http_client: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<HttpResponse, ForecastError> {
    let started = Instant::now();
    let url = request.url.clone();

    let response = http_client.execute(request).await.map_err(|error| {
        warn!(%provider, %url, timed_out = error.timed_out(), "upstream transport failure");
        if error.timed_out() {
            ForecastError::upstream_unavailable(format!(
                "{} request timed out: {}",
                provider.display_name(),
                error.message()
            ))
        } else {
            ForecastError::upstream_unavailable(format!(
                "{} transport error: {}",
                provider.display_name(),
                error.message()
            ))
        }
    })?;

    debug!(
        %provider,
        %url,
        status = response.status,
        latency_ms = started.elapsed().as_millis() as u64,
        "upstream responded"
    );
    Ok(response)
}

fn status_unavailable(provider: ProviderId, status: u16) -> ForecastError {
    warn!(%provider, status, "upstream returned non-success status");
    ForecastError::upstream_unavailable(format!(
        "{} returned status {status}",
        provider.display_name()
    ))
}

fn parse_body<T: DeserializeOwned>(provider: ProviderId, body: &str) -> Result<T, ForecastError> {
    serde_json::from_str(body).map_err(|e| {
        ForecastError::internal(format!(
            "failed to parse {} response: {e}",
            provider.display_name()
        ))
    })
}
