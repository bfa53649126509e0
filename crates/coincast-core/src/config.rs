//! Process-wide configuration, read once at startup.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `COINCAST_PROVIDER` | `cryptocompare` | Active price source |
//! | `COINCAST_<PROVIDER>_API_KEY` | unset | Credential for the active source |
//! | `COINCAST_TIMEOUT_MS` | `8000` | Upstream timeout, 1000..=10000 |
//! | `COINCAST_MIN_SAMPLES` | `10` | Minimum samples before forecasting |
//! | `COINCAST_CMC_HISTORY` | `historical` | CoinMarketCap history mode |

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use crate::adapters::CmcHistoryMode;
use crate::{ConfigError, ProviderId, ProviderPolicy};

pub const DEFAULT_MIN_SAMPLES: usize = 10;
const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Provider credential. `Debug` output is redacted so the value never
/// reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub provider: ProviderId,
    pub api_key: Option<ApiKey>,
    pub timeout: Duration,
    pub min_samples: usize,
    pub cmc_history_mode: CmcHistoryMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::Cryptocompare,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            min_samples: DEFAULT_MIN_SAMPLES,
            cmc_history_mode: CmcHistoryMode::Historical,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let provider = match get("COINCAST_PROVIDER") {
            Some(value) => value.parse::<ProviderId>()?,
            None => ProviderId::Cryptocompare,
        };

        let timeout_ms = match get("COINCAST_TIMEOUT_MS") {
            Some(value) => parse_bounded("COINCAST_TIMEOUT_MS", &value, MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let cmc_history_mode = match get("COINCAST_CMC_HISTORY") {
            Some(value) => value.parse::<CmcHistoryMode>()?,
            None => CmcHistoryMode::Historical,
        };

        let max_samples = deliverable_samples(provider, cmc_history_mode) as u64;
        let min_samples = match get("COINCAST_MIN_SAMPLES") {
            Some(value) => parse_bounded("COINCAST_MIN_SAMPLES", &value, 2, max_samples)? as usize,
            None => DEFAULT_MIN_SAMPLES,
        };

        Ok(Self {
            provider,
            api_key: get(provider.api_key_var()).map(ApiKey::new),
            timeout: Duration::from_millis(timeout_ms),
            min_samples,
            cmc_history_mode,
        })
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(api_key));
        self
    }

    /// Override the upstream timeout, clamped to the supported bounds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS));
        self
    }

    pub fn policy(&self) -> ProviderPolicy {
        ProviderPolicy::default_for(self.provider).with_timeout(self.timeout)
    }
}

/// Most samples one history read from `provider` can yield.
fn deliverable_samples(provider: ProviderId, cmc_history_mode: CmcHistoryMode) -> usize {
    match (provider, cmc_history_mode) {
        (ProviderId::Coinmarketcap, CmcHistoryMode::Sampled { samples, .. }) => samples,
        _ => ProviderPolicy::default_for(provider).lookback_days as usize + 1,
    }
}

fn parse_bounded(key: &'static str, value: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let parsed = value.parse::<u64>().map_err(|_| ConfigError::NotAnInteger {
        key,
        value: value.to_owned(),
    })?;
    if !(min..=max).contains(&parsed) {
        return Err(ConfigError::OutOfRange {
            key,
            value: parsed,
            min,
            max,
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_cryptocompare_without_key() {
        let config = AppConfig::from_lookup(lookup(&[])).expect("defaults are valid");

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.policy().horizon_ceiling_days, 30);
    }

    #[test]
    fn reads_only_the_active_providers_key() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COINCAST_PROVIDER", "coingecko"),
            ("COINCAST_CRYPTOCOMPARE_API_KEY", "cc"),
            ("COINCAST_COINGECKO_API_KEY", "cg"),
            ("COINCAST_TIMEOUT_MS", "5000"),
        ]))
        .expect("valid config");

        assert_eq!(config.provider, ProviderId::Coingecko);
        assert_eq!(config.api_key.as_ref().map(ApiKey::expose), Some("cg"));
        assert_eq!(config.policy().request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_unbounded_timeout() {
        let err = AppConfig::from_lookup(lookup(&[("COINCAST_TIMEOUT_MS", "60000")]))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::OutOfRange { key: "COINCAST_TIMEOUT_MS", .. }));
    }

    #[test]
    fn rejects_non_numeric_min_samples() {
        let err = AppConfig::from_lookup(lookup(&[("COINCAST_MIN_SAMPLES", "ten")]))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::NotAnInteger { .. }));
    }

    #[test]
    fn min_samples_beyond_the_provider_lookback_fails_at_load() {
        let err = AppConfig::from_lookup(lookup(&[("COINCAST_MIN_SAMPLES", "100")]))
            .expect_err("cryptocompare reads 31 days at most");
        assert!(matches!(
            err,
            ConfigError::OutOfRange { key: "COINCAST_MIN_SAMPLES", value: 100, max: 31, .. }
        ));

        let config = AppConfig::from_lookup(lookup(&[
            ("COINCAST_PROVIDER", "coingecko"),
            ("COINCAST_MIN_SAMPLES", "100"),
        ]))
        .expect("coingecko reads a year");
        assert_eq!(config.min_samples, 100);
    }

    #[test]
    fn sampled_mode_bounds_min_samples_by_the_sample_cap() {
        let err = AppConfig::from_lookup(lookup(&[
            ("COINCAST_PROVIDER", "coinmarketcap"),
            ("COINCAST_CMC_HISTORY", "sampled"),
            ("COINCAST_MIN_SAMPLES", "20"),
        ]))
        .expect_err("sampled mode reads ten quotes");
        assert!(matches!(err, ConfigError::OutOfRange { max: 10, .. }));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let config = AppConfig::default().with_api_key("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"), "{debug}");
    }
}
