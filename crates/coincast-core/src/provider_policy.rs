use std::time::Duration;

use crate::ProviderId;

/// Default upstream timeout applied when configuration does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8_000);

/// Per-provider limits for history windows and forecast horizons.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    /// Days of daily history requested for a forecast.
    pub lookback_days: u32,
    /// Furthest horizon a forecast may target.
    pub horizon_ceiling_days: u32,
    /// Largest window the raw history endpoint accepts.
    pub max_history_days: u32,
    pub request_timeout: Duration,
}

impl ProviderPolicy {
    pub fn cryptocompare_default() -> Self {
        Self {
            provider_id: ProviderId::Cryptocompare,
            lookback_days: 30,
            horizon_ceiling_days: 30,
            max_history_days: 2_000,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn coingecko_default() -> Self {
        Self {
            provider_id: ProviderId::Coingecko,
            lookback_days: 365,
            horizon_ceiling_days: 365,
            max_history_days: 365,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn coinmarketcap_default() -> Self {
        Self {
            provider_id: ProviderId::Coinmarketcap,
            lookback_days: 30,
            horizon_ceiling_days: 30,
            max_history_days: 365,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Cryptocompare => Self::cryptocompare_default(),
            ProviderId::Coingecko => Self::coingecko_default(),
            ProviderId::Coinmarketcap => Self::coinmarketcap_default(),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
