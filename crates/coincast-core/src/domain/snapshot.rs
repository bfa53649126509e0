use serde::{Deserialize, Serialize};

use crate::{ProviderId, Symbol, UtcDateTime};

/// Current market snapshot for one coin, quoted in USD.
///
/// Every figure is optional: providers differ in what they report and a
/// missing field is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    pub symbol: Symbol,
    pub provider: ProviderId,
    pub as_of: UtcDateTime,
    pub price: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub change_pct_1h: Option<f64>,
    pub change_pct_24h: Option<f64>,
    pub change_pct_7d: Option<f64>,
    pub change_pct_1y: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
}

impl CoinSnapshot {
    pub fn empty(symbol: Symbol, provider: ProviderId) -> Self {
        Self {
            symbol,
            provider,
            as_of: UtcDateTime::now(),
            price: None,
            high_24h: None,
            low_24h: None,
            change_pct_1h: None,
            change_pct_24h: None,
            change_pct_7d: None,
            change_pct_1y: None,
            market_cap: None,
            volume_24h: None,
        }
    }

    /// Replace non-finite upstream numbers with `None`.
    pub fn sanitized(mut self) -> Self {
        for field in [
            &mut self.price,
            &mut self.high_24h,
            &mut self.low_24h,
            &mut self.change_pct_1h,
            &mut self.change_pct_24h,
            &mut self.change_pct_7d,
            &mut self.change_pct_1y,
            &mut self.market_cap,
            &mut self.volume_24h,
        ] {
            *field = field.filter(|value| value.is_finite());
        }
        self
    }
}
