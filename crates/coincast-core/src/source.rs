use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in configuration, notes and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Cryptocompare,
    Coingecko,
    Coinmarketcap,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Cryptocompare, Self::Coingecko, Self::Coinmarketcap];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cryptocompare => "cryptocompare",
            Self::Coingecko => "coingecko",
            Self::Coinmarketcap => "coinmarketcap",
        }
    }

    /// Human-facing provider name used in provenance notes.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cryptocompare => "CryptoCompare",
            Self::Coingecko => "CoinGecko",
            Self::Coinmarketcap => "CoinMarketCap",
        }
    }

    /// Environment variable holding this provider's API key.
    pub const fn api_key_var(self) -> &'static str {
        match self {
            Self::Cryptocompare => "COINCAST_CRYPTOCOMPARE_API_KEY",
            Self::Coingecko => "COINCAST_COINGECKO_API_KEY",
            Self::Coinmarketcap => "COINCAST_COINMARKETCAP_API_KEY",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cryptocompare" => Ok(Self::Cryptocompare),
            "coingecko" => Ok(Self::Coingecko),
            "coinmarketcap" | "cmc" => Ok(Self::Coinmarketcap),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names_case_insensitively() {
        assert_eq!(
            "CoinGecko".parse::<ProviderId>().expect("valid provider"),
            ProviderId::Coingecko
        );
        assert_eq!(
            "cmc".parse::<ProviderId>().expect("alias"),
            ProviderId::Coinmarketcap
        );
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = "binance".parse::<ProviderId>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidSource { .. }));
    }
}
