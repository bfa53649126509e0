//! Request validation: symbol normalization and horizon resolution.
//!
//! Pure functions of `(today, raw inputs, ceiling)`. Nothing here touches
//! the network, so every failure is reported before an upstream call.

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Duration};

use crate::{ForecastError, Symbol};

/// Caller-supplied forecast target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSpec {
    /// Absolute calendar date, `YYYY-MM-DD`.
    Date(String),
    /// Whole days after today.
    Horizon(i64),
}

impl TargetSpec {
    /// Build from the optional request fields; exactly one must be present.
    pub fn from_parts(
        target_date: Option<&str>,
        days_ahead: Option<i64>,
    ) -> Result<Self, ForecastError> {
        match (target_date, days_ahead) {
            (Some(date), None) => Ok(Self::Date(date.to_owned())),
            (None, Some(days)) => Ok(Self::Horizon(days)),
            (Some(_), Some(_)) => Err(ForecastError::invalid_request(
                "provide either target_date or days_ahead, not both",
            )),
            (None, None) => Err(ForecastError::invalid_request(
                "request must include target_date (YYYY-MM-DD) or days_ahead",
            )),
        }
    }
}

/// Unvalidated prediction request as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub symbol: String,
    pub target: TargetSpec,
}

impl PredictionRequest {
    pub fn new(symbol: impl Into<String>, target: TargetSpec) -> Self {
        Self {
            symbol: symbol.into(),
            target,
        }
    }
}

/// A request whose symbol and horizon passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub symbol: Symbol,
    pub horizon_days: u32,
    pub target_date: Date,
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_target_date(raw: &str) -> Result<Date, ForecastError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ForecastError::invalid_date_format(raw))
}

/// Validate a prediction request against `today` and the active
/// provider's horizon ceiling.
pub fn validate(
    today: Date,
    request: &PredictionRequest,
    ceiling_days: u32,
) -> Result<ValidatedRequest, ForecastError> {
    let symbol = Symbol::parse(&request.symbol)?;

    let horizon = match &request.target {
        TargetSpec::Date(raw) => (parse_target_date(raw)? - today).whole_days(),
        TargetSpec::Horizon(days) => *days,
    };

    if horizon < 1 || horizon > i64::from(ceiling_days) {
        return Err(ForecastError::horizon_out_of_range(horizon, ceiling_days));
    }

    let target_date = today
        .checked_add(Duration::days(horizon))
        .ok_or_else(|| ForecastError::horizon_out_of_range(horizon, ceiling_days))?;

    Ok(ValidatedRequest {
        symbol,
        horizon_days: horizon as u32,
        target_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForecastErrorKind;
    use time::macros::date;

    const TODAY: Date = date!(2025 - 03 - 10);

    fn date_request(symbol: &str, raw: &str) -> PredictionRequest {
        PredictionRequest::new(symbol, TargetSpec::Date(raw.to_owned()))
    }

    #[test]
    fn resolves_date_to_horizon_and_uppercases_symbol() {
        let validated = validate(TODAY, &date_request("eth", "2025-03-15"), 30).expect("valid");

        assert_eq!(validated.symbol.as_str(), "ETH");
        assert_eq!(validated.horizon_days, 5);
        assert_eq!(validated.target_date, date!(2025 - 03 - 15));
    }

    #[test]
    fn resolves_relative_horizon_to_date() {
        let request = PredictionRequest::new("BTC", TargetSpec::Horizon(30));
        let validated = validate(TODAY, &request, 30).expect("valid");

        assert_eq!(validated.target_date, date!(2025 - 04 - 09));
    }

    #[test]
    fn rejects_malformed_and_impossible_dates() {
        for raw in ["03/15/2025", "2025-02-30", "tomorrow", ""] {
            let err = validate(TODAY, &date_request("BTC", raw), 30).expect_err(raw);
            assert_eq!(err.kind(), ForecastErrorKind::InvalidDateFormat, "{raw}");
        }
    }

    #[test]
    fn rejects_today_past_and_beyond_ceiling() {
        for raw in ["2025-03-10", "2025-01-01", "2025-04-10"] {
            let err = validate(TODAY, &date_request("BTC", raw), 30).expect_err(raw);
            assert_eq!(err.kind(), ForecastErrorKind::HorizonOutOfRange, "{raw}");
        }
    }

    #[test]
    fn ceiling_is_per_provider() {
        let request = PredictionRequest::new("BTC", TargetSpec::Horizon(200));

        assert!(validate(TODAY, &request, 30).is_err());
        assert_eq!(validate(TODAY, &request, 365).expect("valid").horizon_days, 200);
    }

    #[test]
    fn invalid_symbol_is_invalid_request() {
        let err = validate(TODAY, &date_request("  ", "2025-03-11"), 30).expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::InvalidRequest);
    }

    #[test]
    fn target_spec_requires_exactly_one_field() {
        assert!(TargetSpec::from_parts(None, None).is_err());
        assert!(TargetSpec::from_parts(Some("2025-03-11"), Some(1)).is_err());
        assert_eq!(
            TargetSpec::from_parts(None, Some(3)).expect("valid"),
            TargetSpec::Horizon(3)
        );
    }
}
