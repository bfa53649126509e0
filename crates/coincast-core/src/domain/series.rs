use serde::{Deserialize, Serialize};

use crate::{ForecastError, ProviderId, Symbol, UtcDateTime};

/// Where the samples of a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesProvenance {
    /// True daily closing prices from a history endpoint.
    Historical,
    /// Repeated current-price reads standing in for history.
    SampledSnapshots,
}

/// One upstream record before normalization. `price` is `None` when the
/// provider omitted or nulled the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawObservation {
    pub observed_at: UtcDateTime,
    pub price: Option<f64>,
}

impl RawObservation {
    pub fn new(observed_at: UtcDateTime, price: Option<f64>) -> Self {
        Self { observed_at, price }
    }
}

/// A single normalized closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub day_index: usize,
    pub observed_at: UtcDateTime,
    pub price: f64,
}

/// Immutable oldest-to-newest price sequence with day indices `0..len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: Symbol,
    provider: ProviderId,
    provenance: SeriesProvenance,
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    /// Normalize raw upstream records.
    ///
    /// Records with a missing, non-finite or non-positive price are dropped.
    /// The remainder is ordered by observation time and re-indexed from 0.
    pub fn from_observations<I>(
        symbol: Symbol,
        provider: ProviderId,
        provenance: SeriesProvenance,
        observations: I,
    ) -> Self
    where
        I: IntoIterator<Item = RawObservation>,
    {
        let mut valid = observations
            .into_iter()
            .filter_map(|raw| match raw.price {
                Some(price) if price.is_finite() && price > 0.0 => Some((raw.observed_at, price)),
                _ => None,
            })
            .collect::<Vec<_>>();
        valid.sort_by_key(|(observed_at, _)| *observed_at);

        let samples = valid
            .into_iter()
            .enumerate()
            .map(|(day_index, (observed_at, price))| PriceSample {
                day_index,
                observed_at,
                price,
            })
            .collect();

        Self {
            symbol,
            provider,
            provenance,
            samples,
        }
    }

    /// Enforce a minimum sample count.
    ///
    /// An empty series means the provider knows nothing about the symbol;
    /// a short one is reported as insufficient history.
    pub fn require_samples(self, min_samples: usize) -> Result<Self, ForecastError> {
        if self.samples.is_empty() {
            return Err(ForecastError::symbol_not_found(&self.symbol, self.provider));
        }
        if self.samples.len() < min_samples {
            return Err(ForecastError::insufficient_history(
                self.samples.len(),
                min_samples,
            ));
        }
        Ok(self)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    pub const fn provenance(&self) -> SeriesProvenance {
        self.provenance
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|sample| sample.price)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForecastErrorKind;

    fn at(day: i64) -> UtcDateTime {
        UtcDateTime::from_unix_seconds(1_700_000_000 + day * 86_400).expect("valid timestamp")
    }

    fn symbol() -> Symbol {
        Symbol::parse("BTC").expect("valid symbol")
    }

    #[test]
    fn drops_missing_and_non_positive_prices_and_reindexes() {
        let series = PriceSeries::from_observations(
            symbol(),
            ProviderId::Cryptocompare,
            SeriesProvenance::Historical,
            vec![
                RawObservation::new(at(0), Some(10.0)),
                RawObservation::new(at(1), None),
                RawObservation::new(at(2), Some(0.0)),
                RawObservation::new(at(3), Some(f64::NAN)),
                RawObservation::new(at(4), Some(12.0)),
            ],
        );

        let indexed = series
            .samples()
            .iter()
            .map(|sample| (sample.day_index, sample.price))
            .collect::<Vec<_>>();
        assert_eq!(indexed, vec![(0, 10.0), (1, 12.0)]);
    }

    #[test]
    fn orders_samples_oldest_first() {
        let series = PriceSeries::from_observations(
            symbol(),
            ProviderId::Coinmarketcap,
            SeriesProvenance::Historical,
            vec![
                RawObservation::new(at(2), Some(3.0)),
                RawObservation::new(at(0), Some(1.0)),
                RawObservation::new(at(1), Some(2.0)),
            ],
        );

        assert_eq!(series.prices().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_series_is_symbol_not_found() {
        let series = PriceSeries::from_observations(
            symbol(),
            ProviderId::Coingecko,
            SeriesProvenance::Historical,
            vec![RawObservation::new(at(0), None)],
        );

        let err = series.require_samples(10).expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::SymbolNotFound);
    }

    #[test]
    fn short_series_is_insufficient_history() {
        let series = PriceSeries::from_observations(
            symbol(),
            ProviderId::Coingecko,
            SeriesProvenance::Historical,
            (0..9).map(|day| RawObservation::new(at(day), Some(100.0))),
        );

        let err = series.require_samples(10).expect_err("must fail");
        assert_eq!(err.kind(), ForecastErrorKind::InsufficientHistory);
        assert!(err.message().contains("9"), "{}", err.message());
    }
}
