//! Ordinary least squares forecast over a [`PriceSeries`].
//!
//! Prices are regressed on their day index (`0..n`); the forecast for
//! horizon `h` is the fitted line evaluated at `n + h - 1`, i.e. the `h`-th
//! day after the last observation. Values are never rounded here.

use serde::{Deserialize, Serialize};

use crate::{ForecastError, PriceSeries};

/// `price ≈ slope * day_index + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub slope: f64,
    pub intercept: f64,
}

impl FittedModel {
    /// Fit a line through `prices` indexed `0..prices.len()`.
    ///
    /// A flat series fits exactly with slope 0; a single point does too.
    pub fn fit(prices: &[f64]) -> Result<Self, ForecastError> {
        let Some(&first) = prices.first() else {
            return Err(ForecastError::internal("cannot fit a model to an empty series"));
        };
        if prices.iter().any(|price| !price.is_finite()) {
            return Err(ForecastError::internal("series contains non-finite prices"));
        }
        if prices.iter().all(|&price| price == first) {
            return Ok(Self {
                slope: 0.0,
                intercept: first,
            });
        }

        let n = prices.len() as f64;
        let mean_x = (n - 1.0) / 2.0;
        let mean_y = prices.iter().sum::<f64>() / n;

        let (sxy, sxx) = prices
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sxy, sxx), (index, &price)| {
                let dx = index as f64 - mean_x;
                (sxy + dx * (price - mean_y), sxx + dx * dx)
            });

        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict_at(&self, day_index: f64) -> f64 {
        self.intercept + self.slope * day_index
    }
}

/// Result of extrapolating a fitted series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub model: FittedModel,
    pub samples_used: usize,
    pub future_index: usize,
    pub price: f64,
}

/// Fit `series` and evaluate `horizon_days` past its last sample.
pub fn forecast(series: &PriceSeries, horizon_days: u32) -> Result<Forecast, ForecastError> {
    if horizon_days == 0 {
        return Err(ForecastError::internal("forecast horizon must be at least one day"));
    }

    let prices = series.prices().collect::<Vec<_>>();
    let model = FittedModel::fit(&prices)?;
    let future_index = prices.len() + horizon_days as usize - 1;
    let price = model.predict_at(future_index as f64);
    if !price.is_finite() {
        return Err(ForecastError::internal("forecast produced a non-finite price"));
    }

    Ok(Forecast {
        model,
        samples_used: prices.len(),
        future_index,
        price,
    })
}

/// Mean of the last `window` prices.
pub fn simple_moving_average(series: &PriceSeries, window: usize) -> Result<f64, ForecastError> {
    if window == 0 {
        return Err(ForecastError::invalid_request(
            "moving average window must be at least 1",
        ));
    }
    if window > series.len() {
        return Err(ForecastError::insufficient_history(series.len(), window));
    }

    let tail = &series.samples()[series.len() - window..];
    Ok(tail.iter().map(|sample| sample.price).sum::<f64>() / window as f64)
}

/// Round to whole cents, applied only when formatting a response.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
