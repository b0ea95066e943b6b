use error_stack::{Report, ResultExt};
use ndarray::{Array1, Array2};

use crate::error::{ForecastError, IndicatorError};
use crate::indicator::align_series;
use crate::indicator::ma::Sma;
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::indicator::volatility::Volatility;

pub const LAGS: usize = 5;

/// sma5, sma10, sma20, rsi14, macd, vol20, (price_lag, return_lag) x 5, sma5/sma20.
pub const FEATURE_COUNT: usize = 6 + 2 * LAGS + 1;

/// Regressors for bar `index`. `price` rides along for the target and the
/// implied price but is not itself a regressor.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub index: usize,
    pub price: f64,
    pub values: [f64; FEATURE_COUNT],
}

/// One row per bar where every feature is defined, oldest first.
pub fn build_rows(closes: &[f64]) -> Result<Vec<FeatureRow>, Report<ForecastError>> {
    let n = closes.len();
    let aligned = |values: Vec<f64>| align_series(n, values);

    let sma_5 = aligned(window_or_empty(Sma::new(5).and_then(|s| s.calculate_prices(closes)))?);
    let sma_10 = aligned(window_or_empty(Sma::new(10).and_then(|s| s.calculate_prices(closes)))?);
    let sma_20 = aligned(window_or_empty(Sma::new(20).and_then(|s| s.calculate_prices(closes)))?);
    let rsi = aligned(window_or_empty(Rsi::new(14).and_then(|r| r.calculate_prices(closes)))?);
    let vol = aligned(window_or_empty(
        Volatility::new(20).and_then(|v| v.calculate_prices(closes)),
    )?);
    let macd = aligned(
        window_or_empty(Macd::new(12, 26, 9).and_then(|m| m.calculate_prices(closes)))?
            .into_iter()
            .map(|p| p.macd)
            .collect(),
    );

    let mut rows = Vec::new();
    for t in LAGS..n {
        let (Some(s5), Some(s10), Some(s20), Some(r), Some(m), Some(v)) =
            (sma_5[t], sma_10[t], sma_20[t], rsi[t], macd[t], vol[t])
        else {
            continue;
        };

        let mut values = [0.0; FEATURE_COUNT];
        values[..6].copy_from_slice(&[s5, s10, s20, r, m, v]);
        for lag in 1..=LAGS {
            values[6 + 2 * (lag - 1)] = closes[t - lag];
            values[7 + 2 * (lag - 1)] = closes[t] / closes[t - lag] - 1.0;
        }
        values[FEATURE_COUNT - 1] = s5 / s20;

        if values.iter().all(|v| v.is_finite()) {
            rows.push(FeatureRow {
                index: t,
                price: closes[t],
                values,
            });
        }
    }

    Ok(rows)
}

/// Forward `horizon`-bar return for each row, `None` past the series end.
pub fn targets(closes: &[f64], rows: &[FeatureRow], horizon: usize) -> Vec<Option<f64>> {
    rows.iter()
        .map(|row| {
            row.index
                .checked_add(horizon)
                .and_then(|i| closes.get(i))
                .map(|future| future / row.price - 1.0)
        })
        .collect()
}

/// Stack rows into a design matrix and target vector.
pub fn to_matrix(
    rows: &[(&FeatureRow, f64)],
) -> Result<(Array2<f64>, Array1<f64>), Report<ForecastError>> {
    let flat: Vec<f64> = rows.iter().flat_map(|(row, _)| row.values).collect();
    let x = Array2::from_shape_vec((rows.len(), FEATURE_COUNT), flat)
        .change_context(ForecastError::Shape)?;
    let y = rows.iter().map(|&(_, target)| target).collect();
    Ok((x, y))
}

/// Short input only shortens the row set; other indicator failures abort.
fn window_or_empty<T>(
    result: Result<Vec<T>, Report<IndicatorError>>,
) -> Result<Vec<T>, Report<ForecastError>> {
    match result {
        Ok(values) => Ok(values),
        Err(report) => match report.current_context() {
            IndicatorError::InsufficientData { .. } => Ok(Vec::new()),
            _ => Err(report.change_context(ForecastError::Features)),
        },
    }
}
