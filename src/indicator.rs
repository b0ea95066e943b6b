pub mod adx;
pub mod bollinger;
pub mod fibonacci;
pub mod ma;
pub mod macd;
pub mod rsi;
pub mod snapshot;
pub mod stochastic;
pub mod volatility;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::model::PriceSeries;

/// A technical analysis indicator that operates on a price series.
///
/// The series is in ascending chronological order (oldest first).
pub trait Indicator {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one output value.
    fn required_bars(&self) -> usize;

    /// Calculate indicator values from the series.
    ///
    /// Returns one value per output point. The number of values may be less
    /// than the number of bars depending on the indicator's lookback.
    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>>;
}

/// Latest value of `indicator`, or `None` when it cannot be computed.
pub fn latest(indicator: &dyn Indicator, series: &PriceSeries) -> Option<f64> {
    match indicator.calculate(series) {
        Ok(values) => values.last().copied(),
        Err(report) => {
            tracing::debug!(
                indicator = indicator.name(),
                required = indicator.required_bars(),
                available = series.len(),
                error = %report.current_context(),
                "indicator unavailable"
            );
            None
        }
    }
}

/// Right-align `values` against a series of `total_len` bars.
pub fn align_series<T: Clone>(total_len: usize, values: Vec<T>) -> Vec<Option<T>> {
    let offset = total_len.saturating_sub(values.len());
    let mut output = vec![None; total_len];
    for (index, value) in values.into_iter().enumerate() {
        output[offset + index] = Some(value);
    }
    output
}

/// Simple percentage change between consecutive prices.
pub fn returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sample standard deviation (n - 1 denominator). `None` below two points.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
