use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::Sma;
use crate::model::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticPoint {
    pub k: f64,
    pub d: f64,
}

/// Stochastic oscillator (%K with an SMA-smoothed %D).
///
/// Bars without a high or low use their close instead.
pub struct Stochastic {
    period: usize,
    smooth: usize,
}

impl Stochastic {
    pub fn new(period: usize, smooth: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 || smooth == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period and smooth must be > 0".into(),
            });
        }
        Ok(Self { period, smooth })
    }

    /// Raw %K per full window. A window with no range reads 50.
    pub fn percent_k(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        if series.len() < self.period {
            bail!(IndicatorError::InsufficientData {
                required: self.period,
                available: series.len(),
            });
        }

        let highs = series.highs();
        let lows = series.lows();
        let closes = series.closes();

        Ok((self.period - 1..closes.len())
            .map(|i| {
                let start = i + 1 - self.period;
                let max_high = highs[start..=i].iter().copied().fold(f64::MIN, f64::max);
                let min_low = lows[start..=i].iter().copied().fold(f64::MAX, f64::min);
                let range = max_high - min_low;
                if range <= 0.0 {
                    50.0
                } else {
                    100.0 * (closes[i] - min_low) / range
                }
            })
            .collect())
    }

    pub fn calculate_full(
        &self,
        series: &PriceSeries,
    ) -> Result<Vec<StochasticPoint>, Report<IndicatorError>> {
        if series.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: series.len(),
            });
        }

        let k = self.percent_k(series)?;
        let d = Sma::new(self.smooth)?.calculate_prices(&k)?;
        let offset = self.smooth - 1;

        Ok(k[offset..]
            .iter()
            .zip(d.iter())
            .map(|(&k, &d)| StochasticPoint { k, d })
            .collect())
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        "stochastic"
    }

    fn required_bars(&self) -> usize {
        self.period + self.smooth - 1
    }

    /// Returns %K values aligned with %D.
    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        Ok(self
            .calculate_full(series)?
            .into_iter()
            .map(|p| p.k)
            .collect())
    }
}
