use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::Ema;
use crate::model::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    /// Calculate one MACD point per price.
    pub fn calculate_prices(
        &self,
        prices: &[f64],
    ) -> Result<Vec<MacdPoint>, Report<IndicatorError>> {
        if prices.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: prices.len(),
            });
        }

        let fast_ema = Ema::new(self.fast_period)?.calculate_prices(prices)?;
        let slow_ema = Ema::new(self.slow_period)?.calculate_prices(prices)?;

        // Both EMAs are seeded at bar 0, so they are already aligned.
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Ema::new(self.signal_period)?.calculate_prices(&macd_line)?;

        Ok(macd_line
            .iter()
            .zip(signal_line.iter())
            .map(|(&macd, &signal)| MacdPoint {
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect())
    }

    pub fn calculate_full(
        &self,
        series: &PriceSeries,
    ) -> Result<Vec<MacdPoint>, Report<IndicatorError>> {
        self.calculate_prices(&series.closes())
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_bars(&self) -> usize {
        self.slow_period.max(self.signal_period)
    }

    /// Returns MACD line values only.
    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        Ok(self
            .calculate_full(series)?
            .into_iter()
            .map(|p| p.macd)
            .collect())
    }
}
