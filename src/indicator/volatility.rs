use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, returns, sample_std};
use crate::model::PriceSeries;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Realized volatility: rolling sample standard deviation of daily returns,
/// expressed in percent.
pub struct Volatility {
    window: usize,
}

impl Volatility {
    pub fn new(window: usize) -> Result<Self, Report<IndicatorError>> {
        if window < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "window must be >= 2".into(),
            });
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if prices.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: prices.len(),
            });
        }

        Ok(returns(prices)
            .windows(self.window)
            .map(|w| sample_std(w).unwrap_or(0.0) * 100.0)
            .collect())
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        "volatility"
    }

    fn required_bars(&self) -> usize {
        self.window + 1
    }

    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&series.closes())
    }
}

/// Scale a daily volatility to `periods` periods.
pub fn annualize(daily: f64, periods: f64) -> f64 {
    daily * periods.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::series_from_closes;

    #[test]
    fn volatility_window_too_small_invalid() {
        assert!(Volatility::new(1).is_err());
    }

    #[test]
    fn volatility_insufficient_data() {
        let vol = Volatility::new(20).unwrap();
        assert!(vol.calculate(&series_from_closes(&[100.0; 20])).is_err());
    }

    #[test]
    fn volatility_flat_prices_zero() {
        let vol = Volatility::new(20).unwrap();
        let values = vol.calculate(&series_from_closes(&[100.0; 30])).unwrap();
        assert_eq!(values.len(), 10);
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn volatility_in_percent() {
        let vol = Volatility::new(2).unwrap();
        // returns +10%, -10%: sample std = 0.1414..
        let values = vol.calculate_prices(&[100.0, 110.0, 99.0]).unwrap();
        assert!((values[0] - 0.02_f64.sqrt() * 100.0).abs() < 1e-9);
    }

    #[test]
    fn annualize_scales_by_root() {
        assert!((annualize(1.0, TRADING_DAYS_PER_YEAR) - 252.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(annualize(2.0, 4.0), 4.0);
    }
}
