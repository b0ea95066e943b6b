use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::model::PriceSeries;

/// RSI (Relative Strength Index) over simple rolling means of gains and losses.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Calculate RSI values from a price slice.
    ///
    /// The first value belongs to bar `period`; output length is
    /// `prices.len() - period`.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if prices.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: prices.len(),
            });
        }

        let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

        Ok(deltas
            .windows(self.period)
            .map(|window| {
                let avg_gain =
                    window.iter().map(|&d| d.max(0.0)).sum::<f64>() / self.period as f64;
                let avg_loss =
                    window.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / self.period as f64;
                rsi_value(avg_gain, avg_loss)
            })
            .collect())
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&series.closes())
    }
}

/// RSI from average gain/loss. A window without losses is 100, a window
/// without any movement is 50.
pub fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::series_from_closes;

    #[test]
    fn rsi_period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn rsi_thirteen_bars_is_insufficient() {
        let rsi = Rsi::new(14).unwrap();
        let closes: Vec<f64> = (0..13).map(|i| 100.0 + i as f64).collect();
        let err = rsi.calculate(&series_from_closes(&closes)).unwrap_err();
        assert_eq!(
            err.current_context(),
            &IndicatorError::InsufficientData {
                required: 15,
                available: 13
            }
        );
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi
            .calculate(&series_from_closes(&[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        assert_eq!(values, vec![100.0]);
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi
            .calculate(&series_from_closes(&[4.0, 3.0, 2.0, 1.0]))
            .unwrap();
        assert!(values[0].abs() < 1e-9);
    }

    #[test]
    fn rsi_flat_prices_are_neutral() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate(&series_from_closes(&[100.0; 30])).unwrap();
        assert!(values.iter().all(|&v| v == 50.0));
    }

    #[test]
    fn rsi_known_value() {
        // deltas +2, -1, +1: avg_gain 1, avg_loss 1/3 -> rs 3 -> 75
        let rsi = Rsi::new(3).unwrap();
        let values = rsi
            .calculate(&series_from_closes(&[10.0, 12.0, 11.0, 12.0]))
            .unwrap();
        assert!((values[0] - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_stays_in_range() {
        let rsi = Rsi::new(14).unwrap();
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.7).sin() + (i % 7) as f64)
            .collect();
        let values = rsi.calculate(&series_from_closes(&closes)).unwrap();
        assert_eq!(values.len(), 120 - 14);
        assert!(values.iter().all(|v| (0.0..=100.0).contains(v)));
    }
}
