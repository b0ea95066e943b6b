use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::model::PriceSeries;

pub const RETRACEMENT_RATIOS: [f64; 4] = [0.236, 0.382, 0.5, 0.618];

/// Retracement levels measured down from the recent high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciLevels {
    pub high: f64,
    pub low: f64,
    pub level_236: f64,
    pub level_382: f64,
    pub level_500: f64,
    pub level_618: f64,
}

pub struct Fibonacci {
    lookback: usize,
}

impl Fibonacci {
    pub fn new(lookback: usize) -> Result<Self, Report<IndicatorError>> {
        if lookback < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "lookback must be >= 2".into(),
            });
        }
        Ok(Self { lookback })
    }

    /// Levels over the trailing `lookback` closes.
    pub fn levels(&self, series: &PriceSeries) -> Result<FibonacciLevels, Report<IndicatorError>> {
        if series.len() < self.lookback {
            bail!(IndicatorError::InsufficientData {
                required: self.lookback,
                available: series.len(),
            });
        }

        let closes = series.closes();
        let recent = &closes[closes.len() - self.lookback..];
        let high = recent.iter().copied().fold(f64::MIN, f64::max);
        let low = recent.iter().copied().fold(f64::MAX, f64::min);
        let diff = high - low;
        let [r236, r382, r500, r618] = RETRACEMENT_RATIOS.map(|r| high - diff * r);

        Ok(FibonacciLevels {
            high,
            low,
            level_236: r236,
            level_382: r382,
            level_500: r500,
            level_618: r618,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::series_from_closes;

    #[test]
    fn fibonacci_lookback_too_small_invalid() {
        assert!(Fibonacci::new(1).is_err());
    }

    #[test]
    fn fibonacci_insufficient_data() {
        let fib = Fibonacci::new(90).unwrap();
        assert!(fib.levels(&series_from_closes(&[100.0; 89])).is_err());
    }

    #[test]
    fn fibonacci_levels_between_high_and_low() {
        let fib = Fibonacci::new(5).unwrap();
        // Older bars outside the lookback are ignored.
        let levels = fib
            .levels(&series_from_closes(&[500.0, 100.0, 120.0, 200.0, 150.0, 110.0]))
            .unwrap();
        assert_eq!(levels.high, 200.0);
        assert_eq!(levels.low, 100.0);
        assert!((levels.level_236 - 176.4).abs() < 1e-9);
        assert!((levels.level_382 - 161.8).abs() < 1e-9);
        assert!((levels.level_500 - 150.0).abs() < 1e-9);
        assert!((levels.level_618 - 138.2).abs() < 1e-9);
    }
}
