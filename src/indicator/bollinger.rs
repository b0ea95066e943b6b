use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, sample_std};
use crate::model::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// Relative position of `price` between the lower (0.0) and upper (1.0)
    /// band. `None` when the bands have collapsed to zero width.
    pub fn position(&self, price: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            return None;
        }
        Some((price - self.lower) / width)
    }
}

pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be >= 2".into(),
            });
        }
        if std_dev_multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "std_dev_multiplier must be > 0".into(),
            });
        }
        Ok(Self {
            period,
            std_dev_multiplier,
        })
    }

    /// Returns one set of bands per full window, using the sample standard deviation.
    pub fn calculate_bands(
        &self,
        series: &PriceSeries,
    ) -> Result<Vec<Bands>, Report<IndicatorError>> {
        let prices = series.closes();
        if prices.len() < self.period {
            bail!(IndicatorError::InsufficientData {
                required: self.period,
                available: prices.len(),
            });
        }

        let sma = Sma::new(self.period)?.calculate_prices(&prices)?;

        Ok(prices
            .windows(self.period)
            .zip(sma.iter())
            .map(|(window, &middle)| {
                let std_dev = sample_std(window).unwrap_or(0.0);
                Bands {
                    upper: middle + self.std_dev_multiplier * std_dev,
                    middle,
                    lower: middle - self.std_dev_multiplier * std_dev,
                }
            })
            .collect())
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    /// Returns middle band (SMA) values only.
    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        Ok(self
            .calculate_bands(series)?
            .into_iter()
            .map(|b| b.middle)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::series_from_closes;

    #[test]
    fn bollinger_period_too_small_invalid() {
        assert!(BollingerBands::new(1, 2.0).is_err());
    }

    #[test]
    fn bollinger_negative_multiplier_invalid() {
        assert!(BollingerBands::new(20, -1.0).is_err());
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = BollingerBands::new(5, 2.0).unwrap();
        assert!(bb.calculate(&series_from_closes(&[1.0; 4])).is_err());
    }

    #[test]
    fn bollinger_flat_prices_zero_width() {
        let bb = BollingerBands::new(3, 2.0).unwrap();
        let bands = bb.calculate_bands(&series_from_closes(&[10.0; 5])).unwrap();
        for b in &bands {
            assert!((b.upper - 10.0).abs() < 1e-9);
            assert!((b.lower - 10.0).abs() < 1e-9);
            assert_eq!(b.position(10.0), None);
        }
    }

    #[test]
    fn bollinger_uses_sample_deviation() {
        let bb = BollingerBands::new(3, 2.0).unwrap();
        let bands = bb.calculate_bands(&series_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        // sample std of [1,2,3] is 1.0
        assert!((bands[0].upper - 4.0).abs() < 1e-9);
        assert!((bands[0].lower - 0.0).abs() < 1e-9);
        assert!((bands[0].position(2.0).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn bollinger_drop_falls_below_lower_band() {
        let mut closes = vec![100.0; 99];
        closes.push(90.0);
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let last = *bb
            .calculate_bands(&series_from_closes(&closes))
            .unwrap()
            .last()
            .unwrap();
        assert!(90.0 < last.lower);
    }
}
