use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::Sma;
use crate::model::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdxPoint {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Average Directional Index with simple rolling means for ATR, DM and DX.
///
/// A bar without a high or low uses its close in their place, so close-only
/// input still yields a reading built from close-to-close moves.
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_full(
        &self,
        series: &PriceSeries,
    ) -> Result<Vec<AdxPoint>, Report<IndicatorError>> {
        if series.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: series.len(),
            });
        }

        let highs = series.highs();
        let lows = series.lows();
        let closes = series.closes();

        // Directional movement and true range start at the second bar.
        let mut true_range = Vec::with_capacity(closes.len() - 1);
        let mut plus_dm = Vec::with_capacity(closes.len() - 1);
        let mut minus_dm = Vec::with_capacity(closes.len() - 1);
        for i in 1..closes.len() {
            let up = highs[i] - highs[i - 1];
            let down = lows[i - 1] - lows[i];
            plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });

            let prev_close = closes[i - 1];
            true_range.push(
                (highs[i] - lows[i])
                    .max((highs[i] - prev_close).abs())
                    .max((lows[i] - prev_close).abs()),
            );
        }

        let sma = Sma::new(self.period)?;
        let atr = sma.calculate_prices(&true_range)?;
        let plus_avg = sma.calculate_prices(&plus_dm)?;
        let minus_avg = sma.calculate_prices(&minus_dm)?;

        let directional: Vec<(f64, f64)> = atr
            .iter()
            .zip(plus_avg.iter().zip(minus_avg.iter()))
            .map(|(&atr, (&plus, &minus))| {
                if atr <= 0.0 {
                    (0.0, 0.0)
                } else {
                    (100.0 * plus / atr, 100.0 * minus / atr)
                }
            })
            .collect();

        let dx: Vec<f64> = directional
            .iter()
            .map(|&(plus, minus)| {
                let sum = plus + minus;
                if sum <= 0.0 {
                    0.0
                } else {
                    100.0 * (plus - minus).abs() / sum
                }
            })
            .collect();

        let adx = sma.calculate_prices(&dx)?;
        let offset = self.period - 1;

        Ok(adx
            .iter()
            .zip(directional[offset..].iter())
            .map(|(&adx, &(plus_di, minus_di))| AdxPoint {
                adx,
                plus_di,
                minus_di,
            })
            .collect())
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        "adx"
    }

    fn required_bars(&self) -> usize {
        2 * self.period
    }

    /// Returns ADX values only.
    fn calculate(&self, series: &PriceSeries) -> Result<Vec<f64>, Report<IndicatorError>> {
        Ok(self
            .calculate_full(series)?
            .into_iter()
            .map(|p| p.adx)
            .collect())
    }
}
