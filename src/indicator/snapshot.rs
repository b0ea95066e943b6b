use chrono::NaiveDate;
use error_stack::Report;
use serde::Serialize;

use crate::config::IndicatorConfig;
use crate::error::IndicatorError;
use crate::indicator::adx::{Adx, AdxPoint};
use crate::indicator::bollinger::{Bands, BollingerBands};
use crate::indicator::fibonacci::{Fibonacci, FibonacciLevels};
use crate::indicator::latest;
use crate::indicator::ma::Sma;
use crate::indicator::macd::{Macd, MacdPoint};
use crate::indicator::rsi::Rsi;
use crate::indicator::stochastic::{Stochastic, StochasticPoint};
use crate::indicator::volatility::Volatility;
use crate::model::PriceSeries;

/// Latest value of every indicator for one series. `None` marks an
/// indicator that the series is too short for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdPoint>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub bollinger: Option<Bands>,
    pub stochastic: Option<StochasticPoint>,
    pub adx: Option<AdxPoint>,
    pub fibonacci: Option<FibonacciLevels>,
    /// Daily return volatility in percent.
    pub volatility: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn compute(
        series: &PriceSeries,
        config: &IndicatorConfig,
    ) -> Result<Self, Report<IndicatorError>> {
        let last = series.last();

        let macd = Macd::new(config.macd_fast, config.macd_slow, config.macd_signal)?;
        let bollinger = BollingerBands::new(config.bollinger_period, config.bollinger_multiplier)?;
        let stochastic = Stochastic::new(config.stochastic_period, config.stochastic_smooth)?;
        let adx = Adx::new(config.adx_period)?;
        let fibonacci = Fibonacci::new(config.fibonacci_lookback)?;

        Ok(Self {
            date: last.date,
            price: last.close,
            volume: last.volume,
            rsi: latest(&Rsi::new(config.rsi_period)?, series),
            macd: last_of("macd", macd.calculate_full(series))?,
            sma_20: latest(&Sma::new(20)?, series),
            sma_50: latest(&Sma::new(50)?, series),
            sma_200: latest(&Sma::new(200)?, series),
            bollinger: last_of("bollinger", bollinger.calculate_bands(series))?,
            stochastic: last_of("stochastic", stochastic.calculate_full(series))?,
            adx: last_of("adx", adx.calculate_full(series))?,
            fibonacci: optional("fibonacci", fibonacci.levels(series))?,
            volatility: latest(&Volatility::new(config.volatility_window)?, series),
        })
    }
}

fn last_of<T: Copy>(
    name: &str,
    result: Result<Vec<T>, Report<IndicatorError>>,
) -> Result<Option<T>, Report<IndicatorError>> {
    Ok(optional(name, result)?.and_then(|values| values.last().copied()))
}

/// Turns insufficient history into `None`; parameter errors still
/// propagate.
fn optional<T>(
    name: &str,
    result: Result<T, Report<IndicatorError>>,
) -> Result<Option<T>, Report<IndicatorError>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(report) => match report.current_context() {
            IndicatorError::InsufficientData { .. } => {
                tracing::debug!(indicator = name, error = %report.current_context(), "indicator unavailable");
                Ok(None)
            }
            IndicatorError::InvalidParameter { .. } => Err(report),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{series_from_closes, series_with_ranges};

    #[test]
    fn short_series_leaves_long_windows_empty() {
        let closes: Vec<f64> = (0..60).map(|i| 1000.0 + i as f64).collect();
        let snapshot =
            IndicatorSnapshot::compute(&series_from_closes(&closes), &IndicatorConfig::default())
                .unwrap();
        assert_eq!(snapshot.price, 1059.0);
        assert!(snapshot.rsi.is_some());
        assert!(snapshot.macd.is_some());
        assert!(snapshot.sma_50.is_some());
        assert!(snapshot.sma_200.is_none());
        assert!(snapshot.fibonacci.is_none());
        // Close-only bars still feed ADX through their closes.
        assert!(snapshot.adx.is_some());
        assert!(snapshot.stochastic.is_some());
    }

    #[test]
    fn full_series_fills_every_indicator() {
        let closes: Vec<f64> = (0..220)
            .map(|i| 20_000.0 + 50.0 * i as f64 + 30.0 * (i as f64).sin())
            .collect();
        let snapshot =
            IndicatorSnapshot::compute(&series_with_ranges(&closes, 40.0), &IndicatorConfig::default())
                .unwrap();
        assert!(snapshot.sma_200.is_some());
        assert!(snapshot.adx.is_some());
        assert!(snapshot.fibonacci.is_some());
        assert!(snapshot.volatility.is_some());
        assert_eq!(snapshot.volume, Some(1_000.0));
    }

    #[test]
    fn tiny_series_does_not_panic() {
        let snapshot = IndicatorSnapshot::compute(
            &series_from_closes(&[100.0, 101.0]),
            &IndicatorConfig::default(),
        )
        .unwrap();
        assert!(snapshot.rsi.is_none());
        assert!(snapshot.macd.is_none());
        assert!(snapshot.bollinger.is_none());
        assert!(snapshot.volatility.is_none());
    }

    #[test]
    fn invalid_parameters_propagate() {
        let config = IndicatorConfig {
            macd_fast: 30,
            ..IndicatorConfig::default()
        };
        assert!(IndicatorSnapshot::compute(&series_from_closes(&[100.0; 50]), &config).is_err());
    }
}
