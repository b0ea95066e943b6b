use serde::Serialize;

use crate::indicator::volatility::{TRADING_DAYS_PER_YEAR, annualize};
use crate::indicator::{returns, sample_std};

/// Bars per reporting period: day, week, month, quarter, year.
const PERIODS: [usize; 5] = [1, 5, 21, 63, 252];
const DRAWDOWN_WINDOW: usize = 252;
const MIN_DRAWDOWN_BARS: usize = 50;
const MIN_VOLATILITY_BARS: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodReturns {
    pub daily: Option<f64>,
    pub weekly: Option<f64>,
    pub monthly: Option<f64>,
    pub quarterly: Option<f64>,
    pub yearly: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReturnVolatility {
    pub daily: Option<f64>,
    pub annualized: Option<f64>,
}

/// Historical performance, all figures in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Performance {
    pub returns: PeriodReturns,
    pub max_drawdown: Option<f64>,
    pub volatility: ReturnVolatility,
}

impl Performance {
    pub fn calculate(closes: &[f64]) -> Self {
        let [daily, weekly, monthly, quarterly, yearly] =
            PERIODS.map(|period| period_return(closes, period));

        let volatility = if closes.len() > MIN_VOLATILITY_BARS {
            let daily = sample_std(&returns(closes)).map(|std| std * 100.0);
            ReturnVolatility {
                daily,
                annualized: daily.map(|d| annualize(d, TRADING_DAYS_PER_YEAR)),
            }
        } else {
            ReturnVolatility::default()
        };

        Self {
            returns: PeriodReturns {
                daily,
                weekly,
                monthly,
                quarterly,
                yearly,
            },
            max_drawdown: (closes.len() > MIN_DRAWDOWN_BARS)
                .then(|| max_drawdown(closes, DRAWDOWN_WINDOW)),
            volatility,
        }
    }
}

/// Percent change from `period` bars ago to the last close.
fn period_return(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() <= period {
        return None;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - period];
    Some((last / base - 1.0) * 100.0)
}

/// Deepest fall below the rolling `window`-bar high, as a non-positive
/// percentage.
pub fn max_drawdown(closes: &[f64], window: usize) -> f64 {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let start = (i + 1).saturating_sub(window);
            let peak = closes[start..=i].iter().copied().fold(f64::MIN, f64::max);
            (close / peak - 1.0) * 100.0
        })
        .fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_leaves_gaps() {
        let perf = Performance::calculate(&[100.0, 110.0]);
        assert!((perf.returns.daily.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(perf.returns.weekly, None);
        assert_eq!(perf.max_drawdown, None);
        assert_eq!(perf.volatility.daily, None);
    }

    #[test]
    fn period_returns_use_offset_bars() {
        let closes: Vec<f64> = (1..=300).map(f64::from).collect();
        let perf = Performance::calculate(&closes);
        assert!((perf.returns.weekly.unwrap() - (300.0 / 295.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((perf.returns.monthly.unwrap() - (300.0 / 279.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((perf.returns.quarterly.unwrap() - (300.0 / 237.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((perf.returns.yearly.unwrap() - (300.0 / 48.0 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn yearly_needs_more_than_a_year() {
        let perf = Performance::calculate(&[100.0; 252]);
        assert!(perf.returns.quarterly.is_some());
        assert_eq!(perf.returns.yearly, None);
    }

    #[test]
    fn drawdown_from_running_peak() {
        let closes = [100.0, 120.0, 90.0, 110.0];
        assert!((max_drawdown(&closes, 252) - (-25.0)).abs() < 1e-9);
    }

    #[test]
    fn drawdown_window_forgets_old_peaks() {
        let closes = [200.0, 100.0, 100.0, 100.0];
        assert!((max_drawdown(&closes, 2) - (-50.0)).abs() < 1e-9);
        // Without the old peak there is nothing to fall from.
        assert!((max_drawdown(&closes[1..], 2)).abs() < 1e-9);
    }

    #[test]
    fn rising_series_has_no_drawdown() {
        let closes: Vec<f64> = (1..=60).map(f64::from).collect();
        assert_eq!(Performance::calculate(&closes).max_drawdown, Some(0.0));
    }

    #[test]
    fn volatility_annualizes_daily() {
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let perf = Performance::calculate(&closes);
        let daily = perf.volatility.daily.unwrap();
        assert!(daily > 0.0);
        assert!((perf.volatility.annualized.unwrap() - daily * 252.0_f64.sqrt()).abs() < 1e-9);
    }
}
