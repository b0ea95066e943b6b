pub mod levels;

use error_stack::Report;
use serde::Serialize;

use crate::config::{AnalysisConfig, IndicatorConfig};
use crate::error::IndicatorError;
use crate::forecast::Direction;
use crate::indicator::ma::Sma;
use crate::indicator::snapshot::IndicatorSnapshot;
use crate::indicator::volatility::{Volatility, annualize};
use crate::model::PriceSeries;
use crate::thresholds::{SENTIMENT, TREND_STRENGTH, VOLATILITY_STATE};

pub use levels::{KeyLevel, LevelKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPhase {
    Bull,
    Bear,
    Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    #[serde(rename = "none")]
    NoTrend,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityState {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    OverboughtExtreme,
    Overbought,
    Neutral,
    Oversold,
    OversoldExtreme,
}

impl Sentiment {
    pub fn is_extreme(self) -> bool {
        matches!(self, Self::OverboughtExtreme | Self::OversoldExtreme)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    GoldenCross,
    DeadCross,
}

/// Price position relative to one moving average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverageReading {
    pub value: f64,
    pub direction: Direction,
    /// Percent distance of the price above (+) or below (-) the average.
    pub deviation_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverageTrend {
    pub short: Option<MovingAverageReading>,
    pub medium: Option<MovingAverageReading>,
    pub long: Option<MovingAverageReading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLevel {
    Low,
    Normal,
    High,
}

/// Current window-scaled volatility against its trailing-year average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityProfile {
    pub current: f64,
    pub average: f64,
    pub level: VolatilityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketCondition {
    pub phase: MarketPhase,
    pub trend_strength: Option<TrendStrength>,
    pub volatility_state: Option<VolatilityState>,
    pub sentiment: Option<Sentiment>,
    pub key_levels: Vec<KeyLevel>,
    pub crossover: Option<Crossover>,
    pub moving_averages: MovingAverageTrend,
    pub volatility_profile: Option<VolatilityProfile>,
}

impl MarketCondition {
    pub fn assess(
        series: &PriceSeries,
        snapshot: &IndicatorSnapshot,
        analysis: &AnalysisConfig,
        indicators: &IndicatorConfig,
    ) -> Result<Self, Report<IndicatorError>> {
        let closes = series.closes();
        let price = snapshot.price;

        Ok(Self {
            phase: classify_phase(price, snapshot.sma_50, snapshot.sma_200),
            trend_strength: snapshot.adx.map(|p| TREND_STRENGTH.grade(p.adx)),
            volatility_state: snapshot.volatility.map(|v| VOLATILITY_STATE.grade(v)),
            sentiment: snapshot.rsi.map(|r| SENTIMENT.grade(r)),
            key_levels: levels::key_levels(&closes, price, analysis),
            crossover: detect_crossover(&closes, 20, 50)?,
            moving_averages: MovingAverageTrend {
                short: snapshot.sma_20.map(|ma| read_average(price, ma)),
                medium: snapshot.sma_50.map(|ma| read_average(price, ma)),
                long: snapshot.sma_200.map(|ma| read_average(price, ma)),
            },
            volatility_profile: volatility_profile(&closes, indicators.volatility_window)?,
        })
    }
}

/// Bull when price and SMA50 both sit above SMA200, bear when both sit
/// below, transition otherwise or when either average is unavailable.
pub fn classify_phase(close: f64, sma_50: Option<f64>, sma_200: Option<f64>) -> MarketPhase {
    match (sma_50, sma_200) {
        (Some(medium), Some(long)) if close > long && medium > long => MarketPhase::Bull,
        (Some(medium), Some(long)) if close < long && medium < long => MarketPhase::Bear,
        _ => MarketPhase::Transition,
    }
}

/// Golden or dead cross of the short over the medium SMA on the last bar.
pub fn detect_crossover(
    closes: &[f64],
    short: usize,
    medium: usize,
) -> Result<Option<Crossover>, Report<IndicatorError>> {
    if closes.len() < medium + 1 {
        return Ok(None);
    }

    let short_ma = Sma::new(short)?.calculate_prices(closes)?;
    let medium_ma = Sma::new(medium)?.calculate_prices(closes)?;
    let (s_prev, s_now) = (short_ma[short_ma.len() - 2], short_ma[short_ma.len() - 1]);
    let (m_prev, m_now) = (medium_ma[medium_ma.len() - 2], medium_ma[medium_ma.len() - 1]);

    if s_now > m_now && s_prev <= m_prev {
        Ok(Some(Crossover::GoldenCross))
    } else if s_now < m_now && s_prev >= m_prev {
        Ok(Some(Crossover::DeadCross))
    } else {
        Ok(None)
    }
}

fn read_average(price: f64, average: f64) -> MovingAverageReading {
    MovingAverageReading {
        value: average,
        direction: Direction::of(price - average),
        deviation_pct: (price / average - 1.0) * 100.0,
    }
}

fn volatility_profile(
    closes: &[f64],
    window: usize,
) -> Result<Option<VolatilityProfile>, Report<IndicatorError>> {
    let volatility = Volatility::new(window)?;
    let Ok(daily) = volatility.calculate_prices(closes) else {
        return Ok(None);
    };

    let scaled: Vec<f64> = daily
        .iter()
        .map(|&v| annualize(v, volatility.window() as f64))
        .collect();
    let tail = &scaled[scaled.len().saturating_sub(252)..];
    let average = tail.iter().sum::<f64>() / tail.len() as f64;
    let current = scaled[scaled.len() - 1];

    let level = if current < average * 0.7 {
        VolatilityLevel::Low
    } else if current > average * 1.3 {
        VolatilityLevel::High
    } else {
        VolatilityLevel::Normal
    };

    Ok(Some(VolatilityProfile {
        current,
        average,
        level,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::series_from_closes;

    #[test]
    fn phase_bull_bear_transition() {
        assert_eq!(classify_phase(110.0, Some(105.0), Some(100.0)), MarketPhase::Bull);
        assert_eq!(classify_phase(90.0, Some(95.0), Some(100.0)), MarketPhase::Bear);
        assert_eq!(classify_phase(110.0, Some(95.0), Some(100.0)), MarketPhase::Transition);
        assert_eq!(classify_phase(100.0, Some(100.0), Some(100.0)), MarketPhase::Transition);
    }

    #[test]
    fn phase_without_long_average_is_transition() {
        assert_eq!(classify_phase(110.0, Some(105.0), None), MarketPhase::Transition);
    }

    #[test]
    fn phase_is_idempotent() {
        let first = classify_phase(123.4, Some(120.0), Some(118.0));
        for _ in 0..3 {
            assert_eq!(classify_phase(123.4, Some(120.0), Some(118.0)), first);
        }
    }

    #[test]
    fn golden_cross_on_last_bar() {
        // Flat, then a jump on the last bar lifts SMA3 over SMA5.
        let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 110.0];
        assert_eq!(
            detect_crossover(&closes, 3, 5).unwrap(),
            Some(Crossover::GoldenCross)
        );
    }

    #[test]
    fn dead_cross_on_last_bar() {
        let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 90.0];
        assert_eq!(
            detect_crossover(&closes, 3, 5).unwrap(),
            Some(Crossover::DeadCross)
        );
    }

    #[test]
    fn no_cross_in_steady_trend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(detect_crossover(&closes, 3, 5).unwrap(), None);
    }

    #[test]
    fn no_cross_with_short_history() {
        assert_eq!(detect_crossover(&[100.0; 10], 3, 50).unwrap(), None);
    }

    #[test]
    fn assess_fills_categories() {
        let closes: Vec<f64> = (0..260).map(|i| 1000.0 + 2.0 * i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = IndicatorConfig::default();
        let snapshot = IndicatorSnapshot::compute(&series, &indicators).unwrap();
        let condition =
            MarketCondition::assess(&series, &snapshot, &AnalysisConfig::default(), &indicators)
                .unwrap();

        assert_eq!(condition.phase, MarketPhase::Bull);
        assert_eq!(condition.sentiment, Some(Sentiment::OverboughtExtreme));
        assert_eq!(condition.volatility_state, Some(VolatilityState::VeryLow));
        // Close-only input grades ADX from close-to-close moves.
        assert_eq!(condition.trend_strength, Some(TrendStrength::VeryStrong));
        let long = condition.moving_averages.long.unwrap();
        assert_eq!(long.direction, Direction::Up);
        assert!(long.deviation_pct > 0.0);
        assert!(condition.volatility_profile.is_some());
    }
}
