use serde::Serialize;

use crate::indicator::snapshot::IndicatorSnapshot;
use crate::market::{MarketCondition, TrendStrength};
use crate::thresholds::{KEY_LEVEL_RISK, OVERALL_RISK, VOLATILITY_RISK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    SomewhatLow,
    Moderate,
    SomewhatHigh,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// 1 (low) through 6 (very high).
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::SomewhatLow => 2,
            Self::Moderate => 3,
            Self::SomewhatHigh => 4,
            Self::High => 5,
            Self::VeryHigh => 6,
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, Self::High | Self::VeryHigh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub volatility_risk: RiskLevel,
    pub trend_risk: RiskLevel,
    pub sentiment_risk: RiskLevel,
    pub key_level_risk: RiskLevel,
    pub overall_risk: RiskLevel,
}

/// Grade four risk factors and average their ranks. Factors whose inputs
/// are unavailable count as moderate.
pub fn assess(snapshot: &IndicatorSnapshot, condition: &MarketCondition) -> RiskAssessment {
    let volatility_risk = snapshot
        .volatility
        .map_or(RiskLevel::Moderate, |v| VOLATILITY_RISK.grade(v));

    let trend_risk = match condition.trend_strength {
        Some(TrendStrength::VeryStrong) => RiskLevel::Low,
        Some(TrendStrength::NoTrend) => RiskLevel::High,
        _ => RiskLevel::Moderate,
    };

    let sentiment_risk = match condition.sentiment {
        Some(sentiment) if sentiment.is_extreme() => RiskLevel::High,
        _ => RiskLevel::Moderate,
    };

    let nearest_pct = condition
        .key_levels
        .iter()
        .map(|level| (level.price - snapshot.price).abs() / snapshot.price * 100.0)
        .fold(f64::INFINITY, f64::min);
    let key_level_risk = KEY_LEVEL_RISK.grade(nearest_pct);

    let factors = [volatility_risk, trend_risk, sentiment_risk, key_level_risk];
    let mean_rank =
        factors.iter().map(|r| f64::from(r.rank())).sum::<f64>() / factors.len() as f64;

    RiskAssessment {
        volatility_risk,
        trend_risk,
        sentiment_risk,
        key_level_risk,
        overall_risk: OVERALL_RISK.grade(mean_rank),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::market::{
        KeyLevel, LevelKind, MarketPhase, MovingAverageTrend, Sentiment,
    };

    fn snapshot(price: f64, volatility: Option<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            price,
            volume: None,
            rsi: None,
            macd: None,
            sma_20: None,
            sma_50: None,
            sma_200: None,
            bollinger: None,
            stochastic: None,
            adx: None,
            fibonacci: None,
            volatility,
        }
    }

    fn condition(
        trend_strength: Option<TrendStrength>,
        sentiment: Option<Sentiment>,
        key_levels: Vec<KeyLevel>,
    ) -> MarketCondition {
        MarketCondition {
            phase: MarketPhase::Transition,
            trend_strength,
            volatility_state: None,
            sentiment,
            key_levels,
            crossover: None,
            moving_averages: MovingAverageTrend {
                short: None,
                medium: None,
                long: None,
            },
            volatility_profile: None,
        }
    }

    #[test]
    fn unavailable_inputs_are_moderate() {
        let risk = assess(&snapshot(100.0, None), &condition(None, None, Vec::new()));
        assert_eq!(risk.volatility_risk, RiskLevel::Moderate);
        assert_eq!(risk.trend_risk, RiskLevel::Moderate);
        assert_eq!(risk.sentiment_risk, RiskLevel::Moderate);
        assert_eq!(risk.key_level_risk, RiskLevel::Moderate);
        assert_eq!(risk.overall_risk, RiskLevel::Moderate);
    }

    #[test]
    fn calm_strong_trend_is_low_risk() {
        let risk = assess(
            &snapshot(100.0, Some(0.5)),
            &condition(Some(TrendStrength::VeryStrong), Some(Sentiment::Neutral), Vec::new()),
        );
        assert_eq!(risk.volatility_risk, RiskLevel::Low);
        assert_eq!(risk.trend_risk, RiskLevel::Low);
        // (1 + 1 + 3 + 3) / 4 = 2
        assert_eq!(risk.overall_risk, RiskLevel::SomewhatLow);
    }

    #[test]
    fn stressed_market_is_high_risk() {
        let level = KeyLevel {
            price: 100.5,
            kind: LevelKind::Resistance,
            strength: 4,
        };
        let risk = assess(
            &snapshot(100.0, Some(3.5)),
            &condition(
                Some(TrendStrength::NoTrend),
                Some(Sentiment::OversoldExtreme),
                vec![level],
            ),
        );
        assert_eq!(risk.volatility_risk, RiskLevel::VeryHigh);
        assert_eq!(risk.trend_risk, RiskLevel::High);
        assert_eq!(risk.sentiment_risk, RiskLevel::High);
        assert_eq!(risk.key_level_risk, RiskLevel::High);
        // (6 + 5 + 5 + 5) / 4 = 5.25
        assert_eq!(risk.overall_risk, RiskLevel::VeryHigh);
        assert!(risk.overall_risk.is_elevated());
    }

    #[test]
    fn nearest_key_level_wins() {
        let far = KeyLevel {
            price: 90.0,
            kind: LevelKind::Support,
            strength: 9,
        };
        let near = KeyLevel {
            price: 102.0,
            kind: LevelKind::Resistance,
            strength: 3,
        };
        let risk = assess(&snapshot(100.0, None), &condition(None, None, vec![far, near]));
        assert_eq!(risk.key_level_risk, RiskLevel::SomewhatHigh);
    }

    #[test]
    fn ranks_are_ordered() {
        assert_eq!(RiskLevel::Low.rank(), 1);
        assert_eq!(RiskLevel::VeryHigh.rank(), 6);
        assert!(RiskLevel::High > RiskLevel::Moderate);
    }
}
