//! Fixed-threshold classification tables.
//!
//! Each table is an ordered list of bands; the first band whose cut admits
//! the value decides the grade, otherwise the table's fallback applies.
//! Bump [`THRESHOLDS_VERSION`] whenever a cut or grade changes.

use crate::market::{Sentiment, TrendStrength, VolatilityState};
use crate::recommendation::Confidence;
use crate::risk::RiskLevel;

pub const THRESHOLDS_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cut {
    /// value > bound
    Above(f64),
    /// value < bound
    Below(f64),
}

impl Cut {
    pub fn admits(self, value: f64) -> bool {
        match self {
            Self::Above(bound) => value > bound,
            Self::Below(bound) => value < bound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band<T> {
    pub cut: Cut,
    pub grade: T,
}

#[derive(Debug, Clone, Copy)]
pub struct Table<T: 'static> {
    pub bands: &'static [Band<T>],
    pub fallback: T,
}

impl<T: Copy> Table<T> {
    pub fn grade(&self, value: f64) -> T {
        self.bands
            .iter()
            .find(|band| band.cut.admits(value))
            .map(|band| band.grade)
            .unwrap_or(self.fallback)
    }
}

const fn band<T>(cut: Cut, grade: T) -> Band<T> {
    Band { cut, grade }
}

/// ADX → trend strength.
pub const TREND_STRENGTH: Table<TrendStrength> = Table {
    bands: &[
        band(Cut::Above(50.0), TrendStrength::VeryStrong),
        band(Cut::Above(40.0), TrendStrength::Strong),
        band(Cut::Above(30.0), TrendStrength::Moderate),
        band(Cut::Above(20.0), TrendStrength::Weak),
    ],
    fallback: TrendStrength::NoTrend,
};

/// Daily volatility (%) → volatility state.
pub const VOLATILITY_STATE: Table<VolatilityState> = Table {
    bands: &[
        band(Cut::Above(3.0), VolatilityState::VeryHigh),
        band(Cut::Above(2.0), VolatilityState::High),
        band(Cut::Below(0.8), VolatilityState::VeryLow),
        band(Cut::Below(1.2), VolatilityState::Low),
    ],
    fallback: VolatilityState::Normal,
};

/// RSI → sentiment.
pub const SENTIMENT: Table<Sentiment> = Table {
    bands: &[
        band(Cut::Above(80.0), Sentiment::OverboughtExtreme),
        band(Cut::Above(70.0), Sentiment::Overbought),
        band(Cut::Below(20.0), Sentiment::OversoldExtreme),
        band(Cut::Below(30.0), Sentiment::Oversold),
    ],
    fallback: Sentiment::Neutral,
};

/// Daily volatility (%) → volatility risk.
pub const VOLATILITY_RISK: Table<RiskLevel> = Table {
    bands: &[
        band(Cut::Above(3.0), RiskLevel::VeryHigh),
        band(Cut::Above(2.0), RiskLevel::High),
        band(Cut::Above(1.5), RiskLevel::Moderate),
    ],
    fallback: RiskLevel::Low,
};

/// Distance (%) from price to the nearest key level → key-level risk.
pub const KEY_LEVEL_RISK: Table<RiskLevel> = Table {
    bands: &[
        band(Cut::Below(1.0), RiskLevel::High),
        band(Cut::Below(3.0), RiskLevel::SomewhatHigh),
    ],
    fallback: RiskLevel::Moderate,
};

/// Mean risk rank (1..6) → overall risk.
pub const OVERALL_RISK: Table<RiskLevel> = Table {
    bands: &[
        band(Cut::Above(5.0), RiskLevel::VeryHigh),
        band(Cut::Above(4.0), RiskLevel::High),
        band(Cut::Above(3.0), RiskLevel::SomewhatHigh),
        band(Cut::Above(2.0), RiskLevel::Moderate),
        band(Cut::Above(1.0), RiskLevel::SomewhatLow),
    ],
    fallback: RiskLevel::Low,
};

/// |predicted return| (fraction) → forecast confidence.
pub const FORECAST_CONFIDENCE: Table<f64> = Table {
    bands: &[
        band(Cut::Above(0.05), 0.9),
        band(Cut::Above(0.02), 0.8),
        band(Cut::Above(0.01), 0.7),
    ],
    fallback: 0.6,
};

/// Winning recommendation score → confidence tier.
pub const RECOMMENDATION_CONFIDENCE: Table<Confidence> = Table {
    bands: &[
        band(Cut::Above(3.0), Confidence::High),
        band(Cut::Above(2.0), Confidence::Medium),
    ],
    fallback: Confidence::Low,
};

/// Buy-score multiplier indexed by `RiskLevel::rank() - 1`.
pub const BUY_DAMPENING: [f64; 6] = [1.2, 1.1, 1.0, 0.9, 0.8, 0.7];
