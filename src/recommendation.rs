use serde::Serialize;

use crate::forecast::{Direction, Prediction};
use crate::indicator::snapshot::IndicatorSnapshot;
use crate::market::{MarketCondition, MarketPhase};
use crate::risk::{RiskAssessment, RiskLevel};
use crate::signal::TradingSignals;
use crate::thresholds::{BUY_DAMPENING, RECOMMENDATION_CONFIDENCE};

/// Winner must beat the opposite side by this factor.
const DECISION_MARGIN: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Scores {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl Scores {
    fn max(&self) -> f64 {
        self.buy.max(self.sell).max(self.hold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: Confidence,
    pub explanation: String,
    pub scores: Scores,
}

/// Everything the synthesizer weighs. `forecast` is the shortest ready
/// horizon, if any.
pub struct Evidence<'a> {
    pub snapshot: &'a IndicatorSnapshot,
    pub condition: &'a MarketCondition,
    pub forecast: Option<&'a Prediction>,
    pub risk: &'a RiskAssessment,
    pub signals: &'a TradingSignals,
}

pub fn recommend(evidence: &Evidence<'_>) -> Recommendation {
    let scores = tally(evidence);

    let Some((action, confidence)) = decide(&scores) else {
        return Recommendation {
            action: Action::Hold,
            confidence: Confidence::Low,
            explanation: "No clear signal; staying on the sidelines is recommended.".into(),
            scores,
        };
    };

    let mut explanation = explain(action, evidence.condition.phase, evidence.forecast);
    let overall = evidence.risk.overall_risk;
    if overall.is_elevated() {
        let label = if overall == RiskLevel::VeryHigh {
            "very high"
        } else {
            "high"
        };
        explanation.push_str(&format!(
            " Overall risk is currently {label}, so act with caution."
        ));
    }

    Recommendation {
        action,
        confidence,
        explanation,
        scores,
    }
}

/// `None` when no side scored at all.
fn decide(scores: &Scores) -> Option<(Action, Confidence)> {
    let best = scores.max();
    if best == 0.0 {
        return None;
    }

    Some(
        if scores.buy == best && scores.buy > scores.sell * DECISION_MARGIN {
            (Action::Buy, RECOMMENDATION_CONFIDENCE.grade(scores.buy))
        } else if scores.sell == best && scores.sell > scores.buy * DECISION_MARGIN {
            (Action::Sell, RECOMMENDATION_CONFIDENCE.grade(scores.sell))
        } else {
            (Action::Hold, Confidence::Medium)
        },
    )
}

fn tally(evidence: &Evidence<'_>) -> Scores {
    let mut scores = Scores::default();

    if let Some(prediction) = evidence.forecast {
        match prediction.direction {
            Direction::Up => scores.buy += prediction.confidence,
            Direction::Down => scores.sell += prediction.confidence,
            Direction::Flat => scores.hold += 1.0,
        }
    }

    if let Some(rsi) = evidence.snapshot.rsi {
        if rsi < 30.0 {
            scores.buy += 1.0;
        } else if rsi > 70.0 {
            scores.sell += 1.0;
        } else {
            scores.hold += 0.5;
        }
    }

    if let Some(macd) = evidence.snapshot.macd {
        if macd.macd > macd.signal {
            scores.buy += 0.8;
        } else if macd.macd < macd.signal {
            scores.sell += 0.8;
        }
    }

    match evidence.condition.phase {
        MarketPhase::Bull => scores.buy += 1.0,
        MarketPhase::Bear => scores.sell += 1.0,
        MarketPhase::Transition => {}
    }

    let weight = evidence.signals.verdict.weight();
    if weight > 0.0 {
        scores.buy += weight;
    } else if weight < 0.0 {
        scores.sell += weight.abs();
    } else {
        scores.hold += 0.5;
    }

    let rank = usize::from(evidence.risk.overall_risk.rank());
    scores.buy *= BUY_DAMPENING[rank - 1];

    scores
}

fn explain(action: Action, phase: MarketPhase, forecast: Option<&Prediction>) -> String {
    let direction = forecast.map(|p| p.direction);
    match action {
        Action::Buy if phase == MarketPhase::Bull => {
            "Buy signal inside a bull market; trading with the trend is favoured.".into()
        }
        Action::Buy => match forecast {
            Some(p) if direction == Some(Direction::Up) => format!(
                "A short-term rise of {:.1}% is forecast and technical indicators point to buying.",
                p.magnitude_pct
            ),
            _ => "Several technical indicators are signalling a buy.".into(),
        },
        Action::Sell if phase == MarketPhase::Bear => {
            "Sell signal inside a bear market; the downtrend may continue.".into()
        }
        Action::Sell => match forecast {
            Some(p) if direction == Some(Direction::Down) => format!(
                "A short-term decline of {:.1}% is forecast and technical indicators point to selling.",
                -p.magnitude_pct
            ),
            _ => "Several technical indicators are signalling a sell.".into(),
        },
        Action::Hold => "No clear direction; waiting is recommended.".into(),
    }
}
