//! Vote-based market summary and the oversold-reversal marker series.

use chrono::NaiveDate;
use error_stack::Report;
use serde::Serialize;

use super::{IndicatorSignal, Stance};
use crate::config::IndicatorConfig;
use crate::error::IndicatorError;
use crate::forecast::Direction;
use crate::indicator::align_series;
use crate::indicator::macd::{Macd, MacdPoint};
use crate::indicator::rsi::Rsi;
use crate::market::{Crossover, MarketCondition};
use crate::model::PriceSeries;
use crate::recommendation::{Action, Confidence};

const OVERSOLD: f64 = 30.0;
const OVERBOUGHT: f64 = 70.0;

/// Lead one side needs to win the vote, and to win it with high confidence.
const WIN_MARGIN: f64 = 1.0;
const HIGH_MARGIN: f64 = 3.0;

const CROSSOVER_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Votes {
    pub buy: f64,
    pub sell: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub rsi: Option<IndicatorSignal>,
    pub macd: Option<IndicatorSignal>,
    pub votes: Votes,
    pub signal: Action,
    pub confidence: Confidence,
    /// Bars where RSI stayed oversold for two bars while MACD crossed above
    /// its signal line.
    pub strong_buy_dates: Vec<NaiveDate>,
}

/// Weigh the RSI and MACD readings, the moving-average trend and any fresh
/// crossover into one buy/sell/hold vote.
pub fn summarize(
    series: &PriceSeries,
    condition: &MarketCondition,
    config: &IndicatorConfig,
) -> Result<MarketSummary, Report<IndicatorError>> {
    let closes = series.closes();
    let n = closes.len();
    let rsi = aligned(n, Rsi::new(config.rsi_period)?.calculate_prices(&closes))?;
    let macd = aligned(
        n,
        Macd::new(config.macd_fast, config.macd_slow, config.macd_signal)?
            .calculate_prices(&closes),
    )?;

    let rsi_signal = rsi.last().copied().flatten().map(rsi_reading);
    let macd_signal = match macd.as_slice() {
        [.., Some(prev), Some(now)] => Some(macd_reading(*prev, *now)),
        _ => None,
    };

    let votes = tally(rsi_signal, macd_signal, condition);
    let (signal, confidence) = decide(&votes);

    let bars = series.bars();
    let strong_buy_dates = strong_buy_bars(&rsi, &macd)
        .into_iter()
        .map(|i| bars[i].date)
        .collect();

    Ok(MarketSummary {
        rsi: rsi_signal,
        macd: macd_signal,
        votes,
        signal,
        confidence,
        strong_buy_dates,
    })
}

fn aligned<T: Clone>(
    total_len: usize,
    result: Result<Vec<T>, Report<IndicatorError>>,
) -> Result<Vec<Option<T>>, Report<IndicatorError>> {
    match result {
        Ok(values) => Ok(align_series(total_len, values)),
        Err(report) => match report.current_context() {
            IndicatorError::InsufficientData { .. } => Ok(vec![None; total_len]),
            _ => Err(report),
        },
    }
}

/// Inclusive bounds, unlike the scorer's RSI signal.
fn rsi_reading(rsi: f64) -> IndicatorSignal {
    if rsi <= OVERSOLD {
        IndicatorSignal::noted(Stance::Buy, "oversold")
    } else if rsi >= OVERBOUGHT {
        IndicatorSignal::noted(Stance::Sell, "overbought")
    } else {
        IndicatorSignal::plain(Stance::Neutral)
    }
}

fn macd_reading(prev: MacdPoint, now: MacdPoint) -> IndicatorSignal {
    if now.macd > now.signal && prev.macd <= prev.signal {
        IndicatorSignal::noted(Stance::Buy, "crossed above signal")
    } else if now.macd < now.signal && prev.macd >= prev.signal {
        IndicatorSignal::noted(Stance::Sell, "crossed below signal")
    } else if now.macd > now.signal {
        IndicatorSignal::noted(Stance::WeakBuy, "above signal")
    } else if now.macd < now.signal {
        IndicatorSignal::noted(Stance::WeakSell, "below signal")
    } else {
        IndicatorSignal::plain(Stance::Neutral)
    }
}

fn tally(
    rsi: Option<IndicatorSignal>,
    macd: Option<IndicatorSignal>,
    condition: &MarketCondition,
) -> Votes {
    let mut votes = Votes::default();

    for signal in [rsi, macd].into_iter().flatten() {
        if signal.stance.is_buy() {
            votes.buy += 1.0;
        } else if signal.stance.is_sell() {
            votes.sell += 1.0;
        } else {
            votes.neutral += 1.0;
        }
    }

    // Longer averages carry more weight.
    let averages = &condition.moving_averages;
    for (reading, weight) in [
        (averages.short, 0.5),
        (averages.medium, 1.0),
        (averages.long, 1.5),
    ] {
        match reading.map(|r| r.direction) {
            Some(Direction::Up) => votes.buy += weight,
            Some(Direction::Down) => votes.sell += weight,
            Some(Direction::Flat) | None => {}
        }
    }

    match condition.crossover {
        Some(Crossover::GoldenCross) => votes.buy += CROSSOVER_WEIGHT,
        Some(Crossover::DeadCross) => votes.sell += CROSSOVER_WEIGHT,
        None => {}
    }

    votes
}

fn decide(votes: &Votes) -> (Action, Confidence) {
    let graded = |lead: f64| {
        if lead > HIGH_MARGIN {
            Confidence::High
        } else {
            Confidence::Medium
        }
    };

    if votes.buy > votes.sell + WIN_MARGIN {
        (Action::Buy, graded(votes.buy - votes.sell))
    } else if votes.sell > votes.buy + WIN_MARGIN {
        (Action::Sell, graded(votes.sell - votes.buy))
    } else {
        (Action::Hold, Confidence::Low)
    }
}

/// Indices where RSI is below the oversold line on this bar and the one
/// before, and MACD crosses above its signal line on this bar.
fn strong_buy_bars(rsi: &[Option<f64>], macd: &[Option<MacdPoint>]) -> Vec<usize> {
    (1..rsi.len().min(macd.len()))
        .filter(|&i| {
            let oversold = matches!(
                (rsi[i - 1], rsi[i]),
                (Some(prev), Some(now)) if prev < OVERSOLD && now < OVERSOLD
            );
            let crossed = matches!(
                (macd[i - 1], macd[i]),
                (Some(prev), Some(now)) if now.macd > now.signal && prev.macd <= prev.signal
            );
            oversold && crossed
        })
        .collect()
}
