pub mod summary;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::indicator::snapshot::IndicatorSnapshot;
use crate::market::{MarketCondition, MarketPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    StrongBuy,
    Buy,
    WeakBuy,
    Neutral,
    WeakSell,
    Sell,
    StrongSell,
}

impl Stance {
    pub fn is_buy(self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy | Self::WeakBuy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell | Self::WeakSell)
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StrongBuy => "strong buy",
            Self::Buy => "buy",
            Self::WeakBuy => "weak buy",
            Self::Neutral => "neutral",
            Self::WeakSell => "weak sell",
            Self::Sell => "sell",
            Self::StrongSell => "strong sell",
        };
        f.write_str(label)
    }
}

/// One indicator's reading, rendered as e.g. `"buy (oversold)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSignal {
    pub stance: Stance,
    pub note: Option<&'static str>,
}

impl IndicatorSignal {
    fn plain(stance: Stance) -> Self {
        Self { stance, note: None }
    }

    fn noted(stance: Stance, note: &'static str) -> Self {
        Self {
            stance,
            note: Some(note),
        }
    }
}

impl fmt::Display for IndicatorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.note {
            Some(note) => write!(f, "{} ({note})", self.stance),
            None => write!(f, "{}", self.stance),
        }
    }
}

impl Serialize for IndicatorSignal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndividualSignals {
    pub rsi: Option<IndicatorSignal>,
    pub macd: Option<IndicatorSignal>,
    pub bollinger: Option<IndicatorSignal>,
    pub stochastic: Option<IndicatorSignal>,
    pub trend: Option<IndicatorSignal>,
}

impl IndividualSignals {
    fn iter(&self) -> impl Iterator<Item = &IndicatorSignal> {
        [
            &self.rsi,
            &self.macd,
            &self.bollinger,
            &self.stochastic,
            &self.trend,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinedSignal {
    Buy,
    WeakBuy,
    Neutral,
    WeakSell,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    Strong,
    Moderate,
    Weak,
    None,
}

/// Combined signal after reconciling it with the market phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalVerdict {
    StrongBuy,
    Buy,
    WeakBuy,
    CautiousBuy,
    Neutral,
    CautiousSell,
    WeakSell,
    Sell,
    StrongSell,
}

impl SignalVerdict {
    /// Signed weight in the recommendation: positive favours buying.
    pub fn weight(self) -> f64 {
        match self {
            Self::StrongBuy => 1.5,
            Self::Buy => 1.0,
            Self::WeakBuy | Self::CautiousBuy => 0.5,
            Self::Neutral => 0.0,
            Self::WeakSell | Self::CautiousSell => -0.5,
            Self::Sell => -1.0,
            Self::StrongSell => -1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TradingSignals {
    pub individual: IndividualSignals,
    pub buy_count: usize,
    pub sell_count: usize,
    pub combined: CombinedSignal,
    pub strength: SignalStrength,
    pub verdict: SignalVerdict,
}

/// Score every available indicator, aggregate the votes and reconcile the
/// result with the market phase.
pub fn score(snapshot: &IndicatorSnapshot, condition: &MarketCondition) -> TradingSignals {
    let price = snapshot.price;
    let individual = IndividualSignals {
        rsi: snapshot.rsi.map(rsi_signal),
        macd: snapshot.macd.map(|p| macd_signal(p.macd, p.signal)),
        bollinger: snapshot
            .bollinger
            .map(|bands| bollinger_signal(price, bands.upper, bands.lower, bands.position(price))),
        stochastic: snapshot.stochastic.map(|p| stochastic_signal(p.k, p.d)),
        trend: snapshot
            .sma_20
            .map(|sma_20| trend_signal(price, sma_20, snapshot.sma_50, snapshot.sma_200)),
    };

    let buy_count = individual.iter().filter(|s| s.stance.is_buy()).count();
    let sell_count = individual.iter().filter(|s| s.stance.is_sell()).count();
    let (combined, strength) = combine(buy_count, sell_count);

    TradingSignals {
        individual,
        buy_count,
        sell_count,
        combined,
        strength,
        verdict: reconcile(condition.phase, combined),
    }
}

fn rsi_signal(rsi: f64) -> IndicatorSignal {
    if rsi < 30.0 {
        IndicatorSignal::noted(Stance::Buy, "oversold")
    } else if rsi > 70.0 {
        IndicatorSignal::noted(Stance::Sell, "overbought")
    } else {
        IndicatorSignal::plain(Stance::Neutral)
    }
}

fn macd_signal(macd: f64, signal: f64) -> IndicatorSignal {
    let stance = if macd > signal && macd > 0.0 {
        Stance::StrongBuy
    } else if macd > signal {
        Stance::WeakBuy
    } else if macd < signal && macd < 0.0 {
        Stance::StrongSell
    } else if macd < signal {
        Stance::WeakSell
    } else {
        Stance::Neutral
    };
    IndicatorSignal::plain(stance)
}

fn bollinger_signal(price: f64, upper: f64, lower: f64, position: Option<f64>) -> IndicatorSignal {
    if price > upper {
        return IndicatorSignal::noted(Stance::Sell, "above upper band");
    }
    if price < lower {
        return IndicatorSignal::noted(Stance::Buy, "below lower band");
    }
    match position {
        Some(p) if p > 0.8 => IndicatorSignal::noted(Stance::WeakSell, "near upper band"),
        Some(p) if p < 0.2 => IndicatorSignal::noted(Stance::WeakBuy, "near lower band"),
        _ => IndicatorSignal::plain(Stance::Neutral),
    }
}

fn stochastic_signal(k: f64, d: f64) -> IndicatorSignal {
    if k < 20.0 && d < 20.0 {
        IndicatorSignal::noted(Stance::Buy, "oversold")
    } else if k > 80.0 && d > 80.0 {
        IndicatorSignal::noted(Stance::Sell, "overbought")
    } else if k > d {
        IndicatorSignal::plain(Stance::WeakBuy)
    } else if k < d {
        IndicatorSignal::plain(Stance::WeakSell)
    } else {
        IndicatorSignal::plain(Stance::Neutral)
    }
}

/// Missing longer averages never satisfy a comparison, so a short series
/// falls through to the SMA20 readings.
fn trend_signal(
    price: f64,
    sma_20: f64,
    sma_50: Option<f64>,
    sma_200: Option<f64>,
) -> IndicatorSignal {
    let above = |ma: Option<f64>| ma.is_some_and(|m| price > m);
    let below = |ma: Option<f64>| ma.is_some_and(|m| price < m);
    let stacked_up = matches!((sma_50, sma_200), (Some(m), Some(l)) if m > l);
    let stacked_down = matches!((sma_50, sma_200), (Some(m), Some(l)) if m < l);

    if price > sma_20 && above(sma_50) && above(sma_200) {
        IndicatorSignal::noted(Stance::StrongBuy, "above all moving averages")
    } else if price < sma_20 && below(sma_50) && below(sma_200) {
        IndicatorSignal::noted(Stance::StrongSell, "below all moving averages")
    } else if above(sma_50) && stacked_up {
        IndicatorSignal::noted(Stance::Buy, "golden cross alignment")
    } else if below(sma_50) && stacked_down {
        IndicatorSignal::noted(Stance::Sell, "dead cross alignment")
    } else if price > sma_20 {
        IndicatorSignal::plain(Stance::WeakBuy)
    } else if price < sma_20 {
        IndicatorSignal::plain(Stance::WeakSell)
    } else {
        IndicatorSignal::plain(Stance::Neutral)
    }
}

fn combine(buy: usize, sell: usize) -> (CombinedSignal, SignalStrength) {
    let graded = |count: usize| {
        if count >= 4 {
            SignalStrength::Strong
        } else {
            SignalStrength::Moderate
        }
    };

    if buy >= 3 && buy > sell + 1 {
        (CombinedSignal::Buy, graded(buy))
    } else if sell >= 3 && sell > buy + 1 {
        (CombinedSignal::Sell, graded(sell))
    } else if buy > sell {
        (CombinedSignal::WeakBuy, SignalStrength::Weak)
    } else if sell > buy {
        (CombinedSignal::WeakSell, SignalStrength::Weak)
    } else {
        (CombinedSignal::Neutral, SignalStrength::None)
    }
}

fn reconcile(phase: MarketPhase, combined: CombinedSignal) -> SignalVerdict {
    match (phase, combined) {
        (MarketPhase::Bull, CombinedSignal::Buy) => SignalVerdict::StrongBuy,
        (MarketPhase::Bear, CombinedSignal::Sell) => SignalVerdict::StrongSell,
        (MarketPhase::Bull, CombinedSignal::Sell) => SignalVerdict::CautiousSell,
        (MarketPhase::Bear, CombinedSignal::Buy) => SignalVerdict::CautiousBuy,
        (_, CombinedSignal::Buy) => SignalVerdict::Buy,
        (_, CombinedSignal::WeakBuy) => SignalVerdict::WeakBuy,
        (_, CombinedSignal::Neutral) => SignalVerdict::Neutral,
        (_, CombinedSignal::WeakSell) => SignalVerdict::WeakSell,
        (_, CombinedSignal::Sell) => SignalVerdict::Sell,
    }
}
