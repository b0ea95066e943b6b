use std::collections::BTreeMap;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt, bail};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::forecast::{self, Direction, Forecast};
use crate::indicator::snapshot::IndicatorSnapshot;
use crate::market::MarketCondition;
use crate::model::PriceSeries;
use crate::performance::Performance;
use crate::recommendation::{self, Evidence, Recommendation};
use crate::risk::{self, RiskAssessment};
use crate::signal::summary::{self, MarketSummary};
use crate::signal::{self, TradingSignals};
use crate::thresholds::THRESHOLDS_VERSION;

/// Trailing window for the short-term slope trend.
const TREND_WINDOW: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub date: NaiveDate,
    pub price: f64,
    pub thresholds_version: u32,
    pub indicators: IndicatorSnapshot,
    pub market_condition: MarketCondition,
    /// Keyed by horizon in bars.
    pub predictions: BTreeMap<usize, Forecast>,
    pub short_term_trend: Option<Direction>,
    pub performance: Performance,
    pub trading_signals: TradingSignals,
    pub market_summary: MarketSummary,
    pub risk_assessment: RiskAssessment,
    pub recommendation: Recommendation,
}

/// Run the full indicator, classification, forecast and decision pipeline
/// over `series`.
pub fn analyze(
    series: &PriceSeries,
    config: &AppConfig,
) -> Result<AnalysisReport, Report<AnalysisError>> {
    let required = config.analysis.min_bars;
    if series.len() < required {
        bail!(AnalysisError::InsufficientHistory {
            required,
            available: series.len(),
        });
    }

    let last = series.last();
    tracing::info!(bars = series.len(), date = %last.date, "analysis started");

    let closes = series.closes();
    let snapshot = IndicatorSnapshot::compute(series, &config.indicators)
        .change_context(AnalysisError::Indicator)?;
    let condition =
        MarketCondition::assess(series, &snapshot, &config.analysis, &config.indicators)
            .change_context(AnalysisError::Indicator)?;

    let predictions: BTreeMap<usize, Forecast> = config
        .forecast
        .horizons
        .iter()
        .map(|&horizon| (horizon, forecast::forecast(series, horizon, &config.forecast)))
        .collect();
    let shortest = predictions
        .values()
        .next()
        .and_then(Forecast::prediction);

    let signals = signal::score(&snapshot, &condition);
    let market_summary = summary::summarize(series, &condition, &config.indicators)
        .change_context(AnalysisError::Indicator)?;
    let risk = risk::assess(&snapshot, &condition);
    let recommendation = recommendation::recommend(&Evidence {
        snapshot: &snapshot,
        condition: &condition,
        forecast: shortest,
        risk: &risk,
        signals: &signals,
    });

    tracing::info!(
        phase = ?condition.phase,
        verdict = ?signals.verdict,
        overall_risk = ?risk.overall_risk,
        action = ?recommendation.action,
        confidence = ?recommendation.confidence,
        "analysis finished"
    );

    Ok(AnalysisReport {
        date: last.date,
        price: last.close,
        thresholds_version: THRESHOLDS_VERSION,
        short_term_trend: forecast::linear_trend(&closes, TREND_WINDOW),
        performance: Performance::calculate(&closes),
        predictions,
        trading_signals: signals,
        market_summary,
        risk_assessment: risk,
        recommendation,
        indicators: snapshot,
        market_condition: condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MarketPhase, Sentiment, TrendStrength};
    use crate::model::fixtures::{series_from_closes, series_with_ranges, start_date};
    use crate::recommendation::Action;
    use crate::signal::SignalVerdict;

    fn uptrend(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 20_000.0 + 100.0 * i as f64 + 5.0 * (i as f64 * 0.7).sin())
            .collect()
    }

    #[test]
    fn refuses_short_series() {
        let err = analyze(&series_from_closes(&[100.0; 49]), &AppConfig::default()).unwrap_err();
        assert!(matches!(
            err.current_context(),
            AnalysisError::InsufficientHistory {
                required: 50,
                available: 49
            }
        ));
    }

    #[test]
    fn linear_uptrend_is_bullish() {
        let report = analyze(
            &series_with_ranges(&uptrend(300), 50.0),
            &AppConfig::default(),
        )
        .unwrap();

        assert_eq!(report.market_condition.phase, MarketPhase::Bull);
        assert!(report.market_condition.trend_strength >= Some(TrendStrength::Moderate));
        assert_ne!(report.recommendation.action, Action::Sell);
        assert_eq!(report.short_term_trend, Some(Direction::Up));
        assert!(report.performance.returns.yearly.unwrap() > 0.0);
        assert_eq!(report.predictions.len(), 2);
    }

    #[test]
    fn close_only_uptrend_still_grades_trend() {
        let report = analyze(&series_from_closes(&uptrend(300)), &AppConfig::default()).unwrap();

        assert_eq!(report.market_condition.phase, MarketPhase::Bull);
        assert!(report.market_condition.trend_strength >= Some(TrendStrength::Moderate));
        assert_ne!(report.recommendation.action, Action::Sell);
    }

    #[test]
    fn constant_series_is_neutral() {
        let report = analyze(&series_from_closes(&[100.0; 250]), &AppConfig::default()).unwrap();

        assert_eq!(report.indicators.rsi, Some(50.0));
        assert_eq!(report.market_condition.sentiment, Some(Sentiment::Neutral));
        let macd = report.indicators.macd.unwrap();
        assert!(macd.macd.abs() < 1e-9);
        assert_eq!(report.trading_signals.verdict, SignalVerdict::Neutral);
        assert_eq!(report.recommendation.action, Action::Hold);
        assert_eq!(report.short_term_trend, Some(Direction::Flat));
    }

    #[test]
    fn sharp_drop_reads_below_lower_band() {
        let mut closes = vec![100.0; 99];
        closes.push(90.0);
        let report = analyze(&series_from_closes(&closes), &AppConfig::default()).unwrap();

        let bollinger = report.trading_signals.individual.bollinger.unwrap();
        assert_eq!(bollinger.to_string(), "buy (below lower band)");
        assert!((report.performance.returns.daily.unwrap() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn report_serializes_with_closed_vocabulary() {
        let report = analyze(&series_from_closes(&[100.0; 250]), &AppConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        let last_date = start_date() + chrono::Days::new(249);
        assert_eq!(json["date"], last_date.to_string());
        assert_eq!(json["thresholds_version"], THRESHOLDS_VERSION);
        assert_eq!(json["recommendation"]["action"], "hold");
        assert_eq!(json["market_summary"]["signal"], "hold");
        assert_eq!(json["market_summary"]["confidence"], "low");
        assert_eq!(json["market_condition"]["phase"], "transition");
        assert_eq!(json["predictions"]["7"]["status"], "ready");
        assert_eq!(json["predictions"]["7"]["direction"], "flat");
        assert_eq!(json["market_condition"]["trend_strength"], "none");
        assert!(json["recommendation"]["explanation"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn analysis_is_deterministic() {
        let series = series_with_ranges(&uptrend(120), 30.0);
        let config = AppConfig::default();
        assert_eq!(analyze(&series, &config).unwrap(), analyze(&series, &config).unwrap());
    }
}
