use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_multiplier() -> f64 {
    2.0
}

fn default_stochastic_period() -> usize {
    14
}

fn default_stochastic_smooth() -> usize {
    3
}

fn default_adx_period() -> usize {
    14
}

fn default_fibonacci_lookback() -> usize {
    90
}

fn default_volatility_window() -> usize {
    20
}

fn default_horizons() -> Vec<usize> {
    vec![7, 30]
}

fn default_forecast_min_bars() -> usize {
    60
}

fn default_min_rows() -> usize {
    30
}

fn default_min_train_rows() -> usize {
    20
}

fn default_train_ratio() -> f64 {
    0.8
}

fn default_analysis_min_bars() -> usize {
    50
}

fn default_level_lookback() -> usize {
    60
}

fn default_level_tolerance() -> f64 {
    0.01
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Indicator windows used for the snapshot and the signal scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_multiplier")]
    pub bollinger_multiplier: f64,
    #[serde(default = "default_stochastic_period")]
    pub stochastic_period: usize,
    #[serde(default = "default_stochastic_smooth")]
    pub stochastic_smooth: usize,
    #[serde(default = "default_adx_period")]
    pub adx_period: usize,
    #[serde(default = "default_fibonacci_lookback")]
    pub fibonacci_lookback: usize,
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_period: default_bollinger_period(),
            bollinger_multiplier: default_bollinger_multiplier(),
            stochastic_period: default_stochastic_period(),
            stochastic_smooth: default_stochastic_smooth(),
            adx_period: default_adx_period(),
            fibonacci_lookback: default_fibonacci_lookback(),
            volatility_window: default_volatility_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Forecast horizons in bars; the shortest one feeds the recommendation.
    #[serde(default = "default_horizons")]
    pub horizons: Vec<usize>,
    #[serde(default = "default_forecast_min_bars")]
    pub min_bars: usize,
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    #[serde(default = "default_min_train_rows")]
    pub min_train_rows: usize,
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizons: default_horizons(),
            min_bars: default_forecast_min_bars(),
            min_rows: default_min_rows(),
            min_train_rows: default_min_train_rows(),
            train_ratio: default_train_ratio(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_min_bars")]
    pub min_bars: usize,
    /// Trailing closes considered for support/resistance clustering.
    #[serde(default = "default_level_lookback")]
    pub level_lookback: usize,
    /// Relative distance from a cluster centroid that still joins the cluster.
    #[serde(default = "default_level_tolerance")]
    pub level_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_bars: default_analysis_min_bars(),
            level_lookback: default_level_lookback(),
            level_tolerance: default_level_tolerance(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_indicators(&config.indicators)?;
    validate_forecast(&config.forecast)?;
    validate_analysis(&config.analysis)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not valid",
            general.log_format
        )));
    }
    Ok(())
}

fn validate_indicators(indicators: &IndicatorConfig) -> Result<(), Report<ConfigError>> {
    let periods = [
        ("rsi_period", indicators.rsi_period),
        ("macd_fast", indicators.macd_fast),
        ("macd_slow", indicators.macd_slow),
        ("macd_signal", indicators.macd_signal),
        ("bollinger_period", indicators.bollinger_period),
        ("stochastic_period", indicators.stochastic_period),
        ("stochastic_smooth", indicators.stochastic_smooth),
        ("adx_period", indicators.adx_period),
        ("fibonacci_lookback", indicators.fibonacci_lookback),
        ("volatility_window", indicators.volatility_window),
    ];
    for (name, value) in periods {
        if value == 0 {
            return Err(invalid(format!("indicators.{name} must be > 0")));
        }
    }

    if indicators.macd_fast >= indicators.macd_slow {
        return Err(invalid(format!(
            "indicators.macd_fast ({}) must be < macd_slow ({})",
            indicators.macd_fast, indicators.macd_slow
        )));
    }

    let windows = [
        ("bollinger_period", indicators.bollinger_period),
        ("fibonacci_lookback", indicators.fibonacci_lookback),
        ("volatility_window", indicators.volatility_window),
    ];
    for (name, value) in windows {
        if value < 2 {
            return Err(invalid(format!("indicators.{name} must be >= 2")));
        }
    }

    if indicators.bollinger_multiplier <= 0.0 {
        return Err(invalid(
            "indicators.bollinger_multiplier must be > 0".into(),
        ));
    }

    Ok(())
}

fn validate_forecast(forecast: &ForecastConfig) -> Result<(), Report<ConfigError>> {
    if forecast.horizons.is_empty() {
        return Err(invalid("forecast.horizons must not be empty".into()));
    }
    if forecast.horizons.contains(&0) {
        return Err(invalid("forecast.horizons must all be > 0".into()));
    }
    if !(forecast.train_ratio > 0.0 && forecast.train_ratio < 1.0) {
        return Err(invalid(format!(
            "forecast.train_ratio {} must be in (0, 1)",
            forecast.train_ratio
        )));
    }
    if forecast.min_train_rows == 0 {
        return Err(invalid("forecast.min_train_rows must be > 0".into()));
    }
    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), Report<ConfigError>> {
    if analysis.min_bars < 2 {
        return Err(invalid("analysis.min_bars must be >= 2".into()));
    }
    if analysis.level_lookback == 0 {
        return Err(invalid("analysis.level_lookback must be > 0".into()));
    }
    if !(analysis.level_tolerance > 0.0 && analysis.level_tolerance < 1.0) {
        return Err(invalid(format!(
            "analysis.level_tolerance {} must be in (0, 1)",
            analysis.level_tolerance
        )));
    }
    Ok(())
}
