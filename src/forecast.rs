pub mod features;
pub mod regression;

use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::model::PriceSeries;
use crate::thresholds::FORECAST_CONFIDENCE;

use features::FeatureRow;
use regression::{LinearFit, Standardizer, fit_ols};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Sign of `value`; exact zero is flat.
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Up
        } else if value < 0.0 {
            Self::Down
        } else {
            Self::Flat
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub direction: Direction,
    /// Predicted return over the horizon, in percent.
    pub magnitude_pct: f64,
    pub confidence: f64,
    pub horizon_days: usize,
    pub current_price: f64,
    pub predicted_price: f64,
}

/// Outcome of one horizon's forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Forecast {
    Ready(Prediction),
    InsufficientData { required: usize, available: usize },
    CalculationError { reason: String },
}

impl Forecast {
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::Ready(prediction) => Some(prediction),
            _ => None,
        }
    }
}

/// Predict the `horizon`-bar return of `series` from a model fitted on the
/// series itself. Never fails: short history and fit problems come back as
/// the non-ready variants.
pub fn forecast(series: &PriceSeries, horizon: usize, config: &ForecastConfig) -> Forecast {
    match predict(&series.closes(), horizon, config) {
        Ok(prediction) => Forecast::Ready(prediction),
        Err(report) => match report.current_context() {
            ForecastError::InsufficientHistory {
                required,
                available,
            } => {
                tracing::debug!(horizon, required, available, "forecast skipped");
                Forecast::InsufficientData {
                    required: *required,
                    available: *available,
                }
            }
            _ => {
                tracing::warn!(horizon, error = ?report, "forecast failed");
                Forecast::CalculationError {
                    reason: report.current_context().to_string(),
                }
            }
        },
    }
}

/// Standardizer fitted on the labelled training split, ready to score the
/// latest row.
struct TrainedModel<'a> {
    scaler: Standardizer,
    fit: LinearFit,
    train_rows: usize,
    latest: &'a FeatureRow,
}

fn train<'a>(
    closes: &[f64],
    rows: &'a [FeatureRow],
    horizon: usize,
    config: &ForecastConfig,
) -> Result<TrainedModel<'a>, Report<ForecastError>> {
    require(config.min_rows, rows.len())?;

    let split = (rows.len() as f64 * config.train_ratio).floor() as usize;
    let targets = features::targets(closes, rows, horizon);
    let train: Vec<(&FeatureRow, f64)> = rows[..split]
        .iter()
        .zip(&targets[..split])
        .filter_map(|(row, target)| target.map(|t| (row, t)))
        .collect();
    require(config.min_train_rows, train.len())?;

    let (x, y) = features::to_matrix(&train)?;
    let scaler = Standardizer::fit(&x)?;
    let fit = fit_ols(&scaler.transform(&x)?, &y)
        .attach_with(|| format!("train rows: {}", train.len()))?;

    let Some(latest) = rows.last() else {
        return Err(Report::new(ForecastError::Features));
    };

    Ok(TrainedModel {
        scaler,
        fit,
        train_rows: train.len(),
        latest,
    })
}

fn predict(
    closes: &[f64],
    horizon: usize,
    config: &ForecastConfig,
) -> Result<Prediction, Report<ForecastError>> {
    require(config.min_bars, closes.len())?;

    let rows = features::build_rows(closes)?;
    let model = train(closes, &rows, horizon, config)?;
    tracing::trace!(horizon, train_rows = model.train_rows, "model fitted");

    let latest = model.latest;
    let latest_values = ndarray::ArrayView1::from(&latest.values);
    let predicted = model
        .fit
        .predict(model.scaler.transform_row(latest_values)?.view())?;

    Ok(Prediction {
        direction: Direction::of(predicted),
        magnitude_pct: predicted * 100.0,
        confidence: FORECAST_CONFIDENCE.grade(predicted.abs()),
        horizon_days: horizon,
        current_price: latest.price,
        predicted_price: latest.price * (1.0 + predicted),
    })
}

fn require(required: usize, available: usize) -> Result<(), Report<ForecastError>> {
    if available < required {
        return Err(Report::new(ForecastError::InsufficientHistory {
            required,
            available,
        }));
    }
    Ok(())
}

/// Direction of the least-squares slope over the trailing `window` closes.
pub fn linear_trend(closes: &[f64], window: usize) -> Option<Direction> {
    if window < 2 || closes.len() < window {
        return None;
    }

    let tail = &closes[closes.len() - window..];
    let n = window as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = tail.iter().sum::<f64>() / n;
    let (cov, var) = tail
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(cov, var), (i, &y)| {
            let dx = i as f64 - x_mean;
            (cov + dx * (y - y_mean), var + dx * dx)
        });

    Some(Direction::of(cov / var))
}
