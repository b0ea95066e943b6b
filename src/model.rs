use std::path::Path;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt, bail};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One daily OHLCV bar. Only `close` is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Bar {
    /// A bar carrying only a close price.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    pub fn high_or_close(&self) -> f64 {
        self.high.unwrap_or(self.close)
    }

    pub fn low_or_close(&self) -> f64 {
        self.low.unwrap_or(self.close)
    }
}

/// Validated, immutable, date-ordered sequence of bars.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate and wrap `bars`.
    ///
    /// Rejects an empty input, non-increasing dates, non-finite or
    /// non-positive closes and bars whose high is below their low.
    pub fn new(bars: Vec<Bar>) -> Result<Self, Report<DataError>> {
        if bars.is_empty() {
            bail!(DataError::Empty);
        }

        for bar in &bars {
            validate_bar(bar)?;
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                bail!(DataError::Unordered {
                    date: pair[1].date.to_string(),
                });
            }
        }

        Ok(Self { bars })
    }

    /// Parse a JSON array of bars.
    pub fn from_json(json: &str) -> Result<Self, Report<DataError>> {
        let bars: Vec<Bar> = serde_json::from_str(json).change_context(DataError::Parse)?;
        Self::new(bars)
    }

    /// Load a JSON array of bars from `path`.
    pub fn load(path: &Path) -> Result<Self, Report<DataError>> {
        let content = std::fs::read_to_string(path)
            .change_context(DataError::ReadFile)
            .attach_with(|| format!("path: {}", path.display()))?;
        Self::from_json(&content).attach_with(|| format!("path: {}", path.display()))
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> &Bar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Highs, falling back to the close where a bar has none.
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::high_or_close).collect()
    }

    /// Lows, falling back to the close where a bar has none.
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::low_or_close).collect()
    }
}

fn validate_bar(bar: &Bar) -> Result<(), Report<DataError>> {
    let invalid = |reason: &str| DataError::InvalidBar {
        date: bar.date.to_string(),
        reason: reason.into(),
    };

    if !bar.close.is_finite() || bar.close <= 0.0 {
        bail!(invalid("close must be finite and > 0"));
    }

    let optional = [bar.open, bar.high, bar.low, bar.volume];
    if optional.iter().flatten().any(|v| !v.is_finite()) {
        bail!(invalid("non-finite value"));
    }

    if let (Some(high), Some(low)) = (bar.high, bar.low) {
        if high < low {
            bail!(invalid("high below low"));
        }
    }

    Ok(())
}
