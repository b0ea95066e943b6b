use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum DataError {
    #[display("failed to read bar file")]
    ReadFile,
    #[display("failed to parse bars")]
    Parse,
    #[display("price series is empty")]
    Empty,
    #[display("invalid bar at {date}: {reason}")]
    InvalidBar { date: String, reason: String },
    #[display("dates are not strictly increasing at {date}")]
    Unordered { date: String },
}

#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum IndicatorError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum ForecastError {
    #[display("insufficient history: need {required}, got {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[display("feature matrix has inconsistent shape")]
    Shape,
    #[display("normal equations are singular")]
    Singular,
    #[display("non-finite value in regression")]
    NonFinite,
    #[display("feature construction failed")]
    Features,
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("insufficient history for analysis: need {required}, got {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[display("indicator configuration rejected")]
    Indicator,
}
