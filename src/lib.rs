pub mod analysis;
pub mod config;
pub mod error;
pub mod forecast;
pub mod indicator;
pub mod market;
pub mod model;
pub mod performance;
pub mod recommendation;
pub mod risk;
pub mod signal;
pub mod thresholds;

pub use analysis::{AnalysisReport, analyze};
pub use config::AppConfig;
pub use model::{Bar, PriceSeries};
