use std::path::PathBuf;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing_subscriber::EnvFilter;

use index_advisor::config::{self, AppConfig};
use index_advisor::{PriceSeries, analyze};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("input data error")]
    Input,
    #[display("analysis error")]
    Analysis,
    #[display("output error")]
    Output,
}

#[derive(Parser)]
#[command(
    name = "index-advisor",
    about = "Technical analysis and trade recommendation for a daily price series"
)]
struct Cli {
    /// JSON file holding an array of daily bars
    #[arg(short, long)]
    input: PathBuf,

    /// Optional TOML configuration file; built-in defaults otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report on one line instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn main() {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };

    init_tracing(&config);

    let series = PriceSeries::load(&cli.input).change_context(AppError::Input)?;
    tracing::debug!(path = %cli.input.display(), bars = series.len(), "bars loaded");

    let report = analyze(&series, &config).change_context(AppError::Analysis)?;

    let json = if cli.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .change_context(AppError::Output)?;
    println!("{json}");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    // Logs go to stderr so stdout carries only the report.
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
