//! Sentiment Report Binary
//!
//! Run with: `DATASETS=english=data/english.csv cargo run --bin sentiment-report`

use fuel_sentiment::{ComparisonReport, CsvRecordSource, Dataset, RecordSource, ReportConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays valid JSON. Set RUST_LOG to control
    // the level:
    //   RUST_LOG=debug cargo run --bin sentiment-report
    //   RUST_LOG=fuel_sentiment::csv_source=info cargo run --bin sentiment-report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = ReportConfig::from_env()?;
    tracing::info!(
        datasets = config.datasets.len(),
        providers = ?config.providers,
        threshold = config.aggregator.large_change_threshold,
        direction = %config.aggregator.direction,
        "Starting sentiment report"
    );

    let datasets = config
        .datasets
        .iter()
        .map(|input| CsvRecordSource::from_path(input.name.clone(), &input.path).load())
        .collect::<Result<Vec<Dataset>, _>>()?;

    let report = ComparisonReport::compute(&datasets, &config.providers, &config.aggregator)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
