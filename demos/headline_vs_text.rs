//! Headline vs Text Example
//!
//! This example walks through one dataset the way an analyst would:
//! 1. Loads a CSV of price changes and sentiment scores
//! 2. Compares headline and body text sentiment on drops and hikes
//! 3. Compares petrol and diesel sensitivity per provider
//! 4. Lists large increases that were reversed within two months
//!
//! Run with: cargo run --example headline_vs_text [path/to/data.csv]

use fuel_sentiment::analytics::{Condition, SentimentAggregator};
use fuel_sentiment::report::find_reversals;
use fuel_sentiment::{AggregatorConfig, CsvRecordSource, RecordSource, SentimentPair};

fn fmt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.csv").to_string());
    let dataset = CsvRecordSource::from_path("sample", &path).load()?;
    let aggregator = SentimentAggregator::new(AggregatorConfig::default());

    println!("=== Headline vs Text: {} ({} records) ===\n", path, dataset.len());

    for provider in ["openai", "gemini"] {
        let pair = SentimentPair::for_provider(provider)?;
        println!("--- {} ---", provider);

        for condition in [Condition::Drop, Condition::Hike] {
            let polarity = aggregator.polarity(&dataset, &pair, &condition);
            println!(
                "{:>5}: n={:<3} headline={} text={} difference={}",
                condition.to_string(),
                polarity.records,
                fmt(polarity.headline_mean),
                fmt(polarity.text_mean),
                fmt(polarity.difference),
            );
            println!(
                "       text above headline {} of {} ({}%)",
                polarity.text_above_headline,
                polarity.compared,
                fmt(polarity.share(polarity.text_above_headline)),
            );
            for exception in &polarity.exceptions {
                println!(
                    "       headline above text on {}: H={:.2} T={:.2}",
                    exception.date, exception.headline, exception.text
                );
            }
        }

        let records: Vec<_> = dataset.iter().collect();
        let sensitivity = fuel_sentiment::analytics::fuel_sensitivity(&records, &pair);
        println!(
            "sensitivity: petrol={} diesel={} headline={} text={}",
            fmt(sensitivity.petrol),
            fmt(sensitivity.diesel),
            fmt(sensitivity.headline),
            fmt(sensitivity.text),
        );
        match sensitivity.more_sensitive_fuel {
            Some(fuel) => println!("more sensitive fuel: {}", fuel),
            None => println!("more sensitive fuel: undecided"),
        }
        println!();
    }

    let openai = SentimentPair::for_provider("openai")?;
    let reversals = find_reversals(&dataset, &aggregator);
    println!("Large increases reversed within two months: {}", reversals.len());
    for reversal in reversals {
        let (headline, text) = reversal.increase.scores(&openai);
        println!(
            "  {} {} {:+.2} (H={} T={})",
            reversal.date(),
            reversal.fuel,
            reversal.increase.change,
            fmt(headline),
            fmt(text)
        );
        for decrease in &reversal.decreases {
            let (headline, text) = decrease.scores(&openai);
            println!(
                "    -> {} {:+.2} (H={} T={})",
                decrease.date,
                decrease.change,
                fmt(headline),
                fmt(text)
            );
        }
    }

    Ok(())
}
