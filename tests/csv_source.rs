use chrono::NaiveDate;
use fuel_sentiment::{
    CsvRecordSource, Dataset, FuelType, RecordSource, RecordSourceError, SentimentKey, SentimentPair,
};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_sample() -> Dataset {
    let _ = env_logger::builder().is_test(true).try_init();
    CsvRecordSource::from_path("english", fixture("sample.csv"))
        .load()
        .unwrap()
}

#[test]
fn csv_fixture_loads_every_row() {
    let dataset = load_sample();

    assert_eq!(dataset.name(), "english");
    assert_eq!(dataset.len(), 12);
    assert!(dataset
        .records()
        .windows(2)
        .all(|pair| pair[0].date < pair[1].date));

    let first = &dataset.records()[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2022, 1, 16).unwrap());
    assert_eq!(first.price_change(FuelType::Petrol), Some(4.0));
    assert_eq!(first.price_change(FuelType::Diesel), Some(-3.0));
}

#[test]
fn csv_fixture_discovers_provider_columns() {
    let dataset = load_sample();
    let record = &dataset.records()[0];

    for provider in ["openai", "gemini"] {
        let pair = SentimentPair::for_provider(provider).unwrap();
        assert!(record.sentiment(&pair.headline).is_some(), "{}", provider);
        assert!(record.sentiment(&pair.text).is_some(), "{}", provider);
    }
    assert_eq!(record.sentiments().count(), 4);
}

#[test]
fn csv_fixture_keeps_missing_scores_undefined() {
    let dataset = load_sample();
    let gemini_headline = SentimentKey::headline("gemini").unwrap();

    let nan_row = dataset.get(NaiveDate::from_ymd_opt(2022, 4, 16).unwrap()).unwrap();
    assert_eq!(nan_row.sentiment(&gemini_headline), None);

    let empty_row = dataset.get(NaiveDate::from_ymd_opt(2022, 8, 16).unwrap()).unwrap();
    assert_eq!(empty_row.sentiment(&gemini_headline), None);
    assert_eq!(
        empty_row.sentiment(&SentimentKey::text("gemini").unwrap()),
        Some(0.05)
    );
}

#[test]
fn csv_fixture_supports_month_selection() {
    let dataset = load_sample();
    assert_eq!(dataset.in_month(2022, 6).len(), 2);
    assert_eq!(dataset.in_month(2022, 9).len(), 2);
    assert!(dataset.in_month(2021, 6).is_empty());
}

#[test]
fn missing_csv_file_is_an_io_error() {
    let result = CsvRecordSource::from_path("missing", fixture("does_not_exist.csv")).load();
    assert!(matches!(result, Err(RecordSourceError::Io(_))));
}
