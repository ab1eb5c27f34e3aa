pub mod record;
pub mod dataset;
pub mod record_source;
pub mod csv_source;
pub mod config;
pub mod analytics;
pub mod report;


pub use record::{
    Field, FieldKeyError, FuelType, PriceSentimentRecord, SentimentKey, SentimentPair, TextSubject,
};
pub use dataset::{DateRange, Dataset};
pub use record_source::{InMemoryRecordSource, RecordSource, RecordSourceError};
pub use csv_source::CsvRecordSource;
pub use config::{AggregatorConfig, ConfigError, DatasetInput, DifferenceDirection, ReportConfig};
pub use analytics::{
    compare_polarity,
    correlate,
    difference,
    mean_of,
    partition,
    rate_of_change_ratio,
    sensitivity_score,
    Condition,
    Correlation,
    Partition,
    PolarityComparison,
    SentimentAggregator,
};
pub use report::{rank_by_sensitivity, ComparisonReport, ProviderSummary, RankedSensitivity};
