//! Structured results for dataset/provider comparisons.
//!
//! Everything here is computed from the analytics functions and carries no
//! formatting. Undefined statistics serialize as `null`.

use crate::analytics::{
    asymmetry, fuel_observations, fuel_sensitivity, mean_of, pooled_polarity, select, std_dev_of, Condition,
    FuelResponse, FuelSensitivity, PolarityComparison, PooledPolarity, PriceMovement, SentimentAggregator,
};
use crate::config::AggregatorConfig;
use crate::dataset::Dataset;
use crate::record::{Field, FieldKeyError, FuelType, PriceSentimentRecord, SentimentKey, SentimentPair, TextSubject};
use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Calendar months after a large increase searched for a large decrease.
pub const REVERSAL_WINDOW_MONTHS: (u32, u32) = (1, 2);

/// How records split across price-change partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub total: usize,
    pub hikes: usize,
    pub drops: usize,
    /// Records counted as both hike and drop
    pub mixed: usize,
    pub no_change: usize,
}

impl RecordCounts {
    pub fn from_records(records: &[&PriceSentimentRecord]) -> Self {
        let hikes = select(records.iter().copied(), &Condition::Hike);
        RecordCounts {
            total: records.len(),
            mixed: select(hikes.iter().copied(), &Condition::Drop).len(),
            hikes: hikes.len(),
            drops: select(records.iter().copied(), &Condition::Drop).len(),
            no_change: select(records.iter().copied(), &Condition::NoChange).len(),
        }
    }
}

/// Section-level per-unit response for one fuel and sentiment field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledResponse {
    pub fuel: FuelType,
    pub sentiment: SentimentKey,
    pub increase: Option<f64>,
    pub decrease: Option<f64>,
}

/// All statistics for one (dataset, provider) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub dataset: String,
    pub provider: String,
    pub counts: RecordCounts,
    pub headline_mean: Option<f64>,
    pub text_mean: Option<f64>,
    pub difference: Option<f64>,
    pub headline_std_dev: Option<f64>,
    pub text_std_dev: Option<f64>,
    pub drops: PolarityComparison,
    pub hikes: PolarityComparison,
    pub asymmetry: Option<f64>,
    /// Drop/hike polarity with one entry per moving fuel
    pub pooled: PooledPolarity,
    pub sensitivity: FuelSensitivity,
    /// One table per fuel and subject
    pub responses: Vec<FuelResponse>,
    pub pooled_responses: Vec<PooledResponse>,
}

impl ProviderSummary {
    /// Computes the summary of `provider` over every record in `dataset`.
    ///
    /// # Errors
    /// Returns an error if `provider` is not a valid provider identifier.
    pub fn compute(dataset: &Dataset, provider: &str, config: &AggregatorConfig) -> Result<Self, FieldKeyError> {
        let pair = SentimentPair::for_provider(provider)?;
        let aggregator = SentimentAggregator::new(*config);
        let records: Vec<&PriceSentimentRecord> = dataset.iter().collect();

        let drops = aggregator.polarity(records.iter().copied(), &pair, &Condition::Drop);
        let hikes = aggregator.polarity(records.iter().copied(), &pair, &Condition::Hike);

        let observations = fuel_observations(records.iter().copied());

        let mut responses = Vec::with_capacity(4);
        let mut pooled_responses = Vec::with_capacity(4);
        for fuel in FuelType::ALL {
            for subject in TextSubject::ALL {
                let key = pair.key(subject);
                responses.push(aggregator.fuel_response(&records, fuel, key));
                pooled_responses.push(PooledResponse {
                    fuel,
                    sentiment: key.clone(),
                    increase: aggregator.pooled_response(&observations, fuel, key, PriceMovement::Increase),
                    decrease: aggregator.pooled_response(&observations, fuel, key, PriceMovement::Decrease),
                });
            }
        }

        let headline_mean = mean_of(records.iter().copied(), &Field::from(&pair.headline));
        let text_mean = mean_of(records.iter().copied(), &Field::from(&pair.text));

        let summary = ProviderSummary {
            dataset: dataset.name().to_string(),
            provider: pair.provider().to_string(),
            counts: RecordCounts::from_records(&records),
            headline_mean,
            text_mean,
            difference: config.direction.apply(headline_mean, text_mean),
            headline_std_dev: std_dev_of(records.iter().copied(), &Field::from(&pair.headline)),
            text_std_dev: std_dev_of(records.iter().copied(), &Field::from(&pair.text)),
            asymmetry: asymmetry(&drops, &hikes),
            drops,
            hikes,
            pooled: pooled_polarity(&observations, &pair, config.direction),
            sensitivity: fuel_sensitivity(&records, &pair),
            responses,
            pooled_responses,
        };

        debug!(
            dataset = %summary.dataset,
            provider = %summary.provider,
            records = summary.counts.total,
            changed = select(records.iter().copied(), &Condition::AnyChange).len(),
            sensitivity = ?summary.sensitivity.overall(),
            "provider summary computed"
        );
        Ok(summary)
    }

    /// Mean of petrol and diesel sensitivity.
    pub fn sensitivity_score(&self) -> Option<f64> {
        self.sensitivity.overall()
    }

    /// Response table for one fuel and subject.
    pub fn response(&self, fuel: FuelType, subject: TextSubject) -> Option<&FuelResponse> {
        self.responses
            .iter()
            .find(|r| r.fuel == fuel && r.sentiment.subject() == subject)
    }
}

/// One row of the cross-provider sensitivity ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSensitivity {
    /// 1-based position
    pub rank: usize,
    pub dataset: String,
    pub provider: String,
    pub petrol: Option<f64>,
    pub diesel: Option<f64>,
    pub score: Option<f64>,
}

/// Orders summaries by mean petrol/diesel sensitivity, strongest first.
///
/// Summaries without a defined score come last; ties keep input order.
pub fn rank_by_sensitivity(summaries: &[ProviderSummary]) -> Vec<RankedSensitivity> {
    let mut ordered: Vec<&ProviderSummary> = summaries.iter().collect();
    ordered.sort_by_key(|summary| Reverse(summary.sensitivity_score().map(OrderedFloat)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, summary)| RankedSensitivity {
            rank: index + 1,
            dataset: summary.dataset.clone(),
            provider: summary.provider.clone(),
            petrol: summary.sensitivity.petrol,
            diesel: summary.sensitivity.diesel,
            score: summary.sensitivity_score(),
        })
        .collect()
}

/// A dated price change together with every sentiment score of its record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReversalPoint {
    pub date: NaiveDate,
    pub change: f64,
    pub sentiments: BTreeMap<SentimentKey, f64>,
}

impl ReversalPoint {
    fn from_record(record: &PriceSentimentRecord, fuel: FuelType) -> Option<Self> {
        Some(ReversalPoint {
            date: record.date,
            change: record.price_change(fuel)?,
            sentiments: record
                .sentiments()
                .map(|(key, score)| (key.clone(), score))
                .collect(),
        })
    }

    /// Headline and text scores of one provider at this point.
    pub fn scores(&self, pair: &SentimentPair) -> (Option<f64>, Option<f64>) {
        (
            self.sentiments.get(&pair.headline).copied(),
            self.sentiments.get(&pair.text).copied(),
        )
    }
}

/// A large increase and the large decreases that followed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reversal {
    pub fuel: FuelType,
    pub increase: ReversalPoint,
    /// Each large decrease inside the window, oldest first
    pub decreases: Vec<ReversalPoint>,
}

impl Reversal {
    /// Date of the anchoring increase.
    pub fn date(&self) -> NaiveDate {
        self.increase.date
    }
}

/// Large increases of either fuel followed within
/// [`REVERSAL_WINDOW_MONTHS`] by at least one large decrease of that fuel.
///
/// Anchors and follow-ups use the aggregator's reversal thresholds, which
/// may differ from each other.
pub fn find_reversals(dataset: &Dataset, aggregator: &SentimentAggregator) -> Vec<Reversal> {
    let (from_months, to_months) = REVERSAL_WINDOW_MONTHS;
    let mut reversals = Vec::new();

    for fuel in FuelType::ALL {
        let decrease = aggregator.reversal_decrease(fuel);
        for anchor in select(dataset, &aggregator.reversal_increase(fuel)) {
            let Some(increase) = ReversalPoint::from_record(anchor, fuel) else {
                continue;
            };
            let decreases: Vec<ReversalPoint> = dataset
                .follow_ups(anchor.date, from_months, to_months, &decrease)
                .into_iter()
                .filter_map(|record| ReversalPoint::from_record(record, fuel))
                .collect();

            if !decreases.is_empty() {
                reversals.push(Reversal {
                    fuel,
                    increase,
                    decreases,
                });
            }
        }
    }

    reversals.sort_by_key(Reversal::date);
    reversals
}

/// Provider-independent facts about a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub name: String,
    pub records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub reversals: Vec<Reversal>,
}

impl DatasetOverview {
    pub fn compute(dataset: &Dataset, config: &AggregatorConfig) -> Self {
        let aggregator = SentimentAggregator::new(*config);
        DatasetOverview {
            name: dataset.name().to_string(),
            records: dataset.len(),
            first_date: dataset.records().first().map(|r| r.date),
            last_date: dataset.records().last().map(|r| r.date),
            reversals: find_reversals(dataset, &aggregator),
        }
    }
}

/// Full output of a reporting run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub config: AggregatorConfig,
    pub datasets: Vec<DatasetOverview>,
    pub summaries: Vec<ProviderSummary>,
    pub ranking: Vec<RankedSensitivity>,
}

impl ComparisonReport {
    /// Summarizes every provider over every dataset and ranks the results.
    ///
    /// # Errors
    /// Returns an error for the first invalid provider identifier.
    pub fn compute<S>(datasets: &[Dataset], providers: &[S], config: &AggregatorConfig) -> Result<Self, FieldKeyError>
    where
        S: AsRef<str>,
    {
        let mut summaries = Vec::with_capacity(datasets.len() * providers.len());
        for dataset in datasets {
            for provider in providers {
                summaries.push(ProviderSummary::compute(dataset, provider.as_ref(), config)?);
            }
        }

        Ok(ComparisonReport {
            config: *config,
            datasets: datasets.iter().map(|d| DatasetOverview::compute(d, config)).collect(),
            ranking: rank_by_sensitivity(&summaries),
            summaries,
        })
    }

    /// Summary for a (dataset, provider) pair.
    pub fn summary(&self, dataset: &str, provider: &str) -> Option<&ProviderSummary> {
        self.summaries
            .iter()
            .find(|s| s.dataset == dataset && s.provider == provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, month, day).unwrap()
    }

    fn record(month: u32, day: u32, petrol: f64, diesel: f64, scores: &[(&str, f64, f64)]) -> PriceSentimentRecord {
        scores.iter().fold(
            PriceSentimentRecord::new(date(month, day), Some(petrol), Some(diesel)),
            |record, &(provider, headline, text)| {
                let pair = SentimentPair::for_provider(provider).unwrap();
                record
                    .with_sentiment(pair.headline, headline)
                    .with_sentiment(pair.text, text)
            },
        )
    }

    fn dataset() -> Dataset {
        Dataset::new(
            "dawn",
            vec![
                record(1, 15, 12.0, 8.0, &[("openai", -0.7, -0.5), ("gemini", 0.1, -0.2)]),
                record(2, 16, -11.0, -6.0, &[("openai", 0.5, 0.3), ("gemini", -0.1, 0.3)]),
                record(3, 1, 0.0, 0.0, &[("openai", 0.0, 0.1), ("gemini", 0.2, 0.0)]),
                record(3, 16, 4.0, -2.0, &[("openai", -0.2, -0.1), ("gemini", 0.0, 0.1)]),
                record(4, 1, -3.0, -1.0, &[("openai", 0.2, 0.2), ("gemini", 0.3, -0.3)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_record_counts() {
        let data = dataset();
        let records: Vec<&PriceSentimentRecord> = data.iter().collect();
        let counts = RecordCounts::from_records(&records);
        assert_eq!(
            counts,
            RecordCounts {
                total: 5,
                hikes: 2,
                drops: 3,
                mixed: 1,
                no_change: 1,
            }
        );
    }

    #[test]
    fn test_provider_summary() {
        let summary = ProviderSummary::compute(&dataset(), "openai", &AggregatorConfig::default()).unwrap();

        assert_eq!(summary.dataset, "dawn");
        assert_eq!(summary.drops.records, 3);
        assert_eq!(summary.hikes.records, 2);
        assert_eq!(summary.responses.len(), 4);
        assert_eq!(summary.pooled_responses.len(), 4);

        let table = summary.response(FuelType::Petrol, TextSubject::Headline).unwrap();
        assert_eq!(table.large_increases, 1);
        assert_eq!(table.large_decreases, 1);
        assert_eq!(table.large_increase_mean, Some(-0.7));

        assert!(summary.asymmetry.is_some());
        assert!(summary.sensitivity_score().is_some());
        assert!((summary.headline_mean.unwrap() - (-0.2 / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_provider_summary_rejects_invalid_provider() {
        let result = ProviderSummary::compute(&dataset(), "open_ai", &AggregatorConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_ranking_orders_by_score_with_undefined_last() {
        let data = dataset();
        let config = AggregatorConfig::default();
        let mut summaries = vec![
            ProviderSummary::compute(&data, "gemini", &config).unwrap(),
            ProviderSummary::compute(&data, "openai", &config).unwrap(),
            ProviderSummary::compute(&data, "claude", &config).unwrap(),
        ];
        // Nothing is scored for claude.
        assert_eq!(summaries[2].sensitivity_score(), None);

        let ranking = rank_by_sensitivity(&summaries);
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].provider, "openai");
        assert_eq!(ranking[2].provider, "claude");
        assert_eq!(ranking[2].rank, 3);
        assert!(ranking[0].score >= ranking[1].score);

        summaries.reverse();
        let reversed = rank_by_sensitivity(&summaries);
        assert_eq!(reversed[0].provider, "openai");
        assert_eq!(reversed[2].provider, "claude");
    }

    #[test]
    fn test_find_reversals_within_window() {
        let data = dataset();
        let reversals = find_reversals(&data, &SentimentAggregator::default());

        // Petrol +12 on 15 Jan is followed by -11 on 16 Feb. Diesel never
        // moves by 10.
        assert_eq!(reversals.len(), 1);
        assert_eq!(reversals[0].fuel, FuelType::Petrol);
        assert_eq!(reversals[0].date(), date(1, 15));
        assert_eq!(reversals[0].increase.change, 12.0);
        assert_eq!(reversals[0].decreases.len(), 1);
        assert_eq!(reversals[0].decreases[0].date, date(2, 16));
        assert_eq!(reversals[0].decreases[0].change, -11.0);

        let strict = SentimentAggregator::new(AggregatorConfig::default().with_threshold(12.0).unwrap());
        assert!(find_reversals(&data, &strict).is_empty());
    }

    #[test]
    fn test_reversals_carry_sentiment_scores() {
        let data = dataset();
        let reversal = &find_reversals(&data, &SentimentAggregator::default())[0];
        let openai = SentimentPair::for_provider("openai").unwrap();
        let gemini = SentimentPair::for_provider("gemini").unwrap();

        assert_eq!(reversal.increase.scores(&openai), (Some(-0.7), Some(-0.5)));
        assert_eq!(reversal.increase.scores(&gemini), (Some(0.1), Some(-0.2)));
        assert_eq!(reversal.decreases[0].scores(&openai), (Some(0.5), Some(0.3)));
        assert_eq!(reversal.increase.sentiments.len(), 4);

        let claude = SentimentPair::for_provider("claude").unwrap();
        assert_eq!(reversal.increase.scores(&claude), (None, None));
    }

    #[test]
    fn test_reversal_thresholds_are_independent() {
        let data = dataset();

        // A 12 anchor qualifies, but no follow-up falls by 12 or more.
        let config = AggregatorConfig::default().with_reversal_thresholds(12.0, 12.0).unwrap();
        assert!(find_reversals(&data, &SentimentAggregator::new(config)).is_empty());

        let config = AggregatorConfig::default().with_reversal_thresholds(12.0, 11.0).unwrap();
        let reversals = find_reversals(&data, &SentimentAggregator::new(config));
        assert_eq!(reversals.len(), 1);
        assert_eq!(reversals[0].decreases[0].change, -11.0);

        // Anchors above 12 do not exist even with a lenient follow-up.
        let config = AggregatorConfig::default().with_reversal_thresholds(13.0, 1.0).unwrap();
        assert!(find_reversals(&data, &SentimentAggregator::new(config)).is_empty());
    }

    #[test]
    fn test_provider_summary_lists_polarity_exceptions() {
        let summary = ProviderSummary::compute(&dataset(), "openai", &AggregatorConfig::default()).unwrap();

        // Drops: 16 Feb (0.5 > 0.3) is an exception, 1 Apr ties, 16 Mar
        // reads text above headline.
        let drop_dates: Vec<NaiveDate> = summary.drops.exceptions.iter().map(|e| e.date).collect();
        assert_eq!(drop_dates, vec![date(2, 16)]);
        assert_eq!(summary.drops.exceptions[0].headline, 0.5);
        assert_eq!(summary.drops.exceptions[0].text, 0.3);

        assert!(summary.hikes.exceptions.is_empty());
    }

    #[test]
    fn test_comparison_report() {
        let datasets = vec![dataset()];
        let report = ComparisonReport::compute(&datasets, &["openai", "gemini"], &AggregatorConfig::default()).unwrap();

        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.ranking.len(), 2);
        assert_eq!(report.datasets[0].records, 5);
        assert_eq!(report.datasets[0].first_date, Some(date(1, 15)));
        assert!(report.summary("dawn", "gemini").is_some());
        assert!(report.summary("dawn", "claude").is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summaries"][0]["provider"], "openai");
        assert_eq!(json["config"]["direction"], "headline-minus-text");
    }
}
