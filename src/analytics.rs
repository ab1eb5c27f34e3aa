//! Conditional Sentiment Aggregation
//!
//! This module provides the stateless functions that relate price changes to
//! sentiment scores: partitioning records by price-change conditions, means and
//! differences over subsets, correlations, and the sensitivity heuristics built
//! on top of them. Every function borrows records and returns derived values;
//! undefined results are `None`, never NaN or zero.
//!
//! [`SentimentAggregator`] bundles these functions with an
//! [`AggregatorConfig`] so thresholds and the subtraction direction are chosen
//! once per run.

pub mod aggregates;
pub mod observations;
pub mod partition;
pub mod polarity;
pub mod primitives;
pub mod sensitivity;

pub use aggregates::{correlate, defined_values, difference, mean_of, paired_values, std_dev_of, Correlation};
pub use observations::{fuel_observations, pooled_polarity, pooled_response, FuelObservation, PooledPolarity};
pub use partition::{partition, partition_by, select, Condition, Partition};
pub use polarity::{asymmetry, compare_polarity, PairedScores, PolarityComparison};
pub use sensitivity::{
    fuel_response, fuel_sensitivity, per_unit_response, rate_of_change_ratio, sensitivity_score,
    FuelResponse, FuelSensitivity, PriceMovement,
};

use crate::config::AggregatorConfig;
use crate::record::{Field, FuelType, PriceSentimentRecord, SentimentKey, SentimentPair};
use tracing::debug;

/// Aggregation entry point carrying the run's configuration.
///
/// # Examples
/// ```
/// use fuel_sentiment::analytics::{Condition, SentimentAggregator};
/// use fuel_sentiment::{AggregatorConfig, FuelType};
///
/// let aggregator = SentimentAggregator::new(AggregatorConfig::default());
/// assert_eq!(
///     aggregator.large_increase(FuelType::Petrol),
///     Condition::LargeIncrease { fuel: FuelType::Petrol, threshold: 10.0 }
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAggregator {
    config: AggregatorConfig,
}

impl SentimentAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        SentimentAggregator { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Large increase of `fuel` at the configured threshold.
    pub fn large_increase(&self, fuel: FuelType) -> Condition {
        PriceMovement::Increase.large_condition(fuel, self.config.large_change_threshold)
    }

    /// Large decrease of `fuel` at the configured threshold.
    pub fn large_decrease(&self, fuel: FuelType) -> Condition {
        PriceMovement::Decrease.large_condition(fuel, self.config.large_change_threshold)
    }

    /// Increase of `fuel` that can anchor a reversal.
    pub fn reversal_increase(&self, fuel: FuelType) -> Condition {
        let (increase, _) = self.config.reversal_thresholds();
        PriceMovement::Increase.large_condition(fuel, increase)
    }

    /// Decrease of `fuel` that reverses an anchor.
    pub fn reversal_decrease(&self, fuel: FuelType) -> Condition {
        let (_, decrease) = self.config.reversal_thresholds();
        PriceMovement::Decrease.large_condition(fuel, decrease)
    }

    /// Headline/text comparison over the records satisfying `condition`.
    ///
    /// # Arguments
    /// * `records` - Records to filter
    /// * `pair` - Headline and text keys of one provider
    /// * `condition` - Subset selector, e.g. [`Condition::Drop`]
    ///
    /// # Returns
    /// A [`PolarityComparison`] whose difference follows the configured
    /// direction
    pub fn polarity<'a, I>(
        &self,
        records: I,
        pair: &SentimentPair,
        condition: &Condition,
    ) -> PolarityComparison
    where
        I: IntoIterator<Item = &'a PriceSentimentRecord>,
    {
        let subset = select(records, condition);
        debug!(%condition, provider = pair.provider(), records = subset.len(), "polarity subset");
        compare_polarity(subset, pair, self.config.direction)
    }

    /// Difference of headline and text means in the configured direction.
    pub fn headline_text_difference<'a, I>(&self, records: I, pair: &SentimentPair) -> Option<f64>
    where
        I: IntoIterator<Item = &'a PriceSentimentRecord>,
    {
        let records: Vec<&PriceSentimentRecord> = records.into_iter().collect();
        let headline = mean_of(records.iter().copied(), &Field::from(&pair.headline));
        let text = mean_of(records.iter().copied(), &Field::from(&pair.text));
        self.config.direction.apply(headline, text)
    }

    pub fn fuel_response(
        &self,
        records: &[&PriceSentimentRecord],
        fuel: FuelType,
        key: &SentimentKey,
    ) -> FuelResponse {
        fuel_response(records, fuel, key, &self.config)
    }

    /// [`rate_of_change_ratio`] guarded by the configured minimum denominator.
    pub fn rate_of_change_ratio<'a, I>(&self, records: I, sentiment_field: &Field, price_field: &Field) -> Option<f64>
    where
        I: IntoIterator<Item = &'a PriceSentimentRecord>,
    {
        rate_of_change_ratio(records, sentiment_field, price_field, self.config.min_denominator)
    }

    /// [`per_unit_response`] guarded by the configured minimum denominator.
    pub fn per_unit_response<'a, I>(
        &self,
        records: I,
        fuel: FuelType,
        key: &SentimentKey,
        movement: PriceMovement,
    ) -> Option<f64>
    where
        I: IntoIterator<Item = &'a PriceSentimentRecord>,
    {
        per_unit_response(records, fuel, key, movement, self.config.min_denominator)
    }

    /// [`pooled_response`] guarded by the configured minimum denominator.
    pub fn pooled_response(
        &self,
        observations: &[FuelObservation<'_>],
        fuel: FuelType,
        key: &SentimentKey,
        movement: PriceMovement,
    ) -> Option<f64> {
        pooled_response(observations, fuel, key, movement, self.config.min_denominator)
    }
}
