//! Sensitivity heuristics relating sentiment to price changes.
//!
//! None of these are formal elasticities. They exist to rank fuels, subjects
//! and providers against each other.

use crate::analytics::aggregates::{correlate, mean_of, Correlation};
use crate::analytics::partition::{select, Condition};
use crate::analytics::primitives::guarded_ratio;
use crate::config::AggregatorConfig;
use crate::record::{Field, FuelType, PriceSentimentRecord, SentimentKey, SentimentPair, TextSubject};
use serde::Serialize;
use tracing::debug;

/// Direction of a single fuel's price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMovement {
    Increase,
    Decrease,
}

impl PriceMovement {
    /// Condition selecting this movement for `fuel`.
    pub fn condition(&self, fuel: FuelType) -> Condition {
        match self {
            PriceMovement::Increase => Condition::Increase(fuel),
            PriceMovement::Decrease => Condition::Decrease(fuel),
        }
    }

    /// Condition selecting large movements of at least `threshold` PKR.
    pub fn large_condition(&self, fuel: FuelType, threshold: f64) -> Condition {
        match self {
            PriceMovement::Increase => Condition::LargeIncrease { fuel, threshold },
            PriceMovement::Decrease => Condition::LargeDecrease { fuel, threshold },
        }
    }

    /// Sign convention for per-unit denominators: increases divide by the
    /// signed mean change, decreases by its magnitude.
    pub(crate) fn denominator(&self, change: f64) -> f64 {
        match self {
            PriceMovement::Increase => change,
            PriceMovement::Decrease => change.abs(),
        }
    }
}

/// Average of the absolute values of two correlations.
///
/// Undefined if either correlation is undefined. The argument order does not
/// matter.
pub fn sensitivity_score(corr_a: Option<f64>, corr_b: Option<f64>) -> Option<f64> {
    Some((corr_a?.abs() + corr_b?.abs()) / 2.0)
}

/// `mean(sentiment_field) / mean(price_field)` over `records`.
///
/// Undefined when either mean is undefined or the price mean's magnitude is
/// below `min_denominator`.
pub fn rate_of_change_ratio<'a, I>(
    records: I,
    sentiment_field: &Field,
    price_field: &Field,
    min_denominator: f64,
) -> Option<f64>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    let records: Vec<&PriceSentimentRecord> = records.into_iter().collect();
    let sentiment = mean_of(records.iter().copied(), sentiment_field)?;
    let price = mean_of(records.iter().copied(), price_field)?;
    guarded_ratio(sentiment, price, min_denominator)
}

/// Mean sentiment per PKR of mean price movement for one fuel.
///
/// Filters `records` to the fuel's increases (or decreases) first. For
/// decreases the denominator is the magnitude of the mean change, so the sign
/// of the result follows the sentiment.
pub fn per_unit_response<'a, I>(
    records: I,
    fuel: FuelType,
    key: &SentimentKey,
    movement: PriceMovement,
    min_denominator: f64,
) -> Option<f64>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    let subset = select(records, &movement.condition(fuel));
    let sentiment = mean_of(subset.iter().copied(), &Field::from(key))?;
    let change = mean_of(subset.iter().copied(), &Field::from(fuel))?;
    guarded_ratio(sentiment, movement.denominator(change), min_denominator)
}

/// Response table of one sentiment field to one fuel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelResponse {
    pub fuel: FuelType,
    pub sentiment: SentimentKey,
    pub threshold: f64,
    pub increases: usize,
    pub decreases: usize,
    pub large_increases: usize,
    pub large_decreases: usize,
    pub per_unit_increase: Option<f64>,
    pub per_unit_decrease: Option<f64>,
    pub large_increase_mean: Option<f64>,
    pub large_decrease_mean: Option<f64>,
}

/// Builds the [`FuelResponse`] table using the configured threshold and
/// denominator guard.
pub fn fuel_response(
    records: &[&PriceSentimentRecord],
    fuel: FuelType,
    key: &SentimentKey,
    config: &AggregatorConfig,
) -> FuelResponse {
    let threshold = config.large_change_threshold;
    let field = Field::from(key);

    let count = |condition: Condition| select(records.iter().copied(), &condition).len();
    let large_mean = |movement: PriceMovement| {
        let subset = select(records.iter().copied(), &movement.large_condition(fuel, threshold));
        mean_of(subset, &field)
    };
    let per_unit = |movement: PriceMovement| {
        per_unit_response(records.iter().copied(), fuel, key, movement, config.min_denominator)
    };

    let response = FuelResponse {
        fuel,
        sentiment: key.clone(),
        threshold,
        increases: count(PriceMovement::Increase.condition(fuel)),
        decreases: count(PriceMovement::Decrease.condition(fuel)),
        large_increases: count(PriceMovement::Increase.large_condition(fuel, threshold)),
        large_decreases: count(PriceMovement::Decrease.large_condition(fuel, threshold)),
        per_unit_increase: per_unit(PriceMovement::Increase),
        per_unit_decrease: per_unit(PriceMovement::Decrease),
        large_increase_mean: large_mean(PriceMovement::Increase),
        large_decrease_mean: large_mean(PriceMovement::Decrease),
    };

    debug!(
        %fuel,
        sentiment = %key,
        increases = response.increases,
        decreases = response.decreases,
        "fuel response computed"
    );
    response
}

/// Correlation-based comparison of petrol and diesel sensitivity for one
/// provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelSensitivity {
    pub petrol_headline: Option<Correlation>,
    pub petrol_text: Option<Correlation>,
    pub diesel_headline: Option<Correlation>,
    pub diesel_text: Option<Correlation>,
    /// Petrol sensitivity averaged over headline and text
    pub petrol: Option<f64>,
    /// Diesel sensitivity averaged over headline and text
    pub diesel: Option<f64>,
    /// Headline sensitivity averaged over petrol and diesel
    pub headline: Option<f64>,
    /// Text sensitivity averaged over petrol and diesel
    pub text: Option<f64>,
    pub more_sensitive_fuel: Option<FuelType>,
    pub more_sensitive_subject: Option<TextSubject>,
}

impl FuelSensitivity {
    /// Mean of petrol and diesel sensitivity, used for ranking providers.
    pub fn overall(&self) -> Option<f64> {
        sensitivity_score(self.petrol, self.diesel)
    }

    /// Correlation for a fuel/subject combination.
    pub fn correlation(&self, fuel: FuelType, subject: TextSubject) -> Option<&Correlation> {
        match (fuel, subject) {
            (FuelType::Petrol, TextSubject::Headline) => self.petrol_headline.as_ref(),
            (FuelType::Petrol, TextSubject::Text) => self.petrol_text.as_ref(),
            (FuelType::Diesel, TextSubject::Headline) => self.diesel_headline.as_ref(),
            (FuelType::Diesel, TextSubject::Text) => self.diesel_text.as_ref(),
        }
    }
}

/// Picks the label of the strictly larger score; ties and undefined scores
/// have no winner.
fn larger<T>(a: Option<f64>, b: Option<f64>, label_a: T, label_b: T) -> Option<T> {
    let (a, b) = (a?, b?);
    if a > b {
        Some(label_a)
    } else if b > a {
        Some(label_b)
    } else {
        None
    }
}

/// Correlates both fuels with both subjects of `pair` over `records`.
pub fn fuel_sensitivity(records: &[&PriceSentimentRecord], pair: &SentimentPair) -> FuelSensitivity {
    let corr = |fuel: FuelType, key: &SentimentKey| {
        correlate(records.iter().copied(), &Field::from(fuel), &Field::from(key))
    };
    let coefficient = |c: &Option<Correlation>| c.map(|c| c.coefficient);

    let petrol_headline = corr(FuelType::Petrol, &pair.headline);
    let petrol_text = corr(FuelType::Petrol, &pair.text);
    let diesel_headline = corr(FuelType::Diesel, &pair.headline);
    let diesel_text = corr(FuelType::Diesel, &pair.text);

    let petrol = sensitivity_score(coefficient(&petrol_headline), coefficient(&petrol_text));
    let diesel = sensitivity_score(coefficient(&diesel_headline), coefficient(&diesel_text));
    let headline = sensitivity_score(coefficient(&petrol_headline), coefficient(&diesel_headline));
    let text = sensitivity_score(coefficient(&petrol_text), coefficient(&diesel_text));

    FuelSensitivity {
        petrol_headline,
        petrol_text,
        diesel_headline,
        diesel_text,
        petrol,
        diesel,
        headline,
        text,
        more_sensitive_fuel: larger(petrol, diesel, FuelType::Petrol, FuelType::Diesel),
        more_sensitive_subject: larger(headline, text, TextSubject::Headline, TextSubject::Text),
    }
}
