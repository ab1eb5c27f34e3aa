//! Per-fuel views of records.
//!
//! A record where both petrol and diesel moved contributes one observation
//! per fuel, so section-level statistics weigh each price movement equally.

use crate::analytics::polarity::{compare_polarity, PolarityComparison};
use crate::analytics::primitives::guarded_ratio;
use crate::analytics::sensitivity::PriceMovement;
use crate::config::DifferenceDirection;
use crate::record::{FuelType, PriceSentimentRecord, SentimentKey, SentimentPair};
use chrono::NaiveDate;
use serde::Serialize;

/// One non-zero price change of one fuel, borrowing its source record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelObservation<'a> {
    pub fuel: FuelType,
    pub change: f64,
    pub record: &'a PriceSentimentRecord,
}

impl FuelObservation<'_> {
    pub fn date(&self) -> NaiveDate {
        self.record.date
    }

    pub fn movement(&self) -> PriceMovement {
        if self.change > 0.0 {
            PriceMovement::Increase
        } else {
            PriceMovement::Decrease
        }
    }

    pub fn sentiment(&self, key: &SentimentKey) -> Option<f64> {
        self.record.sentiment(key)
    }
}

/// Flattens records into one observation per defined, non-zero fuel change.
///
/// Output is ordered by record, petrol before diesel.
pub fn fuel_observations<'a, I>(records: I) -> Vec<FuelObservation<'a>>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    records
        .into_iter()
        .flat_map(|record| {
            FuelType::ALL.into_iter().filter_map(move |fuel| {
                let change = record.price_change(fuel).filter(|&c| c != 0.0)?;
                Some(FuelObservation {
                    fuel,
                    change,
                    record,
                })
            })
        })
        .collect()
}

/// `Σ sentiment / |Σ change|` over observations of `fuel` moving in the
/// given direction where the sentiment is defined.
///
/// Undefined when no pair exists or `|Σ change|` is below `min_denominator`.
pub fn pooled_response(
    observations: &[FuelObservation<'_>],
    fuel: FuelType,
    key: &SentimentKey,
    movement: PriceMovement,
    min_denominator: f64,
) -> Option<f64> {
    let (count, sentiment_total, change_total) = observations
        .iter()
        .filter(|obs| obs.fuel == fuel && obs.movement() == movement)
        .filter_map(|obs| Some((obs.sentiment(key)?, obs.change)))
        .fold((0usize, 0.0, 0.0), |(n, s, c), (sentiment, change)| {
            (n + 1, s + sentiment, c + change)
        });

    if count == 0 {
        return None;
    }
    guarded_ratio(sentiment_total, change_total.abs(), min_denominator)
}

/// Drop and hike polarity computed over fuel observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledPolarity {
    pub drops: PolarityComparison,
    pub hikes: PolarityComparison,
}

/// Compares headline and text separately for decreasing and increasing
/// observations. A record appears once per fuel that moved in that direction.
pub fn pooled_polarity(
    observations: &[FuelObservation<'_>],
    pair: &SentimentPair,
    direction: DifferenceDirection,
) -> PooledPolarity {
    let side = |movement: PriceMovement| {
        compare_polarity(
            observations
                .iter()
                .filter(move |obs| obs.movement() == movement)
                .map(|obs| obs.record),
            pair,
            direction,
        )
    };

    PooledPolarity {
        drops: side(PriceMovement::Decrease),
        hikes: side(PriceMovement::Increase),
    }
}
