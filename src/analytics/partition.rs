//! Price-change conditions and record partitioning.
//!
//! Membership is always derived from the record's price-change fields at the
//! time of the call; nothing is cached on the records.

use crate::record::{FuelType, PriceSentimentRecord};
use serde::Serialize;
use std::fmt;

/// A predicate over the price-change fields of a record.
///
/// Undefined price changes never satisfy a sign or magnitude test, so a
/// record with both changes undefined falls into [`Condition::NoChange`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// `petrol > 0 OR diesel > 0`
    Hike,
    /// `petrol < 0 OR diesel < 0`
    Drop,
    /// `petrol != 0 OR diesel != 0`
    AnyChange,
    /// Neither fuel has a defined non-zero change
    NoChange,
    /// The fuel's change is positive
    Increase(FuelType),
    /// The fuel's change is negative
    Decrease(FuelType),
    /// The fuel's change is at least `threshold`
    LargeIncrease { fuel: FuelType, threshold: f64 },
    /// The fuel's change is at most `-threshold`
    LargeDecrease { fuel: FuelType, threshold: f64 },
    /// `|change| > threshold` for the fuel, e.g. one standard deviation
    LargeChange { fuel: FuelType, threshold: f64 },
    /// `low < change < high` for the fuel
    ChangeBetween { fuel: FuelType, low: f64, high: f64 },
}

impl Condition {
    /// Evaluates the condition against one record.
    ///
    /// `Hike` and `Drop` test the two fuels independently, so a record with
    /// petrol and diesel moving in opposite directions satisfies both.
    pub fn matches(&self, record: &PriceSentimentRecord) -> bool {
        let any_fuel = |test: &dyn Fn(f64) -> bool| {
            FuelType::ALL
                .iter()
                .any(|&fuel| record.price_change(fuel).is_some_and(test))
        };
        let fuel_is = |fuel: FuelType, test: &dyn Fn(f64) -> bool| {
            record.price_change(fuel).is_some_and(test)
        };

        match *self {
            Condition::Hike => any_fuel(&|change| change > 0.0),
            Condition::Drop => any_fuel(&|change| change < 0.0),
            Condition::AnyChange => any_fuel(&|change| change != 0.0),
            Condition::NoChange => !any_fuel(&|change| change != 0.0),
            Condition::Increase(fuel) => fuel_is(fuel, &|change| change > 0.0),
            Condition::Decrease(fuel) => fuel_is(fuel, &|change| change < 0.0),
            Condition::LargeIncrease { fuel, threshold } => {
                fuel_is(fuel, &|change| change >= threshold)
            }
            Condition::LargeDecrease { fuel, threshold } => {
                fuel_is(fuel, &|change| change <= -threshold)
            }
            Condition::LargeChange { fuel, threshold } => {
                fuel_is(fuel, &|change| change.abs() > threshold)
            }
            Condition::ChangeBetween { fuel, low, high } => {
                fuel_is(fuel, &|change| low < change && change < high)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Hike => write!(f, "hike"),
            Condition::Drop => write!(f, "drop"),
            Condition::AnyChange => write!(f, "any change"),
            Condition::NoChange => write!(f, "no change"),
            Condition::Increase(fuel) => write!(f, "{} increase", fuel),
            Condition::Decrease(fuel) => write!(f, "{} decrease", fuel),
            Condition::LargeIncrease { fuel, threshold } => {
                write!(f, "{} increase >= {}", fuel, threshold)
            }
            Condition::LargeDecrease { fuel, threshold } => {
                write!(f, "{} decrease <= -{}", fuel, threshold)
            }
            Condition::LargeChange { fuel, threshold } => {
                write!(f, "{} |change| > {}", fuel, threshold)
            }
            Condition::ChangeBetween { fuel, low, high } => {
                write!(f, "{} change in ({}, {})", fuel, low, high)
            }
        }
    }
}

/// Records split by a condition.
///
/// Both halves borrow the original records and keep their input order.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    /// Records satisfying the condition
    pub matching: Vec<&'a PriceSentimentRecord>,
    /// Every other record
    pub rest: Vec<&'a PriceSentimentRecord>,
}

impl<'a> Partition<'a> {
    /// Iterates over the matching records.
    pub fn matching(&self) -> impl Iterator<Item = &'a PriceSentimentRecord> + '_ {
        self.matching.iter().copied()
    }

    /// Iterates over the complement.
    pub fn rest(&self) -> impl Iterator<Item = &'a PriceSentimentRecord> + '_ {
        self.rest.iter().copied()
    }

    /// Total number of records partitioned.
    pub fn len(&self) -> usize {
        self.matching.len() + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matching.is_empty() && self.rest.is_empty()
    }
}

/// Splits records by an arbitrary predicate.
pub fn partition_by<'a, I, P>(records: I, mut predicate: P) -> Partition<'a>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
    P: FnMut(&PriceSentimentRecord) -> bool,
{
    let mut result = Partition::default();
    for record in records {
        if predicate(record) {
            result.matching.push(record);
        } else {
            result.rest.push(record);
        }
    }
    result
}

/// Splits records into those satisfying `condition` and the complement.
pub fn partition<'a, I>(records: I, condition: &Condition) -> Partition<'a>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    partition_by(records, |record| condition.matches(record))
}

/// Records satisfying `condition`, discarding the complement.
pub fn select<'a, I>(records: I, condition: &Condition) -> Vec<&'a PriceSentimentRecord>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    records
        .into_iter()
        .filter(|record| condition.matches(record))
        .collect()
}
