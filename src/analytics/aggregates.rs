use crate::analytics::primitives::{correlation_p_value, mean, pearson, sample_std_dev};
use crate::record::{Field, PriceSentimentRecord};
use serde::Serialize;
use tracing::trace;

/// Pearson correlation between two fields together with its sample size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    /// Coefficient in [-1, 1]
    pub coefficient: f64,
    /// Number of records where both fields were defined
    pub n: usize,
    /// Two-sided p-value; undefined for fewer than three pairs
    pub p_value: Option<f64>,
}

impl Correlation {
    /// Absolute coefficient, the per-pair sensitivity.
    pub fn magnitude(&self) -> f64 {
        self.coefficient.abs()
    }
}

/// Values of `field` on every record where it is defined, in record order.
pub fn defined_values<'a, I>(records: I, field: &Field) -> Vec<f64>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    records
        .into_iter()
        .filter_map(|record| record.value(field))
        .collect()
}

/// Values of two fields on every record where both are defined.
pub fn paired_values<'a, I>(records: I, field_a: &Field, field_b: &Field) -> (Vec<f64>, Vec<f64>)
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    records
        .into_iter()
        .filter_map(|record| Some((record.value(field_a)?, record.value(field_b)?)))
        .unzip()
}

/// Arithmetic mean of `field` across records where it is defined.
///
/// Returns `None` for an empty subset or when no record defines the field;
/// undefined values are skipped, never counted as zero.
pub fn mean_of<'a, I>(records: I, field: &Field) -> Option<f64>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    mean(&defined_values(records, field))
}

/// Sample standard deviation of `field`; undefined below two values.
pub fn std_dev_of<'a, I>(records: I, field: &Field) -> Option<f64>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    sample_std_dev(&defined_values(records, field))
}

/// Subtracts `b` from `a`.
///
/// The caller owns the direction convention; see
/// [`DifferenceDirection`](crate::config::DifferenceDirection) for the
/// headline/text case.
pub fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Pearson correlation of two fields over records where both are defined.
///
/// Returns `None` when fewer than two pairs exist or either field is
/// constant over the pairs. The result is symmetric in `field_a`/`field_b`.
pub fn correlate<'a, I>(records: I, field_a: &Field, field_b: &Field) -> Option<Correlation>
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    let (xs, ys) = paired_values(records, field_a, field_b);
    let n = xs.len();
    let coefficient = pearson(&xs, &ys);
    trace!(%field_a, %field_b, n, ?coefficient, "correlate");

    coefficient.map(|coefficient| Correlation {
        coefficient,
        n,
        p_value: correlation_p_value(coefficient, n),
    })
}
