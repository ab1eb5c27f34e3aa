//! Headline versus body text comparisons within a subset of records.

use crate::analytics::aggregates::mean_of;
use crate::config::DifferenceDirection;
use crate::record::{Field, PriceSentimentRecord, SentimentPair};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// Headline and text scores of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedScores {
    pub date: NaiveDate,
    pub headline: f64,
    pub text: f64,
}

/// Headline and text sentiment of one subset, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarityComparison {
    /// Records in the subset
    pub records: usize,
    /// Records where both headline and text are defined
    pub compared: usize,
    pub headline_mean: Option<f64>,
    pub text_mean: Option<f64>,
    /// Subtraction order used for `difference`
    pub direction: DifferenceDirection,
    pub difference: Option<f64>,
    /// Records whose text score exceeds the headline score
    pub text_above_headline: usize,
    /// Records whose headline score exceeds the text score
    pub headline_above_text: usize,
    pub ties: usize,
    /// Records whose headline reads more positive than the text, in input
    /// order
    pub exceptions: Vec<PairedScores>,
}

impl PolarityComparison {
    /// Percentage of compared records represented by `count`.
    ///
    /// Undefined when no record had both scores.
    pub fn share(&self, count: usize) -> Option<f64> {
        if self.compared == 0 {
            return None;
        }
        Some(count as f64 / self.compared as f64 * 100.0)
    }

    /// Magnitude of the headline/text gap, independent of direction.
    pub fn gap(&self) -> Option<f64> {
        self.difference.map(f64::abs)
    }
}

/// Compares headline and text sentiment over `records`.
///
/// Means use every defined value of each subject separately; the ordering
/// counts only use records where both subjects are defined.
pub fn compare_polarity<'a, I>(
    records: I,
    pair: &SentimentPair,
    direction: DifferenceDirection,
) -> PolarityComparison
where
    I: IntoIterator<Item = &'a PriceSentimentRecord>,
{
    let records: Vec<&PriceSentimentRecord> = records.into_iter().collect();
    let headline_field = Field::from(&pair.headline);
    let text_field = Field::from(&pair.text);

    let headline_mean = mean_of(records.iter().copied(), &headline_field);
    let text_mean = mean_of(records.iter().copied(), &text_field);

    let mut compared = 0;
    let mut text_above_headline = 0;
    let mut headline_above_text = 0;
    let mut ties = 0;
    let mut exceptions = Vec::new();

    for record in &records {
        let (Some(headline), Some(text)) = (
            record.sentiment(&pair.headline),
            record.sentiment(&pair.text),
        ) else {
            continue;
        };

        compared += 1;
        match text.partial_cmp(&headline) {
            Some(Ordering::Greater) => text_above_headline += 1,
            Some(Ordering::Less) => {
                headline_above_text += 1;
                exceptions.push(PairedScores {
                    date: record.date,
                    headline,
                    text,
                });
            }
            _ => ties += 1,
        }
    }

    PolarityComparison {
        records: records.len(),
        compared,
        headline_mean,
        text_mean,
        direction,
        difference: direction.apply(headline_mean, text_mean),
        text_above_headline,
        headline_above_text,
        ties,
        exceptions,
    }
}

/// Headline drop/hike spread minus text drop/hike spread:
/// `|H_drop - H_hike| - |T_drop - T_hike|`.
///
/// Positive values mean headlines react more asymmetrically than text.
pub fn asymmetry(drops: &PolarityComparison, hikes: &PolarityComparison) -> Option<f64> {
    let headline_spread = (drops.headline_mean? - hikes.headline_mean?).abs();
    let text_spread = (drops.text_mean? - hikes.text_mean?).abs();
    Some(headline_spread - text_spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pair() -> SentimentPair {
        SentimentPair::for_provider("openai").unwrap()
    }

    fn record(day: u32, headline: Option<f64>, text: Option<f64>) -> PriceSentimentRecord {
        let pair = pair();
        let mut record =
            PriceSentimentRecord::new(NaiveDate::from_ymd_opt(2021, 11, day).unwrap(), Some(1.0), None);
        if let Some(h) = headline {
            record = record.with_sentiment(pair.headline.clone(), h);
        }
        if let Some(t) = text {
            record = record.with_sentiment(pair.text, t);
        }
        record
    }

    #[test]
    fn test_compare_polarity_counts_and_means() {
        let data = vec![
            record(1, Some(-0.8), Some(-0.4)),
            record(2, Some(-0.2), Some(-0.6)),
            record(3, Some(0.1), Some(0.1)),
            record(4, Some(-0.5), None),
        ];
        let result = compare_polarity(&data, &pair(), DifferenceDirection::HeadlineMinusText);

        assert_eq!(result.records, 4);
        assert_eq!(result.compared, 3);
        assert_eq!(result.text_above_headline, 1);
        assert_eq!(result.headline_above_text, 1);
        assert_eq!(result.ties, 1);

        let headline_mean = result.headline_mean.unwrap();
        assert!((headline_mean - (-1.4 / 4.0)).abs() < 1e-12);
        let text_mean = result.text_mean.unwrap();
        assert!((text_mean - (-0.9 / 3.0)).abs() < 1e-12);
        assert!((result.difference.unwrap() - (headline_mean - text_mean)).abs() < 1e-12);

        assert_eq!(
            result.exceptions,
            vec![PairedScores {
                date: NaiveDate::from_ymd_opt(2021, 11, 2).unwrap(),
                headline: -0.2,
                text: -0.6,
            }]
        );

        let share = result.share(result.text_above_headline).unwrap();
        assert!((share - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_exceptions_keep_input_order() {
        let data = vec![
            record(9, Some(0.4), Some(0.1)),
            record(3, Some(-0.1), Some(0.2)),
            record(5, Some(0.3), Some(-0.3)),
            record(7, Some(0.5), None),
        ];
        let result = compare_polarity(&data, &pair(), DifferenceDirection::TextMinusHeadline);

        let dates: Vec<u32> = result
            .exceptions
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(dates, vec![9, 5]);
        assert_eq!(result.exceptions.len(), result.headline_above_text);
        assert_eq!(result.exceptions[1].headline, 0.3);
        assert_eq!(result.exceptions[1].text, -0.3);
    }

    #[test]
    fn test_direction_flips_sign_only() {
        let data = vec![record(1, Some(-0.8), Some(-0.4))];
        let h_minus_t = compare_polarity(&data, &pair(), DifferenceDirection::HeadlineMinusText);
        let t_minus_h = compare_polarity(&data, &pair(), DifferenceDirection::TextMinusHeadline);
        assert_eq!(h_minus_t.difference.map(|d| -d), t_minus_h.difference);
        assert_eq!(h_minus_t.gap(), t_minus_h.gap());
    }

    #[test]
    fn test_empty_subset_is_undefined() {
        let data: Vec<PriceSentimentRecord> = Vec::new();
        let result = compare_polarity(&data, &pair(), DifferenceDirection::default());
        assert_eq!(result.records, 0);
        assert_eq!(result.headline_mean, None);
        assert_eq!(result.difference, None);
        assert_eq!(result.share(0), None);
    }

    #[test]
    fn test_asymmetry() {
        let drops = compare_polarity(
            &[record(1, Some(0.6), Some(0.3))],
            &pair(),
            DifferenceDirection::default(),
        );
        let hikes = compare_polarity(
            &[record(2, Some(-0.6), Some(-0.1))],
            &pair(),
            DifferenceDirection::default(),
        );
        // |0.6 - -0.6| - |0.3 - -0.1| = 1.2 - 0.4
        assert!((asymmetry(&drops, &hikes).unwrap() - 0.8).abs() < 1e-12);

        let empty = compare_polarity(
            std::iter::empty::<&PriceSentimentRecord>(),
            &pair(),
            DifferenceDirection::default(),
        );
        assert_eq!(asymmetry(&drops, &empty), None);
    }
}
