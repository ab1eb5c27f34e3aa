use crate::analytics::Condition;
use crate::record::PriceSentimentRecord;
use chrono::{Datelike, Months, NaiveDate};
use std::ops::RangeInclusive;

/// Date range for selecting records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Creates a DateRange from an inclusive range.
    pub fn from_range(range: RangeInclusive<NaiveDate>) -> Self {
        let (start, end) = range.into_inner();
        DateRange { start, end }
    }

    /// Returns true when `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A named, date-ordered collection of records loaded from one source.
///
/// Dates are unique and ascending; construction rejects duplicates so that
/// the date can be used as the record key.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    records: Vec<PriceSentimentRecord>,
}

impl Dataset {
    /// Builds a dataset, sorting records by date.
    ///
    /// # Errors
    /// Returns the first date that appears more than once.
    pub fn new(
        name: impl Into<String>,
        mut records: Vec<PriceSentimentRecord>,
    ) -> Result<Self, NaiveDate> {
        records.sort_by_key(|record| record.date);

        if let Some(pair) = records.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(pair[0].date);
        }

        Ok(Dataset {
            name: name.into(),
            records,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[PriceSentimentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceSentimentRecord> {
        self.records.iter()
    }

    /// Looks up the record for an exact date.
    pub fn get(&self, date: NaiveDate) -> Option<&PriceSentimentRecord> {
        self.records
            .binary_search_by_key(&date, |record| record.date)
            .ok()
            .map(|index| &self.records[index])
    }

    /// Records whose date lies within `range` (inclusive on both ends).
    pub fn between(&self, range: &DateRange) -> Vec<&PriceSentimentRecord> {
        if range.start > range.end {
            return Vec::new();
        }

        let start = self.records.partition_point(|record| record.date < range.start);
        let end = self.records.partition_point(|record| record.date <= range.end);
        self.records[start..end].iter().collect()
    }

    /// Records dated within the given calendar month.
    pub fn in_month(&self, year: i32, month: u32) -> Vec<&PriceSentimentRecord> {
        self.records
            .iter()
            .filter(|record| record.date.year() == year && record.date.month() == month)
            .collect()
    }

    /// Records dated between `from_months` and `to_months` calendar months
    /// after `anchor` (inclusive) that also satisfy `condition`.
    ///
    /// Month arithmetic clamps to the end of shorter months, so one month
    /// after 31 January is the last day of February.
    pub fn follow_ups(
        &self,
        anchor: NaiveDate,
        from_months: u32,
        to_months: u32,
        condition: &Condition,
    ) -> Vec<&PriceSentimentRecord> {
        let start = anchor.checked_add_months(Months::new(from_months));
        let end = anchor.checked_add_months(Months::new(to_months));

        match (start, end) {
            (Some(start), Some(end)) => self
                .between(&DateRange::new(start, end))
                .into_iter()
                .filter(|record| condition.matches(record))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a PriceSentimentRecord;
    type IntoIter = std::slice::Iter<'a, PriceSentimentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
