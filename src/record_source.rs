use crate::dataset::Dataset;
use crate::record::PriceSentimentRecord;
use chrono::NaiveDate;

/// Trait for data source abstraction.
///
/// The aggregator never reads files itself; it is handed a [`Dataset`]
/// produced by a source. Implementations can be:
/// - In-memory records (for testing)
/// - CSV files
/// - Any other tabular source
pub trait RecordSource {
    /// Name used to label results computed from this source.
    fn name(&self) -> &str;

    /// Loads every record of the source.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read, a row is malformed, or
    /// two rows share a date. Loading never skips bad rows.
    fn load(&self) -> Result<Dataset, RecordSourceError>;
}

/// Errors that can occur when loading records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSourceError {
    /// Underlying file could not be opened or read
    Io(String),
    /// CSV syntax error
    Csv { line: Option<u64>, message: String },
    /// A required column is absent from the header row
    MissingColumn(String),
    /// A date cell could not be parsed
    InvalidDate { line: u64, value: String },
    /// A numeric cell could not be parsed
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
    /// Two rows carry the same date
    DuplicateDate(NaiveDate),
    /// Two headers name the same sentiment column, ignoring case
    DuplicateColumn(String),
}

impl std::fmt::Display for RecordSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSourceError::Io(msg) => write!(f, "I/O error: {}", msg),
            RecordSourceError::Csv {
                line: Some(line),
                message,
            } => write!(f, "CSV error on line {}: {}", line, message),
            RecordSourceError::Csv { line: None, message } => write!(f, "CSV error: {}", message),
            RecordSourceError::MissingColumn(column) => {
                write!(f, "Missing required column: {}", column)
            }
            RecordSourceError::InvalidDate { line, value } => {
                write!(f, "Invalid date '{}' on line {}", value, line)
            }
            RecordSourceError::InvalidNumber {
                line,
                column,
                value,
            } => write!(
                f,
                "Invalid number '{}' in column '{}' on line {}",
                value, column, line
            ),
            RecordSourceError::DuplicateDate(date) => write!(f, "Duplicate date: {}", date),
            RecordSourceError::DuplicateColumn(column) => {
                write!(f, "Duplicate sentiment column: {}", column)
            }
        }
    }
}

impl std::error::Error for RecordSourceError {}

impl From<std::io::Error> for RecordSourceError {
    fn from(err: std::io::Error) -> Self {
        RecordSourceError::Io(err.to_string())
    }
}

impl From<csv::Error> for RecordSourceError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            return RecordSourceError::Io(err.to_string());
        }

        RecordSourceError::Csv {
            line: err.position().map(|position| position.line()),
            message: err.to_string(),
        }
    }
}

/// In-memory record source for testing.
#[derive(Debug, Clone)]
pub struct InMemoryRecordSource {
    name: String,
    records: Vec<PriceSentimentRecord>,
}

impl InMemoryRecordSource {
    /// Creates a new empty in-memory source.
    pub fn new(name: impl Into<String>) -> Self {
        InMemoryRecordSource {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Creates a source holding the given records.
    pub fn with_records(name: impl Into<String>, records: Vec<PriceSentimentRecord>) -> Self {
        InMemoryRecordSource {
            name: name.into(),
            records,
        }
    }

    /// Adds a record.
    pub fn add_record(&mut self, record: PriceSentimentRecord) {
        self.records.push(record);
    }

    /// Clears all records from the source.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl RecordSource for InMemoryRecordSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Dataset, RecordSourceError> {
        Dataset::new(self.name.clone(), self.records.clone())
            .map_err(RecordSourceError::DuplicateDate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_in_memory_source_loads_sorted_dataset() {
        let mut source = InMemoryRecordSource::new("english");
        source.add_record(PriceSentimentRecord::new(ymd(2021, 2, 16), Some(3.0), Some(0.0)));
        source.add_record(PriceSentimentRecord::new(ymd(2021, 1, 1), Some(-1.0), None));

        let dataset = source.load().unwrap();
        assert_eq!(dataset.name(), "english");
        assert_eq!(dataset.records()[0].date, ymd(2021, 1, 1));
        assert_eq!(source.name(), "english");
    }

    #[test]
    fn test_in_memory_source_rejects_duplicates() {
        let records = vec![
            PriceSentimentRecord::new(ymd(2021, 1, 1), Some(1.0), None),
            PriceSentimentRecord::new(ymd(2021, 1, 1), Some(2.0), None),
        ];
        let source = InMemoryRecordSource::with_records("urdu", records);
        assert_eq!(
            source.load(),
            Err(RecordSourceError::DuplicateDate(ymd(2021, 1, 1)))
        );
    }

    #[test]
    fn test_clear_empties_source() {
        let mut source = InMemoryRecordSource::new("empty");
        source.add_record(PriceSentimentRecord::new(ymd(2021, 1, 1), None, None));
        source.clear();
        assert!(source.load().unwrap().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = RecordSourceError::InvalidNumber {
            line: 4,
            column: "petrol_change".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid number 'abc' in column 'petrol_change' on line 4"
        );
    }
}
