use crate::dataset::Dataset;
use crate::record::{FuelType, PriceSentimentRecord, SentimentKey};
use crate::record_source::{RecordSource, RecordSourceError};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};

const DATE_COLUMN: &str = "date";
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%b-%Y"];

#[derive(Debug, Clone)]
enum CsvOrigin {
    File(PathBuf),
    Text(String),
}

/// CSV-based record source.
///
/// Expects a header row with `date`, `petrol_change` and `diesel_change`
/// columns. Sentiment columns are discovered from headers of the form
/// `{provider}_{headline|text}_overall_sentiment`; every other column is
/// ignored. Empty cells and `nan` are read as undefined values.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    name: String,
    origin: CsvOrigin,
}

/// Positions of the interesting columns within a header row.
struct ColumnLayout {
    date: usize,
    petrol: usize,
    diesel: usize,
    sentiments: Vec<(usize, SentimentKey)>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, RecordSourceError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(column))
                .ok_or_else(|| RecordSourceError::MissingColumn(column.to_string()))
        };

        let date = find(DATE_COLUMN)?;
        let petrol = find(FuelType::Petrol.column())?;
        let diesel = find(FuelType::Diesel.column())?;

        let mut sentiments: Vec<(usize, SentimentKey)> = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            let Some(key) = SentimentKey::from_column(&header.to_ascii_lowercase()) else {
                continue;
            };
            if sentiments.iter().any(|(_, seen)| *seen == key) {
                return Err(RecordSourceError::DuplicateColumn(header.to_string()));
            }
            sentiments.push((index, key));
        }

        Ok(ColumnLayout {
            date,
            petrol,
            diesel,
            sentiments,
        })
    }
}

impl CsvRecordSource {
    /// Creates a source reading from a CSV file on disk.
    pub fn from_path(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        CsvRecordSource {
            name: name.into(),
            origin: CsvOrigin::File(path.as_ref().to_path_buf()),
        }
    }

    /// Creates a source over CSV text already held in memory.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        CsvRecordSource {
            name: name.into(),
            origin: CsvOrigin::Text(text.into()),
        }
    }

    fn read_records<R: Read>(&self, reader: R) -> Result<Vec<PriceSentimentRecord>, RecordSourceError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let layout = ColumnLayout::from_headers(rdr.headers()?)?;
        log::debug!(
            "{}: found {} sentiment columns",
            self.name,
            layout.sentiments.len()
        );

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            records.push(parse_row(&row, &layout)?);
        }

        Ok(records)
    }
}

impl RecordSource for CsvRecordSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Dataset, RecordSourceError> {
        let records = match &self.origin {
            CsvOrigin::File(path) => {
                log::info!("Loading {} from {}", self.name, path.display());
                let file = std::fs::File::open(path).map_err(|e| {
                    RecordSourceError::Io(format!("{}: {}", path.display(), e))
                })?;
                self.read_records(file)?
            }
            CsvOrigin::Text(text) => self.read_records(text.as_bytes())?,
        };

        log::info!("Loaded {} records for {}", records.len(), self.name);

        Dataset::new(self.name.clone(), records).map_err(RecordSourceError::DuplicateDate)
    }
}

fn line_of(row: &StringRecord) -> u64 {
    row.position().map(|position| position.line()).unwrap_or(0)
}

fn parse_row(row: &StringRecord, layout: &ColumnLayout) -> Result<PriceSentimentRecord, RecordSourceError> {
    let raw_date = row.get(layout.date).unwrap_or("");
    let date = parse_date(raw_date).ok_or_else(|| RecordSourceError::InvalidDate {
        line: line_of(row),
        value: raw_date.to_string(),
    })?;

    let petrol = parse_cell(row, layout.petrol, FuelType::Petrol.column())?;
    let diesel = parse_cell(row, layout.diesel, FuelType::Diesel.column())?;

    let mut record = PriceSentimentRecord::new(date, petrol, diesel);
    for (index, key) in &layout.sentiments {
        if let Some(score) = parse_cell(row, *index, &key.column())? {
            record.set_sentiment(key.clone(), score);
        }
    }

    Ok(record)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // Timestamps such as "2021-11-05 00:00:00" keep only their date part.
    let value = value.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn parse_cell(row: &StringRecord, index: usize, column: &str) -> Result<Option<f64>, RecordSourceError> {
    let value = row.get(index).unwrap_or("");
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    match value.parse::<f64>() {
        Ok(number) if number.is_nan() => Ok(None),
        Ok(number) => Ok(Some(number)),
        Err(_) => Err(RecordSourceError::InvalidNumber {
            line: line_of(row),
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}
