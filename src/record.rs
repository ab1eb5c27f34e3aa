use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fuel whose price change is tracked on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
}

impl FuelType {
    /// Both fuels, petrol first.
    pub const ALL: [FuelType; 2] = [FuelType::Petrol, FuelType::Diesel];

    /// CSV column holding the price change for this fuel.
    pub fn column(&self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol_change",
            FuelType::Diesel => "diesel_change",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelType::Petrol => write!(f, "petrol"),
            FuelType::Diesel => write!(f, "diesel"),
        }
    }
}

/// Part of an article a sentiment score was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSubject {
    Headline,
    Text,
}

impl TextSubject {
    pub const ALL: [TextSubject; 2] = [TextSubject::Headline, TextSubject::Text];

    fn as_str(&self) -> &'static str {
        match self {
            TextSubject::Headline => "headline",
            TextSubject::Text => "text",
        }
    }
}

impl fmt::Display for TextSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const SENTIMENT_COLUMN_SUFFIX: &str = "_overall_sentiment";

/// Identifies one sentiment score column: a scoring provider plus the
/// article subject it scored.
///
/// Columns follow the `{provider}_{subject}_overall_sentiment` convention,
/// e.g. `openai_headline_overall_sentiment`. Underscores are therefore not
/// allowed inside provider names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SentimentKey {
    provider: String,
    subject: TextSubject,
}

impl SentimentKey {
    /// Creates a key for the given provider and subject.
    ///
    /// # Errors
    /// Returns an error if the provider is empty or contains characters other
    /// than ASCII alphanumerics, `-` and `.`.
    ///
    /// Provider names are case-insensitive and stored lower-cased, matching
    /// the keys discovered from column headers.
    pub fn new(provider: impl Into<String>, subject: TextSubject) -> Result<Self, FieldKeyError> {
        let provider = provider.into().to_ascii_lowercase();
        validate_provider(&provider)?;
        Ok(SentimentKey { provider, subject })
    }

    /// Shorthand for the headline key of a provider.
    pub fn headline(provider: impl Into<String>) -> Result<Self, FieldKeyError> {
        Self::new(provider, TextSubject::Headline)
    }

    /// Shorthand for the body text key of a provider.
    pub fn text(provider: impl Into<String>) -> Result<Self, FieldKeyError> {
        Self::new(provider, TextSubject::Text)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn subject(&self) -> TextSubject {
        self.subject
    }

    /// Returns the same provider keyed on the other subject.
    pub fn counterpart(&self) -> SentimentKey {
        let subject = match self.subject {
            TextSubject::Headline => TextSubject::Text,
            TextSubject::Text => TextSubject::Headline,
        };
        SentimentKey {
            provider: self.provider.clone(),
            subject,
        }
    }

    /// Column name used in tabular sources.
    pub fn column(&self) -> String {
        format!(
            "{}_{}{}",
            self.provider,
            self.subject.as_str(),
            SENTIMENT_COLUMN_SUFFIX
        )
    }

    /// Parses a column header back into a key.
    ///
    /// Returns `None` for headers that do not follow the sentiment column
    /// convention, so unrelated columns can simply be skipped.
    pub fn from_column(column: &str) -> Option<SentimentKey> {
        let stem = column.strip_suffix(SENTIMENT_COLUMN_SUFFIX)?;
        let (provider, subject) = stem.rsplit_once('_')?;
        let subject = match subject {
            "headline" => TextSubject::Headline,
            "text" => TextSubject::Text,
            _ => return None,
        };
        SentimentKey::new(provider, subject).ok()
    }
}

impl fmt::Display for SentimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.subject)
    }
}

impl From<SentimentKey> for String {
    fn from(key: SentimentKey) -> Self {
        key.column()
    }
}

impl TryFrom<String> for SentimentKey {
    type Error = FieldKeyError;

    fn try_from(column: String) -> Result<Self, Self::Error> {
        SentimentKey::from_column(&column).ok_or(FieldKeyError::UnknownColumn(column))
    }
}

/// Headline and body text keys of a single provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SentimentPair {
    pub headline: SentimentKey,
    pub text: SentimentKey,
}

impl SentimentPair {
    /// Builds both keys for a provider.
    pub fn for_provider(provider: impl Into<String>) -> Result<Self, FieldKeyError> {
        let headline = SentimentKey::headline(provider)?;
        let text = headline.counterpart();
        Ok(SentimentPair { headline, text })
    }

    pub fn provider(&self) -> &str {
        self.headline.provider()
    }

    /// Key for the requested subject.
    pub fn key(&self, subject: TextSubject) -> &SentimentKey {
        match subject {
            TextSubject::Headline => &self.headline,
            TextSubject::Text => &self.text,
        }
    }
}

pub(crate) fn validate_provider(provider: &str) -> Result<(), FieldKeyError> {
    if provider.is_empty() {
        return Err(FieldKeyError::EmptyProvider);
    }

    if !provider
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(FieldKeyError::InvalidCharacters(provider.to_string()));
    }

    Ok(())
}

/// Errors raised when building a [`SentimentKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKeyError {
    /// Provider name is empty
    EmptyProvider,
    /// Provider name contains characters outside `[A-Za-z0-9.-]`
    InvalidCharacters(String),
    /// Column name does not follow the sentiment column convention
    UnknownColumn(String),
}

impl fmt::Display for FieldKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKeyError::EmptyProvider => write!(f, "Provider name cannot be empty"),
            FieldKeyError::InvalidCharacters(provider) => {
                write!(f, "Provider name contains invalid characters: {}", provider)
            }
            FieldKeyError::UnknownColumn(column) => {
                write!(f, "Not a sentiment column: {}", column)
            }
        }
    }
}

impl std::error::Error for FieldKeyError {}

/// A numeric column of a record that aggregations can read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    PriceChange(FuelType),
    Sentiment(SentimentKey),
}

impl From<FuelType> for Field {
    fn from(fuel: FuelType) -> Self {
        Field::PriceChange(fuel)
    }
}

impl From<SentimentKey> for Field {
    fn from(key: SentimentKey) -> Self {
        Field::Sentiment(key)
    }
}

impl From<&SentimentKey> for Field {
    fn from(key: &SentimentKey) -> Self {
        Field::Sentiment(key.clone())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::PriceChange(fuel) => write!(f, "{}", fuel.column()),
            Field::Sentiment(key) => write!(f, "{}", key.column()),
        }
    }
}

/// One dated row pairing fuel price changes with article sentiment.
///
/// Price changes are signed PKR deltas; `Some(0.0)` means "no change" and
/// `None` means the value was not recorded. Sentiment scores are optional
/// per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSentimentRecord {
    pub date: NaiveDate,
    pub petrol_change: Option<f64>,
    pub diesel_change: Option<f64>,
    #[serde(default)]
    sentiments: BTreeMap<SentimentKey, f64>,
}

impl PriceSentimentRecord {
    /// Creates a record without any sentiment scores.
    pub fn new(date: NaiveDate, petrol_change: Option<f64>, diesel_change: Option<f64>) -> Self {
        PriceSentimentRecord {
            date,
            petrol_change,
            diesel_change,
            sentiments: BTreeMap::new(),
        }
    }

    /// Builder-style helper that attaches a sentiment score.
    ///
    /// NaN scores are treated as absent.
    pub fn with_sentiment(mut self, key: SentimentKey, score: f64) -> Self {
        self.set_sentiment(key, score);
        self
    }

    pub(crate) fn set_sentiment(&mut self, key: SentimentKey, score: f64) {
        if score.is_nan() {
            self.sentiments.remove(&key);
        } else {
            self.sentiments.insert(key, score);
        }
    }

    /// Price change of the given fuel, if recorded.
    pub fn price_change(&self, fuel: FuelType) -> Option<f64> {
        let value = match fuel {
            FuelType::Petrol => self.petrol_change,
            FuelType::Diesel => self.diesel_change,
        };
        value.filter(|v| !v.is_nan())
    }

    /// Sentiment score for the given key, if present.
    pub fn sentiment(&self, key: &SentimentKey) -> Option<f64> {
        self.sentiments.get(key).copied()
    }

    /// Iterates over all sentiment scores of this record.
    pub fn sentiments(&self) -> impl Iterator<Item = (&SentimentKey, f64)> {
        self.sentiments.iter().map(|(key, &score)| (key, score))
    }

    /// Reads any field; `None` when the value is undefined.
    pub fn value(&self, field: &Field) -> Option<f64> {
        match field {
            Field::PriceChange(fuel) => self.price_change(*fuel),
            Field::Sentiment(key) => self.sentiment(key),
        }
    }
}
