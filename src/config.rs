//! Aggregator and reporting configuration.
//!
//! Collects the constants that analyses otherwise re-derive by hand: the
//! large-change threshold, the guard applied to ratio denominators and the
//! direction used when subtracting headline and text means.

use crate::record::validate_provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default magnitude (PKR) from which a price change counts as large.
pub const DEFAULT_LARGE_CHANGE_THRESHOLD: f64 = 10.0;

/// Default smallest denominator magnitude accepted by ratio metrics.
pub const DEFAULT_MIN_DENOMINATOR: f64 = 1e-9;

/// Order of subtraction when comparing headline and body text means.
///
/// The sign of the difference reads differently for drops and hikes, so the
/// direction is always carried explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DifferenceDirection {
    /// `headline - text`
    #[default]
    HeadlineMinusText,
    /// `text - headline`
    TextMinusHeadline,
}

impl DifferenceDirection {
    /// Subtracts the two means in this direction.
    ///
    /// Returns `None` when either mean is undefined.
    pub fn apply(&self, headline: Option<f64>, text: Option<f64>) -> Option<f64> {
        match self {
            DifferenceDirection::HeadlineMinusText => crate::analytics::difference(headline, text),
            DifferenceDirection::TextMinusHeadline => crate::analytics::difference(text, headline),
        }
    }
}

impl fmt::Display for DifferenceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferenceDirection::HeadlineMinusText => write!(f, "headline-text"),
            DifferenceDirection::TextMinusHeadline => write!(f, "text-headline"),
        }
    }
}

impl FromStr for DifferenceDirection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headline-text" => Ok(DifferenceDirection::HeadlineMinusText),
            "text-headline" => Ok(DifferenceDirection::TextMinusHeadline),
            other => Err(ConfigError::InvalidValue {
                key: "DIFFERENCE_DIRECTION".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Parameters shared by every conditional aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Magnitude (PKR) from which a change counts as large (inclusive)
    pub large_change_threshold: f64,
    /// Ratios whose denominator magnitude falls below this are undefined
    pub min_denominator: f64,
    /// Headline/text subtraction order
    pub direction: DifferenceDirection,
    /// Smallest increase that anchors a reversal; `large_change_threshold`
    /// when unset
    pub reversal_increase_threshold: Option<f64>,
    /// Smallest decrease magnitude that reverses an anchor;
    /// `large_change_threshold` when unset
    pub reversal_decrease_threshold: Option<f64>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            large_change_threshold: DEFAULT_LARGE_CHANGE_THRESHOLD,
            min_denominator: DEFAULT_MIN_DENOMINATOR,
            direction: DifferenceDirection::default(),
            reversal_increase_threshold: None,
            reversal_decrease_threshold: None,
        }
    }
}

impl AggregatorConfig {
    /// Creates a configuration, validating the numeric parameters.
    ///
    /// # Errors
    /// Returns an error if the threshold is negative or not finite, or if the
    /// denominator guard is negative or not finite.
    pub fn new(
        large_change_threshold: f64,
        min_denominator: f64,
        direction: DifferenceDirection,
    ) -> Result<Self, ConfigError> {
        check_threshold("LARGE_CHANGE_THRESHOLD", large_change_threshold)?;
        if !min_denominator.is_finite() || min_denominator < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "MIN_DENOMINATOR".to_string(),
                value: min_denominator.to_string(),
            });
        }

        Ok(AggregatorConfig {
            large_change_threshold,
            min_denominator,
            direction,
            reversal_increase_threshold: None,
            reversal_decrease_threshold: None,
        })
    }

    /// Returns a copy with a different large-change threshold.
    ///
    /// Reversal thresholds that were set explicitly are kept.
    pub fn with_threshold(self, large_change_threshold: f64) -> Result<Self, ConfigError> {
        check_threshold("LARGE_CHANGE_THRESHOLD", large_change_threshold)?;
        Ok(AggregatorConfig {
            large_change_threshold,
            ..self
        })
    }

    /// Returns a copy with separate anchor and follow-up thresholds for the
    /// reversal search.
    ///
    /// # Errors
    /// Returns an error if either threshold is negative or not finite.
    pub fn with_reversal_thresholds(self, increase: f64, decrease: f64) -> Result<Self, ConfigError> {
        check_threshold("REVERSAL_INCREASE_THRESHOLD", increase)?;
        check_threshold("REVERSAL_DECREASE_THRESHOLD", decrease)?;
        Ok(AggregatorConfig {
            reversal_increase_threshold: Some(increase),
            reversal_decrease_threshold: Some(decrease),
            ..self
        })
    }

    /// `(increase, decrease)` thresholds used by the reversal search.
    pub fn reversal_thresholds(&self) -> (f64, f64) {
        (
            self.reversal_increase_threshold
                .unwrap_or(self.large_change_threshold),
            self.reversal_decrease_threshold
                .unwrap_or(self.large_change_threshold),
        )
    }

    /// Returns a copy with a different subtraction direction.
    pub fn with_direction(self, direction: DifferenceDirection) -> Self {
        AggregatorConfig { direction, ..self }
    }

    /// Reads the configuration from environment variables.
    ///
    /// Recognized variables: `LARGE_CHANGE_THRESHOLD`, `MIN_DENOMINATOR`,
    /// `DIFFERENCE_DIRECTION`, `REVERSAL_INCREASE_THRESHOLD` and
    /// `REVERSAL_DECREASE_THRESHOLD`. Unset variables keep their defaults; set
    /// but unparsable ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AggregatorConfig::from_env`] but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AggregatorConfig::default();

        let threshold = match lookup("LARGE_CHANGE_THRESHOLD") {
            Some(value) => parse_number("LARGE_CHANGE_THRESHOLD", &value)?,
            None => defaults.large_change_threshold,
        };
        let min_denominator = match lookup("MIN_DENOMINATOR") {
            Some(value) => parse_number("MIN_DENOMINATOR", &value)?,
            None => defaults.min_denominator,
        };
        let direction = match lookup("DIFFERENCE_DIRECTION") {
            Some(value) => value.parse()?,
            None => defaults.direction,
        };

        let mut config = Self::new(threshold, min_denominator, direction)?;
        if let Some(value) = lookup("REVERSAL_INCREASE_THRESHOLD") {
            let increase = parse_number("REVERSAL_INCREASE_THRESHOLD", &value)?;
            check_threshold("REVERSAL_INCREASE_THRESHOLD", increase)?;
            config.reversal_increase_threshold = Some(increase);
        }
        if let Some(value) = lookup("REVERSAL_DECREASE_THRESHOLD") {
            let decrease = parse_number("REVERSAL_DECREASE_THRESHOLD", &value)?;
            check_threshold("REVERSAL_DECREASE_THRESHOLD", decrease)?;
            config.reversal_decrease_threshold = Some(decrease);
        }
        Ok(config)
    }
}

fn check_threshold(key: &str, threshold: f64) -> Result<(), ConfigError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: threshold.to_string(),
        });
    }
    Ok(())
}

/// Providers compared when `PROVIDERS` is unset.
pub const DEFAULT_PROVIDERS: [&str; 2] = ["openai", "gemini"];

/// A named CSV input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInput {
    pub name: String,
    pub path: PathBuf,
}

/// Settings for one reporting run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Datasets to load, in report order
    pub datasets: Vec<DatasetInput>,
    /// Providers whose sentiment columns are compared
    pub providers: Vec<String>,
    pub aggregator: AggregatorConfig,
}

impl ReportConfig {
    pub fn new(datasets: Vec<DatasetInput>, providers: Vec<String>, aggregator: AggregatorConfig) -> Self {
        ReportConfig {
            datasets,
            providers,
            aggregator,
        }
    }

    /// Reads `DATASETS`, `PROVIDERS` and the aggregator variables from the
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ReportConfig::from_env`] but with an injectable lookup.
    ///
    /// `DATASETS` is required and holds comma-separated `name=path` pairs.
    /// `PROVIDERS` is a comma-separated list and defaults to
    /// [`DEFAULT_PROVIDERS`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_datasets = lookup("DATASETS").ok_or_else(|| ConfigError::Missing("DATASETS".to_string()))?;
        let datasets = parse_datasets(&raw_datasets)?;

        let providers = match lookup("PROVIDERS") {
            Some(value) => parse_providers(&value)?,
            None => DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect(),
        };

        let aggregator = AggregatorConfig::from_lookup(&lookup)?;
        Ok(ReportConfig::new(datasets, providers, aggregator))
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_datasets(value: &str) -> Result<Vec<DatasetInput>, ConfigError> {
    let datasets: Vec<DatasetInput> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, path) = entry.split_once('=').ok_or_else(|| invalid("DATASETS", entry))?;
            let (name, path) = (name.trim(), path.trim());
            if name.is_empty() || path.is_empty() {
                return Err(invalid("DATASETS", entry));
            }
            Ok(DatasetInput {
                name: name.to_string(),
                path: PathBuf::from(path),
            })
        })
        .collect::<Result<_, _>>()?;

    if datasets.is_empty() {
        return Err(ConfigError::Missing("DATASETS".to_string()));
    }
    Ok(datasets)
}

fn parse_providers(value: &str) -> Result<Vec<String>, ConfigError> {
    let providers: Vec<String> = value
        .split(',')
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    if providers.is_empty() {
        return Err(invalid("PROVIDERS", value));
    }
    for provider in &providers {
        validate_provider(provider).map_err(|_| invalid("PROVIDERS", provider))?;
    }
    Ok(providers)
}

fn parse_number(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent
    Missing(String),
    /// A setting could not be parsed or is out of range
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required setting: {}", key),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AggregatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AggregatorConfig::default());
        assert_eq!(config.large_change_threshold, 10.0);
        assert_eq!(config.direction, DifferenceDirection::HeadlineMinusText);
    }

    #[test]
    fn test_reads_overrides() {
        let config = AggregatorConfig::from_lookup(lookup(&[
            ("LARGE_CHANGE_THRESHOLD", "25"),
            ("MIN_DENOMINATOR", "0.01"),
            ("DIFFERENCE_DIRECTION", "Text-Headline"),
        ]))
        .unwrap();
        assert_eq!(config.large_change_threshold, 25.0);
        assert_eq!(config.min_denominator, 0.01);
        assert_eq!(config.direction, DifferenceDirection::TextMinusHeadline);
    }

    #[test]
    fn test_rejects_unparsable_values() {
        let err = AggregatorConfig::from_lookup(lookup(&[("LARGE_CHANGE_THRESHOLD", "ten")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "LARGE_CHANGE_THRESHOLD".to_string(),
                value: "ten".to_string(),
            }
        );

        assert!(AggregatorConfig::from_lookup(lookup(&[("DIFFERENCE_DIRECTION", "up")])).is_err());
        assert!(AggregatorConfig::new(-1.0, 0.0, DifferenceDirection::default()).is_err());
    }

    #[test]
    fn test_reversal_thresholds_fall_back_to_large_change() {
        let config = AggregatorConfig::default();
        assert_eq!(config.reversal_thresholds(), (10.0, 10.0));

        let config = config.with_reversal_thresholds(20.0, 30.0).unwrap();
        assert_eq!(config.reversal_thresholds(), (20.0, 30.0));
        let config = config.with_threshold(5.0).unwrap();
        assert_eq!(config.reversal_thresholds(), (20.0, 30.0));

        assert!(AggregatorConfig::default()
            .with_reversal_thresholds(20.0, f64::NAN)
            .is_err());
    }

    #[test]
    fn test_reads_reversal_thresholds() {
        let config = AggregatorConfig::from_lookup(lookup(&[
            ("LARGE_CHANGE_THRESHOLD", "15"),
            ("REVERSAL_DECREASE_THRESHOLD", "30"),
        ]))
        .unwrap();
        assert_eq!(config.reversal_thresholds(), (15.0, 30.0));

        let err = AggregatorConfig::from_lookup(lookup(&[("REVERSAL_INCREASE_THRESHOLD", "-20")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "REVERSAL_INCREASE_THRESHOLD".to_string(),
                value: "-20".to_string(),
            }
        );
    }

    #[test]
    fn test_direction_apply() {
        let headline = Some(-0.5);
        let text = Some(-0.2);
        let h_minus_t = DifferenceDirection::HeadlineMinusText.apply(headline, text).unwrap();
        let t_minus_h = DifferenceDirection::TextMinusHeadline.apply(headline, text).unwrap();
        assert!((h_minus_t + 0.3).abs() < 1e-12);
        assert!((t_minus_h - 0.3).abs() < 1e-12);
        assert_eq!(DifferenceDirection::HeadlineMinusText.apply(None, text), None);
    }

    #[test]
    fn test_report_config_requires_datasets() {
        let err = ReportConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATASETS".to_string()));
    }

    #[test]
    fn test_report_config_parses_datasets_and_providers() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("DATASETS", "dawn=data/dawn.csv, tribune = data/tribune.csv"),
            ("LARGE_CHANGE_THRESHOLD", "20"),
        ]))
        .unwrap();

        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[1].name, "tribune");
        assert_eq!(config.datasets[1].path, PathBuf::from("data/tribune.csv"));
        assert_eq!(config.providers, vec!["openai", "gemini"]);
        assert_eq!(config.aggregator.large_change_threshold, 20.0);

        let config = ReportConfig::from_lookup(lookup(&[
            ("DATASETS", "dawn=dawn.csv"),
            ("PROVIDERS", "Claude, mistral"),
        ]))
        .unwrap();
        assert_eq!(config.providers, vec!["claude", "mistral"]);
    }

    #[test]
    fn test_report_config_rejects_bad_entries() {
        assert!(ReportConfig::from_lookup(lookup(&[("DATASETS", "dawn.csv")])).is_err());
        assert!(ReportConfig::from_lookup(lookup(&[("DATASETS", "=dawn.csv")])).is_err());
        assert_eq!(
            ReportConfig::from_lookup(lookup(&[("DATASETS", "a=a.csv"), ("PROVIDERS", "open_ai")]))
                .unwrap_err(),
            ConfigError::InvalidValue {
                key: "PROVIDERS".to_string(),
                value: "open_ai".to_string(),
            }
        );
    }
}
