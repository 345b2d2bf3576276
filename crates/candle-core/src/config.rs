use crate::error::{CandleError, Result};
use crate::types::IntervalType;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// What an aggregation pass does when an instrument has no "latest" quote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingLatestPolicy {
    /// Fail the whole batch; nothing is written for the interval
    #[default]
    Abort,
    /// Drop only the affected instrument and keep going
    Skip,
}

impl FromStr for MissingLatestPolicy {
    type Err = CandleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(MissingLatestPolicy::Abort),
            "skip" => Ok(MissingLatestPolicy::Skip),
            other => Err(CandleError::Config(format!(
                "unknown missing-latest policy '{}' (expected abort|skip)",
                other
            ))),
        }
    }
}

/// What a batch insert does when a (instrument, interval, start) row already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Roll back the whole batch
    #[default]
    Fail,
    /// Keep the existing row and skip the new one
    Skip,
}

impl FromStr for ConflictPolicy {
    type Err = CandleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(ConflictPolicy::Fail),
            "skip" => Ok(ConflictPolicy::Skip),
            other => Err(CandleError::Config(format!(
                "unknown conflict policy '{}' (expected fail|skip)",
                other
            ))),
        }
    }
}

/// Scheduled aggregation configuration
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Run the scheduled job at all (default: true)
    pub enabled: bool,
    /// Interval produced by the scheduled job
    pub interval: IntervalType,
    pub missing_latest: MissingLatestPolicy,
    /// Seconds to wait past the interval boundary so the quote source has the last samples
    pub tick_delay_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: IntervalType::Minute1,
            missing_latest: MissingLatestPolicy::Abort,
            tick_delay_secs: 1,
        }
    }
}

impl AggregationConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let enabled = env::var("CANDLE_AGGREGATION_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.enabled);

        let missing_latest = match env::var("CANDLE_MISSING_LATEST_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.missing_latest,
        };

        let tick_delay_secs = parse_env("CANDLE_TICK_DELAY_SECS")?.unwrap_or(defaults.tick_delay_secs);

        Ok(Self {
            enabled,
            missing_latest,
            tick_delay_secs,
            ..defaults
        })
    }
}

/// Read an optional numeric variable, rejecting values that do not parse
pub fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CandleError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Read a required variable, stripping surrounding quotes and whitespace
pub fn required_env(name: &str) -> Result<String> {
    let raw = env::var(name).map_err(|_| CandleError::MissingEnvVar(name.to_string()))?;
    Ok(sanitize_url(&raw))
}

/// Remove surrounding quotes and whitespace from a URL-like value
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    let quoted = (trimmed.starts_with('"') && trimmed.ends_with('"'))
        || (trimmed.starts_with('\'') && trimmed.ends_with('\''));
    let without_quotes = if quoted && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    without_quotes.to_string()
}
