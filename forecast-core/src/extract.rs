//! Maps the provider's day/night-interleaved forecast document onto one
//! [`ForecastRecord`] per requested day.
//!
//! Offset 0 of every array is "today" and is skipped. For day offset `d`
//! the daypart arrays hold the day reading at `2d` and the night reading
//! at `2d + 1`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::error;

use crate::{
    model::{ForecastRecord, RecordStatus, RequestParameters},
    request::OPERATION,
};

/// Length of the `:SS±HH:MM` tail cut from `validTimeLocal` entries.
const LOCAL_TIME_SUFFIX_LEN: usize = 9;

/// Failure that leaves no day extractable.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at '{0}'")]
    NotAnObject(String),

    #[error("missing key '{0}' in forecast response")]
    MissingPath(String),
}

/// Failure confined to a single forecast day.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DayError {
    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("'{0}' is not an array")]
    NotAnArray(String),

    #[error("index {index} out of range for '{field}'")]
    IndexOutOfRange { field: String, index: usize },

    #[error("'{field}[{index}]' is not {expected}")]
    TypeMismatch { field: String, index: usize, expected: &'static str },

    #[error("'{0}' is too short to trim its time suffix")]
    ShortTimestamp(String),

    #[error("cannot trim time suffix from '{0}'")]
    UntrimmableTimestamp(String),
}

/// Lazy sequence of records for one parsed response.
#[derive(Debug)]
pub struct DailyRecords {
    data: Value,
    days: RangeInclusive<usize>,
    scrape_timestamp: String,
    source_url: String,
}

/// Parses `raw` and locates the forecast payload for `params`.
///
/// Only document-level failures are returned as errors; per-day lookups
/// are resolved lazily as the returned iterator advances.
pub fn extract(
    raw: &str,
    params: &RequestParameters,
    source_url: &str,
    now: DateTime<Utc>,
) -> Result<DailyRecords, ExtractError> {
    let mut root: Value = serde_json::from_str(raw)?;
    if !root.is_object() {
        return Err(ExtractError::NotAnObject("$".to_string()));
    }

    let key = params.payload_key();
    let mut node = &mut root;
    for segment in ["dal", OPERATION, key.as_str(), "data"] {
        node = node
            .get_mut(segment)
            .ok_or_else(|| ExtractError::MissingPath(segment.to_string()))?;
    }
    if !node.is_object() {
        return Err(ExtractError::NotAnObject("data".to_string()));
    }

    Ok(DailyRecords {
        data: node.take(),
        days: 1..=usize::from(params.day_count.get()),
        scrape_timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        source_url: source_url.to_string(),
    })
}

/// Like [`extract`], but logs a fatal error and yields no records instead.
pub fn extract_or_empty(
    raw: &str,
    params: &RequestParameters,
    source_url: &str,
    now: DateTime<Utc>,
) -> Vec<ForecastRecord> {
    match extract(raw, params, source_url, now) {
        Ok(records) => records.collect(),
        Err(err) => {
            error!(
                error = %err,
                url = source_url,
                "An error occurred while parsing forecast data"
            );
            Vec::new()
        }
    }
}

impl Iterator for DailyRecords {
    type Item = ForecastRecord;

    fn next(&mut self) -> Option<ForecastRecord> {
        let day = self.days.next()?;

        let mut readings = DayReadings::default();
        let status = match readings.fill(&self.data, day) {
            Ok(()) => RecordStatus::Ok,
            Err(err) => {
                error!(day, error = %err, "An error occurred while scraping weather data");
                RecordStatus::Failed(err.to_string())
            }
        };

        Some(readings.into_record(
            self.scrape_timestamp.clone(),
            self.source_url.clone(),
            status,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.days.size_hint()
    }
}

impl ExactSizeIterator for DailyRecords {}

#[derive(Debug, Default)]
struct DayReadings {
    local_date: Option<String>,
    max_temp: Option<Number>,
    min_temp: Option<Number>,
    uv_index: Option<Number>,
    cloud_cover_am: Option<Number>,
    cloud_cover_pm: Option<Number>,
    rain_chance_am: Option<Number>,
    rain_chance_pm: Option<Number>,
    wind_speed_am: Option<Number>,
    wind_speed_pm: Option<Number>,
}

impl DayReadings {
    /// Reads fields in order, stopping at the first failed lookup.
    fn fill(&mut self, data: &Value, day: usize) -> Result<(), DayError> {
        let am = day * 2;
        let pm = am + 1;

        self.local_date = local_date(data, day)?;
        self.max_temp = metric(data, "temperatureMax", day)?;
        self.min_temp = metric(data, "temperatureMin", day)?;

        let daypart = daypart(data)?;
        // Night UV is always zero upstream, so only the day reading is kept.
        self.uv_index = metric(daypart, "uvIndex", am)?;
        self.cloud_cover_am = metric(daypart, "cloudCover", am)?;
        self.cloud_cover_pm = metric(daypart, "cloudCover", pm)?;
        self.rain_chance_am = metric(daypart, "precipChance", am)?;
        self.rain_chance_pm = metric(daypart, "precipChance", pm)?;
        self.wind_speed_am = metric(daypart, "windSpeed", am)?;
        self.wind_speed_pm = metric(daypart, "windSpeed", pm)?;

        Ok(())
    }

    fn into_record(
        self,
        scrape_timestamp: String,
        source_url: String,
        status: RecordStatus,
    ) -> ForecastRecord {
        ForecastRecord {
            local_date: self.local_date,
            max_temp: self.max_temp,
            min_temp: self.min_temp,
            uv_index: self.uv_index,
            cloud_cover_am: self.cloud_cover_am,
            cloud_cover_pm: self.cloud_cover_pm,
            rain_chance_am: self.rain_chance_am,
            rain_chance_pm: self.rain_chance_pm,
            wind_speed_am: self.wind_speed_am,
            wind_speed_pm: self.wind_speed_pm,
            scrape_timestamp,
            source_url,
            status,
        }
    }
}

fn daypart(data: &Value) -> Result<&Value, DayError> {
    lookup(data, "daypart", 0)
}

/// `node[field][index]`, failing on an absent key or index.
fn lookup<'a>(node: &'a Value, field: &str, index: usize) -> Result<&'a Value, DayError> {
    let array = node
        .get(field)
        .ok_or_else(|| DayError::MissingKey(field.to_string()))?
        .as_array()
        .ok_or_else(|| DayError::NotAnArray(field.to_string()))?;

    array.get(index).ok_or_else(|| DayError::IndexOutOfRange {
        field: field.to_string(),
        index,
    })
}

/// Numeric reading, passed through as sent; `null` is an empty reading rather than a failure.
fn metric(node: &Value, field: &str, index: usize) -> Result<Option<Number>, DayError> {
    match lookup(node, field, index)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(n.clone())),
        _ => Err(DayError::TypeMismatch {
            field: field.to_string(),
            index,
            expected: "a number",
        }),
    }
}

fn local_date(data: &Value, day: usize) -> Result<Option<String>, DayError> {
    const FIELD: &str = "validTimeLocal";

    let raw = match lookup(data, FIELD, day)? {
        Value::Null => return Ok(None),
        Value::String(s) => s,
        _ => {
            return Err(DayError::TypeMismatch {
                field: FIELD.to_string(),
                index: day,
                expected: "a string",
            });
        }
    };

    let end = raw
        .len()
        .checked_sub(LOCAL_TIME_SUFFIX_LEN)
        .ok_or_else(|| DayError::ShortTimestamp(raw.clone()))?;

    raw.get(..end)
        .map(|date| Some(date.to_string()))
        .ok_or_else(|| DayError::UntrimmableTimestamp(raw.clone()))
}
