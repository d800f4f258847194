use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;
use std::fmt;
use thiserror::Error;

/// Largest forecast window the provider serves.
pub const MAX_DAYS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("day count {0} is out of range; expected 1..=10")]
    DayCountOutOfRange(u8),
}

/// Number of forecast days to request, always within `1..=MAX_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayCount(u8);

impl DayCount {
    pub fn new(days: u8) -> Result<Self, ParamsError> {
        if (1..=MAX_DAYS).contains(&days) {
            Ok(Self(days))
        } else {
            Err(ParamsError::DayCountOutOfRange(days))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for DayCount {
    type Error = ParamsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
        }
    }

    /// Code the provider expects in the `units` request parameter.
    pub fn code(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "e",
            UnitSystem::Metric => "m",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Imperial, UnitSystem::Metric]
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "imperial" | "e" => Ok(UnitSystem::Imperial),
            "metric" | "m" => Ok(UnitSystem::Metric),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported unit systems: imperial, metric."
            )),
        }
    }
}

/// Parameters of one fetch/extract cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestParameters {
    pub day_count: DayCount,
    pub latitude: f64,
    pub longitude: f64,
    pub units: UnitSystem,
}

impl RequestParameters {
    pub fn new(day_count: DayCount, latitude: f64, longitude: f64, units: UnitSystem) -> Self {
        Self { day_count, latitude, longitude, units }
    }

    pub fn duration(&self) -> String {
        format!("{}day", self.day_count)
    }

    /// `lat,lon`, keeping a trailing `.0` on whole degrees as the provider's web client does.
    pub fn geocode(&self) -> String {
        format!("{:?},{:?}", self.latitude, self.longitude)
    }

    /// Key under which the provider echoes the forecast for these parameters.
    pub fn payload_key(&self) -> String {
        format!(
            "duration:{};geocode:{};units:{}",
            self.duration(),
            self.geocode(),
            self.units.code()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Ok,
    Failed(String),
}

impl RecordStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, RecordStatus::Ok)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Ok => f.write_str("OK"),
            RecordStatus::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}

impl Serialize for RecordStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One scraped forecast day. Readings keep the number exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub local_date: Option<String>,
    pub max_temp: Option<Number>,
    pub min_temp: Option<Number>,
    pub uv_index: Option<Number>,
    #[serde(rename = "cloudCoverAM")]
    pub cloud_cover_am: Option<Number>,
    #[serde(rename = "cloudCoverPM")]
    pub cloud_cover_pm: Option<Number>,
    #[serde(rename = "rainChanceAM")]
    pub rain_chance_am: Option<Number>,
    #[serde(rename = "rainChancePM")]
    pub rain_chance_pm: Option<Number>,
    #[serde(rename = "windSpeedAM")]
    pub wind_speed_am: Option<Number>,
    #[serde(rename = "windSpeedPM")]
    pub wind_speed_pm: Option<Number>,
    pub scrape_timestamp: String,
    pub source_url: String,
    pub status: RecordStatus,
}

impl ForecastRecord {
    /// Column names, in field order.
    pub const HEADERS: [&'static str; 13] = [
        "localDate",
        "maxTemp",
        "minTemp",
        "uvIndex",
        "cloudCoverAM",
        "cloudCoverPM",
        "rainChanceAM",
        "rainChancePM",
        "windSpeedAM",
        "windSpeedPM",
        "scrapeTimestamp",
        "sourceUrl",
        "status",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_accepts_full_range() {
        for days in 1..=MAX_DAYS {
            assert_eq!(DayCount::new(days).map(DayCount::get), Ok(days));
        }
    }

    #[test]
    fn day_count_rejects_zero_and_eleven() {
        assert_eq!(DayCount::new(0), Err(ParamsError::DayCountOutOfRange(0)));
        assert_eq!(DayCount::try_from(11), Err(ParamsError::DayCountOutOfRange(11)));
    }

    #[test]
    fn unit_system_as_str_roundtrip() {
        for units in UnitSystem::all() {
            let parsed = UnitSystem::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_unit_system_error() {
        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn payload_key_matches_provider_format() {
        let params = RequestParameters::new(
            DayCount::new(7).unwrap(),
            26.231,
            -98.445,
            UnitSystem::Imperial,
        );

        assert_eq!(params.payload_key(), "duration:7day;geocode:26.231,-98.445;units:e");
    }

    #[test]
    fn geocode_keeps_fraction_on_whole_degrees() {
        let params =
            RequestParameters::new(DayCount::new(1).unwrap(), 26.0, -98.0, UnitSystem::Metric);

        assert_eq!(params.geocode(), "26.0,-98.0");
        assert_eq!(params.payload_key(), "duration:1day;geocode:26.0,-98.0;units:m");
    }

    #[test]
    fn serialized_field_names_match_headers() {
        let record = ForecastRecord {
            local_date: None,
            max_temp: None,
            min_temp: None,
            uv_index: None,
            cloud_cover_am: None,
            cloud_cover_pm: None,
            rain_chance_am: None,
            rain_chance_pm: None,
            wind_speed_am: None,
            wind_speed_pm: None,
            scrape_timestamp: String::new(),
            source_url: String::new(),
            status: RecordStatus::Ok,
        };

        let value = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let mut headers = ForecastRecord::HEADERS.to_vec();
        keys.sort_unstable();
        headers.sort_unstable();
        assert_eq!(keys, headers);
    }

    #[test]
    fn status_renders_ok_and_failed() {
        assert_eq!(RecordStatus::Ok.to_string(), "OK");
        assert_eq!(
            RecordStatus::Failed("index 4 out of range".into()).to_string(),
            "Failed: index 4 out of range"
        );
    }
}
