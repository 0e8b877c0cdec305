use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ForecastError, Result};

/// PVForecast API key. Immutable once constructed; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ForecastError::invalid("api_key", "must not be empty"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Forecast granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Hourly,
    Daily,
}

impl Resolution {
    /// Value of the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Hourly => "hour",
            Resolution::Daily => "day",
        }
    }

    /// Documented default horizon: 48 hours or 2 days.
    pub const fn default_length(&self) -> u32 {
        match self {
            Resolution::Hourly => 48,
            Resolution::Daily => 2,
        }
    }

    /// Longest horizon the service produces.
    pub const fn max_length(&self) -> u32 {
        match self {
            Resolution::Hourly => 72,
            Resolution::Daily => 3,
        }
    }

    /// Unit of the irradiance values in a series of this resolution.
    pub const fn unit(&self) -> &'static str {
        match self {
            Resolution::Hourly => "W/m²",
            Resolution::Daily => "Wh/m²",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daylight saving time handling applied by the service to returned times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dst {
    #[default]
    Auto,
    Disabled,
}

impl Dst {
    /// Value of the `dst` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Dst::Auto => "1",
            Dst::Disabled => "0",
        }
    }
}

impl TryFrom<&str> for Dst {
    type Error = ForecastError;

    fn try_from(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "auto" | "1" => Ok(Dst::Auto),
            "disabled" | "0" => Ok(Dst::Disabled),
            _ => Err(ForecastError::invalid(
                "dst",
                format!("unknown value '{value}', expected 'auto' or 'disabled'"),
            )),
        }
    }
}

/// First day covered by the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStart {
    #[default]
    Auto,
    Today,
    Tomorrow,
}

impl ForecastStart {
    /// Value of the `start` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastStart::Auto => "auto",
            ForecastStart::Today => "today",
            ForecastStart::Tomorrow => "tomorrow",
        }
    }
}

impl fmt::Display for ForecastStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ForecastStart {
    type Error = ForecastError;

    fn try_from(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "auto" => Ok(ForecastStart::Auto),
            "today" => Ok(ForecastStart::Today),
            "tomorrow" => Ok(ForecastStart::Tomorrow),
            _ => Err(ForecastError::invalid(
                "start",
                format!("unknown value '{value}', expected 'auto', 'today' or 'tomorrow'"),
            )),
        }
    }
}

/// Parameters of a single forecast request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub length: u32,
    pub dst: Dst,
    pub start: ForecastStart,
}

impl ForecastQuery {
    pub fn new(latitude: f64, longitude: f64, length: u32) -> Self {
        Self { latitude, longitude, length, dst: Dst::default(), start: ForecastStart::default() }
    }

    pub fn with_dst(mut self, dst: Dst) -> Self {
        self.dst = dst;
        self
    }

    pub fn with_start(mut self, start: ForecastStart) -> Self {
        self.start = start;
        self
    }

    /// Check coordinates and horizon length against the bounds for `resolution`.
    pub fn validate(&self, resolution: Resolution) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ForecastError::invalid(
                "lat",
                format!("must be within -90..=90, got {}", self.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ForecastError::invalid(
                "lon",
                format!("must be within -180..=180, got {}", self.longitude),
            ));
        }

        let max = resolution.max_length();
        if self.length == 0 || self.length > max {
            return Err(ForecastError::invalid(
                "length",
                format!("{resolution} forecast length must be within 1..={max}, got {}", self.length),
            ));
        }

        Ok(())
    }
}

/// Time slot of a forecast point, exactly as the service labelled it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointTime {
    /// Hour or day number.
    Index(u32),
    Timestamp(String),
}

impl PointTime {
    /// Wall-clock time of a timestamp slot. The offset of an RFC 3339 value is dropped.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        let PointTime::Timestamp(s) = self else {
            return None;
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }

        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }
}

impl fmt::Display for PointTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointTime::Index(i) => write!(f, "{i}"),
            PointTime::Timestamp(s) => f.write_str(s),
        }
    }
}

impl From<u32> for PointTime {
    fn from(value: u32) -> Self {
        PointTime::Index(value)
    }
}

impl From<&str> for PointTime {
    fn from(value: &str) -> Self {
        PointTime::Timestamp(value.to_string())
    }
}

/// One predicted irradiance value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: PointTime,
    /// W/m² for hourly points, Wh/m² daily total for daily points; `None` when the service sent `null`.
    pub irradiance: Option<f64>,
}

impl ForecastPoint {
    pub fn new(time: impl Into<PointTime>, irradiance: Option<f64>) -> Self {
        Self { time: time.into(), irradiance }
    }
}

/// Forecast points in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub resolution: Resolution,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastPoint> {
        self.points.iter()
    }
}

impl IntoIterator for ForecastSeries {
    type Item = ForecastPoint;
    type IntoIter = std::vec::IntoIter<ForecastPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a ForecastSeries {
    type Item = &'a ForecastPoint;
    type IntoIter = std::slice::Iter<'a, ForecastPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_rejects_blank_and_hides_value() {
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("   ").is_err());

        let key = ApiKey::new("secret-key").expect("valid key");
        assert_eq!(key.as_str(), "secret-key");
        assert!(!format!("{key:?}").contains("secret-key"));
    }

    #[test]
    fn resolution_defaults_fit_within_bounds() {
        assert_eq!(Resolution::Hourly.as_str(), "hour");
        assert_eq!(Resolution::Daily.to_string(), "day");
        assert_eq!(Resolution::Hourly.default_length(), 48);
        assert_eq!(Resolution::Daily.default_length(), 2);
        for res in [Resolution::Hourly, Resolution::Daily] {
            assert!(res.default_length() <= res.max_length());
        }
    }

    #[test]
    fn dst_and_start_parse() {
        assert_eq!(Dst::try_from("auto").unwrap(), Dst::Auto);
        assert_eq!(Dst::try_from("0").unwrap(), Dst::Disabled);
        assert!(Dst::try_from("2").is_err());
        assert_eq!(Dst::Disabled.as_param(), "0");

        assert_eq!(ForecastStart::try_from("Tomorrow").unwrap(), ForecastStart::Tomorrow);
        assert!(ForecastStart::try_from("invalid").is_err());
    }

    #[test]
    fn validate_accepts_boundaries() {
        assert!(ForecastQuery::new(90.0, 180.0, 72).validate(Resolution::Hourly).is_ok());
        assert!(ForecastQuery::new(-90.0, -180.0, 1).validate(Resolution::Hourly).is_ok());
        assert!(ForecastQuery::new(50.0, 14.0, 3).validate(Resolution::Daily).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let cases = [
            (ForecastQuery::new(91.0, 14.0, 48), Resolution::Hourly, "lat"),
            (ForecastQuery::new(-90.5, 14.0, 48), Resolution::Hourly, "lat"),
            (ForecastQuery::new(f64::NAN, 14.0, 48), Resolution::Hourly, "lat"),
            (ForecastQuery::new(50.0, 180.1, 48), Resolution::Hourly, "lon"),
            (ForecastQuery::new(50.0, 14.0, 0), Resolution::Hourly, "length"),
            (ForecastQuery::new(50.0, 14.0, 73), Resolution::Hourly, "length"),
            (ForecastQuery::new(50.0, 14.0, 5), Resolution::Daily, "length"),
        ];

        for (query, res, expected) in cases {
            match query.validate(res) {
                Err(ForecastError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected invalid '{expected}' for {query:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn point_time_parses_service_timestamps() {
        let rfc = PointTime::from("2023-10-01T06:00:00Z").as_datetime().expect("rfc3339");
        assert_eq!(rfc.format("%Y-%m-%d %H:%M").to_string(), "2023-10-01 06:00");

        let plain = PointTime::from("2023-10-01 13:00:00").as_datetime().expect("plain");
        assert_eq!(plain.format("%H:%M").to_string(), "13:00");

        assert!(PointTime::Index(3).as_datetime().is_none());
        assert!(PointTime::from("tomorrow").as_datetime().is_none());
    }

    #[test]
    fn series_serializes_indices_as_numbers() {
        let series = ForecastSeries {
            resolution: Resolution::Hourly,
            points: vec![ForecastPoint::new(0, Some(123.4)), ForecastPoint::new("2023-10-01", None)],
        };

        let json = serde_json::to_value(&series).expect("should serialize");
        assert_eq!(json["resolution"], "hourly");
        assert_eq!(json["points"][0]["time"], 0);
        assert_eq!(json["points"][1]["time"], "2023-10-01");
        assert!(json["points"][1]["irradiance"].is_null());
    }
}
