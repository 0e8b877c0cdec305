//! HTTP client for the PVForecast irradiance API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::{debug, instrument, warn};

use crate::{
    config::ClientConfig,
    error::{ForecastError, Result},
    model::{ApiKey, ForecastPoint, ForecastQuery, ForecastSeries, PointTime, Resolution},
};

/// Source of irradiance forecasts.
#[async_trait]
pub trait IrradianceForecaster: Send + Sync + Debug {
    async fn forecast(&self, resolution: Resolution, query: &ForecastQuery)
    -> Result<ForecastSeries>;
}

/// Client for the PVForecast service.
///
/// Holds the API key and a pooled `reqwest::Client`; it is cheap to clone and
/// safe to share between tasks. Every call sends exactly one request.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    api_key: ApiKey,
    config: ClientConfig,
    http: Client,
}

impl ForecastClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, ClientConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let api_key = ApiKey::new(api_key)?;
        if config.timeout_secs == 0 {
            return Err(ForecastError::invalid("timeout_secs", "must be at least 1 second"));
        }
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self { api_key, config, http })
    }

    /// Hourly irradiance in W/m² for the next `length` hours (1..=72).
    pub async fn get_hourly_irradiance(
        &self,
        lat: f64,
        lon: f64,
        length: u32,
    ) -> Result<ForecastSeries> {
        self.fetch(Resolution::Hourly, &self.query(lat, lon, length)).await
    }

    /// Daily irradiance totals in Wh/m² for the next `length` days (1..=3).
    pub async fn get_daily_irradiance(
        &self,
        lat: f64,
        lon: f64,
        length: u32,
    ) -> Result<ForecastSeries> {
        self.fetch(Resolution::Daily, &self.query(lat, lon, length)).await
    }

    fn query(&self, lat: f64, lon: f64, length: u32) -> ForecastQuery {
        ForecastQuery::new(lat, lon, length)
            .with_dst(self.config.dst)
            .with_start(self.config.start)
    }

    /// Validate `query`, send one request and decode the response.
    #[instrument(
        skip(self, query),
        fields(lat = query.latitude, lon = query.longitude, length = query.length)
    )]
    pub async fn fetch(
        &self,
        resolution: Resolution,
        query: &ForecastQuery,
    ) -> Result<ForecastSeries> {
        query.validate(resolution)?;

        let number = query.length.to_string();
        let lat = query.latitude.to_string();
        let lon = query.longitude.to_string();

        debug!(url = %self.config.base_url, "Requesting irradiance forecast");

        let res = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("forecast", "pv"),
                ("format", "json"),
                ("type", resolution.as_str()),
                ("number", number.as_str()),
                ("dst", query.dst.as_param()),
                ("start", query.start.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            debug!(%status, "PVForecast rejected request");
            return Err(ForecastError::Service {
                status: status.as_u16(),
                message: truncate_body(&String::from_utf8_lossy(&body)),
            });
        }

        let points = decode_points(&body)?;

        if points.len() != query.length as usize {
            warn!(
                requested = query.length,
                received = points.len(),
                "PVForecast returned a different number of points than requested"
            );
        }
        debug!(points = points.len(), "Decoded irradiance forecast");

        Ok(ForecastSeries { resolution, points })
    }
}

#[async_trait]
impl IrradianceForecaster for ForecastClient {
    async fn forecast(
        &self,
        resolution: Resolution,
        query: &ForecastQuery,
    ) -> Result<ForecastSeries> {
        self.fetch(resolution, query).await
    }
}

/// The service answers with a bare array of `[time, value]` pairs; the
/// wrapped `{"data": [...]}` form with record entries is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PvResponse {
    Bare(Vec<PvPoint>),
    Wrapped { data: Vec<PvPoint> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PvPoint {
    Pair(PointTime, Option<f64>),
    Record(PvRecord),
}

#[derive(Debug, Deserialize)]
struct PvRecord {
    #[serde(alias = "day", alias = "timestamp")]
    hour: PointTime,
    // `null` is a valid value but the field itself must be present.
    #[serde(alias = "total_irradiance", deserialize_with = "Option::deserialize")]
    irradiance: Option<f64>,
}

impl From<PvPoint> for ForecastPoint {
    fn from(point: PvPoint) -> Self {
        match point {
            PvPoint::Pair(time, irradiance) => ForecastPoint { time, irradiance },
            PvPoint::Record(r) => ForecastPoint { time: r.hour, irradiance: r.irradiance },
        }
    }
}

/// Any malformed entry fails the whole body; points are never skipped.
/// Bytes that are not UTF-8 are rejected rather than replaced.
fn decode_points(body: &[u8]) -> Result<Vec<ForecastPoint>> {
    let parsed: PvResponse = serde_json::from_slice(body).map_err(|source| {
        ForecastError::Decode { source, body: truncate_body(&String::from_utf8_lossy(body)) }
    })?;

    let raw = match parsed {
        PvResponse::Bare(points) | PvResponse::Wrapped { data: points } => points,
    };

    Ok(raw.into_iter().map(ForecastPoint::from).collect())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
