//! Core library for the PVForecast irradiance client.
//!
//! This crate defines:
//! - `ForecastClient`, the HTTP client for hourly and daily irradiance forecasts
//! - Shared domain models (queries, forecast series)
//! - The error taxonomy returned by client calls
//! - Configuration & credentials handling
//!
//! It is used by `pvforecast-cli`, but can also be reused by other binaries or services.
//!
//! ```no_run
//! # async fn run() -> Result<(), pvforecast_core::ForecastError> {
//! let client = pvforecast_core::ForecastClient::new("my-api-key")?;
//! let series = client.get_hourly_irradiance(50.08, 14.42, 48).await?;
//! for point in &series {
//!     println!("{}: {:?}", point.time, point.irradiance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use client::{ForecastClient, IrradianceForecaster};
pub use config::{ClientConfig, Config, Location};
pub use error::ForecastError;
pub use model::{
    ApiKey, Dst, ForecastPoint, ForecastQuery, ForecastSeries, ForecastStart, PointTime,
    Resolution,
};
