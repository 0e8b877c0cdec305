use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::fmt::Write as _;

use pvforecast_core::{
    Config, Dst, ForecastClient, ForecastQuery, ForecastSeries, ForecastStart,
    IrradianceForecaster, Resolution,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "pvforecast", version, about = "PVForecast solar irradiance CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and an optional default location.
    Configure,

    /// Show the hourly irradiance forecast (W/m²).
    Hourly(ForecastArgs),

    /// Show the daily irradiance totals (Wh/m²).
    Daily(ForecastArgs),
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Latitude; defaults to the configured location.
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude; defaults to the configured location.
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Number of hours (1-72) or days (1-3). Defaults to 48 hours or 2 days.
    #[arg(long)]
    length: Option<u32>,

    /// Daylight saving handling: "auto" or "disabled".
    #[arg(long)]
    dst: Option<String>,

    /// Forecast start: "auto", "today" or "tomorrow".
    #[arg(long)]
    start: Option<String>,

    /// Print the series as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Hourly(args) => show(Resolution::Hourly, args).await,
            Command::Daily(args) => show(Resolution::Daily, args).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("PVForecast API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key.trim().to_string());

    let set_location = inquire::Confirm::new("Set a default location?")
        .with_default(cfg.location.is_none())
        .prompt()
        .context("Failed to read answer")?;

    if set_location {
        let latitude = inquire::CustomType::<f64>::new("Latitude (-90..90):")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = inquire::CustomType::<f64>::new("Longitude (-180..180):")
            .prompt()
            .context("Failed to read longitude")?;
        ForecastQuery::new(latitude, longitude, 1).validate(Resolution::Hourly)?;
        cfg.set_location(latitude, longitude);
    }

    let path = cfg.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(resolution: Resolution, args: ForecastArgs) -> Result<()> {
    let cfg = Config::load()?;
    let query = build_query(&cfg, resolution, &args)?;
    tracing::debug!(?query, %resolution, "Built forecast query");

    let client = ForecastClient::with_config(cfg.api_key()?, cfg.client.clone())?;
    let series = fetch(&client, resolution, &query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print!("{}", render(&series));
    }

    Ok(())
}

async fn fetch(
    forecaster: &dyn IrradianceForecaster,
    resolution: Resolution,
    query: &ForecastQuery,
) -> Result<ForecastSeries> {
    forecaster.forecast(resolution, query).await.with_context(|| {
        format!(
            "Failed to fetch {resolution} forecast for {}, {}",
            query.latitude, query.longitude
        )
    })
}

fn build_query(cfg: &Config, resolution: Resolution, args: &ForecastArgs) -> Result<ForecastQuery> {
    let (latitude, longitude) = match (args.lat, args.lon, cfg.location) {
        (Some(lat), Some(lon), _) => (lat, lon),
        (None, None, Some(loc)) => (loc.latitude, loc.longitude),
        (None, None, None) => {
            return Err(anyhow!(
                "No location given.\n\
                 Hint: pass --lat and --lon, or run `pvforecast configure` to store a default."
            ));
        }
        _ => return Err(anyhow!("--lat and --lon must be given together")),
    };

    let dst = match &args.dst {
        Some(s) => Dst::try_from(s.as_str())?,
        None => cfg.client.dst,
    };
    let start = match &args.start {
        Some(s) => ForecastStart::try_from(s.as_str())?,
        None => cfg.client.start,
    };

    Ok(ForecastQuery::new(
        latitude,
        longitude,
        args.length.unwrap_or(resolution.default_length()),
    )
    .with_dst(dst)
    .with_start(start))
}

fn render(series: &ForecastSeries) -> String {
    let unit = series.resolution.unit();
    let mut out = String::new();

    for point in series {
        let value = point
            .irradiance
            .map(|v| format!("{v} {unit}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{}\t{value}", point.time);
    }

    out
}
