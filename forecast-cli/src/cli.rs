use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use forecast_core::{Config, DayCount, UnitSystem, WeatherComSource, write_csv_file};
use inquire::{CustomType, Select, Text};
use std::path::PathBuf;
use tracing::{info, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "weather.com daily forecast scraper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the forecast and write one CSV row per day.
    Scrape(ScrapeArgs),

    /// Interactively set location, forecast window, units and output file.
    Configure,

    /// Print the effective configuration and where it is stored.
    Config,
}

/// Per-run overrides of the stored configuration.
#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Number of days to scrape, 1 to 10.
    #[arg(long)]
    pub days: Option<u8>,

    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// "imperial" or "metric".
    #[arg(long, value_parser = parse_units)]
    pub units: Option<UnitSystem>,

    /// CSV file to write.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ScrapeArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(lat) = self.lat {
            config.location.latitude = lat;
        }
        if let Some(lon) = self.lon {
            config.location.longitude = lon;
        }
        if let Some(units) = self.units {
            config.units = units;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
    }
}

fn parse_units(value: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Scrape(args) => scrape(args).await,
            Command::Configure => configure(),
            Command::Config => show_config(),
        }
    }
}

async fn scrape(args: ScrapeArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    args.apply(&mut config);
    let params = config.request_parameters()?;

    let source = WeatherComSource::new();
    let records = forecast_core::scrape(&source, &config.endpoint, &params, Utc::now()).await?;

    if records.is_empty() {
        warn!("No forecast days could be extracted; writing header only");
    }

    let written = write_csv_file(&config.output, &records)?;
    info!(rows = written, path = %config.output.display(), "Wrote forecast");

    let failed = records.iter().filter(|r| !r.status.is_ok()).count();
    println!(
        "Wrote {written} day(s) to {} ({failed} failed)",
        config.output.display()
    );

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let latitude = CustomType::<f64>::new("Latitude:")
        .with_default(config.location.latitude)
        .prompt()?;
    let longitude = CustomType::<f64>::new("Longitude:")
        .with_default(config.location.longitude)
        .prompt()?;

    let days = CustomType::<u8>::new("Days to scrape (1-10):")
        .with_default(config.days)
        .prompt()?;
    DayCount::new(days).context("Invalid number of days")?;

    let units = UnitSystem::all().to_vec();
    let cursor = units.iter().position(|u| *u == config.units).unwrap_or(0);
    let units = Select::new("Units:", units).with_starting_cursor(cursor).prompt()?;

    let current_output = config.output.display().to_string();
    let output = Text::new("Output CSV file:")
        .with_default(&current_output)
        .prompt()?;

    config.location.latitude = latitude;
    config.location.longitude = longitude;
    config.days = days;
    config.units = units;
    config.output = PathBuf::from(output);

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn show_config() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let config = Config::load()?;

    println!("# {}", path.display());
    print!("{}", config.to_toml()?);

    Ok(())
}
