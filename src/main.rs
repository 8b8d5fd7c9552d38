use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vgsales::config::AppConfig;
use vgsales::sales::{SalesFilter, SalesService, MIN_RELEASE_YEAR};

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    year_from: Option<i32>,
    year_to: Option<i32>,
    genre: Option<String>,
    platform: Option<String>,
    publisher: Option<String>,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = CliArgs::default();
        let mut iter = args.iter();

        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .with_context(|| format!("Missing value for {}", flag))
            };

            match flag.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--year-from" => parsed.year_from = Some(parse_year(&value()?)?),
                "--year-to" => parsed.year_to = Some(parse_year(&value()?)?),
                "--genre" => parsed.genre = Some(value()?),
                "--platform" => parsed.platform = Some(value()?),
                "--publisher" => parsed.publisher = Some(value()?),
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(parsed)
    }

    /// Missing year bounds are open-ended.
    fn filter(&self) -> SalesFilter {
        let mut filter = SalesFilter::new();
        if self.year_from.is_some() || self.year_to.is_some() {
            filter = filter.with_year_range(
                self.year_from.unwrap_or(MIN_RELEASE_YEAR),
                self.year_to.unwrap_or(i32::MAX),
            );
        }
        filter.genre = self.genre.clone();
        filter.platform = self.platform.clone();
        filter.publisher = self.publisher.clone();
        filter
    }
}

fn parse_year(value: &str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .with_context(|| format!("Invalid year: {}", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vgsales=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli = CliArgs::parse(&args)?;

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::info!("Using sales data at {}", config.data_path.display());

    let service = SalesService::new(config);
    let table = service
        .dataset()
        .await
        .context("Failed to load sales data")?;

    let report = service.report(&table, &cli.filter());
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
