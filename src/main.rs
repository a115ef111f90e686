mod config;
mod data;
mod engine;
mod error;
mod ml;
mod report;
mod types;
mod web;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LoggingSettings};
use engine::{target_date, ForecastContext};
use types::{parse_date, CovariateLookup, ForecastQuery};
use web::{start_server, AppState};

#[derive(Parser)]
#[command(name = "sales-forecast")]
#[command(version)]
#[command(about = "Monthly automotive sales forecast from a trend model and seasonal ARIMA ensemble", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and dashboard
    Serve {
        /// Listen port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the forecast for one date
    Forecast {
        /// Query date (YYYY-MM-DD); the forecast targets one month earlier
        #[arg(short, long)]
        date: String,
        /// Trend model weight, defaults to forecast.default_alpha
        #[arg(short, long, allow_negative_numbers = true)]
        alpha: Option<f64>,
    },
    /// Print the exogenous variables used for a date
    Inputs {
        /// Query date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?;
    config
        .validate()
        .map_err(|errors| anyhow!("Invalid configuration: {}", errors.join(", ")))?;

    init_logging(&config.logging, cli.verbose)?;
    info!("Sales Forecast v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { port } => {
            serve(&config, port.unwrap_or(config.server.port)).await?;
        }
        Commands::Forecast { date, alpha } => {
            print_forecast(&config, &date, alpha.unwrap_or(config.forecast.default_alpha))?;
        }
        Commands::Inputs { date } => {
            print_inputs(&config, &date)?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_logging(settings: &LoggingSettings, verbose: bool) -> Result<()> {
    let default_directive = if verbose { "debug" } else { settings.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", default_directive, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = match settings.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

fn load_context(config: &AppConfig) -> Result<ForecastContext> {
    ForecastContext::load(&config.data, &config.models).map_err(|e| {
        anyhow!(
            "Failed to load forecast context (data {}, models {}): {}",
            config.data.history_path.display(),
            config.models.trend_path.display(),
            e
        )
    })
}

async fn serve(config: &AppConfig, port: u16) -> Result<()> {
    let context = Arc::new(load_context(config)?);
    info!(
        "Context ready: cutoff {}, data through {}",
        context.cutoff(),
        context.series().last_date()
    );

    let state = AppState::new(context, config.forecast.default_alpha);
    start_server(state, &config.server.host, port).await
}

fn print_forecast(config: &AppConfig, date: &str, alpha: f64) -> Result<()> {
    let query = ForecastQuery::parse(date, alpha).map_err(|e| anyhow!(e))?;
    if !query.alpha_in_unit_range() {
        warn!("alpha {} is outside [0, 1]", query.alpha);
    }

    let context = load_context(config)?;
    let result = context.forecast(query.query_date, query.alpha)?;
    let lookup = context.lookup_covariates(result.target_date);

    println!("{}", report::render_forecast(&result, &lookup, context.cutoff()));
    Ok(())
}

fn print_inputs(config: &AppConfig, date: &str) -> Result<()> {
    let query_date = parse_date(date).map_err(|e| anyhow!(e))?;
    let context = load_context(config)?;

    let lookup = context.lookup_covariates(target_date(query_date));
    print!("{}", report::render_covariates(&lookup));
    if let CovariateLookup::NotAvailable { .. } = lookup {
        let series = context.series();
        println!(
            "Available range: {} to {}",
            series.first_date(),
            series.last_date()
        );
    }
    Ok(())
}
