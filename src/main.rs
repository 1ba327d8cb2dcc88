//! Distillation Yield Predictor - Main Entry Point
//!
//! Serves the prediction form, or runs a single prediction from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use distillation_yield_predictor::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::PredictionMetrics,
    models::InferenceEngine,
    types::{
        parameters::{FLOW_RATE_RANGE, PRESSURE_DIFF_RANGE, TEMPERATURE_RANGE},
        OperatingParameters, PredictionOutcome,
    },
    web,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "distillation-yield-predictor")]
#[command(about = "Predict distillation column yield with a pre-trained regressor", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction form (default)
    Serve {
        /// Address to listen on, overriding server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },
    /// Predict yield for one set of operating parameters
    Predict {
        /// Feed flow rate (m³/s)
        #[arg(long, default_value_t = FLOW_RATE_RANGE.default as i64,
              value_parser = clap::value_parser!(i64).range(FLOW_RATE_RANGE.min as i64..=FLOW_RATE_RANGE.max as i64))]
        flow_rate: i64,

        /// Reboiler temperature (°C)
        #[arg(long, default_value_t = TEMPERATURE_RANGE.default as i64,
              value_parser = clap::value_parser!(i64).range(TEMPERATURE_RANGE.min as i64..=TEMPERATURE_RANGE.max as i64))]
        temperature: i64,

        /// Pressure differential across the column (psi)
        #[arg(long, default_value_t = PRESSURE_DIFF_RANGE.default as i64, allow_negative_numbers = true,
              value_parser = clap::value_parser!(i64).range(PRESSURE_DIFF_RANGE.min as i64..=PRESSURE_DIFF_RANGE.max as i64))]
        pressure_diff: i64,
    },
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    init_logging(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    let metrics = Arc::new(PredictionMetrics::new());
    let engine = Arc::new(InferenceEngine::new(&config, metrics.clone())?);

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
            serve(engine, &bind_addr).await?;
            metrics.log_summary();
            Ok(())
        }
        Commands::Predict {
            flow_rate,
            temperature,
            pressure_diff,
        } => {
            let params = OperatingParameters::from_controls(pressure_diff, flow_rate, temperature)?;
            println!("{}", run_predict(&engine, params)?);
            Ok(())
        }
    }
}

/// One prediction for the command line, as the line to print
fn run_predict(engine: &InferenceEngine, params: OperatingParameters) -> Result<String> {
    match engine.predict(&params) {
        PredictionOutcome::Predicted(prediction) => Ok(format!("Predicted yield: {}", prediction)),
        PredictionOutcome::Failed(e) => {
            anyhow::bail!("An error occurred during prediction: {}", e)
        }
        PredictionOutcome::Unavailable(cause) => {
            anyhow::bail!("The model could not be loaded: {}", cause)
        }
    }
}

async fn serve(engine: Arc<InferenceEngine>, bind_addr: &str) -> Result<()> {
    // Load the model up front; a failure leaves the form in degraded mode
    let warm = engine.clone();
    let available = tokio::task::spawn_blocking(move || warm.warm_up().is_ok()).await?;
    if available {
        info!("Model ready");
    } else {
        warn!("Serving in degraded mode, prediction disabled");
    }

    let app = web::build_app(engine);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!(addr = %listener.local_addr()?, "Prediction form listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
