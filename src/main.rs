// src/main.rs

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use eli::api::http::http_router;
use eli::config::EliConfig;
use eli::enrich;
use eli::state::create_app_state;

#[derive(Parser)]
#[command(name = "eli", version, about = "Course recommendation chat backend for Yale students")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default when no subcommand is given)
    Serve,

    /// Copy rating data into parsed-course files by season/CRN key
    PortRatings {
        #[arg(long, default_value = "data/parsed_courses")]
        target_dir: PathBuf,
        #[arg(long, default_value = "data/course_evals")]
        ratings_dir: PathBuf,
        /// Years of rating info to port, e.g. --years 2023 2024
        #[arg(long, num_args = 1.., default_values_t = [2023])]
        years: Vec<i32>,
    },

    /// Copy sentiment data into parsed-course files by season/CRN key
    PortSentiment {
        #[arg(long, default_value = "data/parsed_courses")]
        target_dir: PathBuf,
        #[arg(long, default_value = "data/course_evals")]
        sentiment_dir: PathBuf,
        #[arg(long, num_args = 1.., default_values_t = [2023])]
        years: Vec<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EliConfig::from_env();

    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::PortRatings {
            target_dir,
            ratings_dir,
            years,
        } => {
            let report = enrich::port_ratings(&target_dir, &ratings_dir, &years)?;
            info!(?report, "rating port complete");
            Ok(())
        }
        Command::PortSentiment {
            target_dir,
            sentiment_dir,
            years,
        } => {
            let report = enrich::port_sentiment(&target_dir, &sentiment_dir, &years)?;
            info!(?report, "sentiment port complete");
            Ok(())
        }
    }
}

async fn serve(config: EliConfig) -> anyhow::Result<()> {
    info!("Starting Eli backend");
    info!("Model: {}", config.chat_model);
    info!(
        "Gates: safety={} retrieval={}",
        config.enable_safety_gate, config.enable_retrieval_gate
    );

    let app_state = create_app_state(config).await?;
    let bind_address = app_state.config.bind_address();
    let app = http_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on http://{bind_address}");
    axum::serve(listener, app).await?;

    Ok(())
}
