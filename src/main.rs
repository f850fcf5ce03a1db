mod cli;
mod compose;
mod config;
mod encoder;
mod memory;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use compose::SensorContext;

#[derive(Parser)]
#[command(name = "bhumi", version, about = "Soil wisdom memory bank")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load initial soil and wisdom record sets from JSON files
    Load {
        /// Path to the soil records JSON file
        #[arg(long)]
        soil: PathBuf,
        /// Path to the wisdom records JSON file
        #[arg(long)]
        wisdom: PathBuf,
    },
    /// Search soil records by natural-language query
    SearchSoil {
        query: String,
        /// Moisture reading to include as query context (fraction)
        #[arg(long)]
        moisture: Option<f64>,
        /// pH reading to include as query context
        #[arg(long)]
        ph: Option<f64>,
        /// Temperature reading to include as query context (°C)
        #[arg(long)]
        temperature: Option<f64>,
        /// Only return records observed in this season
        #[arg(long)]
        season: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search farming-wisdom snippets by natural-language query
    SearchWisdom {
        query: String,
        /// Only return entries applicable to this soil type
        #[arg(long)]
        soil_type: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Recommend practices for a soil record from similar high-yield records
    Recommend {
        /// Soil record identifier (e.g. soil_001)
        soil_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record outcome feedback for a soil record
    Reinforce {
        /// Soil record identifier (e.g. soil_001)
        soil_id: String,
        /// Record a negative outcome instead (count is left unchanged)
        #[arg(long)]
        ineffective: bool,
    },
    /// Show soil memory statistics
    Stats,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.bhumi/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::BhumiConfig::load()?;

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Load { soil, wisdom } => cli::load::load(&config, &soil, &wisdom)?,
        Command::SearchSoil {
            query,
            moisture,
            ph,
            temperature,
            season,
            limit,
        } => {
            let sensor = SensorContext {
                moisture,
                ph,
                temperature,
            };
            cli::search::search_soil(&config, &query, sensor, season.as_deref(), limit)?;
        }
        Command::SearchWisdom {
            query,
            soil_type,
            limit,
        } => cli::search::search_wisdom(&config, &query, soil_type.as_deref(), limit)?,
        Command::Recommend { soil_id, limit } => {
            cli::recommend::recommend(&config, &soil_id, limit)?
        }
        Command::Reinforce {
            soil_id,
            ineffective,
        } => cli::reinforce::reinforce(&config, &soil_id, !ineffective)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
