use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use color_snake::game::{GameConfig, GameEngine};
use color_snake::modes::HumanMode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "color_snake")]
#[command(version, about = "Snake game where every segment keeps its own color")]
struct Cli {
    /// JSON file with game settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Edge length of the square grid
    #[arg(long)]
    grid_size: Option<usize>,

    /// Milliseconds between game ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Milliseconds without food before the snake shrinks
    #[arg(long)]
    food_timeout_ms: Option<u64>,

    /// Seed for food placement, for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (the terminal is taken by the game)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load_json_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => GameConfig::default(),
        };

        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(food_timeout_ms) = self.food_timeout_ms {
            config.food_timeout_ms = food_timeout_ms;
        }

        config.validate().context("Invalid game configuration")?;
        Ok(config)
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = cli.game_config()?;
    let engine = match cli.seed {
        Some(seed) => GameEngine::with_seed(config, seed)?,
        None => GameEngine::new(config)?,
    };

    let mut human_mode = HumanMode::new(engine);
    human_mode.run().await?;

    Ok(())
}
