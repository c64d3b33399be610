mod app;
mod config;
mod food;
mod frontend;
mod game;
mod input;
mod snake;
mod term;

use std::{fs::File, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use clap::Parser;

use crate::app::App;
use crate::config::GameConfig;
use crate::term::TermManager;

pub type Coord = i32;
pub type Cell = (Coord, Coord);

#[derive(Parser)]
#[command(name = "retro_snake")]
#[command(version, about = "Grid snake in the terminal")]
struct Cli {
    /// YAML file with game settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side of the square grid, in cells
    #[arg(long)]
    cell_count: Option<i32>,

    /// Milliseconds between snake moves
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Frames drawn per second
    #[arg(long)]
    fps: Option<u32>,

    /// Disable the eat and wall bells
    #[arg(long)]
    mute: bool,

    /// Write logs here (the terminal itself is taken by the game)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_yaml_file(path)?,
            None => GameConfig::default(),
        };

        if let Some(cell_count) = self.cell_count {
            config.cell_count = cell_count;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if self.mute {
            config.eat_sound = "none".to_string();
            config.wall_sound = "none".to_string();
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = cli.game_config()?;
    log::info!("starting with {:?}", config);

    let term = TermManager::new(&config)?;
    let mut app = App::new(term, &config)?;
    app.run()
}
