use std::{fs, path::{Path, PathBuf}, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Cell;
use crate::snake::Direction;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Everything the game and its frontend need to know about the playing field,
/// its timing and its look. Built once at startup and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side of the square grid, in cells
    pub cell_count: i32,
    /// Terminal columns used by one cell
    pub cell_size: u16,
    /// Margin around the grid, in rows and columns
    pub offset: u16,

    pub tick_interval_ms: u64,
    pub target_fps: u32,

    pub initial_head: Cell,
    pub initial_length: usize,
    pub initial_direction: Direction,

    pub background: Rgb,
    pub foreground: Rgb,
    pub food_tint: Rgb,

    pub food_texture: String,
    pub eat_sound: String,
    pub wall_sound: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            cell_count: 25,
            cell_size: 2,
            offset: 2,
            tick_interval_ms: 150,
            target_fps: 60,
            initial_head: (6, 9),
            initial_length: 3,
            initial_direction: Direction::Right,
            background: Rgb(173, 204, 96),
            foreground: Rgb(43, 51, 24),
            food_tint: Rgb(230, 41, 55),
            food_texture: "()".to_string(),
            eat_sound: "bell".to_string(),
            wall_sound: "bell".to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.cell_count < 2 {
            return invalid(format!("cell_count must be at least 2, got {}", self.cell_count));
        }
        if self.cell_size == 0 {
            return invalid("cell_size must be positive".to_string());
        }
        if self.offset < 2 {
            return invalid(format!("offset must be at least 2, got {}", self.offset));
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive".to_string());
        }
        if self.target_fps == 0 {
            return invalid("target_fps must be positive".to_string());
        }
        if self.initial_length == 0 {
            return invalid("initial_length must be positive".to_string());
        }

        // Screen coordinates are u16; the grid plus margins must fit in one.
        let (cols, rows) = self.screen_extent();
        if cols > u16::MAX as u64 || rows > u16::MAX as u64 {
            return invalid(format!(
                "a {n}x{n} grid with cell_size {} and offset {} is too large to lay out on screen",
                self.cell_size, self.offset, n = self.cell_count,
            ));
        }

        if let Some(cell) = self.initial_body().iter().find(|cell| !self.contains(**cell)) {
            return invalid(format!("initial snake cell {:?} lies outside the {n}x{n} grid", cell, n = self.cell_count));
        }

        Ok(())
    }

    /// Starting body, head first, trailing away from the initial direction.
    pub fn initial_body(&self) -> Vec<Cell> {
        let (dx, dy) = self.initial_direction.delta();
        let (hx, hy) = self.initial_head;

        (0..self.initial_length as i32)
            .map(|i| (hx - dx * i, hy - dy * i))
            .collect()
    }

    pub fn contains(&self, (x, y): Cell) -> bool {
        (0..self.cell_count).contains(&x) && (0..self.cell_count).contains(&y)
    }

    /// Columns and rows spanned by margins, border, grid and score line.
    fn screen_extent(&self) -> (u64, u64) {
        let n = self.cell_count.max(0) as u64;
        let offset = self.offset as u64;
        (2 * offset + n * self.cell_size as u64, offset + n + 2)
    }

    pub fn tick_interval(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }
}
