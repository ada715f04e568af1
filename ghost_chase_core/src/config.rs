use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    level::{Level, LevelError},
    maze,
    search::Algorithm,
};

/// Invalid session settings. Fatal at session start.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Maze dimensions must be positive, got {rows}x{cols}")]
    EmptyMaze { rows: usize, cols: usize },
    #[error("Rasterization scale must be positive")]
    ZeroScale,
    #[error("Unknown search algorithm '{0}' (expected bfs, dfs or dijkstra)")]
    UnknownAlgorithm(String),
    #[error("Unknown movement mode '{0}' (expected direct or search)")]
    UnknownMovementMode(String),
    #[error("Unknown level source '{0}' (expected classic or generated)")]
    UnknownLevelSource(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// How pursuing ghosts pick their heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Greedy: at each junction take the open, non-reversing heading that
    /// lands closest to the target.
    #[default]
    Direct,
    /// Follow a freshly searched waypoint path to the target tile.
    SearchGuided,
}

impl FromStr for MovementMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "original" | "heuristic" => Ok(MovementMode::Direct),
            "search" | "pathfinding" | "search-guided" => Ok(MovementMode::SearchGuided),
            _ => Err(ConfigError::UnknownMovementMode(s.to_string())),
        }
    }
}

impl fmt::Display for MovementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MovementMode::Direct => "direct",
            MovementMode::SearchGuided => "search",
        })
    }
}

/// Where the session's level comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelSource {
    #[default]
    Classic,
    Generated {
        rows: usize,
        cols: usize,
        scale: usize,
    },
}

impl FromStr for LevelSource {
    type Err = ConfigError;

    /// Parses the kind only; generated levels get the default 10x10 at 3x.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "original" => Ok(LevelSource::Classic),
            "generated" | "kruskal" => Ok(LevelSource::Generated {
                rows: maze::DEFAULT_ROWS,
                cols: maze::DEFAULT_COLS,
                scale: maze::DEFAULT_SCALE,
            }),
            _ => Err(ConfigError::UnknownLevelSource(s.to_string())),
        }
    }
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSource::Classic => f.write_str("classic"),
            LevelSource::Generated { rows, cols, scale } => {
                write!(f, "generated {rows}x{cols} @{scale}x")
            }
        }
    }
}

/// Every tunable of a session. Resolved once at start, then read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub movement: MovementMode,
    pub algorithm: Algorithm,
    pub level: LevelSource,
    pub seed: u64,
    /// Pixels per tile edge.
    pub tile_size: f32,
    /// Base ghost speed in pixels per tick.
    pub ghost_speed: f32,
    pub player_speed: f32,
    pub frightened_speed_factor: f32,
    pub eaten_speed_factor: f32,
    /// Box release delay per role index, in ticks.
    pub exit_delay_ticks: u32,
    /// Ticks without progress before a box exit forces its way out.
    pub stall_limit_ticks: u32,
    pub fright_ticks: u32,
    /// Chance per decision point of a random redirection while pursuing.
    pub redirect_chance: f64,
    /// Chance per decision point of a random turn while frightened.
    pub fright_turn_chance: f64,
    /// Pixel distance at which a waypoint counts as reached.
    pub waypoint_tolerance: f32,
    pub ambush_offset: f32,
    pub pivot_offset: f32,
    pub flip_threshold: f32,
    pub lives: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            movement: MovementMode::Direct,
            algorithm: Algorithm::BreadthFirst,
            level: LevelSource::Classic,
            seed: 0,
            tile_size: 20.0,
            ghost_speed: 2.0,
            player_speed: 2.0,
            frightened_speed_factor: 0.75,
            eaten_speed_factor: 2.0,
            exit_delay_ticks: 180,
            stall_limit_ticks: 180,
            fright_ticks: 600,
            redirect_chance: 0.03,
            fright_turn_chance: 0.05,
            waypoint_tolerance: 4.0,
            ambush_offset: 80.0,
            pivot_offset: 40.0,
            flip_threshold: 150.0,
            lives: 3,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        };
        positive("tile_size", self.tile_size)?;
        positive("ghost_speed", self.ghost_speed)?;
        positive("player_speed", self.player_speed)?;
        positive("frightened_speed_factor", self.frightened_speed_factor)?;
        positive("eaten_speed_factor", self.eaten_speed_factor)?;
        positive("waypoint_tolerance", self.waypoint_tolerance)?;

        // A step longer than a tile would jump over tile centers.
        let fastest = self.ghost_speed * self.eaten_speed_factor.max(1.0);
        if fastest > self.tile_size || self.player_speed > self.tile_size {
            return Err(ConfigError::InvalidValue {
                field: "ghost_speed",
                reason: format!(
                    "per-tick movement must not exceed tile_size {}",
                    self.tile_size
                ),
            });
        }

        for (field, chance) in [
            ("redirect_chance", self.redirect_chance),
            ("fright_turn_chance", self.fright_turn_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a probability, got {chance}"),
                });
            }
        }

        if self.lives == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lives",
                reason: "must be at least 1".to_string(),
            });
        }

        if let LevelSource::Generated { rows, cols, scale } = self.level {
            if rows == 0 || cols == 0 {
                return Err(ConfigError::EmptyMaze { rows, cols });
            }
            maze::check_scale(scale)?;
        }
        Ok(())
    }

    /// Builds the level named by `self.level`.
    pub fn build_level(&self) -> Result<Level, LevelError> {
        self.validate()?;
        match self.level {
            LevelSource::Classic => Ok(Level::classic()),
            LevelSource::Generated { rows, cols, scale } => {
                maze::generate_level(rows, cols, scale, self.seed)
            }
        }
    }
}
