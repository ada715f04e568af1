use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Direction, Vec2,
    config::{ConfigError, SessionConfig},
    connectivity::ConnectivityGrid,
    ghost::{Ghost, GhostState, TickContext},
    level::{GHOST_COUNT, Level, LevelError},
    movement,
    targeting::{Role, TargetInput},
};

/// Collision radius as a share of the tile size.
const CONTACT_TILES: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Playing,
    Won,
    GameOver,
}

/// The player's avatar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec2,
    pub heading: Direction,
    /// Last steering input, applied at the next tile center where it fits.
    pub desired: Option<Direction>,
}

/// Owns one game: the level, the player, four ghosts and the scoreboard.
///
/// Each [`Session::tick`] runs, in order: player movement, pellet eating,
/// the fright timer, ghost targeting, one update per ghost, collisions.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    level: Level,
    connectivity: ConnectivityGrid,
    player: Player,
    ghosts: Vec<Ghost>,
    frightened: bool,
    fright_timer: u32,
    eaten: [bool; GHOST_COUNT],
    score: u32,
    lives: u32,
    status: SessionStatus,
    ticks: u64,
}

impl Session {
    /// Validates `config` and builds the level it names.
    pub fn new(config: SessionConfig) -> Result<Self, LevelError> {
        let level = config.build_level()?;
        Ok(Session::with_level(config, level)?)
    }

    /// Starts a session on an already loaded level.
    pub fn with_level(config: SessionConfig, level: Level) -> Result<Self, ConfigError> {
        config.validate()?;
        let connectivity = level.connectivity();
        let ghosts = Role::ALL
            .into_iter()
            .map(|role| Ghost::new(role, &level, &config))
            .collect();
        let player = Player {
            position: level.spawns().player.center(config.tile_size),
            heading: Direction::East,
            desired: None,
        };
        info!(
            level = %config.level,
            width = level.width(),
            height = level.height(),
            movement = %config.movement,
            algorithm = %config.algorithm,
            pellets = level.pellets_remaining(),
            "session started"
        );
        Ok(Session {
            lives: config.lives,
            config,
            level,
            connectivity,
            player,
            ghosts,
            frightened: false,
            fright_timer: 0,
            eaten: [false; GHOST_COUNT],
            score: 0,
            status: SessionStatus::Playing,
            ticks: 0,
        })
    }

    /// Advances the game by one tick. `input` is this tick's steering, if any.
    pub fn tick(&mut self, input: Option<Direction>) -> SessionStatus {
        if self.status != SessionStatus::Playing {
            return self.status;
        }
        self.ticks += 1;

        self.move_player(input);
        self.eat_pellet();
        if self.level.pellets_remaining() == 0 {
            info!(score = self.score, ticks = self.ticks, "level cleared");
            self.status = SessionStatus::Won;
            return self.status;
        }
        self.run_fright_timer();
        self.move_ghosts();
        self.resolve_collisions();
        self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn connectivity(&self) -> &ConnectivityGrid {
        &self.connectivity
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn is_frightened(&self) -> bool {
        self.frightened
    }

    /// Ticks until the current fright ends, `0` when not frightened.
    pub fn fright_remaining(&self) -> u32 {
        if self.frightened {
            self.config.fright_ticks.saturating_sub(self.fright_timer)
        } else {
            0
        }
    }

    pub fn eaten(&self) -> &[bool; GHOST_COUNT] {
        &self.eaten
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pellets_remaining(&self) -> usize {
        self.level.pellets_remaining()
    }

    fn move_player(&mut self, input: Option<Direction>) {
        if input.is_some() {
            self.player.desired = input;
        }
        let ts = self.config.tile_size;
        let Some(tile) = movement::tile_under(self.player.position, &self.level, ts) else {
            return;
        };
        let centered = movement::is_centered(self.player.position, ts);
        let open = movement::open_directions(&self.level, tile);

        if let Some(desired) = self.player.desired {
            if (centered && open.contains(&desired)) || desired == self.player.heading.opposite() {
                self.player.heading = desired;
            }
        }
        if centered && !open.contains(&self.player.heading) {
            return;
        }
        self.player.position = movement::advance(
            self.player.position,
            self.player.heading,
            self.config.player_speed,
            ts,
            self.level.pixel_width(ts),
        );
    }

    fn eat_pellet(&mut self) {
        let ts = self.config.tile_size;
        let Some(tile) = movement::tile_under(self.player.position, &self.level, ts) else {
            return;
        };
        let Ok(delta) = self.level.consume_pellet(tile.x, tile.y) else {
            return;
        };
        self.score += delta.points;
        if delta.power {
            debug!(score = self.score, "power pellet eaten, ghosts frightened");
            self.frightened = true;
            self.fright_timer = 0;
            self.eaten = [false; GHOST_COUNT];
        }
    }

    fn run_fright_timer(&mut self) {
        if !self.frightened {
            return;
        }
        self.fright_timer += 1;
        if self.fright_timer >= self.config.fright_ticks {
            debug!("fright over");
            self.frightened = false;
            self.fright_timer = 0;
            self.eaten = [false; GHOST_COUNT];
        }
    }

    fn move_ghosts(&mut self) {
        let blinky = self
            .ghosts
            .iter()
            .find(|ghost| ghost.role() == Role::Blinky)
            .map(Ghost::position);
        let targets: Vec<Vec2> = self
            .ghosts
            .iter()
            .map(|ghost| {
                ghost.targeting().target(&TargetInput {
                    player: self.player.position,
                    heading: self.player.heading,
                    own: ghost.position(),
                    sibling: blinky.filter(|_| ghost.role() == Role::Inky),
                })
            })
            .collect();

        for (ghost, target) in self.ghosts.iter_mut().zip(targets) {
            let ctx = TickContext {
                level: &self.level,
                connectivity: &self.connectivity,
                config: &self.config,
                target,
                frightened: self.frightened,
                eaten: self.eaten[ghost.role().index()],
            };
            ghost.update(&ctx);
        }
    }

    fn resolve_collisions(&mut self) {
        let reach = CONTACT_TILES * self.config.tile_size;
        let mut caught = false;
        for ghost in &mut self.ghosts {
            if ghost.position().distance(self.player.position) >= reach {
                continue;
            }
            let index = ghost.role().index();
            if self.frightened {
                if !self.eaten[index] && ghost.capture() {
                    self.eaten[index] = true;
                    let streak = self.eaten.iter().filter(|eaten| **eaten).count() as u32;
                    let points = 2u32.pow(streak) * 100;
                    self.score += points;
                    debug!(ghost = ghost.role().name(), points, "ghost captured");
                }
            } else if ghost.state() != GhostState::ReturningToBox {
                caught = true;
            }
        }

        if caught {
            self.lives = self.lives.saturating_sub(1);
            debug!(lives = self.lives, "player caught");
            if self.lives == 0 {
                info!(score = self.score, ticks = self.ticks, "game over");
                self.status = SessionStatus::GameOver;
            } else {
                self.reset_positions();
            }
        }
    }

    fn reset_positions(&mut self) {
        let ts = self.config.tile_size;
        self.player = Player {
            position: self.level.spawns().player.center(ts),
            heading: Direction::East,
            desired: None,
        };
        for ghost in &mut self.ghosts {
            ghost.reset(&self.level, ts);
        }
        self.frightened = false;
        self.fright_timer = 0;
        self.eaten = [false; GHOST_COUNT];
    }
}
