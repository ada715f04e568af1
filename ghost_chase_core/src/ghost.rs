use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Direction, Position, Vec2,
    config::{MovementMode, SessionConfig},
    connectivity::ConnectivityGrid,
    level::{GhostHouse, Level},
    movement::{self, ALIGN_EPSILON},
    targeting::{Role, Targeting},
    tile::Tile,
};

/// Behavior state of one ghost. Exactly one is active per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostState {
    /// Pacing inside the house until the release delay elapses.
    InBox,
    /// Walking to the gate column and up through the gate.
    ExitingBox,
    Pursuing,
    Frightened,
    /// Eaten; heading back home at speed, ignoring walls where a house exists.
    ReturningToBox,
}

/// Everything the driver hands a ghost for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub level: &'a Level,
    pub connectivity: &'a ConnectivityGrid,
    pub config: &'a SessionConfig,
    /// Pixel-space target from this ghost's [`Targeting`].
    pub target: Vec2,
    pub frightened: bool,
    /// This ghost was already eaten during the current fright.
    pub eaten: bool,
}

/// A ghost's new placement after [`Ghost::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    pub direction: Direction,
}

/// One pursuer and its state machine.
///
/// The driver calls [`Ghost::update`] exactly once per tick; [`Ghost::capture`]
/// and [`Ghost::reset`] are the only other mutations.
#[derive(Debug, Clone)]
pub struct Ghost {
    role: Role,
    targeting: Targeting,
    spawn: Position,
    position: Vec2,
    direction: Direction,
    state: GhostState,
    target: Vec2,
    path: Vec<Position>,
    cursor: usize,
    box_timer: u32,
    stuck_ticks: u32,
    rng: StdRng,
}

impl Ghost {
    pub fn new(role: Role, level: &Level, config: &SessionConfig) -> Self {
        let spawn = level.spawns().ghosts[role.index()];
        let retreat = Position::new(1, level.height().saturating_sub(2)).center(config.tile_size);
        let mut ghost = Ghost {
            role,
            targeting: Targeting::for_role(role, config, retreat),
            spawn,
            position: spawn.center(config.tile_size),
            direction: Direction::East,
            state: GhostState::Pursuing,
            target: retreat,
            path: Vec::new(),
            cursor: 1,
            box_timer: 0,
            stuck_ticks: 0,
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(role.index() as u64 + 1)),
        };
        ghost.reset(level, config.tile_size);
        ghost
    }

    /// Back to the spawn tile in the starting state: in the box when the
    /// spawn lies inside the house, otherwise already pursuing.
    ///
    /// The release timer carries over, so a ghost that was close to leaving
    /// the box still leaves on schedule after the player loses a life.
    pub fn reset(&mut self, level: &Level, tile_size: f32) {
        self.position = self.spawn.center(tile_size);
        self.direction = Direction::East;
        self.state = if level.house().is_some_and(|house| house.contains(self.spawn)) {
            GhostState::InBox
        } else {
            GhostState::Pursuing
        };
        self.path.clear();
        self.cursor = 1;
        self.stuck_ticks = 0;
    }

    /// Eaten by the player. Only a roaming ghost can be captured; returns
    /// whether the transition happened.
    pub fn capture(&mut self) -> bool {
        if matches!(self.state, GhostState::Pursuing | GhostState::Frightened) {
            self.transition(GhostState::ReturningToBox);
            self.path.clear();
            self.cursor = 1;
            true
        } else {
            false
        }
    }

    pub fn update(&mut self, ctx: &TickContext<'_>) -> Motion {
        self.target = ctx.target;
        match self.state {
            GhostState::ReturningToBox => self.return_home(ctx),
            GhostState::InBox => self.wait_in_box(ctx),
            GhostState::ExitingBox => self.leave_box(ctx),
            GhostState::Pursuing | GhostState::Frightened => {
                if ctx.frightened && !ctx.eaten {
                    self.transition(GhostState::Frightened);
                } else {
                    self.transition(GhostState::Pursuing);
                }
                self.roam(ctx);
            }
        }
        Motion {
            position: self.position,
            direction: self.direction,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn targeting(&self) -> &Targeting {
        &self.targeting
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    /// The target passed in on the last update.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Waypoints not yet reached on the current search path.
    pub fn path(&self) -> &[Position] {
        self.path.get(self.cursor..).unwrap_or(&[])
    }

    pub fn box_timer(&self) -> u32 {
        self.box_timer
    }

    fn transition(&mut self, next: GhostState) {
        if self.state != next {
            debug!(ghost = self.role.name(), from = ?self.state, to = ?next, "ghost state change");
            self.state = next;
        }
    }

    fn speed(&self, ctx: &TickContext<'_>) -> f32 {
        let base = ctx.config.ghost_speed;
        if ctx.eaten || self.state == GhostState::ReturningToBox {
            base * ctx.config.eaten_speed_factor
        } else if ctx.frightened {
            base * ctx.config.frightened_speed_factor
        } else {
            base
        }
    }

    fn wait_in_box(&mut self, ctx: &TickContext<'_>) {
        let Some(house) = ctx.level.house() else {
            self.transition(GhostState::Pursuing);
            return;
        };
        let (left, right) = house.lateral_bounds(ctx.config.tile_size);
        let step = self.speed(ctx) / 2.0;
        if self.direction == Direction::West {
            self.position.x = movement::approach(self.position.x, left, step);
            if self.position.x <= left {
                self.direction = Direction::East;
            }
        } else {
            self.direction = Direction::East;
            self.position.x = movement::approach(self.position.x, right, step);
            if self.position.x >= right {
                self.direction = Direction::West;
            }
        }

        self.box_timer += 1;
        if self.box_timer >= ctx.config.exit_delay_ticks * self.role.index() as u32 {
            self.stuck_ticks = 0;
            self.transition(GhostState::ExitingBox);
        }
    }

    fn leave_box(&mut self, ctx: &TickContext<'_>) {
        let ts = ctx.config.tile_size;
        let Some((house, doorstep)) = ctx
            .level
            .house()
            .and_then(|house| Some((house, house.doorstep()?)))
        else {
            self.transition(GhostState::Pursuing);
            return;
        };

        let step = self.speed(ctx);
        let gate_x = house.gate.center(ts).x;
        let exit = doorstep.center(ts);
        let forced = self.stuck_ticks > ctx.config.stall_limit_ticks;
        let before = self.position;

        if (self.position.x - gate_x).abs() > ALIGN_EPSILON {
            self.direction = if self.position.x < gate_x {
                Direction::East
            } else {
                Direction::West
            };
            let next = Vec2::new(
                movement::approach(self.position.x, gate_x, step),
                self.position.y,
            );
            if forced || exit_passable(ctx.level, house, next, self.direction, ts) {
                self.position = next;
            }
        } else {
            self.direction = Direction::North;
            let next = Vec2::new(gate_x, movement::approach(self.position.y, exit.y, step));
            if forced || exit_passable(ctx.level, house, next, Direction::North, ts) {
                self.position = next;
            }
            if (self.position.y - exit.y).abs() <= ALIGN_EPSILON {
                self.position = exit;
                self.box_timer = 0;
                self.transition(GhostState::Pursuing);
                return;
            }
        }

        if self.position == before {
            self.stuck_ticks += 1;
            if self.stuck_ticks == ctx.config.stall_limit_ticks + 1 {
                warn!(
                    ghost = self.role.name(),
                    ticks = self.stuck_ticks,
                    "box exit stalled, forcing a way out"
                );
            }
        }
    }

    fn return_home(&mut self, ctx: &TickContext<'_>) {
        let ts = ctx.config.tile_size;
        let step = self.speed(ctx);
        let Some(house) = ctx.level.house() else {
            // No house: walk back to the spawn tile by search.
            let centered = movement::is_centered(self.position, ts);
            let Some(tile) = movement::tile_under(self.position, ctx.level, ts) else {
                self.position = self.spawn.center(ts);
                return;
            };
            if centered && tile == self.spawn {
                self.path.clear();
                self.transition(GhostState::Pursuing);
                return;
            }
            self.steer_by_path(ctx, tile, self.spawn, centered);
            self.move_forward(ctx, tile, centered, step);
            return;
        };

        let gate_x = house.gate.center(ts).x;
        let home = house.center(ts);
        if (self.position.x - gate_x).abs() > ALIGN_EPSILON {
            self.direction = if self.position.x < gate_x {
                Direction::East
            } else {
                Direction::West
            };
            self.position.x = movement::approach(self.position.x, gate_x, step);
        } else {
            self.direction = if self.position.y < home.y {
                Direction::South
            } else {
                Direction::North
            };
            self.position.y = movement::approach(self.position.y, home.y, step);
            if (self.position.y - home.y).abs() <= ALIGN_EPSILON {
                self.position = home;
                self.direction = Direction::East;
                self.box_timer = 0;
                self.transition(GhostState::InBox);
            }
        }
    }

    fn roam(&mut self, ctx: &TickContext<'_>) {
        let ts = ctx.config.tile_size;
        let Some(tile) = movement::tile_under(self.position, ctx.level, ts) else {
            return;
        };
        let centered = movement::is_centered(self.position, ts);

        if self.state == GhostState::Frightened {
            self.path.clear();
            if centered {
                self.direction = self.wander(ctx, tile);
            }
        } else {
            match ctx.config.movement {
                MovementMode::Direct => {
                    self.path.clear();
                    if centered {
                        self.direction = self.chase(ctx, tile);
                    }
                }
                MovementMode::SearchGuided => match goal_tile(ctx.level, self.target, ts) {
                    Some(goal) => self.steer_by_path(ctx, tile, goal, centered),
                    None => {
                        if centered {
                            self.direction = self.chase(ctx, tile);
                        }
                    }
                },
            }
        }

        let step = self.speed(ctx);
        self.move_forward(ctx, tile, centered, step);
    }

    fn move_forward(&mut self, ctx: &TickContext<'_>, tile: Position, centered: bool, step: f32) {
        if centered && !movement::open_directions(ctx.level, tile).contains(&self.direction) {
            return;
        }
        let ts = ctx.config.tile_size;
        self.position = movement::advance(
            self.position,
            self.direction,
            step,
            ts,
            ctx.level.pixel_width(ts),
        );
    }

    /// Greedy choice at a tile center: the open, non-reversing heading whose
    /// next tile center is closest to the target.
    fn chase(&mut self, ctx: &TickContext<'_>, tile: Position) -> Direction {
        let ts = ctx.config.tile_size;
        let options = movement::open_directions(ctx.level, tile);
        let back = self.direction.opposite();
        let forward: Vec<Direction> = options.iter().copied().filter(|d| *d != back).collect();
        if forward.is_empty() {
            return if options.contains(&back) {
                back
            } else {
                self.direction
            };
        }

        if self.rng.random_bool(ctx.config.redirect_chance) {
            if let Some(direction) = forward.choose(&mut self.rng) {
                return *direction;
            }
        }

        let here = tile.center(ts);
        let mut best = forward[0];
        let mut best_distance = f32::INFINITY;
        for direction in forward {
            let distance = here.offset(direction, ts).distance(self.target);
            if distance < best_distance {
                best_distance = distance;
                best = direction;
            }
        }
        best
    }

    /// Frightened random walk: keep going unless blocked or a turn is rolled.
    fn wander(&mut self, ctx: &TickContext<'_>, tile: Position) -> Direction {
        let options = movement::open_directions(ctx.level, tile);
        let back = self.direction.opposite();
        let forward: Vec<Direction> = options.iter().copied().filter(|d| *d != back).collect();
        if forward.is_empty() {
            return if options.contains(&back) {
                back
            } else {
                self.direction
            };
        }
        if !forward.contains(&self.direction)
            || self.rng.random_bool(ctx.config.fright_turn_chance)
        {
            return forward
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(self.direction);
        }
        self.direction
    }

    /// Re-plans a path to `goal` and turns toward its next waypoint.
    ///
    /// Heading changes only happen on tile centers, except for a straight
    /// reversal. With no path the current heading is held, falling back to
    /// the greedy choice when that heading is walled off.
    fn steer_by_path(
        &mut self,
        ctx: &TickContext<'_>,
        tile: Position,
        goal: Position,
        centered: bool,
    ) {
        let ts = ctx.config.tile_size;
        let tolerance = ctx.config.waypoint_tolerance;
        self.path = ctx.config.algorithm.find_path(ctx.connectivity, tile, goal);
        self.cursor = 1;
        while let Some(waypoint) = self.path.get(self.cursor) {
            let center = waypoint.center(ts);
            if (center.x - self.position.x).abs() < tolerance
                && (center.y - self.position.y).abs() < tolerance
            {
                self.cursor += 1;
            } else {
                break;
            }
        }

        let desired = self
            .path
            .get(self.cursor)
            .map(|waypoint| heading_toward(self.position, waypoint.center(ts)));

        match desired {
            Some(direction) if centered => {
                if movement::open_directions(ctx.level, tile).contains(&direction) {
                    self.direction = direction;
                }
            }
            Some(direction) if direction == self.direction.opposite() => {
                self.direction = direction;
            }
            Some(_) => {}
            None => {
                let blocked = !movement::open_directions(ctx.level, tile).contains(&self.direction);
                if centered && blocked {
                    self.direction = self.chase(ctx, tile);
                }
            }
        }
    }
}

/// Heading along the dominant axis from `from` to `to`. Ties go horizontal.
fn heading_toward(from: Vec2, to: Vec2) -> Direction {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if dx.abs() >= dy.abs() {
        if dx > 0.0 { Direction::East } else { Direction::West }
    } else if dy > 0.0 {
        Direction::South
    } else {
        Direction::North
    }
}

/// Whether a ghost leaving the house may occupy `next`. The tile its leading
/// edge enters must be open floor, house interior or a gate.
fn exit_passable(
    level: &Level,
    house: &GhostHouse,
    next: Vec2,
    heading: Direction,
    tile_size: f32,
) -> bool {
    let edge = next.offset(heading, tile_size / 2.0 - ALIGN_EPSILON);
    edge.to_tile(tile_size).is_some_and(|tile| {
        level.is_open(tile)
            || house.contains(tile)
            || level.category(tile.x, tile.y) == Ok(Tile::Gate)
    })
}

/// The walkable tile a search should aim for: the target's own tile when
/// it is open, otherwise the nearest open tile outside the house.
fn goal_tile(level: &Level, target: Vec2, tile_size: f32) -> Option<Position> {
    let max_x = level.pixel_width(tile_size) - 1.0;
    let max_y = level.height() as f32 * tile_size - 1.0;
    let clamped = Vec2::new(target.x.clamp(0.0, max_x), target.y.clamp(0.0, max_y));
    let tile = clamped.to_tile(tile_size)?;
    if level.is_open(tile) && !level.house().is_some_and(|house| house.contains(tile)) {
        return Some(tile);
    }
    level
        .tiles()
        .enumerate()
        .filter(|(position, floor)| {
            floor.is_walkable() && !level.house().is_some_and(|house| house.contains(*position))
        })
        .min_by_key(|(position, _)| position.manhattan_distance(tile))
        .map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Algorithm;

    struct Fixture {
        level: Level,
        connectivity: ConnectivityGrid,
        config: SessionConfig,
    }

    impl Fixture {
        fn new(level: Level, config: SessionConfig) -> Self {
            Fixture {
                connectivity: level.connectivity(),
                level,
                config,
            }
        }

        fn classic() -> Self {
            Fixture::new(Level::classic(), SessionConfig::default())
        }

        fn ctx(&self, target: Vec2, frightened: bool, eaten: bool) -> TickContext<'_> {
            TickContext {
                level: &self.level,
                connectivity: &self.connectivity,
                config: &self.config,
                target,
                frightened,
                eaten,
            }
        }
    }

    fn run_until(ghost: &mut Ghost, ctx: &TickContext<'_>, state: GhostState, limit: u32) -> u32 {
        for tick in 1..=limit {
            ghost.update(ctx);
            if ghost.state() == state {
                return tick;
            }
        }
        panic!("{:?} never reached {state:?} in {limit} ticks", ghost.role());
    }

    #[test]
    fn starting_states_follow_the_house() {
        let fixture = Fixture::classic();
        let states: Vec<GhostState> = Role::ALL
            .into_iter()
            .map(|role| Ghost::new(role, &fixture.level, &fixture.config).state())
            .collect();
        assert_eq!(
            states,
            [
                GhostState::Pursuing,
                GhostState::InBox,
                GhostState::InBox,
                GhostState::InBox
            ]
        );
    }

    #[test]
    fn release_is_staggered_by_role() {
        let fixture = Fixture::classic();
        let ctx = fixture.ctx(Vec2::new(270.0, 470.0), false, false);
        let mut inky = Ghost::new(Role::Inky, &fixture.level, &fixture.config);
        let mut clyde = Ghost::new(Role::Clyde, &fixture.level, &fixture.config);
        assert_eq!(run_until(&mut inky, &ctx, GhostState::ExitingBox, 1000), 180);
        assert_eq!(run_until(&mut clyde, &ctx, GhostState::ExitingBox, 1000), 540);
    }

    #[test]
    fn released_ghost_leaves_through_the_gate() {
        let fixture = Fixture::classic();
        let ctx = fixture.ctx(Vec2::new(270.0, 470.0), false, false);
        let mut pinky = Ghost::new(Role::Pinky, &fixture.level, &fixture.config);
        run_until(&mut pinky, &ctx, GhostState::ExitingBox, 400);
        run_until(&mut pinky, &ctx, GhostState::Pursuing, 100);
        assert_eq!(pinky.position(), Position::new(13, 11).center(20.0));
        assert_eq!(pinky.direction(), Direction::North);

        // From the doorstep it never walks back through the gate.
        for _ in 0..300 {
            pinky.update(&ctx);
            let tile = pinky.position().to_tile(20.0).unwrap();
            assert!(!fixture.level.house().unwrap().contains(tile));
            assert_ne!(tile, Position::new(13, 12));
        }
    }

    #[test]
    fn blocked_exit_is_forced_open() {
        // The tile above the gate is a wall, so the exit can only be forced.
        let level: Level = "
#########
#S..#.03#
####-####
###...###
###.12###
#########
"
        .parse()
        .unwrap();
        assert!(!level.is_open(Position::new(4, 1)));
        let house = level.house().expect("enclosed house");
        assert!(house.contains(Position::new(4, 4)));

        let fixture = Fixture::new(level, SessionConfig::default());
        let ctx = fixture.ctx(Vec2::new(30.0, 30.0), false, false);
        let mut inky = Ghost::new(Role::Inky, &fixture.level, &fixture.config);
        assert_eq!(inky.state(), GhostState::InBox);
        run_until(&mut inky, &ctx, GhostState::ExitingBox, 200);
        let ticks = run_until(&mut inky, &ctx, GhostState::Pursuing, 400);
        assert!(ticks > fixture.config.stall_limit_ticks);
        assert_eq!(inky.position(), Position::new(4, 1).center(20.0));
    }

    #[test]
    fn direct_chase_takes_the_closer_branch() {
        let config = SessionConfig {
            redirect_chance: 0.0,
            ..SessionConfig::default()
        };
        let fixture = Fixture::new(Level::classic(), config);
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        // Target far to the west of the doorstep.
        let ctx = fixture.ctx(Vec2::new(10.0, 230.0), false, false);
        let motion = blinky.update(&ctx);
        // Facing east at spawn, so west would be a reversal; east is kept.
        assert_eq!(motion.direction, Direction::East);

        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        blinky.direction = Direction::North;
        let motion = blinky.update(&ctx);
        assert_eq!(motion.direction, Direction::West);
        assert_eq!(motion.position, Vec2::new(268.0, 230.0));
    }

    #[test]
    fn equal_branches_break_ties_in_scan_order() {
        let config = SessionConfig {
            redirect_chance: 0.0,
            ..SessionConfig::default()
        };
        let fixture = Fixture::new(Level::classic(), config);
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        blinky.direction = Direction::North;
        // Straight below the doorstep: the east and west centers are equally far.
        let ctx = fixture.ctx(Vec2::new(270.0, 330.0), false, false);
        let motion = blinky.update(&ctx);
        assert_eq!(motion.direction, Direction::East);
        assert_eq!(motion.position, Vec2::new(272.0, 230.0));
    }

    #[test]
    fn frightened_walk_never_doubles_back() {
        let config = SessionConfig {
            fright_turn_chance: 1.0,
            seed: 9,
            ..SessionConfig::default()
        };
        let fixture = Fixture::new(Level::classic(), config);
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        let ctx = fixture.ctx(Vec2::new(0.0, 0.0), true, false);
        let mut decisions = 0;
        for _ in 0..3000 {
            let heading = blinky.direction();
            let centered = movement::is_centered(blinky.position(), 20.0);
            let tile = blinky.position().to_tile(20.0).unwrap();
            let motion = blinky.update(&ctx);
            if !centered {
                continue;
            }
            let options = movement::open_directions(&fixture.level, tile);
            if options.iter().any(|d| *d != heading.opposite()) {
                assert_ne!(motion.direction, heading.opposite(), "reversed at {tile:?}");
                decisions += 1;
            }
        }
        assert!(decisions > 100, "only {decisions} junction decisions");
    }

    #[test]
    fn waypoints_are_approached_along_the_longer_axis() {
        let from = Vec2::new(50.0, 50.0);
        assert_eq!(heading_toward(from, Vec2::new(90.0, 70.0)), Direction::East);
        assert_eq!(heading_toward(from, Vec2::new(40.0, 10.0)), Direction::North);
        assert_eq!(heading_toward(from, Vec2::new(45.0, 80.0)), Direction::South);
        // Diagonal waypoints resolve horizontally.
        assert_eq!(heading_toward(from, Vec2::new(70.0, 70.0)), Direction::East);
        assert_eq!(heading_toward(from, Vec2::new(30.0, 30.0)), Direction::West);
    }

    #[test]
    fn frightened_ghosts_slow_down() {
        let fixture = Fixture::classic();
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        let start = blinky.position();
        let motion = blinky.update(&fixture.ctx(start, true, false));
        assert_eq!(blinky.state(), GhostState::Frightened);
        assert!((motion.position.distance(start) - 1.5).abs() < 1e-4);

        // Already eaten this cycle: back to pursuit at double speed.
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        let motion = blinky.update(&fixture.ctx(start, true, true));
        assert_eq!(blinky.state(), GhostState::Pursuing);
        assert!((motion.position.distance(start) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn captured_ghost_returns_to_the_house() {
        let fixture = Fixture::classic();
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        let ctx = fixture.ctx(Vec2::new(10.0, 30.0), true, false);
        for _ in 0..40 {
            blinky.update(&ctx);
        }
        assert!(blinky.capture());
        assert!(!blinky.capture());
        assert_eq!(blinky.state(), GhostState::ReturningToBox);

        let eaten = fixture.ctx(Vec2::new(10.0, 30.0), true, true);
        run_until(&mut blinky, &eaten, GhostState::InBox, 200);
        let house = fixture.level.house().unwrap();
        assert_eq!(blinky.position(), house.center(20.0));
        // Blinky has no release delay.
        run_until(&mut blinky, &eaten, GhostState::Pursuing, 100);
    }

    #[test]
    fn search_guided_ghost_follows_a_path() {
        let config = SessionConfig {
            movement: MovementMode::SearchGuided,
            algorithm: Algorithm::UniformCost,
            ..SessionConfig::default()
        };
        let fixture = Fixture::new(Level::classic(), config);
        let mut blinky = Ghost::new(Role::Blinky, &fixture.level, &fixture.config);
        let goal = Position::new(1, 29);
        let ctx = fixture.ctx(goal.center(20.0), false, false);
        blinky.update(&ctx);
        assert!(!blinky.path().is_empty());
        assert_eq!(blinky.path().last(), Some(&goal));

        for _ in 0..2000 {
            blinky.update(&ctx);
            if blinky.position() == goal.center(20.0) {
                return;
            }
        }
        panic!("search-guided ghost never arrived");
    }

    #[test]
    fn reset_restores_spawn_state() {
        let fixture = Fixture::classic();
        let mut inky = Ghost::new(Role::Inky, &fixture.level, &fixture.config);
        let ctx = fixture.ctx(Vec2::new(0.0, 0.0), false, false);
        run_until(&mut inky, &ctx, GhostState::Pursuing, 400);
        inky.reset(&fixture.level, 20.0);
        assert_eq!(inky.state(), GhostState::InBox);
        assert_eq!(inky.position(), Position::new(12, 14).center(20.0));
        assert_eq!(inky.box_timer(), 0);
    }

    #[test]
    fn reset_keeps_release_progress() {
        let fixture = Fixture::classic();
        let mut clyde = Ghost::new(Role::Clyde, &fixture.level, &fixture.config);
        let ctx = fixture.ctx(Vec2::new(0.0, 0.0), false, false);
        for _ in 0..300 {
            clyde.update(&ctx);
        }
        assert_eq!(clyde.box_timer(), 300);
        clyde.reset(&fixture.level, 20.0);
        assert_eq!(clyde.state(), GhostState::InBox);
        assert_eq!(clyde.box_timer(), 300);
        // 540 ticks in total, not 540 more.
        assert_eq!(run_until(&mut clyde, &ctx, GhostState::ExitingBox, 1000), 240);
    }

    #[test]
    fn unreachable_targets_snap_to_open_floor() {
        let level = Level::classic();
        assert_eq!(
            goal_tile(&level, Vec2::new(-500.0, -500.0), 20.0),
            Some(Position::new(1, 1))
        );
        // Inside the house counts as unreachable.
        let goal = goal_tile(&level, Position::new(13, 14).center(20.0), 20.0).unwrap();
        assert!(!level.house().unwrap().contains(goal));
    }
}
