//! Pixel-space movement on the tile lattice shared by the player and ghosts.
//!
//! Agents travel between tile centers. A step never carries an agent past
//! the next center, so every center on a route is visited exactly and
//! heading changes only ever happen there.

use crate::{Direction, Position, Vec2, level::Level};

/// How close to a tile center counts as standing on it.
pub(crate) const ALIGN_EPSILON: f32 = 1e-3;

fn center_offset(coordinate: f32, tile_size: f32) -> f32 {
    let relative = (coordinate - tile_size / 2.0) / tile_size;
    (relative - relative.round()).abs() * tile_size
}

pub(crate) fn is_centered(position: Vec2, tile_size: f32) -> bool {
    center_offset(position.x, tile_size) < ALIGN_EPSILON
        && center_offset(position.y, tile_size) < ALIGN_EPSILON
}

/// The tile whose square contains `position`, if it lies on the level.
pub(crate) fn tile_under(position: Vec2, level: &Level, tile_size: f32) -> Option<Position> {
    position
        .to_tile(tile_size)
        .filter(|tile| level.tiles().contains(*tile))
}

/// Moves up to `amount` pixels along `direction`, stopping on the next tile
/// center if it is closer. Horizontal motion wraps around the level edges.
pub(crate) fn advance(
    position: Vec2,
    direction: Direction,
    amount: f32,
    tile_size: f32,
    pixel_width: f32,
) -> Vec2 {
    let (dx, dy) = direction.delta();
    let sign = (dx + dy) as f32;
    let coordinate = if direction.is_horizontal() {
        position.x
    } else {
        position.y
    };

    let half = tile_size / 2.0;
    let relative = (coordinate - half) / tile_size;
    let slack = ALIGN_EPSILON / tile_size;
    let next_center = if sign > 0.0 {
        ((relative + slack).floor() + 1.0) * tile_size + half
    } else {
        ((relative - slack).ceil() - 1.0) * tile_size + half
    };
    let moved = if amount >= (next_center - coordinate).abs() {
        next_center
    } else {
        coordinate + sign * amount
    };

    if direction.is_horizontal() {
        Vec2::new(moved.rem_euclid(pixel_width), position.y)
    } else {
        Vec2::new(position.x, moved)
    }
}

/// Headings from `tile` into walkable tiles, in scan order. Gates are closed.
pub(crate) fn open_directions(level: &Level, tile: Position) -> Vec<Direction> {
    Direction::SCAN_ORDER
        .into_iter()
        .filter(|direction| {
            level
                .wrapped_neighbor(tile, *direction)
                .is_some_and(|next| level.is_open(next))
        })
        .collect()
}

/// Moves straight toward `goal` on one axis, by at most `amount`.
pub(crate) fn approach(from: f32, goal: f32, amount: f32) -> f32 {
    if (goal - from).abs() <= amount {
        goal
    } else {
        from + amount.copysign(goal - from)
    }
}
