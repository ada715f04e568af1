//! Where each ghost is heading, as pure functions of the player's state.

use serde::{Deserialize, Serialize};

use crate::{Direction, Vec2, config::SessionConfig};

/// The four fixed pursuer identities, in spawn/index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Blinky,
    Inky,
    Pinky,
    Clyde,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Blinky, Role::Inky, Role::Pinky, Role::Clyde];

    pub const fn index(self) -> usize {
        match self {
            Role::Blinky => 0,
            Role::Inky => 1,
            Role::Pinky => 2,
            Role::Clyde => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Blinky => "blinky",
            Role::Inky => "inky",
            Role::Pinky => "pinky",
            Role::Clyde => "clyde",
        }
    }
}

/// Everything a targeting rule may look at. All positions are pixel centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInput {
    pub player: Vec2,
    pub heading: Direction,
    /// The asking ghost's own position.
    pub own: Vec2,
    /// The partner ghost used by [`Targeting::VectorPivot`].
    pub sibling: Option<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Targeting {
    /// Chase the player.
    Direct,
    /// Aim `offset` pixels ahead of the player.
    Ambush { offset: f32 },
    /// Double the vector from the sibling to a point `offset` ahead of the player.
    VectorPivot { offset: f32 },
    /// Chase while farther than `threshold`, otherwise head for `retreat`.
    ProximityFlip { threshold: f32, retreat: Vec2 },
}

impl Targeting {
    pub fn for_role(role: Role, config: &SessionConfig, retreat: Vec2) -> Targeting {
        match role {
            Role::Blinky => Targeting::Direct,
            Role::Inky => Targeting::VectorPivot {
                offset: config.pivot_offset,
            },
            Role::Pinky => Targeting::Ambush {
                offset: config.ambush_offset,
            },
            Role::Clyde => Targeting::ProximityFlip {
                threshold: config.flip_threshold,
                retreat,
            },
        }
    }

    pub fn target(&self, input: &TargetInput) -> Vec2 {
        match *self {
            Targeting::Direct => input.player,
            Targeting::Ambush { offset } => ahead_of(input.player, input.heading, offset),
            Targeting::VectorPivot { offset } => match input.sibling {
                Some(sibling) => {
                    let pivot = ahead_of(input.player, input.heading, offset);
                    Vec2::new(
                        sibling.x + 2.0 * (pivot.x - sibling.x),
                        sibling.y + 2.0 * (pivot.y - sibling.y),
                    )
                }
                None => input.player,
            },
            Targeting::ProximityFlip { threshold, retreat } => {
                if input.own.distance(input.player) > threshold {
                    input.player
                } else {
                    retreat
                }
            }
        }
    }
}

/// A point `offset` ahead of `player`. Facing north also shifts it west by
/// the same amount, like the arcade original.
fn ahead_of(player: Vec2, heading: Direction, offset: f32) -> Vec2 {
    let ahead = player.offset(heading, offset);
    if heading == Direction::North {
        Vec2::new(ahead.x - offset, ahead.y)
    } else {
        ahead
    }
}
