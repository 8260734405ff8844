//! Core entity structs: grid positions and agent body state.

use serde::{Deserialize, Serialize};

use crate::enums::Direction;
use crate::ids::AgentId;

/// A cell on the unbounded integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate (East is +x).
    pub x: i64,
    /// Vertical coordinate (North is +y).
    pub y: i64,
}

impl Position {
    /// Create a position from coordinates.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Return the position `distance` cells away along `direction`.
    ///
    /// Negative distances step backwards. Coordinates saturate at the
    /// `i64` bounds instead of overflowing.
    pub const fn stepped(self, direction: Direction, distance: i64) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx.saturating_mul(distance)),
            y: self.y.saturating_add(dy.saturating_mul(distance)),
        }
    }

    /// The neighbouring cell one step along `direction`.
    pub const fn ahead(self, direction: Direction) -> Self {
        self.stepped(direction, 1)
    }

    /// Euclidean distance to `other`, truncated towards zero.
    pub fn distance_to(self, other: Self) -> u64 {
        let dx = i128::from(self.x).abs_diff(i128::from(other.x));
        let dy = i128::from(self.y).abs_diff(i128::from(other.y));
        // Each square fits in u128; their sum may not.
        let squared = dx
            .saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy));
        u64::try_from(squared.isqrt()).unwrap_or(u64::MAX)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The mutable body of an agent: everything except its program.
///
/// Points are unsigned, so the resource can never go negative. An agent
/// with zero points is dead: it keeps its cell but no longer acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Unique identity.
    pub id: AgentId,
    /// Generation in which this agent was created or mutated.
    pub generation: u64,
    /// The agent this one was mutated from, kept for reporting only.
    pub parent: Option<AgentId>,
    /// Current cell.
    pub position: Position,
    /// Current facing.
    pub direction: Direction,
    /// Resource held.
    pub points: u64,
}

impl AgentState {
    /// Create a fresh body facing North with a new identity.
    pub fn new(generation: u64, position: Position, points: u64) -> Self {
        Self {
            id: AgentId::new(),
            generation,
            parent: None,
            position,
            direction: Direction::North,
            points,
        }
    }

    /// Whether the agent still acts during ticks.
    pub const fn is_alive(&self) -> bool {
        self.points > 0
    }
}
