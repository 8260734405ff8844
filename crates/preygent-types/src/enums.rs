//! Enumeration types for the Preygent simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Number of directions in the facing ring.
const RING_SIZE: i64 = 4;

/// The direction an agent faces on the grid.
///
/// Directions form a clockwise ring (North, East, South, West). Turning by
/// an integer offset walks the ring and wraps in both directions, so a
/// positive offset turns right and a negative offset turns left.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Facing +y.
    #[default]
    North,
    /// Facing +x.
    East,
    /// Facing -y.
    South,
    /// Facing -x.
    West,
}

impl Direction {
    /// All directions in ring order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Position of this direction in the ring (0..4).
    pub const fn index(self) -> i64 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Map any integer onto the ring using Euclidean remainder.
    pub const fn from_index(index: i64) -> Self {
        match index.rem_euclid(RING_SIZE) {
            0 => Self::North,
            1 => Self::East,
            2 => Self::South,
            // rem_euclid(4) leaves 3 as the only remaining value.
            _ => Self::West,
        }
    }

    /// Return the direction reached by turning `offset` steps around the ring.
    pub const fn turned(self, offset: i64) -> Self {
        // Reduce first so the sum cannot overflow.
        let reduced = offset.rem_euclid(RING_SIZE);
        Self::from_index(self.index().wrapping_add(reduced))
    }

    /// Unit displacement `(dx, dy)` of one step in this direction.
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::East => "East",
            Self::South => "South",
            Self::West => "West",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Sensing mode
// ---------------------------------------------------------------------------

/// Which cell the `available` and `consume` primitives look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensingMode {
    /// The cell one step ahead in the agent's facing direction.
    #[default]
    Ahead,
    /// The agent's own cell.
    Here,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turning_right_walks_clockwise() {
        assert_eq!(Direction::North.turned(1), Direction::East);
        assert_eq!(Direction::East.turned(1), Direction::South);
        assert_eq!(Direction::South.turned(1), Direction::West);
        assert_eq!(Direction::West.turned(1), Direction::North);
    }

    #[test]
    fn turning_left_wraps_below_north() {
        assert_eq!(Direction::North.turned(-1), Direction::West);
        assert_eq!(Direction::North.turned(-5), Direction::West);
    }

    #[test]
    fn turn_and_reverse_turn_is_identity() {
        let offsets = [0, 1, -1, 2, 3, 4, -7, 13, 1_000_001, i64::MAX, i64::MIN + 1];
        for start in Direction::ALL {
            for n in offsets {
                assert_eq!(start.turned(n).turned(-n), start, "start {start}, n {n}");
            }
        }
    }

    #[test]
    fn extreme_offsets_stay_on_ring() {
        for start in Direction::ALL {
            let turned = start.turned(i64::MIN);
            assert!(Direction::ALL.contains(&turned));
        }
    }

    #[test]
    fn from_index_matches_index() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_index(direction.index()), direction);
        }
    }

    #[test]
    fn sensing_mode_parses_lowercase() {
        let mode: SensingMode = serde_yml::from_str("here").unwrap_or_default();
        assert_eq!(mode, SensingMode::Here);
    }
}
