//! Hex coordinate system for battle maps (axial coordinates)
//!
//! Uses axial coordinates (q, r) for easy neighbor calculation. Neighbor
//! order always matches `HexDirection::all()`, so index `i` and index
//! `(i + 3) % 6` are opposite sides of a hex.

use serde::{Deserialize, Serialize};

/// Axial hex coordinate for battle map
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct BattleHexCoord {
    pub q: i32,
    pub r: i32,
}

impl BattleHexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Manhattan distance in hex space
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Get all 6 neighboring hex coordinates, in `HexDirection::all()` order
    pub fn neighbors(&self) -> [BattleHexCoord; 6] {
        HexDirection::all().map(|dir| self.neighbor(dir))
    }

    /// The adjacent hex in `dir`
    pub fn neighbor(&self, dir: HexDirection) -> BattleHexCoord {
        let offset = dir.offset();
        BattleHexCoord::new(self.q + offset.q, self.r + offset.r)
    }

    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.distance(other) == 1
    }

    /// Direction from self to an adjacent hex
    pub fn direction_to(&self, other: &Self) -> Option<HexDirection> {
        HexDirection::all()
            .into_iter()
            .find(|dir| self.neighbor(*dir) == *other)
    }

    /// The hex across `self` from an adjacent hex `from`
    ///
    /// Returns `None` when `from` is not adjacent.
    pub fn opposite_of(&self, from: &Self) -> Option<BattleHexCoord> {
        let dir = self.direction_to(from)?;
        Some(self.neighbor(dir.opposite()))
    }
}

/// Direction enum for hex facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// Get the hex offset for this direction
    pub fn offset(&self) -> BattleHexCoord {
        match self {
            HexDirection::East => BattleHexCoord::new(1, 0),
            HexDirection::NorthEast => BattleHexCoord::new(1, -1),
            HexDirection::NorthWest => BattleHexCoord::new(0, -1),
            HexDirection::West => BattleHexCoord::new(-1, 0),
            HexDirection::SouthWest => BattleHexCoord::new(-1, 1),
            HexDirection::SouthEast => BattleHexCoord::new(0, 1),
        }
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            HexDirection::East => HexDirection::West,
            HexDirection::NorthEast => HexDirection::SouthWest,
            HexDirection::NorthWest => HexDirection::SouthEast,
            HexDirection::West => HexDirection::East,
            HexDirection::SouthWest => HexDirection::NorthEast,
            HexDirection::SouthEast => HexDirection::NorthWest,
        }
    }

    /// All directions
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::East,
            HexDirection::NorthEast,
            HexDirection::NorthWest,
            HexDirection::West,
            HexDirection::SouthWest,
            HexDirection::SouthEast,
        ]
    }
}
