//! Battle terrain types and their effects
//!
//! Terrain decides two things per movement type: how likely a unit
//! standing on it is to be hit, and how many movement points entering it
//! costs.

use serde::{Deserialize, Serialize};

/// Primary terrain type for a battle hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BattleTerrain {
    #[default]
    Flat,
    Road,
    Forest,
    Hills,
    Mountains,
    Village,
    Castle,
    Keep,
    ShallowWater,
    DeepWater,
    Swamp,
    Sand,
    Cave,
}

impl BattleTerrain {
    /// Villages heal and shelter; the AI also values them.
    pub fn is_village(&self) -> bool {
        matches!(self, BattleTerrain::Village)
    }

    /// Keeps count as castle for defense and movement.
    pub fn is_castle(&self) -> bool {
        matches!(self, BattleTerrain::Castle | BattleTerrain::Keep)
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, BattleTerrain::Keep)
    }

    /// Terrain class used by the defense and movement tables
    fn class(&self) -> BattleTerrain {
        match self {
            BattleTerrain::Road => BattleTerrain::Flat,
            BattleTerrain::Keep => BattleTerrain::Castle,
            other => *other,
        }
    }
}

/// How a unit moves, which decides its terrain tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    #[default]
    Infantry,
    Mounted,
    Elusive,
    Flying,
    Undead,
}

impl MovementType {
    /// Chance (percent) that a unit of this type is hit while standing on
    /// `terrain`
    pub fn chance_to_be_hit(&self, terrain: BattleTerrain) -> u32 {
        use BattleTerrain::*;
        let terrain = terrain.class();
        match self {
            MovementType::Infantry => match terrain {
                Flat => 60,
                Forest => 50,
                Hills => 50,
                Mountains => 40,
                Village => 40,
                Castle => 40,
                ShallowWater => 80,
                DeepWater => 90,
                Swamp => 80,
                Sand => 70,
                Cave => 60,
                Road | Keep => 60,
            },
            MovementType::Mounted => match terrain {
                Flat => 60,
                Forest => 70,
                Hills => 60,
                Mountains => 70,
                Village => 60,
                Castle => 60,
                ShallowWater => 80,
                DeepWater => 90,
                Swamp => 80,
                Sand => 70,
                Cave => 80,
                Road | Keep => 60,
            },
            MovementType::Elusive => match terrain {
                Flat => 60,
                Forest => 30,
                Hills => 50,
                Mountains => 30,
                Village => 30,
                Castle => 30,
                ShallowWater => 80,
                DeepWater => 90,
                Swamp => 80,
                Sand => 70,
                Cave => 50,
                Road | Keep => 60,
            },
            MovementType::Flying => match terrain {
                Cave => 80,
                _ => 50,
            },
            MovementType::Undead => match terrain {
                Flat => 60,
                Forest => 50,
                Hills => 50,
                Mountains => 40,
                Village => 40,
                Castle => 40,
                ShallowWater => 80,
                DeepWater => 90,
                Swamp => 70,
                Sand => 70,
                Cave => 60,
                Road | Keep => 60,
            },
        }
    }

    /// Movement points needed to enter `terrain`, `None` when impassable
    pub fn movement_cost(&self, terrain: BattleTerrain) -> Option<u32> {
        use BattleTerrain::*;
        let terrain = terrain.class();
        match self {
            MovementType::Infantry | MovementType::Elusive => match terrain {
                Flat | Village | Castle => Some(1),
                Forest | Hills | Sand | Cave => Some(2),
                Mountains | ShallowWater | Swamp => Some(3),
                DeepWater => None,
                Road | Keep => Some(1),
            },
            MovementType::Mounted => match terrain {
                Flat | Village | Castle => Some(1),
                Hills | Sand => Some(2),
                Forest => Some(3),
                ShallowWater | Swamp | Cave => Some(4),
                Mountains | DeepWater => None,
                Road | Keep => Some(1),
            },
            MovementType::Flying => match terrain {
                Cave => Some(3),
                _ => Some(1),
            },
            MovementType::Undead => match terrain {
                Flat | Village | Castle => Some(1),
                Forest | Hills | Sand | Cave | Swamp => Some(2),
                Mountains | ShallowWater | DeepWater => Some(3),
                Road | Keep => Some(1),
            },
        }
    }
}
