//! Time of day and alignment damage modifiers

use serde::{Deserialize, Serialize};

/// Moral alignment of a unit, which decides how daylight affects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Lawful,
    #[default]
    Neutral,
    Chaotic,
}

/// Phase of the six-turn day cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Dawn,
    #[default]
    Morning,
    Afternoon,
    Dusk,
    FirstWatch,
    SecondWatch,
}

impl TimeOfDay {
    /// Phase for a 1-based turn number
    pub fn for_turn(turn: u32) -> Self {
        const CYCLE: [TimeOfDay; 6] = [
            TimeOfDay::Dawn,
            TimeOfDay::Morning,
            TimeOfDay::Afternoon,
            TimeOfDay::Dusk,
            TimeOfDay::FirstWatch,
            TimeOfDay::SecondWatch,
        ];
        CYCLE[(turn.saturating_sub(1) % 6) as usize]
    }

    /// Damage bonus (percent) for lawful units
    pub fn lawful_bonus(&self) -> i32 {
        match self {
            TimeOfDay::Morning | TimeOfDay::Afternoon => 25,
            TimeOfDay::Dawn | TimeOfDay::Dusk => 0,
            TimeOfDay::FirstWatch | TimeOfDay::SecondWatch => -25,
        }
    }

    /// Damage bonus (percent) for a unit of the given alignment
    pub fn bonus_for(&self, alignment: Alignment) -> i32 {
        match alignment {
            Alignment::Lawful => self.lawful_bonus(),
            Alignment::Neutral => 0,
            Alignment::Chaotic => -self.lawful_bonus(),
        }
    }
}
