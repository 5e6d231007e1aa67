//! Sides, alliances and treasuries

use serde::{Deserialize, Serialize};

use crate::core::types::Side;

/// One playing side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub side: Side,
    /// Sides sharing an alliance number are allies
    pub alliance: u32,
    pub gold: i32,
}

impl Team {
    pub fn new(side: Side, alliance: u32) -> Self {
        Self {
            side,
            alliance,
            gold: 0,
        }
    }

    pub fn with_gold(mut self, gold: i32) -> Self {
        self.gold = gold;
        self
    }
}

/// All sides taking part in a battle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Teams {
    teams: Vec<Team>,
}

impl Teams {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    /// Two sides, each its own alliance
    pub fn two_sides() -> Self {
        Self::new(vec![Team::new(Side(1), 1), Team::new(Side(2), 2)])
    }

    pub fn get(&self, side: Side) -> Option<&Team> {
        self.teams.iter().find(|t| t.side == side)
    }

    pub fn get_mut(&mut self, side: Side) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.side == side)
    }

    /// A side with no team entry is invalid (unaffiliated)
    pub fn is_valid(&self, side: Side) -> bool {
        self.get(side).is_some()
    }

    /// Sides are enemies when their alliances differ; unknown sides are
    /// hostile to everyone
    pub fn is_enemy(&self, a: Side, b: Side) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(ta), Some(tb)) => ta.alliance != tb.alliance,
            _ => a != b,
        }
    }

    pub fn gold(&self, side: Side) -> i32 {
        self.get(side).map(|t| t.gold).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter()
    }
}
