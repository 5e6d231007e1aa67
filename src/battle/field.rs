//! The battlefield: map, units, sides and the current rules
//!
//! Everything the combat math needs to know about the board goes through
//! here, so the evaluator never touches the map or arena directly.

use crate::battle::battle_map::BattleMap;
use crate::battle::hex::BattleHexCoord;
use crate::battle::teams::Teams;
use crate::battle::terrain::BattleTerrain;
use crate::battle::time_of_day::TimeOfDay;
use crate::battle::units::{Combatant, UnitArena};
use crate::core::config::CombatRules;
use crate::core::error::{Result, TacticaError};
use crate::core::types::{Side, UnitId};

#[derive(Debug, Clone)]
pub struct Battlefield {
    pub map: BattleMap,
    pub units: UnitArena,
    pub teams: Teams,
    pub time_of_day: TimeOfDay,
    pub rules: CombatRules,
}

impl Battlefield {
    pub fn new(map: BattleMap, teams: Teams) -> Self {
        Self {
            map,
            units: UnitArena::new(),
            teams,
            time_of_day: TimeOfDay::default(),
            rules: CombatRules::default(),
        }
    }

    pub fn with_time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = time_of_day;
        self
    }

    pub fn with_rules(mut self, rules: CombatRules) -> Self {
        self.rules = rules;
        self
    }

    /// Place a unit on the map
    pub fn add_unit(&mut self, unit: Combatant) -> Result<UnitId> {
        if !self.map.in_bounds(unit.hex) {
            return Err(TacticaError::OffMap(unit.hex));
        }
        self.units.insert(unit)
    }

    /// Unit by id; a missing unit is a caller bug
    pub fn unit(&self, id: UnitId) -> &Combatant {
        match self.units.get(id) {
            Some(u) => u,
            None => panic!("no unit with id {}", id),
        }
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Combatant {
        match self.units.get_mut(id) {
            Some(u) => u,
            None => panic!("no unit with id {}", id),
        }
    }

    /// Terrain at a hex; off-map hexes read as flat
    pub fn terrain_at(&self, hex: BattleHexCoord) -> BattleTerrain {
        self.map.terrain_at(hex).unwrap_or_default()
    }

    /// Chance (percent) that a unit is hit where it stands
    pub fn chance_to_be_hit(&self, id: UnitId) -> u32 {
        let unit = self.unit(id);
        unit.chance_to_be_hit(self.terrain_at(unit.hex))
    }

    pub fn is_enemy(&self, a: Side, b: Side) -> bool {
        self.teams.is_enemy(a, b)
    }

    /// Time-of-day damage bonus (percent) for a unit
    pub fn tod_bonus(&self, id: UnitId) -> i32 {
        self.time_of_day.bonus_for(self.unit(id).alignment)
    }

    /// Best leadership bonus (percent) from an adjacent same-side leader of
    /// higher level
    pub fn leadership_bonus(&self, id: UnitId) -> i32 {
        let unit = self.unit(id);
        unit.hex
            .neighbors()
            .iter()
            .filter_map(|hex| self.units.unit_at(*hex))
            .filter(|other| {
                other.side == unit.side
                    && other.abilities.leadership
                    && !other.incapacitated()
                    && other.level > unit.level
            })
            .map(|leader| (leader.level - unit.level) as i32 * self.rules.leadership_per_level)
            .max()
            .unwrap_or(0)
    }

    /// Whether an active enemy of `side` stands next to `hex`
    pub fn enemy_adjacent(&self, hex: BattleHexCoord, side: Side) -> bool {
        hex.neighbors().iter().any(|n| {
            self.units
                .unit_at(*n)
                .is_some_and(|u| !u.incapacitated() && self.is_enemy(u.side, side))
        })
    }

    /// Live units of a side, in id order
    pub fn units_of(&self, side: Side) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, u)| u.side == side)
            .map(|(id, _)| id)
            .collect()
    }

    /// Live enemies of a side, in id order
    pub fn enemies_of(&self, side: Side) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, u)| self.is_enemy(u.side, side))
            .map(|(id, _)| id)
            .collect()
    }
}
