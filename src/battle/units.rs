//! Combatants and the arena that owns them
//!
//! Units live in an append-only arena indexed by `UnitId`. Removing a unit
//! frees its slot but never shifts other units, so ids held by the search
//! or the executor stay valid across deaths and spawns.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::hex::BattleHexCoord;
use crate::battle::terrain::{BattleTerrain, MovementType};
use crate::battle::time_of_day::Alignment;
use crate::combat::weapons::{DamageType, Resistances, Weapon};
use crate::core::error::{Result, TacticaError};
use crate::core::types::{Side, UnitId};

/// Unit abilities that affect combat or movement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    /// Boosts adjacent lower-level allies
    pub leadership: bool,
    /// Ignores enemy zones of control
    pub skirmisher: bool,
    /// Doubles resistances when defending on these terrains (empty = any)
    pub steadfast: Option<Vec<BattleTerrain>>,
}

/// Status effects carried between exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusFlags {
    pub slowed: bool,
    /// Poisoned, or carrying contagion
    pub poisoned: bool,
    pub petrified: bool,
    pub resting: bool,
}

/// A single unit on the battlefield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub unit_type: String,
    pub side: Side,
    /// Position; change it through `UnitArena::relocate` once placed
    pub hex: BattleHexCoord,
    pub level: u32,
    pub hitpoints: u32,
    pub max_hitpoints: u32,
    pub experience: u32,
    pub max_experience: u32,
    /// Recruit cost, used as the unit's value
    pub cost: u32,
    /// Movement points per turn
    pub movement: u32,
    pub movement_type: MovementType,
    pub alignment: Alignment,
    pub resistances: Resistances,
    pub weapons: Vec<Weapon>,
    pub abilities: Abilities,
    /// Non-living units are immune to drain, poison and contagion
    pub living: bool,
    /// Leaders can recruit and are protected by the AI
    pub can_recruit: bool,
    pub status: StatusFlags,
}

impl Combatant {
    pub fn new(
        unit_type: impl Into<String>,
        side: Side,
        hex: BattleHexCoord,
        max_hitpoints: u32,
    ) -> Self {
        Self {
            unit_type: unit_type.into(),
            side,
            hex,
            level: 1,
            hitpoints: max_hitpoints,
            max_hitpoints,
            experience: 0,
            max_experience: 40,
            cost: 14,
            movement: 5,
            movement_type: MovementType::Infantry,
            alignment: Alignment::Neutral,
            resistances: Resistances::default(),
            weapons: Vec::new(),
            abilities: Abilities::default(),
            living: true,
            can_recruit: false,
            status: StatusFlags::default(),
        }
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_hitpoints(mut self, hitpoints: u32) -> Self {
        self.hitpoints = hitpoints.min(self.max_hitpoints);
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_movement(mut self, movement: u32, movement_type: MovementType) -> Self {
        self.movement = movement;
        self.movement_type = movement_type;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_resistance(mut self, damage_type: DamageType, value: i32) -> Self {
        self.resistances.set(damage_type, value);
        self
    }

    pub fn with_abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    /// Mark as a side leader
    pub fn as_leader(mut self) -> Self {
        self.can_recruit = true;
        self
    }

    /// Mark as non-living (undead, mechanical)
    pub fn non_living(mut self) -> Self {
        self.living = false;
        self
    }

    /// Petrified units take no part in combat and exert no influence
    pub fn incapacitated(&self) -> bool {
        self.status.petrified
    }

    /// True when some weapon has at least one strike
    pub fn can_initiate(&self) -> bool {
        self.weapons.iter().any(|w| w.strikes > 0)
    }

    /// Weapon by index; an out-of-range index is a caller bug
    pub fn weapon(&self, index: usize) -> &Weapon {
        match self.weapons.get(index) {
            Some(w) => w,
            None => panic!(
                "weapon index {} out of range for {} ({} weapons)",
                index,
                self.unit_type,
                self.weapons.len()
            ),
        }
    }

    pub fn hp_fraction(&self) -> f64 {
        if self.max_hitpoints == 0 {
            return 0.0;
        }
        self.hitpoints as f64 / self.max_hitpoints as f64
    }

    pub fn chance_to_be_hit(&self, terrain: BattleTerrain) -> u32 {
        self.movement_type.chance_to_be_hit(terrain)
    }

    /// Whether steadfast boosts this unit on `terrain`
    pub fn steadfast_on(&self, terrain: BattleTerrain) -> bool {
        match &self.abilities.steadfast {
            Some(filter) => filter.is_empty() || filter.contains(&terrain),
            None => false,
        }
    }

    /// Apply damage; returns true when the unit is left at zero hitpoints
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hitpoints = self.hitpoints.saturating_sub(amount);
        self.hitpoints == 0
    }

    /// Heal, capped at maximum hitpoints
    pub fn heal(&mut self, amount: u32) {
        self.hitpoints = (self.hitpoints + amount).min(self.max_hitpoints);
    }
}

/// Owner of every combatant on the field
#[derive(Debug, Clone, Default)]
pub struct UnitArena {
    slots: Vec<Option<Combatant>>,
    by_hex: AHashMap<BattleHexCoord, UnitId>,
}

impl UnitArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a unit at its hex and hand out a fresh id
    pub fn insert(&mut self, unit: Combatant) -> Result<UnitId> {
        if self.by_hex.contains_key(&unit.hex) {
            return Err(TacticaError::HexOccupied(unit.hex));
        }
        let id = UnitId(self.slots.len() as u32);
        self.by_hex.insert(unit.hex, id);
        self.slots.push(Some(unit));
        Ok(id)
    }

    pub fn get(&self, id: UnitId) -> Option<&Combatant> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    /// Mutable access; moving a unit must go through `relocate`
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Combatant> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.get(id).is_some()
    }

    /// Free a unit's slot; its id is never handed out again
    pub fn remove(&mut self, id: UnitId) -> Option<Combatant> {
        let unit = self.slots.get_mut(id.index())?.take()?;
        if self.by_hex.get(&unit.hex) == Some(&id) {
            self.by_hex.remove(&unit.hex);
        }
        Some(unit)
    }

    pub fn id_at(&self, hex: BattleHexCoord) -> Option<UnitId> {
        self.by_hex.get(&hex).copied()
    }

    pub fn unit_at(&self, hex: BattleHexCoord) -> Option<&Combatant> {
        self.id_at(hex).and_then(|id| self.get(id))
    }

    /// Move a unit to another hex
    pub fn relocate(&mut self, id: UnitId, to: BattleHexCoord) -> Result<()> {
        let from = self.get(id).ok_or(TacticaError::UnitNotFound(id))?.hex;
        if from == to {
            return Ok(());
        }
        if self.by_hex.contains_key(&to) {
            return Err(TacticaError::HexOccupied(to));
        }
        self.by_hex.remove(&from);
        self.by_hex.insert(to, id);
        if let Some(unit) = self.get_mut(id) {
            unit.hex = to;
        }
        Ok(())
    }

    /// Live units in id order
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &Combatant)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|u| (UnitId(i as u32), u)))
    }

    pub fn ids(&self) -> Vec<UnitId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grunt(hex: BattleHexCoord) -> Combatant {
        Combatant::new("Grunt", Side(1), hex, 38).with_weapon(Weapon::sword())
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut arena = UnitArena::new();
        let hex = BattleHexCoord::new(1, 1);
        let id = arena.insert(grunt(hex)).unwrap();
        assert_eq!(arena.id_at(hex), Some(id));
        assert_eq!(arena.unit_at(hex).map(|u| u.unit_type.as_str()), Some("Grunt"));
    }

    #[test]
    fn test_insert_occupied_hex() {
        let mut arena = UnitArena::new();
        let hex = BattleHexCoord::new(1, 1);
        arena.insert(grunt(hex)).unwrap();
        assert!(matches!(arena.insert(grunt(hex)), Err(TacticaError::HexOccupied(_))));
    }

    #[test]
    fn test_ids_never_reused() {
        let mut arena = UnitArena::new();
        let a = arena.insert(grunt(BattleHexCoord::new(0, 0))).unwrap();
        arena.remove(a).unwrap();
        let b = arena.insert(grunt(BattleHexCoord::new(0, 0))).unwrap();
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_relocate() {
        let mut arena = UnitArena::new();
        let a = arena.insert(grunt(BattleHexCoord::new(0, 0))).unwrap();
        let b = arena.insert(grunt(BattleHexCoord::new(2, 0))).unwrap();
        arena.relocate(a, BattleHexCoord::new(1, 0)).unwrap();
        assert_eq!(arena.id_at(BattleHexCoord::new(1, 0)), Some(a));
        assert_eq!(arena.id_at(BattleHexCoord::new(0, 0)), None);
        assert!(arena.relocate(a, BattleHexCoord::new(2, 0)).is_err());
        assert_eq!(arena.get(b).map(|u| u.hex), Some(BattleHexCoord::new(2, 0)));
    }

    #[test]
    fn test_take_damage_clamps() {
        let mut unit = grunt(BattleHexCoord::new(0, 0));
        assert!(!unit.take_damage(10));
        assert_eq!(unit.hitpoints, 28);
        assert!(unit.take_damage(100));
        assert_eq!(unit.hitpoints, 0);
    }

    #[test]
    fn test_steadfast_filter() {
        let mut unit = grunt(BattleHexCoord::new(0, 0));
        assert!(!unit.steadfast_on(BattleTerrain::Flat));
        unit.abilities.steadfast = Some(vec![]);
        assert!(unit.steadfast_on(BattleTerrain::Flat));
        unit.abilities.steadfast = Some(vec![BattleTerrain::Castle]);
        assert!(!unit.steadfast_on(BattleTerrain::Flat));
        assert!(unit.steadfast_on(BattleTerrain::Castle));
    }

    #[test]
    #[should_panic(expected = "weapon index")]
    fn test_weapon_out_of_range_panics() {
        let unit = grunt(BattleHexCoord::new(0, 0));
        let _ = unit.weapon(3);
    }
}
