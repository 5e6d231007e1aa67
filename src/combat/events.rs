//! Notifications fired during an exchange, and the unit catalog used for
//! contagion spawns

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::battle::units::Combatant;
use crate::core::types::{Side, UnitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEventType {
    Attack {
        attacker: UnitId,
        defender: UnitId,
        weapon: usize,
    },
    Die {
        victim: UnitId,
        killer: UnitId,
        hex: BattleHexCoord,
    },
    ContagionSpawn {
        spawned: UnitId,
        unit_type: String,
        side: Side,
        hex: BattleHexCoord,
    },
    AttackEnd {
        attacker: UnitId,
        defender: UnitId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Swings resolved before the event fired
    pub swing: u32,
    pub event_type: CombatEventType,
    pub description: String,
}

/// Scripting seam
///
/// `notify` may mutate the field (for example remove a unit); the executor
/// re-checks both combatants after every call.
pub trait CombatHooks {
    fn notify(&mut self, _event: &CombatEvent, _field: &mut Battlefield) {}

    /// Cached path and visibility data around these hexes is stale
    fn invalidate(&mut self, _hexes: &[BattleHexCoord]) {}
}

/// Hooks that ignore everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl CombatHooks for NoHooks {}

/// Hooks that record every notification
#[derive(Debug, Clone, Default)]
pub struct CombatEventLog {
    pub events: Vec<CombatEvent>,
    pub invalidated: Vec<BattleHexCoord>,
}

impl CombatEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&CombatEventType) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.event_type)).count()
    }
}

impl CombatHooks for CombatEventLog {
    fn notify(&mut self, event: &CombatEvent, _field: &mut Battlefield) {
        self.events.push(event.clone());
    }

    fn invalidate(&mut self, hexes: &[BattleHexCoord]) {
        self.invalidated.extend_from_slice(hexes);
    }
}

/// Builds fresh units by type name
pub trait UnitCatalog {
    fn instantiate(&self, unit_type: &str, side: Side, hex: BattleHexCoord) -> Option<Combatant>;
}

/// Catalog backed by template units
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: AHashMap<String, Combatant>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under its own unit type
    pub fn add(&mut self, template: Combatant) {
        self.templates.insert(template.unit_type.clone(), template);
    }

    pub fn with(mut self, template: Combatant) -> Self {
        self.add(template);
        self
    }

    pub fn contains(&self, unit_type: &str) -> bool {
        self.templates.contains_key(unit_type)
    }
}

impl UnitCatalog for TemplateCatalog {
    fn instantiate(&self, unit_type: &str, side: Side, hex: BattleHexCoord) -> Option<Combatant> {
        let template = self.templates.get(unit_type)?;
        let mut unit = template.clone();
        unit.side = side;
        unit.hex = hex;
        unit.hitpoints = unit.max_hitpoints;
        unit.experience = 0;
        unit.status = Default::default();
        unit.can_recruit = false;
        Some(unit)
    }
}
