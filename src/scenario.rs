//! Load battle scenarios from TOML files
//!
//! A scenario describes the map, the sides, every unit on the board and
//! the unit templates contagion can spawn. `Scenario::load_from_file`
//! turns it into a ready `Battlefield` plus `TemplateCatalog`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::battle::battle_map::BattleMap;
use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::battle::teams::{Team, Teams};
use crate::battle::terrain::{BattleTerrain, MovementType};
use crate::battle::time_of_day::{Alignment, TimeOfDay};
use crate::battle::units::{Abilities, Combatant};
use crate::combat::events::TemplateCatalog;
use crate::combat::weapons::{DamageType, RangeClass, Resistances, Weapon, WeaponSpecial};
use crate::core::config::CombatRules;
use crate::core::error::{Result, TacticaError};
use crate::core::types::{Side, UnitId};

fn default_one() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub name: String,
    pub damage: u32,
    pub strikes: u32,
    #[serde(default)]
    pub range: RangeClass,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default = "default_weight")]
    pub defense_weight: f64,
    /// Special names, e.g. `"firststrike"` or `"contagion:Walking Corpse"`
    #[serde(default)]
    pub specials: Vec<String>,
}

impl WeaponSpec {
    pub fn to_weapon(&self) -> Weapon {
        let mut weapon = Weapon::new(
            self.name.clone(),
            self.damage,
            self.strikes,
            self.range,
            self.damage_type,
        )
        .with_defense_weight(self.defense_weight);
        for special in &self.specials {
            weapon = weapon.with_special(WeaponSpecial::parse(special));
        }
        weapon
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpec {
    pub unit_type: String,
    #[serde(default = "default_one")]
    pub side: u32,
    /// Position; ignored for templates
    #[serde(default)]
    pub q: i32,
    #[serde(default)]
    pub r: i32,
    pub max_hitpoints: u32,
    /// Current hitpoints, full when absent
    #[serde(default)]
    pub hitpoints: Option<u32>,
    #[serde(default = "default_one")]
    pub level: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default)]
    pub movement: Option<u32>,
    #[serde(default)]
    pub movement_type: MovementType,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub resistances: Resistances,
    #[serde(default)]
    pub abilities: Abilities,
    #[serde(default)]
    pub leader: bool,
    #[serde(default = "default_true")]
    pub living: bool,
    #[serde(default)]
    pub weapons: Vec<WeaponSpec>,
}

impl UnitSpec {
    pub fn to_combatant(&self) -> Result<Combatant> {
        let side = u8::try_from(self.side)
            .map_err(|_| TacticaError::Config(format!("side {} out of range", self.side)))?;
        let mut unit = Combatant::new(
            self.unit_type.clone(),
            Side(side),
            BattleHexCoord::new(self.q, self.r),
            self.max_hitpoints,
        )
        .with_level(self.level)
        .with_alignment(self.alignment)
        .with_abilities(self.abilities.clone());
        if let Some(hp) = self.hitpoints {
            unit = unit.with_hitpoints(hp);
        }
        if let Some(cost) = self.cost {
            unit = unit.with_cost(cost);
        }
        let movement = self.movement.unwrap_or(unit.movement);
        unit = unit.with_movement(movement, self.movement_type);
        unit.resistances = self.resistances;
        unit.experience = self.experience;
        unit.living = self.living;
        unit.can_recruit = self.leader;
        for weapon in &self.weapons {
            unit = unit.with_weapon(weapon.to_weapon());
        }
        Ok(unit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideSpec {
    pub side: u8,
    /// Sides sharing an alliance are friends
    pub alliance: u32,
    #[serde(default)]
    pub gold: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub q: i32,
    pub r: i32,
    pub terrain: BattleTerrain,
}

/// Attack the binary resolves when asked for a duel; indices into `units`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelSpec {
    pub attacker: usize,
    pub defender: usize,
    #[serde(default)]
    pub weapon: usize,
}

/// On-disk scenario layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub rules: CombatRules,
    #[serde(default)]
    pub sides: Vec<SideSpec>,
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub templates: Vec<UnitSpec>,
    #[serde(default)]
    pub duel: Option<DuelSpec>,
    /// Side the attack search plays, if any
    #[serde(default)]
    pub ai_side: Option<u8>,
}

/// A scenario ready to fight
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub field: Battlefield,
    pub catalog: TemplateCatalog,
    /// Ids of `ScenarioFile::units`, in file order
    pub unit_ids: Vec<UnitId>,
    /// Attacker, defender and weapon of the scripted duel
    pub duel: Option<(UnitId, UnitId, usize)>,
    pub ai_side: Option<Side>,
}

impl Scenario {
    pub fn load_from_str(content: &str) -> Result<Self> {
        let file: ScenarioFile = toml::from_str(content)?;
        Self::build(file)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    pub fn build(file: ScenarioFile) -> Result<Self> {
        file.rules.validate().map_err(TacticaError::Config)?;

        let mut map = BattleMap::new(file.width, file.height);
        for patch in &file.terrain {
            let coord = BattleHexCoord::new(patch.q, patch.r);
            if !map.in_bounds(coord) {
                return Err(TacticaError::OffMap(coord));
            }
            map.set_terrain(coord, patch.terrain);
        }

        let teams = if file.sides.is_empty() {
            Teams::two_sides()
        } else {
            Teams::new(
                file.sides
                    .iter()
                    .map(|s| Team::new(Side(s.side), s.alliance).with_gold(s.gold))
                    .collect(),
            )
        };

        let mut field = Battlefield::new(map, teams)
            .with_time_of_day(file.time_of_day)
            .with_rules(file.rules.clone());

        let mut unit_ids = Vec::with_capacity(file.units.len());
        for spec in &file.units {
            unit_ids.push(field.add_unit(spec.to_combatant()?)?);
        }

        let mut catalog = TemplateCatalog::new();
        for spec in &file.templates {
            catalog.add(spec.to_combatant()?);
        }

        let duel = match &file.duel {
            Some(d) => {
                let pick = |i: usize| {
                    unit_ids.get(i).copied().ok_or_else(|| {
                        TacticaError::Config(format!("duel refers to unit {} of {}", i, unit_ids.len()))
                    })
                };
                Some((pick(d.attacker)?, pick(d.defender)?, d.weapon))
            }
            None => None,
        };

        Ok(Self {
            name: file.name,
            field,
            catalog,
            unit_ids,
            duel,
            ai_side: file.ai_side.map(Side),
        })
    }
}
