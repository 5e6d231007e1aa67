//! Weapons (attack profiles), their specials, and damage resistances

use serde::{Deserialize, Serialize};

/// Melee weapons counter melee attacks, ranged counter ranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RangeClass {
    #[default]
    Melee,
    Ranged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Blade,
    Pierce,
    Impact,
    Fire,
    Cold,
    Arcane,
}

/// Special abilities a weapon can carry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponSpecial {
    /// Always strikes first, even when defending
    FirstStrike,
    /// Heals the wielder by half the damage dealt to living targets
    Drain,
    /// Killed living targets rise as a new unit on the killer's side
    Contagion {
        /// Unit type to spawn; the wielder's own type when absent
        spawn_type: Option<String>,
    },
    Poison,
    /// Halves the target's damage until its side's next turn
    Slow,
    /// Turns the target to stone and ends the exchange
    Petrify,
    /// Fixed chance to hit regardless of terrain
    Magical,
    /// Chance to hit floor when attacking
    Marksman,
    /// Doubles damage dealt and taken when attacking
    Charge,
    /// Doubles damage when an enemy of the target stands behind it
    Backstab,
    /// Exchange repeats until one side dies or the round cap is hit
    Berserk,
    /// Strike count scales with remaining hitpoints
    Swarm,
    /// A special this engine does not know; carried but ignored
    Unrecognized(String),
}

impl WeaponSpecial {
    /// Parse a special from its config name
    ///
    /// `contagion:<type>` names the spawned unit type. Unknown names become
    /// `Unrecognized` instead of failing.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(spawn) = name.strip_prefix("contagion:") {
            return WeaponSpecial::Contagion {
                spawn_type: Some(spawn.trim().to_string()),
            };
        }
        match name {
            "first_strike" | "firststrike" => WeaponSpecial::FirstStrike,
            "drain" | "lifedrain" => WeaponSpecial::Drain,
            "contagion" | "plague" => WeaponSpecial::Contagion { spawn_type: None },
            "poison" => WeaponSpecial::Poison,
            "slow" => WeaponSpecial::Slow,
            "petrify" | "stones" => WeaponSpecial::Petrify,
            "magical" => WeaponSpecial::Magical,
            "marksman" => WeaponSpecial::Marksman,
            "charge" => WeaponSpecial::Charge,
            "backstab" => WeaponSpecial::Backstab,
            "berserk" => WeaponSpecial::Berserk,
            "swarm" => WeaponSpecial::Swarm,
            other => WeaponSpecial::Unrecognized(other.to_string()),
        }
    }

    /// Whether two specials are the same kind, ignoring parameters
    pub fn same_kind(&self, other: &WeaponSpecial) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A single attack profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Damage per successful strike
    pub damage: u32,
    /// Strikes per round at full health
    pub strikes: u32,
    pub range: RangeClass,
    pub damage_type: DamageType,
    /// Preference when picking a counter-attack; 0 never counters
    pub defense_weight: f64,
    pub specials: Vec<WeaponSpecial>,
}

impl Weapon {
    pub fn new(
        name: impl Into<String>,
        damage: u32,
        strikes: u32,
        range: RangeClass,
        damage_type: DamageType,
    ) -> Self {
        Self {
            name: name.into(),
            damage,
            strikes,
            range,
            damage_type,
            defense_weight: 1.0,
            specials: Vec::new(),
        }
    }

    pub fn with_special(mut self, special: WeaponSpecial) -> Self {
        self.specials.push(special);
        self
    }

    pub fn with_defense_weight(mut self, weight: f64) -> Self {
        self.defense_weight = weight;
        self
    }

    /// Check if weapon has a special of this kind (parameters ignored)
    pub fn has_special(&self, special: &WeaponSpecial) -> bool {
        self.specials.iter().any(|s| s.same_kind(special))
    }

    /// Unit type spawned on a contagion kill, if the weapon carries contagion
    pub fn contagion_spawn(&self, own_type: &str) -> Option<String> {
        self.specials.iter().find_map(|s| match s {
            WeaponSpecial::Contagion { spawn_type } => {
                Some(spawn_type.clone().unwrap_or_else(|| own_type.to_string()))
            }
            _ => None,
        })
    }

    /// Strike count after swarm scaling for a wielder at `hp` of `max_hp`
    ///
    /// Swarm loses strikes proportionally to missing hitpoints, rounding
    /// the loss down, so any surviving wielder keeps at least one strike.
    pub fn effective_strikes(&self, hp: u32, max_hp: u32) -> u32 {
        if !self.has_special(&WeaponSpecial::Swarm) || max_hp == 0 {
            return self.strikes;
        }
        let missing = max_hp.saturating_sub(hp.min(max_hp));
        self.strikes - self.strikes * missing / max_hp
    }

    /// Common weapon: Sword
    pub fn sword() -> Self {
        Self::new("sword", 7, 3, RangeClass::Melee, DamageType::Blade)
    }

    /// Common weapon: Spear (first strike)
    pub fn spear() -> Self {
        Self::new("spear", 7, 3, RangeClass::Melee, DamageType::Pierce)
            .with_special(WeaponSpecial::FirstStrike)
    }

    /// Common weapon: Bow
    pub fn bow() -> Self {
        Self::new("bow", 6, 3, RangeClass::Ranged, DamageType::Pierce)
    }

    /// Common weapon: Club
    pub fn club() -> Self {
        Self::new("club", 8, 2, RangeClass::Melee, DamageType::Impact)
    }
}

/// Resistance (percent) per damage type; 20 means 20% less damage taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Resistances {
    pub blade: i32,
    pub pierce: i32,
    pub impact: i32,
    pub fire: i32,
    pub cold: i32,
    pub arcane: i32,
}

impl Resistances {
    pub fn get(&self, damage_type: DamageType) -> i32 {
        match damage_type {
            DamageType::Blade => self.blade,
            DamageType::Pierce => self.pierce,
            DamageType::Impact => self.impact,
            DamageType::Fire => self.fire,
            DamageType::Cold => self.cold,
            DamageType::Arcane => self.arcane,
        }
    }

    pub fn set(&mut self, damage_type: DamageType, value: i32) {
        match damage_type {
            DamageType::Blade => self.blade = value,
            DamageType::Pierce => self.pierce = value,
            DamageType::Impact => self.impact = value,
            DamageType::Fire => self.fire = value,
            DamageType::Cold => self.cold = value,
            DamageType::Arcane => self.arcane = value,
        }
    }
}
