//! Combat rule constants with documented defaults
//!
//! Every tunable number the combat math depends on lives here so that a
//! ruleset can be swapped without touching the evaluator.

use serde::{Deserialize, Serialize};

/// Tunable combat rules
///
/// The defaults reproduce the classic ruleset. A `Battlefield` owns one
/// instance; the evaluator and executor read it on every swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    // === EXPERIENCE ===
    /// Experience per level of a killed unit
    ///
    /// A level-0 victim grants half of this instead of zero, so killing
    /// fodder is still worth something.
    pub kill_experience: u32,

    // === SPECIALS ===
    /// Number of rounds a berserk exchange may last
    ///
    /// Each round resets both swing budgets. 30 rounds is effectively
    /// "until someone dies" for any realistic pairing.
    pub berserk_rounds: u32,

    /// Fixed chance to hit for magical weapons (percent)
    pub magical_chance: u32,

    /// Minimum chance to hit for marksman weapons when attacking (percent)
    pub marksman_floor: u32,

    /// Upper bound on resistance after steadfast doubling (percent)
    ///
    /// Steadfast doubles positive resistances up to this cap. A unit that
    /// already resists more than the cap keeps its own value.
    pub steadfast_cap: i32,

    // === MODIFIERS ===
    /// Damage bonus per level a leader stands above the led unit (percent)
    pub leadership_per_level: i32,

    /// Divisor applied to a slowed unit's damage
    pub slow_divisor: u32,

    /// Whether villages protect their occupant from contagion
    ///
    /// When true a unit killed on a village does not rise as a new unit,
    /// and hits taken there do not mark it as a carrier.
    pub village_blocks_contagion: bool,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            kill_experience: 8,
            berserk_rounds: 30,
            magical_chance: 70,
            marksman_floor: 60,
            steadfast_cap: 50,
            leadership_per_level: 25,
            slow_divisor: 2,
            village_blocks_contagion: true,
        }
    }
}

impl CombatRules {
    /// Create rules with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate rules for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.magical_chance > 100 || self.marksman_floor > 100 {
            return Err(format!(
                "hit chances must be percentages (magical {}, marksman {})",
                self.magical_chance, self.marksman_floor
            ));
        }

        if self.steadfast_cap < 0 || self.steadfast_cap > 100 {
            return Err(format!(
                "steadfast_cap ({}) must lie in 0..=100",
                self.steadfast_cap
            ));
        }

        if self.slow_divisor == 0 {
            return Err("slow_divisor must be positive".into());
        }

        if self.berserk_rounds == 0 {
            return Err("berserk_rounds must be at least 1".into());
        }

        Ok(())
    }

    /// Experience granted for killing a unit of `level`
    pub fn kill_experience_for(&self, level: u32) -> u32 {
        if level == 0 {
            self.kill_experience / 2
        } else {
            self.kill_experience * level
        }
    }

    /// Experience granted to a survivor for fighting a unit of `level`
    pub fn fight_experience_for(&self, level: u32) -> u32 {
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_valid() {
        let rules = CombatRules::default();
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_invalid_slow_divisor() {
        let rules = CombatRules {
            slow_divisor: 0,
            ..CombatRules::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_invalid_chance() {
        let rules = CombatRules {
            magical_chance: 120,
            ..CombatRules::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_kill_experience() {
        let rules = CombatRules::default();
        assert_eq!(rules.kill_experience_for(0), 4);
        assert_eq!(rules.kill_experience_for(1), 8);
        assert_eq!(rules.kill_experience_for(3), 24);
        assert_eq!(rules.fight_experience_for(2), 2);
    }

    #[test]
    fn test_rules_from_partial_toml() {
        let rules: CombatRules = toml::from_str("berserk_rounds = 10").unwrap();
        assert_eq!(rules.berserk_rounds, 10);
        assert_eq!(rules.magical_chance, 70);
    }
}
