//! Battle statistics for one weapon pairing
//!
//! `evaluate_battle_stats` turns two combatants, the attacker's weapon
//! choice and the board into an immutable `BattleStats` snapshot. The
//! executor calls it before every swing, the AI for every plan it rates, so
//! nothing here caches results between calls.

use serde::{Deserialize, Serialize};

use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::battle::units::Combatant;
use crate::combat::weapons::{Weapon, WeaponSpecial};
use crate::core::types::UnitId;

/// What one side brings to the exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrikeStats {
    /// Weapon index; `None` when this side cannot counter
    pub weapon: Option<usize>,
    /// Chance (percent) that each strike hits the opponent
    pub chance_to_hit: u32,
    /// Damage dealt per successful strike
    pub damage: u32,
    pub strikes: u32,
    /// Half of each hit heals the striker
    pub drains: bool,
    pub slows: bool,
    pub poisons: bool,
    pub petrifies: bool,
    pub first_strike: bool,
    pub backstab: bool,
    /// Unit type raised on a kill
    pub contagion: Option<String>,
}

impl StrikeStats {
    pub fn hit_probability(&self) -> f64 {
        self.chance_to_hit as f64 / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    pub attacker: StrikeStats,
    pub defender: StrikeStats,
    /// Rounds the exchange may last; more than one under berserk
    pub rounds: u32,
    pub to_the_death: bool,
    pub defender_strikes_first: bool,
}

/// Human-readable breakdown of how each side's numbers came about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStatsStrings {
    pub attacker: Vec<(String, String)>,
    pub defender: Vec<(String, String)>,
}

/// Integer damage after applying a percentage bonus
///
/// Rounds to nearest; exact halves round toward `base`. Any positive
/// damage deals at least 1.
pub fn round_damage(base: u32, bonus: u64, divisor: u64) -> u32 {
    if base == 0 || bonus == 0 || divisor == 0 {
        return 0;
    }
    let rounding = divisor / 2 - if bonus < divisor { 0 } else { 1 };
    ((base as u64 * bonus + rounding) / divisor).max(1) as u32
}

/// Whether an attacker at `attacker_hex` may backstab the unit at
/// `defender_hex`
///
/// True when an active unit stands directly behind the defender and is its
/// enemy, or when either of them belongs to no known side.
pub fn backstab_check(
    field: &Battlefield,
    attacker_hex: BattleHexCoord,
    defender_hex: BattleHexCoord,
) -> bool {
    let Some(defender) = field.units.unit_at(defender_hex) else {
        return false;
    };
    let Some(behind) = defender_hex.opposite_of(&attacker_hex) else {
        return false;
    };
    let Some(flanker) = field.units.unit_at(behind) else {
        return false;
    };
    if flanker.incapacitated() {
        return false;
    }
    if !field.teams.is_valid(defender.side) || !field.teams.is_valid(flanker.side) {
        return true;
    }
    field.is_enemy(flanker.side, defender.side)
}

/// The weapon `defender` answers `attacking_weapon` with, if any
///
/// Only weapons of the same range class with a positive defense weight
/// qualify; the best expected damage times weight wins.
pub fn choose_defender_weapon(
    attacker: &Combatant,
    defender: &Combatant,
    attacking_weapon: &Weapon,
) -> Option<usize> {
    if defender.incapacitated() {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (index, weapon) in defender.weapons.iter().enumerate() {
        if weapon.range != attacking_weapon.range || weapon.defense_weight <= 0.0 {
            continue;
        }
        let modifier = (100 - attacker.resistances.get(weapon.damage_type)).max(0) as f64 / 100.0;
        let strikes = weapon.effective_strikes(defender.hitpoints, defender.max_hitpoints);
        let rating = weapon.damage as f64 * modifier * strikes as f64 * weapon.defense_weight;
        if best.map_or(true, |(_, r)| rating > r) {
            best = Some((index, rating));
        }
    }
    best.map(|(index, _)| index)
}

/// Inputs to one side's damage figure
struct DamageInputs<'a> {
    striker: UnitId,
    target: UnitId,
    weapon: &'a Weapon,
    /// Number of doublings (charge, backstab)
    doublings: u32,
    /// Target is defending, so steadfast may apply
    target_defending: bool,
}

fn damage_per_hit(
    field: &Battlefield,
    inputs: DamageInputs<'_>,
    lines: Option<&mut Vec<(String, String)>>,
) -> u32 {
    let striker = field.unit(inputs.striker);
    let target = field.unit(inputs.target);
    let weapon = inputs.weapon;

    let tod = field.tod_bonus(inputs.striker);
    let leadership = field.leadership_bonus(inputs.striker);
    let percent = (100 + tod + leadership).max(0) as u64;
    let multiplier = 1u64 << inputs.doublings;

    let mut resistance = target.resistances.get(weapon.damage_type);
    let mut steadfast = false;
    if inputs.target_defending && target.steadfast_on(field.terrain_at(target.hex)) {
        let cap = field.rules.steadfast_cap;
        if resistance > 0 && resistance < cap {
            resistance = (resistance * 2).min(cap);
            steadfast = true;
        }
    }
    let resistance_factor = (100 - resistance).max(0) as u64;

    let slow = if striker.status.slowed {
        field.rules.slow_divisor.max(1) as u64
    } else {
        1
    };

    let damage = round_damage(
        weapon.damage,
        percent * multiplier * resistance_factor,
        10_000 * slow,
    );

    if let Some(lines) = lines {
        lines.push(("base damage".into(), weapon.damage.to_string()));
        if tod != 0 {
            lines.push(("time of day".into(), format!("{:+}%", tod)));
        }
        if leadership != 0 {
            lines.push(("leadership".into(), format!("{:+}%", leadership)));
        }
        if multiplier > 1 {
            lines.push(("charge/backstab".into(), format!("x{}", multiplier)));
        }
        if resistance != 0 || steadfast {
            let label = if steadfast { "resistance (steadfast)" } else { "resistance" };
            lines.push((label.into(), format!("{}%", resistance)));
        }
        if slow > 1 {
            lines.push(("slowed".into(), format!("/{}", slow)));
        }
        lines.push(("total damage".into(), damage.to_string()));
    }

    damage
}

/// Compute the stats for `attacker` striking `defender` with weapon
/// `weapon`
///
/// Panics if either unit is missing or the weapon index is out of range.
pub fn evaluate_battle_stats(
    field: &Battlefield,
    attacker_id: UnitId,
    defender_id: UnitId,
    weapon: usize,
    mut strings: Option<&mut BattleStatsStrings>,
) -> BattleStats {
    let attacker = field.unit(attacker_id);
    let defender = field.unit(defender_id);
    let rules = &field.rules;

    let a_weapon = attacker.weapon(weapon);
    let d_index = choose_defender_weapon(attacker, defender, a_weapon);
    let d_weapon = d_index.map(|i| defender.weapon(i));

    // Each side hits with the opponent's chance to be hit where it stands.
    let mut a_chance = defender.chance_to_be_hit(field.terrain_at(defender.hex));
    let mut d_chance = attacker.chance_to_be_hit(field.terrain_at(attacker.hex));
    if a_weapon.has_special(&WeaponSpecial::Magical) {
        a_chance = rules.magical_chance;
    }
    if a_weapon.has_special(&WeaponSpecial::Marksman) && a_chance < rules.marksman_floor {
        a_chance = rules.marksman_floor;
    }
    if d_weapon.is_some_and(|w| w.has_special(&WeaponSpecial::Magical)) {
        d_chance = rules.magical_chance;
    }
    let a_chance = a_chance.min(100);
    let d_chance = d_chance.min(100);

    let charge = a_weapon.has_special(&WeaponSpecial::Charge);
    let backstab = a_weapon.has_special(&WeaponSpecial::Backstab)
        && backstab_check(field, attacker.hex, defender.hex);

    let a_damage = damage_per_hit(
        field,
        DamageInputs {
            striker: attacker_id,
            target: defender_id,
            weapon: a_weapon,
            doublings: charge as u32 + backstab as u32,
            target_defending: true,
        },
        strings.as_deref_mut().map(|s| &mut s.attacker),
    );
    let d_damage = d_weapon.map_or(0, |w| {
        damage_per_hit(
            field,
            DamageInputs {
                striker: defender_id,
                target: attacker_id,
                weapon: w,
                doublings: charge as u32,
                target_defending: false,
            },
            strings.as_deref_mut().map(|s| &mut s.defender),
        )
    });

    let a_strikes = a_weapon.effective_strikes(attacker.hitpoints, attacker.max_hitpoints);
    let d_strikes = d_weapon.map_or(0, |w| {
        w.effective_strikes(defender.hitpoints, defender.max_hitpoints)
    });

    let a_contagion = contagion_against(field, attacker, defender, a_weapon);
    let d_contagion = d_weapon.and_then(|w| contagion_against(field, defender, attacker, w));

    let a_first = a_weapon.has_special(&WeaponSpecial::FirstStrike);
    let d_first = d_weapon.is_some_and(|w| w.has_special(&WeaponSpecial::FirstStrike));

    let berserk = a_weapon.has_special(&WeaponSpecial::Berserk)
        || d_weapon.is_some_and(|w| w.has_special(&WeaponSpecial::Berserk));
    let rounds = if berserk { rules.berserk_rounds.max(1) } else { 1 };

    let attacker_stats = StrikeStats {
        weapon: Some(weapon),
        chance_to_hit: a_chance,
        damage: a_damage,
        strikes: a_strikes,
        drains: a_weapon.has_special(&WeaponSpecial::Drain) && defender.living,
        slows: a_weapon.has_special(&WeaponSpecial::Slow),
        poisons: defender.living
            && (a_weapon.has_special(&WeaponSpecial::Poison) || a_contagion.is_some()),
        petrifies: a_weapon.has_special(&WeaponSpecial::Petrify),
        first_strike: a_first,
        backstab,
        contagion: a_contagion,
    };

    let defender_stats = match d_weapon {
        Some(w) => StrikeStats {
            weapon: d_index,
            chance_to_hit: d_chance,
            damage: d_damage,
            strikes: d_strikes,
            drains: w.has_special(&WeaponSpecial::Drain) && attacker.living,
            slows: w.has_special(&WeaponSpecial::Slow),
            poisons: attacker.living
                && (w.has_special(&WeaponSpecial::Poison) || d_contagion.is_some()),
            petrifies: w.has_special(&WeaponSpecial::Petrify),
            first_strike: d_first,
            backstab: false,
            contagion: d_contagion,
        },
        None => StrikeStats {
            chance_to_hit: d_chance,
            ..StrikeStats::default()
        },
    };

    if let Some(s) = strings {
        s.attacker.push(("strikes".into(), a_strikes.to_string()));
        s.attacker.push(("chance to hit".into(), format!("{}%", a_chance)));
        s.defender.push(("strikes".into(), d_strikes.to_string()));
        s.defender.push(("chance to hit".into(), format!("{}%", d_chance)));
    }

    BattleStats {
        attacker: attacker_stats,
        defender: defender_stats,
        rounds,
        to_the_death: rounds > 1,
        defender_strikes_first: d_first && !a_first,
    }
}

/// Spawn type if `weapon` carries contagion and `target` can catch it
fn contagion_against(
    field: &Battlefield,
    striker: &Combatant,
    target: &Combatant,
    weapon: &Weapon,
) -> Option<String> {
    if !target.living {
        return None;
    }
    if field.rules.village_blocks_contagion && field.map.is_village(target.hex) {
        return None;
    }
    weapon.contagion_spawn(&striker.unit_type)
}
