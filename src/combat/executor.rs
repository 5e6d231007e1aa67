//! Swing-by-swing resolution of one attack
//!
//! `Exchange` is a small state machine. Each `step` resolves exactly one
//! swing: it re-evaluates the battle stats (slow, drain and swarm change
//! them mid-fight), rolls, reconciles the outcome with the supplied
//! `SwingResult` if there is one, then applies it to the field.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::combat::events::{CombatEvent, CombatEventType, CombatHooks, UnitCatalog};
use crate::combat::stats::evaluate_battle_stats;
use crate::combat::sync::{RandomSource, SwingResult};
use crate::core::error::{Result, TacticaError};
use crate::core::types::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Attacker,
    Defender,
}

/// Why an exchange stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEnd {
    /// Every swing of every round was used
    Exhausted,
    AttackerDied,
    DefenderDied,
    /// One side was turned to stone
    Petrified,
    /// A notification removed one of the combatants
    Interrupted,
}

/// A swing as it was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedSwing {
    pub striker: Role,
    pub result: SwingResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeReport {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub swings: Vec<AppliedSwing>,
    pub end: ExchangeEnd,
    /// Swings where the supplied record disagreed with the local outcome
    pub desyncs: u32,
    /// Unit raised by contagion, if any
    pub spawned: Option<UnitId>,
}

impl ExchangeReport {
    /// The applied outcomes in order, ready to hand to a follower
    pub fn results(&self) -> Vec<SwingResult> {
        self.swings.iter().map(|s| s.result).collect()
    }
}

/// External collaborators an exchange talks to
pub struct CombatEnv<'a> {
    pub rolls: &'a mut dyn RandomSource,
    pub hooks: &'a mut dyn CombatHooks,
    pub catalog: &'a dyn UnitCatalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Attacker,
    Defender,
}

#[derive(Debug, Clone)]
pub struct Exchange {
    attacker: UnitId,
    defender: UnitId,
    weapon: usize,
    hexes: [BattleHexCoord; 2],
    round_attacker_swings: u32,
    round_defender_swings: u32,
    attacker_swings: u32,
    defender_swings: u32,
    rounds_remaining: u32,
    first_strike_pending: bool,
    segment: Segment,
    swings: Vec<AppliedSwing>,
    desyncs: u32,
    spawned: Option<UnitId>,
    end: Option<ExchangeEnd>,
}

impl Exchange {
    /// Start an exchange and fire the attack notification
    ///
    /// Fails when the chosen weapon has no strikes. Panics on a missing
    /// unit or a bad weapon index.
    pub fn begin(
        field: &mut Battlefield,
        attacker: UnitId,
        defender: UnitId,
        weapon: usize,
        env: &mut CombatEnv<'_>,
    ) -> Result<Self> {
        if field.unit(attacker).weapon(weapon).strikes == 0 {
            return Err(TacticaError::CannotInitiate(attacker));
        }
        let stats = evaluate_battle_stats(field, attacker, defender, weapon, None);

        field.unit_mut(attacker).status.resting = false;
        field.unit_mut(defender).status.resting = false;

        let mut exchange = Self {
            attacker,
            defender,
            weapon,
            hexes: [field.unit(attacker).hex, field.unit(defender).hex],
            round_attacker_swings: stats.attacker.strikes,
            round_defender_swings: stats.defender.strikes,
            attacker_swings: stats.attacker.strikes,
            defender_swings: stats.defender.strikes,
            rounds_remaining: stats.rounds.max(1),
            first_strike_pending: stats.defender_strikes_first,
            segment: Segment::Attacker,
            swings: Vec::new(),
            desyncs: 0,
            spawned: None,
            end: None,
        };

        exchange.fire(
            field,
            env,
            CombatEventType::Attack {
                attacker,
                defender,
                weapon,
            },
            format!("{} attacks {} with weapon {}", attacker, defender, weapon),
        );
        if !exchange.both_present(field) {
            exchange.finish(field, env, ExchangeEnd::Interrupted);
        }
        Ok(exchange)
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    pub fn end(&self) -> Option<ExchangeEnd> {
        self.end
    }

    /// Swings left in the current round (attacker, defender)
    pub fn swings_remaining(&self) -> (u32, u32) {
        (self.attacker_swings, self.defender_swings)
    }

    pub fn rounds_remaining(&self) -> u32 {
        self.rounds_remaining
    }

    /// Who swings next, advancing rounds as budgets run out
    fn next_striker(&mut self) -> Option<Role> {
        loop {
            if self.end.is_some() {
                return None;
            }
            match self.segment {
                Segment::Attacker => {
                    if self.attacker_swings == 0 && self.defender_swings == 0 {
                        if self.rounds_remaining > 1 {
                            self.rounds_remaining -= 1;
                            self.attacker_swings = self.round_attacker_swings;
                            self.defender_swings = self.round_defender_swings;
                        } else {
                            return None;
                        }
                    }
                    self.segment = Segment::Defender;
                    let pre_empted = self.first_strike_pending;
                    self.first_strike_pending = false;
                    if self.attacker_swings > 0 && !pre_empted {
                        return Some(Role::Attacker);
                    }
                }
                Segment::Defender => {
                    self.segment = Segment::Attacker;
                    if self.defender_swings > 0 {
                        return Some(Role::Defender);
                    }
                }
            }
        }
    }

    /// Resolve one swing
    ///
    /// `expected` is the authoritative outcome for this swing when replaying
    /// or following; on disagreement it wins. Returns `None` once the
    /// exchange is over.
    pub fn step(
        &mut self,
        field: &mut Battlefield,
        env: &mut CombatEnv<'_>,
        expected: Option<&SwingResult>,
    ) -> Option<SwingResult> {
        let Some(role) = self.next_striker() else {
            if self.end.is_none() {
                self.finish(field, env, ExchangeEnd::Exhausted);
            }
            return None;
        };
        let (striker, target) = match role {
            Role::Attacker => (self.attacker, self.defender),
            Role::Defender => (self.defender, self.attacker),
        };

        let stats = evaluate_battle_stats(field, self.attacker, self.defender, self.weapon, None);
        let strike = match role {
            Role::Attacker => stats.attacker,
            Role::Defender => stats.defender,
        };
        if strike.weapon.is_none() {
            // The defender lost its counter mid-fight.
            self.defender_swings = 0;
            return self.step(field, env, expected);
        }

        let target_hp = field.unit(target).hitpoints;
        let roll = env.rolls.roll();
        let hit = roll < strike.chance_to_hit;
        let local = SwingResult {
            hit,
            damage: if hit { strike.damage } else { 0 },
            chance: strike.chance_to_hit,
            dies: hit && strike.damage >= target_hp,
        };

        let result = match expected {
            Some(expected) => self.reconcile(&local, expected, target_hp),
            None => local,
        };

        match role {
            Role::Attacker => self.attacker_swings = self.attacker_swings.saturating_sub(1),
            Role::Defender => self.defender_swings = self.defender_swings.saturating_sub(1),
        }
        self.swings.push(AppliedSwing {
            striker: role,
            result,
        });
        debug!(
            ?role,
            roll,
            hit = result.hit,
            damage = result.damage,
            chance = result.chance,
            dies = result.dies,
            "swing"
        );

        if result.hit {
            let applied = result.damage.min(target_hp);
            let died = field.unit_mut(target).take_damage(applied);
            if strike.drains && applied > 0 {
                field.unit_mut(striker).heal(applied / 2);
            }
            if died {
                self.resolve_death(field, env, striker, target, strike.contagion.as_deref());
                return Some(result);
            }
            let victim = field.unit_mut(target);
            if strike.poisons {
                victim.status.poisoned = true;
            }
            if strike.slows {
                victim.status.slowed = true;
            }
            if strike.petrifies {
                victim.status.petrified = true;
                self.attacker_swings = 0;
                self.defender_swings = 0;
                self.finish(field, env, ExchangeEnd::Petrified);
                return Some(result);
            }
        }

        Some(result)
    }

    /// Settle disagreement between the local outcome and the supplied one
    fn reconcile(&mut self, local: &SwingResult, expected: &SwingResult, target_hp: u32) -> SwingResult {
        let discrepancies = local.discrepancies(expected);
        if discrepancies.is_empty() {
            return *local;
        }
        for d in &discrepancies {
            warn!(attacker = %self.attacker, defender = %self.defender, discrepancy = ?d, "swing out of sync, using supplied outcome");
        }
        self.desyncs += 1;

        let mut result = *expected;
        if result.hit {
            if result.dies {
                result.damage = result.damage.max(target_hp);
            } else if result.damage >= target_hp {
                result.damage = target_hp.saturating_sub(1);
            }
        } else {
            result.damage = 0;
            result.dies = false;
        }
        result
    }

    fn resolve_death(
        &mut self,
        field: &mut Battlefield,
        env: &mut CombatEnv<'_>,
        killer: UnitId,
        victim: UnitId,
        contagion: Option<&str>,
    ) {
        let end = if victim == self.defender {
            ExchangeEnd::DefenderDied
        } else {
            ExchangeEnd::AttackerDied
        };
        let (hex, level) = {
            let v = field.unit(victim);
            (v.hex, v.level)
        };
        let killer_side = field.unit(killer).side;
        let xp = field.rules.kill_experience_for(level);
        field.unit_mut(killer).experience += xp;

        self.fire(
            field,
            env,
            CombatEventType::Die {
                victim,
                killer,
                hex,
            },
            format!("{} killed by {}", victim, killer),
        );
        field.units.remove(victim);

        if let Some(spawn_type) = contagion {
            match env.catalog.instantiate(spawn_type, killer_side, hex) {
                Some(unit) => match field.add_unit(unit) {
                    Ok(spawned) => {
                        self.spawned = Some(spawned);
                        self.fire(
                            field,
                            env,
                            CombatEventType::ContagionSpawn {
                                spawned,
                                unit_type: spawn_type.to_string(),
                                side: killer_side,
                                hex,
                            },
                            format!("{} rises at {:?}", spawn_type, hex),
                        );
                    }
                    Err(e) => warn!(%e, "contagion spawn failed"),
                },
                None => warn!(unit_type = spawn_type, "contagion spawn type not in catalog"),
            }
        }

        self.finish(field, env, end);
    }

    fn both_present(&self, field: &Battlefield) -> bool {
        field.units.contains(self.attacker) && field.units.contains(self.defender)
    }

    fn fire(
        &self,
        field: &mut Battlefield,
        env: &mut CombatEnv<'_>,
        event_type: CombatEventType,
        description: String,
    ) {
        let event = CombatEvent {
            swing: self.swings.len() as u32,
            event_type,
            description,
        };
        env.hooks.notify(&event, field);
    }

    fn finish(&mut self, field: &mut Battlefield, env: &mut CombatEnv<'_>, end: ExchangeEnd) {
        if self.end.is_some() {
            return;
        }
        self.end = Some(end);

        if matches!(end, ExchangeEnd::Exhausted | ExchangeEnd::Petrified) && self.both_present(field) {
            let attacker_xp = field.rules.fight_experience_for(field.unit(self.defender).level);
            let defender_xp = field.rules.fight_experience_for(field.unit(self.attacker).level);
            field.unit_mut(self.attacker).experience += attacker_xp;
            field.unit_mut(self.defender).experience += defender_xp;
        }

        self.fire(
            field,
            env,
            CombatEventType::AttackEnd {
                attacker: self.attacker,
                defender: self.defender,
            },
            format!("attack ended: {:?}", end),
        );
        env.hooks.invalidate(&self.hexes);
    }

    pub fn into_report(self) -> ExchangeReport {
        ExchangeReport {
            attacker: self.attacker,
            defender: self.defender,
            swings: self.swings,
            end: self.end.unwrap_or(ExchangeEnd::Exhausted),
            desyncs: self.desyncs,
            spawned: self.spawned,
        }
    }
}

/// Run a whole attack to completion
///
/// With `expected`, swing `i` is reconciled against `expected[i]`; missing
/// entries fall back to local rolls.
pub fn resolve_attack(
    field: &mut Battlefield,
    attacker: UnitId,
    defender: UnitId,
    weapon: usize,
    env: &mut CombatEnv<'_>,
    expected: Option<&[SwingResult]>,
) -> Result<ExchangeReport> {
    let mut exchange = Exchange::begin(field, attacker, defender, weapon, env)?;
    let mut index = 0;
    while !exchange.is_finished() {
        let supplied = expected.and_then(|e| e.get(index));
        if exchange.step(field, env, supplied).is_none() {
            break;
        }
        index += 1;
    }
    Ok(exchange.into_report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::teams::Teams;
    use crate::battle::time_of_day::TimeOfDay;
    use crate::battle::units::Combatant;
    use crate::combat::events::{CombatEventLog, NoHooks, TemplateCatalog};
    use crate::combat::sync::ScriptedRolls;
    use crate::combat::weapons::{DamageType, RangeClass, Weapon, WeaponSpecial};
    use crate::core::types::Side;

    fn field() -> Battlefield {
        Battlefield::new(BattleMap::new(8, 8), Teams::two_sides()).with_time_of_day(TimeOfDay::Dusk)
    }

    fn unit(side: u8, q: i32, hp: u32, weapon: Weapon) -> Combatant {
        Combatant::new("Unit", Side(side), BattleHexCoord::new(q, 3), hp).with_weapon(weapon)
    }

    fn run(
        f: &mut Battlefield,
        a: UnitId,
        d: UnitId,
        rolls: Vec<u32>,
        log: &mut CombatEventLog,
    ) -> ExchangeReport {
        let mut rolls = ScriptedRolls::new(rolls);
        let catalog = TemplateCatalog::new();
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: log,
            catalog: &catalog,
        };
        resolve_attack(f, a, d, 0, &mut env, None).unwrap()
    }

    #[test]
    fn test_alternating_order() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut log = CombatEventLog::new();
        let report = run(&mut f, a, d, vec![99], &mut log);
        let order: Vec<Role> = report.swings.iter().map(|s| s.striker).collect();
        assert_eq!(
            order,
            vec![Role::Attacker, Role::Defender, Role::Attacker, Role::Defender, Role::Attacker]
        );
        assert_eq!(report.end, ExchangeEnd::Exhausted);
        // all misses
        assert_eq!(f.unit(a).hitpoints, 40);
        // fight experience both ways
        assert_eq!(f.unit(a).experience, 1);
        assert_eq!(f.unit(d).experience, 1);
    }

    #[test]
    fn test_defender_first_strike() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::spear())).unwrap();
        let mut log = CombatEventLog::new();
        let report = run(&mut f, a, d, vec![99], &mut log);
        let order: Vec<Role> = report.swings.iter().map(|s| s.striker).collect();
        assert_eq!(
            order,
            vec![
                Role::Defender,
                Role::Attacker,
                Role::Defender,
                Role::Attacker,
                Role::Defender,
                Role::Attacker
            ]
        );
    }

    #[test]
    fn test_hits_apply_damage() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut log = CombatEventLog::new();
        run(&mut f, a, d, vec![0], &mut log);
        assert_eq!(f.unit(d).hitpoints, 40 - 21);
        assert_eq!(f.unit(a).hitpoints, 40 - 16);
    }

    #[test]
    fn test_death_ends_exchange() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 10, Weapon::club())).unwrap();
        let mut log = CombatEventLog::new();
        let report = run(&mut f, a, d, vec![0], &mut log);
        assert_eq!(report.end, ExchangeEnd::DefenderDied);
        // attacker hit, defender hit, attacker kills
        assert_eq!(report.swings.len(), 3);
        assert!(report.swings[2].result.dies);
        assert!(!f.units.contains(d));
        assert_eq!(f.unit(a).experience, 8);
        assert_eq!(log.count(|e| matches!(e, CombatEventType::Die { .. })), 1);
        assert_eq!(log.count(|e| matches!(e, CombatEventType::AttackEnd { .. })), 1);
        assert_eq!(log.invalidated.len(), 2);
    }

    #[test]
    fn test_drain_heals_striker() {
        let mut f = field();
        let drain = Weapon::new("touch", 8, 1, RangeClass::Melee, DamageType::Arcane)
            .with_special(WeaponSpecial::Drain);
        let a = f
            .add_unit(unit(1, 2, 30, drain).with_hitpoints(10))
            .unwrap();
        let d = f.add_unit(unit(2, 3, 30, Weapon::club().with_defense_weight(0.0))).unwrap();
        let mut log = CombatEventLog::new();
        run(&mut f, a, d, vec![0], &mut log);
        assert_eq!(f.unit(d).hitpoints, 22);
        assert_eq!(f.unit(a).hitpoints, 14);
    }

    #[test]
    fn test_slow_halves_following_counter() {
        let mut f = field();
        let slow = Weapon::new("net", 4, 1, RangeClass::Melee, DamageType::Impact)
            .with_special(WeaponSpecial::Slow);
        let a = f.add_unit(unit(1, 2, 40, slow)).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut log = CombatEventLog::new();
        run(&mut f, a, d, vec![0], &mut log);
        assert!(f.unit(d).status.slowed);
        // two club hits at half damage
        assert_eq!(f.unit(a).hitpoints, 32);
    }

    #[test]
    fn test_petrify_ends_exchange() {
        let mut f = field();
        let gaze = Weapon::new("gaze", 1, 2, RangeClass::Melee, DamageType::Arcane)
            .with_special(WeaponSpecial::Petrify);
        let a = f.add_unit(unit(1, 2, 40, gaze)).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut log = CombatEventLog::new();
        let report = run(&mut f, a, d, vec![0], &mut log);
        assert_eq!(report.end, ExchangeEnd::Petrified);
        assert_eq!(report.swings.len(), 1);
        assert!(f.unit(d).status.petrified);
    }

    #[test]
    fn test_berserk_runs_until_death() {
        let mut f = field();
        let a = f
            .add_unit(unit(1, 2, 40, Weapon::sword().with_special(WeaponSpecial::Berserk)))
            .unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut log = CombatEventLog::new();
        // nobody lands a blow: every one of 30 rounds is fought out
        let report = run(&mut f, a, d, vec![99], &mut log);
        assert_eq!(report.swings.len(), 30 * (3 + 2));
        assert_eq!(report.end, ExchangeEnd::Exhausted);
        assert_eq!(f.unit(a).hitpoints, 40);
        assert_eq!(f.unit(d).hitpoints, 40);
    }

    #[test]
    fn test_berserk_refills_swings_each_round() {
        let mut f = field();
        let a = f
            .add_unit(unit(1, 2, 40, Weapon::sword().with_special(WeaponSpecial::Berserk)))
            .unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut rolls = ScriptedRolls::new(vec![99]);
        let mut hooks = NoHooks;
        let catalog = TemplateCatalog::new();
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut hooks,
            catalog: &catalog,
        };
        let mut exchange = Exchange::begin(&mut f, a, d, 0, &mut env).unwrap();
        assert_eq!(exchange.swings_remaining(), (3, 2));
        assert_eq!(exchange.rounds_remaining(), 30);

        exchange.step(&mut f, &mut env, None).unwrap();
        assert_eq!(exchange.swings_remaining(), (2, 2));

        for _ in 0..4 {
            exchange.step(&mut f, &mut env, None).unwrap();
        }
        assert_eq!(exchange.swings_remaining(), (0, 0));
        assert_eq!(exchange.rounds_remaining(), 30);

        // the next swing opens round two with fresh budgets
        exchange.step(&mut f, &mut env, None).unwrap();
        assert_eq!(exchange.swings_remaining(), (2, 2));
        assert_eq!(exchange.rounds_remaining(), 29);
        assert!(!exchange.is_finished());
    }

    #[test]
    fn test_contagion_spawns_on_kill() {
        let mut f = field();
        let bite = Weapon::new("touch", 10, 2, RangeClass::Melee, DamageType::Arcane).with_special(
            WeaponSpecial::Contagion {
                spawn_type: Some("Walking Corpse".into()),
            },
        );
        let a = f.add_unit(unit(1, 2, 40, bite)).unwrap();
        let d = f.add_unit(unit(2, 3, 10, Weapon::club())).unwrap();
        let catalog = TemplateCatalog::new().with(
            Combatant::new("Walking Corpse", Side(1), BattleHexCoord::new(0, 0), 18)
                .with_weapon(Weapon::club())
                .non_living(),
        );
        let mut rolls = ScriptedRolls::new(vec![0]);
        let mut log = CombatEventLog::new();
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut log,
            catalog: &catalog,
        };
        let report = resolve_attack(&mut f, a, d, 0, &mut env, None).unwrap();
        let spawned = report.spawned.expect("corpse should rise");
        assert_ne!(spawned, d);
        let corpse = f.unit(spawned);
        assert_eq!(corpse.unit_type, "Walking Corpse");
        assert_eq!(corpse.side, Side(1));
        assert_eq!(corpse.hex, BattleHexCoord::new(3, 3));
        assert_eq!(log.count(|e| matches!(e, CombatEventType::ContagionSpawn { .. })), 1);
    }

    #[test]
    fn test_supplied_outcome_wins() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut rolls = ScriptedRolls::new(vec![99]);
        let catalog = TemplateCatalog::new();
        let mut hooks = NoHooks;
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut hooks,
            catalog: &catalog,
        };
        let hit = SwingResult { hit: true, damage: 7, chance: 60, dies: false };
        let miss = SwingResult { hit: false, damage: 0, chance: 60, dies: false };
        let expected = vec![hit, miss, hit, miss, hit];
        let report = resolve_attack(&mut f, a, d, 0, &mut env, Some(&expected)).unwrap();
        assert_eq!(report.desyncs, 3);
        assert_eq!(f.unit(d).hitpoints, 19);
        assert_eq!(report.results(), expected);
    }

    #[test]
    fn test_supplied_death_forces_kill() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut rolls = ScriptedRolls::new(vec![99]);
        let catalog = TemplateCatalog::new();
        let mut hooks = NoHooks;
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut hooks,
            catalog: &catalog,
        };
        let fatal = SwingResult { hit: true, damage: 7, chance: 60, dies: true };
        let report = resolve_attack(&mut f, a, d, 0, &mut env, Some(&[fatal])).unwrap();
        assert_eq!(report.end, ExchangeEnd::DefenderDied);
        assert!(!f.units.contains(d));
    }

    #[test]
    fn test_cannot_initiate_without_strikes() {
        let mut f = field();
        let empty = Weapon::new("none", 5, 0, RangeClass::Melee, DamageType::Blade);
        let a = f.add_unit(unit(1, 2, 40, empty)).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut rolls = ScriptedRolls::new(vec![0]);
        let catalog = TemplateCatalog::new();
        let mut hooks = NoHooks;
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut hooks,
            catalog: &catalog,
        };
        assert!(matches!(
            resolve_attack(&mut f, a, d, 0, &mut env, None),
            Err(TacticaError::CannotInitiate(_))
        ));
    }

    struct RemoveOnAttack;

    impl CombatHooks for RemoveOnAttack {
        fn notify(&mut self, event: &CombatEvent, field: &mut Battlefield) {
            if let CombatEventType::Attack { defender, .. } = event.event_type {
                field.units.remove(defender);
            }
        }
    }

    #[test]
    fn test_script_removal_interrupts() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        let mut rolls = ScriptedRolls::new(vec![0]);
        let catalog = TemplateCatalog::new();
        let mut hooks = RemoveOnAttack;
        let mut env = CombatEnv {
            rolls: &mut rolls,
            hooks: &mut hooks,
            catalog: &catalog,
        };
        let report = resolve_attack(&mut f, a, d, 0, &mut env, None).unwrap();
        assert_eq!(report.end, ExchangeEnd::Interrupted);
        assert!(report.swings.is_empty());
        assert_eq!(f.unit(a).hitpoints, 40);
    }

    #[test]
    fn test_resting_cleared() {
        let mut f = field();
        let a = f.add_unit(unit(1, 2, 40, Weapon::sword())).unwrap();
        let d = f.add_unit(unit(2, 3, 40, Weapon::club())).unwrap();
        f.unit_mut(a).status.resting = true;
        f.unit_mut(d).status.resting = true;
        let mut log = CombatEventLog::new();
        run(&mut f, a, d, vec![99], &mut log);
        assert!(!f.unit(a).status.resting);
        assert!(!f.unit(d).status.resting);
    }
}
