//! Monte Carlo exchanges on fixed stats
//!
//! Used by the AI to estimate outcomes without touching the field. Stats
//! are taken as given for the whole exchange; slow is approximated by
//! halving the victim's damage once it lands.

use serde::{Deserialize, Serialize};

use crate::combat::probability::swing_schedule;
use crate::combat::stats::{round_damage, BattleStats, StrikeStats};
use crate::combat::sync::RandomSource;

/// Hitpoints going into an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    pub hitpoints: u32,
    pub max_hitpoints: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulatedOutcome {
    pub attacker_hp: u32,
    pub defender_hp: u32,
    pub attacker_petrified: bool,
    pub defender_petrified: bool,
    pub attacker_slowed: bool,
    pub defender_slowed: bool,
}

impl SimulatedOutcome {
    pub fn attacker_died(&self) -> bool {
        self.attacker_hp == 0
    }

    pub fn defender_died(&self) -> bool {
        self.defender_hp == 0
    }
}

struct Side<'a> {
    strike: &'a StrikeStats,
    hp: u32,
    max_hp: u32,
    slowed: bool,
    petrified: bool,
}

impl Side<'_> {
    fn damage(&self) -> u32 {
        if self.slowed {
            round_damage(self.strike.damage, 1, 2)
        } else {
            self.strike.damage
        }
    }
}

/// Swing `striker` at `target`; returns true when the exchange is over
fn swing(striker: &mut Side<'_>, target: &mut Side<'_>, rolls: &mut dyn RandomSource) -> bool {
    if rolls.roll() >= striker.strike.chance_to_hit {
        return false;
    }
    let dealt = striker.damage().min(target.hp);
    target.hp -= dealt;
    if striker.strike.drains {
        striker.hp = (striker.hp + dealt / 2).min(striker.max_hp);
    }
    if target.hp == 0 {
        return true;
    }
    if striker.strike.slows {
        target.slowed = true;
    }
    if striker.strike.petrifies {
        target.petrified = true;
        return true;
    }
    false
}

/// Play out one exchange with `rolls`
pub fn simulate_exchange(
    stats: &BattleStats,
    attacker: Vitals,
    defender: Vitals,
    rolls: &mut dyn RandomSource,
) -> SimulatedOutcome {
    let mut a = Side {
        strike: &stats.attacker,
        hp: attacker.hitpoints,
        max_hp: attacker.max_hitpoints,
        slowed: false,
        petrified: false,
    };
    let mut d = Side {
        strike: &stats.defender,
        hp: defender.hitpoints,
        max_hp: defender.max_hitpoints,
        slowed: false,
        petrified: false,
    };

    'rounds: for round in 0..stats.rounds.max(1) {
        let attacker_leads = round > 0 || !stats.defender_strikes_first;
        for attacker_swings in swing_schedule(a.strike.strikes, d.strike.strikes, attacker_leads) {
            let over = if attacker_swings {
                swing(&mut a, &mut d, rolls)
            } else {
                swing(&mut d, &mut a, rolls)
            };
            if over {
                break 'rounds;
            }
        }
    }

    SimulatedOutcome {
        attacker_hp: a.hp,
        defender_hp: d.hp,
        attacker_petrified: a.petrified,
        defender_petrified: d.petrified,
        attacker_slowed: a.slowed,
        defender_slowed: d.slowed,
    }
}

/// Averages over many simulated exchanges
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExchangeSummary {
    pub trials: u32,
    pub defender_killed: f64,
    pub attacker_killed: f64,
    pub avg_damage_to_defender: f64,
    pub avg_damage_to_attacker: f64,
}

/// Run `trials` independent exchanges and average them
pub fn run_trials(
    stats: &BattleStats,
    attacker: Vitals,
    defender: Vitals,
    trials: u32,
    rolls: &mut dyn RandomSource,
) -> ExchangeSummary {
    if trials == 0 {
        return ExchangeSummary::default();
    }
    let mut summary = ExchangeSummary {
        trials,
        ..ExchangeSummary::default()
    };
    for _ in 0..trials {
        let outcome = simulate_exchange(stats, attacker, defender, rolls);
        if outcome.defender_died() {
            summary.defender_killed += 1.0;
        }
        if outcome.attacker_died() {
            summary.attacker_killed += 1.0;
        }
        summary.avg_damage_to_defender += defender.hitpoints.saturating_sub(outcome.defender_hp) as f64;
        summary.avg_damage_to_attacker += attacker.hitpoints as f64 - outcome.attacker_hp as f64;
    }
    let n = trials as f64;
    summary.defender_killed /= n;
    summary.attacker_killed /= n;
    summary.avg_damage_to_defender /= n;
    summary.avg_damage_to_attacker /= n;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::sync::{ScriptedRolls, SeededRolls};

    fn stats(a: (u32, u32, u32), d: (u32, u32, u32)) -> BattleStats {
        BattleStats {
            attacker: StrikeStats {
                weapon: Some(0),
                chance_to_hit: a.0,
                damage: a.1,
                strikes: a.2,
                ..StrikeStats::default()
            },
            defender: StrikeStats {
                weapon: Some(0),
                chance_to_hit: d.0,
                damage: d.1,
                strikes: d.2,
                ..StrikeStats::default()
            },
            rounds: 1,
            ..BattleStats::default()
        }
    }

    fn vitals(hp: u32) -> Vitals {
        Vitals { hitpoints: hp, max_hitpoints: hp }
    }

    #[test]
    fn test_means_match_expectation() {
        let s = stats((70, 8, 2), (50, 4, 1));
        let mut rolls = SeededRolls::new(7);
        let summary = run_trials(&s, vitals(20), vitals(20), 10_000, &mut rolls);
        assert!((summary.avg_damage_to_defender - 11.2).abs() < 11.2 * 0.03);
        // fewer, smaller hits make this mean noisier
        assert!((summary.avg_damage_to_attacker - 2.0).abs() < 2.0 * 0.05);
        assert_eq!(summary.defender_killed, 0.0);
    }

    #[test]
    fn test_kill_stops_exchange() {
        let s = stats((100, 10, 3), (100, 10, 3));
        let out = simulate_exchange(&s, vitals(30), vitals(20), &mut ScriptedRolls::new(vec![0]));
        assert!(out.defender_died());
        assert_eq!(out.attacker_hp, 20);
    }

    #[test]
    fn test_berserk_fights_on() {
        let mut s = stats((100, 5, 1), (100, 5, 1));
        let once = simulate_exchange(&s, vitals(10), vitals(10), &mut ScriptedRolls::new(vec![0]));
        assert_eq!((once.attacker_hp, once.defender_hp), (5, 5));

        s.rounds = 30;
        s.to_the_death = true;
        let out = simulate_exchange(&s, vitals(10), vitals(10), &mut ScriptedRolls::new(vec![0]));
        assert!(out.defender_died());
        assert_eq!(out.attacker_hp, 5);
    }

    #[test]
    fn test_petrify_ends() {
        let mut s = stats((100, 1, 3), (100, 10, 3));
        s.attacker.petrifies = true;
        let out = simulate_exchange(&s, vitals(30), vitals(30), &mut ScriptedRolls::new(vec![0]));
        assert!(out.defender_petrified);
        assert_eq!(out.attacker_hp, 30);
        assert_eq!(out.defender_hp, 29);
    }

    #[test]
    fn test_slowed_damage_rounds_toward_base() {
        let mut s = stats((100, 1, 1), (100, 7, 1));
        s.attacker.slows = true;
        let out = simulate_exchange(&s, vitals(40), vitals(40), &mut ScriptedRolls::new(vec![0]));
        assert!(out.defender_slowed);
        // 7 halves to 4, as in the evaluator
        assert_eq!(out.attacker_hp, 36);
    }

    #[test]
    fn test_zero_trials() {
        let s = stats((70, 8, 2), (50, 4, 1));
        let mut rolls = SeededRolls::new(7);
        assert_eq!(run_trials(&s, vitals(20), vitals(20), 0, &mut rolls).trials, 0);
    }
}
