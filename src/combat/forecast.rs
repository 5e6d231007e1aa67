//! Kill-chance annotation for the attack preview
//!
//! Covers a single round. Berserk exchanges are reported for their first
//! round only; the preview is a hint, not a simulation.

use serde::{Deserialize, Serialize};

use crate::combat::probability::{probability_kill_during_swing, swing_schedule, Striker};
use crate::combat::stats::BattleStats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Chance the attacker kills the defender
    pub attacker_kills: f64,
    /// Chance the defender kills the attacker
    pub defender_kills: f64,
    pub both_survive: f64,
}

/// Forecast one round of `stats` between units at the given hitpoints
pub fn forecast(stats: &BattleStats, attacker_hp: u32, defender_hp: u32) -> Forecast {
    let attacker = Striker {
        hitpoints: attacker_hp,
        damage: stats.attacker.damage,
        chance: stats.attacker.hit_probability(),
        strikes: stats.attacker.strikes,
    };
    let defender = Striker {
        hitpoints: defender_hp,
        damage: stats.defender.damage,
        chance: stats.defender.hit_probability(),
        strikes: stats.defender.strikes,
    };
    let attacker_leads = !stats.defender_strikes_first;
    let swings = swing_schedule(attacker.strikes, defender.strikes, attacker_leads).len();

    let attacker_kills: f64 = (0..swings)
        .map(|n| probability_kill_during_swing(&attacker, &defender, attacker_leads, n))
        .sum();
    let defender_kills: f64 = (0..swings)
        .map(|n| probability_kill_during_swing(&defender, &attacker, !attacker_leads, n))
        .sum();

    Forecast {
        attacker_kills,
        defender_kills,
        both_survive: (1.0 - attacker_kills - defender_kills).max(0.0),
    }
}
