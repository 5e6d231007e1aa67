//! Power projection: how much damage a faction could bring onto one hex
//! this turn
//!
//! One unit strikes from one hex, so each mover is counted at most once
//! around the target.

use crate::battle::ai::moves::MoveMaps;
use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::core::types::UnitId;

/// Village bonus applied to movers that would strike from a village
const VILLAGE_BONUS: f64 = 1.5;
/// Chance to be hit assumed when terrain is ignored
const FLAT_EXPOSURE: f64 = 0.5;

/// Damage potential of `mover` striking from `from`
fn mover_rating(field: &Battlefield, mover: UnitId, from: BattleHexCoord, use_terrain: bool) -> f64 {
    let unit = field.unit(mover);
    let terrain = field.terrain_at(from);
    let exposure = if use_terrain {
        unit.chance_to_be_hit(terrain) as f64 / 100.0
    } else {
        FLAT_EXPOSURE
    };
    let tod = field.time_of_day.bonus_for(unit.alignment);
    let most_damage = unit
        .weapons
        .iter()
        .map(|w| {
            let strikes = w.effective_strikes(unit.hitpoints, unit.max_hitpoints);
            (w.damage as i64 * strikes as i64 * (100 + tod) as i64 / 100).max(0)
        })
        .max()
        .unwrap_or(0) as f64;
    let village = if use_terrain && terrain.is_village() {
        VILLAGE_BONUS
    } else {
        1.0
    };
    unit.hp_fraction() * exposure * most_damage * village
}

/// Sum of the best per-neighbour ratings around `hex` from the movers in
/// `moves`
///
/// A mover already counted at an earlier neighbour moves to a later one
/// only when it rates at least as well there; its earlier contribution is
/// then withdrawn.
pub fn power_projection(
    field: &Battlefield,
    hex: BattleHexCoord,
    moves: &MoveMaps,
    use_terrain: bool,
) -> f64 {
    // (mover, neighbour index, rating)
    let mut used: Vec<(UnitId, usize, f64)> = Vec::with_capacity(6);
    let mut contribution = [0.0f64; 6];

    for (slot, neighbor) in hex.neighbors().into_iter().enumerate() {
        if !field.map.in_bounds(neighbor) {
            continue;
        }
        let mut best: Option<(UnitId, f64)> = None;
        for &mover in moves.movers_to(neighbor) {
            if field.units.get(mover).is_none() {
                continue;
            }
            let rating = mover_rating(field, mover, neighbor, use_terrain);
            if best.is_some_and(|(_, b)| rating <= b) || rating <= 0.0 {
                continue;
            }
            let prior = used.iter().find(|(id, _, _)| *id == mover);
            if prior.map_or(true, |(_, _, r)| rating >= *r) {
                best = Some((mover, rating));
            }
        }

        let Some((mover, rating)) = best else {
            continue;
        };
        match used.iter_mut().find(|(id, _, _)| *id == mover) {
            Some(entry) => {
                contribution[entry.1] = 0.0;
                entry.1 = slot;
                entry.2 = rating;
            }
            None => used.push((mover, slot, rating)),
        }
        contribution[slot] = rating;
    }

    contribution.iter().sum()
}
