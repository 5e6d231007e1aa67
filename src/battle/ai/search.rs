//! Attack-combination search
//!
//! Branch-and-bound over the units that could strike one target. The
//! search grows a single plan one attacker at a time, keeps every plan that
//! beats the best plan one attacker smaller, and prunes the rest. Each
//! commitment is a guard that undoes itself on drop, so unwinding cannot
//! leave a hex marked or an attacker missing from the pool.

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use tracing::debug;

use crate::battle::ai::analysis::{AttackAnalysis, REJECTED};
use crate::battle::ai::moves::MoveMaps;
use crate::battle::ai::personality::AiPersonality;
use crate::battle::ai::power::power_projection;
use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::battle::pathfinding::Pathfinder;
use crate::combat::stats::{backstab_check, evaluate_battle_stats, BattleStats};
use crate::combat::sync::SeededRolls;
use crate::combat::weapons::WeaponSpecial;
use crate::core::types::{Side, UnitId};

/// Vulnerability divisor for a hex the enemy already crowds
const SURROUND_BONUS: f64 = 1.2;

/// Best cover a unit can reach this turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefensivePosition {
    pub hex: BattleHexCoord,
    /// Chance to be hit there, as a fraction
    pub chance_to_be_hit: f64,
}

/// Everything one side's attack search reads, plus its caches
pub struct AttackContext<'a> {
    pub field: &'a mut Battlefield,
    pub side: Side,
    pub personality: &'a AiPersonality,
    /// Move maps of `side` and its allies
    pub own_moves: MoveMaps,
    pub enemy_moves: MoveMaps,
    /// Hexes where this side already attacked this turn
    pub engaged: Vec<BattleHexCoord>,
    pub(crate) rolls: SeededRolls,
    defense_cache: AHashMap<UnitId, DefensivePosition>,
}

impl<'a> AttackContext<'a> {
    pub fn new(
        field: &'a mut Battlefield,
        side: Side,
        personality: &'a AiPersonality,
        pathfinder: &dyn Pathfinder,
    ) -> Self {
        let own_moves = MoveMaps::for_allies_of(field, pathfinder, side);
        let enemy_moves = MoveMaps::for_enemies_of(field, pathfinder, side);
        Self {
            field,
            side,
            personality,
            own_moves,
            enemy_moves,
            engaged: Vec::new(),
            rolls: SeededRolls::new(personality.search.seed),
            defense_cache: AHashMap::new(),
        }
    }

    pub fn with_engaged(mut self, hexes: Vec<BattleHexCoord>) -> Self {
        self.engaged = hexes;
        self
    }

    /// Lowest chance to be hit `unit` can reach this turn
    pub fn best_defensive_position(&mut self, unit: UnitId) -> DefensivePosition {
        if let Some(cached) = self.defense_cache.get(&unit) {
            return *cached;
        }
        let combatant = self.field.unit(unit);
        let own = [combatant.hex];
        let destinations = match self.own_moves.destinations(unit) {
            [] => &own[..],
            hexes => hexes,
        };
        let mut best = DefensivePosition {
            hex: combatant.hex,
            chance_to_be_hit: f64::INFINITY,
        };
        for hex in destinations {
            let chance = combatant.chance_to_be_hit(self.field.terrain_at(*hex)) as f64 / 100.0;
            if chance < best.chance_to_be_hit {
                best = DefensivePosition {
                    hex: *hex,
                    chance_to_be_hit: chance,
                };
            }
        }
        self.defense_cache.insert(unit, best);
        best
    }
}

/// The weapon `attacker` should use against `defender`, with the stats of
/// that exchange
///
/// Maximizes expected damage dealt minus expected damage taken, the latter
/// discounted by `aggression`. `None` when no weapon has a strike.
pub fn choose_weapon(
    field: &Battlefield,
    attacker: UnitId,
    defender: UnitId,
    aggression: f64,
) -> Option<(usize, BattleStats)> {
    let unit = field.unit(attacker);
    let mut best: Option<(usize, BattleStats, f64)> = None;
    for (index, weapon) in unit.weapons.iter().enumerate() {
        if weapon.strikes == 0 {
            continue;
        }
        let stats = evaluate_battle_stats(field, attacker, defender, index, None);
        let dealt = stats.attacker.hit_probability() * (stats.attacker.damage * stats.attacker.strikes) as f64;
        let taken = stats.defender.hit_probability() * (stats.defender.damage * stats.defender.strikes) as f64;
        let rating = dealt - (1.0 - aggression) * taken;
        if best.as_ref().map_or(true, |(_, _, r)| rating > *r) {
            best = Some((index, stats, rating));
        }
    }
    best.map(|(index, stats, _)| (index, stats))
}

/// Hex an attacker would strike from
#[derive(Debug, Clone, Copy)]
struct Approach {
    slot: usize,
    hex: BattleHexCoord,
    vulnerability: f64,
    support: f64,
    surrounded: bool,
}

/// Whether enemies of `side` crowd `hex`: flanked from two opposite sides
/// with a third enemy near, or nearly every open neighbour hostile
fn is_surrounded(field: &Battlefield, side: Side, hex: BattleHexCoord) -> bool {
    let neighbors = hex.neighbors();
    let mut accessible = 0;
    let mut enemies = 0;
    let mut flanked = false;
    for i in 0..3 {
        let mut pair = 0;
        for n in [neighbors[i], neighbors[i + 3]] {
            if !field.map.in_bounds(n) {
                continue;
            }
            accessible += 1;
            if field.units.unit_at(n).is_some_and(|u| field.is_enemy(u.side, side)) {
                enemies += 1;
                pair += 1;
            }
        }
        flanked |= pair == 2;
    }
    (flanked && enemies > 2) || enemies + 1 >= accessible
}

/// Best open neighbour of the target `unit` can strike from
///
/// Highest terrain rating wins; ties go to the hex with the smaller
/// vulnerability over support.
fn best_approach(
    ctx: &AttackContext<'_>,
    unit: UnitId,
    target_hex: BattleHexCoord,
    taken: &[bool; 6],
) -> Option<Approach> {
    let field = &*ctx.field;
    let attacker = field.unit(unit);
    let backstabber = attacker
        .weapons
        .iter()
        .any(|w| w.has_special(&WeaponSpecial::Backstab));

    let mut best: Option<(Approach, f64)> = None;
    for (slot, hex) in target_hex.neighbors().into_iter().enumerate() {
        if taken[slot] || !field.map.in_bounds(hex) {
            continue;
        }
        if field.units.id_at(hex).is_some_and(|occupant| occupant != unit) {
            continue;
        }
        if attacker.hex != hex && !ctx.own_moves.reaches(unit, hex) {
            continue;
        }

        let mut rating = (100 - attacker.chance_to_be_hit(field.terrain_at(hex)).min(100)) as f64;
        if backstabber && backstab_check(field, hex, target_hex) {
            rating *= 2.0;
        }
        let surrounded = is_surrounded(field, ctx.side, hex);
        let mut vulnerability = power_projection(field, hex, &ctx.enemy_moves, true);
        if surrounded {
            vulnerability /= SURROUND_BONUS;
        }
        let support = power_projection(field, hex, &ctx.own_moves, false);

        let better = match &best {
            None => true,
            Some((b, r)) => {
                rating > *r
                    || (rating == *r && vulnerability - support < b.vulnerability - b.support)
            }
        };
        if better {
            best = Some((
                Approach {
                    slot,
                    hex,
                    vulnerability,
                    support,
                    surrounded,
                },
                rating,
            ));
        }
    }
    best.map(|(approach, _)| approach)
}

/// The plan being grown, the attackers not yet in it and the target's
/// neighbours already taken
#[derive(Debug, Clone, PartialEq)]
struct PlanState {
    analysis: AttackAnalysis,
    pool: Vec<UnitId>,
    taken: [bool; 6],
}

/// One attacker tentatively added to the plan; dropping it takes it back
struct Commit<'s> {
    state: &'s mut PlanState,
    saved: AttackAnalysis,
    unit: UnitId,
    pool_index: usize,
    slot: usize,
}

impl<'s> Commit<'s> {
    fn new(state: &'s mut PlanState, pool_index: usize, approach: Approach) -> Self {
        let saved = state.analysis.clone();
        let unit = state.pool.remove(pool_index);
        state.taken[approach.slot] = true;
        let plan = &mut state.analysis;
        plan.movements.push((unit, approach.hex));
        plan.vulnerability += approach.vulnerability;
        plan.support += approach.support;
        plan.is_surrounded = approach.surrounded;
        Self {
            state,
            saved,
            unit,
            pool_index,
            slot: approach.slot,
        }
    }
}

impl Drop for Commit<'_> {
    fn drop(&mut self) {
        std::mem::swap(&mut self.state.analysis, &mut self.saved);
        self.state.taken[self.slot] = false;
        self.state.pool.insert(self.pool_index, self.unit);
    }
}

/// Keep `plan`, dropping the worst result once over `cap`
fn record(results: &mut Vec<AttackAnalysis>, plan: AttackAnalysis, cap: usize) {
    results.push(plan);
    if results.len() > cap {
        let worst = results
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| OrderedFloat(a.rating))
            .map(|(i, _)| i);
        if let Some(worst) = worst {
            results.remove(worst);
        }
    }
}

struct SearchBounds {
    best_per_depth: Vec<f64>,
    results: Vec<AttackAnalysis>,
}

fn search_level(
    ctx: &mut AttackContext<'_>,
    state: &mut PlanState,
    current_rating: f64,
    bounds: &mut SearchBounds,
) {
    let depth = state.analysis.movements.len();
    if depth >= ctx.personality.search.attack_depth {
        return;
    }
    let rating_to_beat = if depth == 0 {
        REJECTED
    } else {
        let best = &mut bounds.best_per_depth[depth];
        *best = best.max(current_rating);
        *best
    };
    let aggression = ctx.personality.behavior.aggression;
    let target_hex = state.analysis.target_hex;

    for index in 0..state.pool.len() {
        let unit = state.pool[index];
        {
            let attacker = ctx.field.unit(unit);
            if attacker.incapacitated() || !attacker.can_initiate() {
                continue;
            }
            // slowing only pays off before anyone else strikes
            if depth > 0 && attacker.weapons.iter().any(|w| w.has_special(&WeaponSpecial::Slow)) {
                continue;
            }
        }
        let Some(approach) = best_approach(ctx, unit, target_hex, &state.taken) else {
            continue;
        };

        let mut commit = Commit::new(state, index, approach);
        commit.state.analysis.analyze(ctx);
        let rating = commit.state.analysis.rating(aggression, ctx);
        commit.state.analysis.rating = rating;

        if rating > rating_to_beat {
            record(
                &mut bounds.results,
                commit.state.analysis.clone(),
                ctx.personality.search.max_results,
            );
            search_level(ctx, &mut *commit.state, rating, bounds);
        }
    }
}

/// Every plan against `target` worth keeping, best first
///
/// Panics when `candidates` is empty. Returns no plans when none of them
/// can reach a free hex next to the target.
pub fn search_attacks(
    ctx: &mut AttackContext<'_>,
    target: UnitId,
    candidates: &[UnitId],
) -> Vec<AttackAnalysis> {
    assert!(
        !candidates.is_empty(),
        "attack search against {} needs at least one candidate",
        target
    );
    let target_hex = ctx.field.unit(target).hex;
    let mut state = PlanState {
        analysis: AttackAnalysis::new(target, target_hex),
        pool: candidates.to_vec(),
        taken: [false; 6],
    };
    let mut bounds = SearchBounds {
        best_per_depth: vec![f64::NEG_INFINITY; ctx.personality.search.attack_depth + 1],
        results: Vec::new(),
    };
    search_level(ctx, &mut state, REJECTED, &mut bounds);

    let mut results = bounds.results;
    results.sort_by_key(|a| Reverse(OrderedFloat(a.rating)));
    debug!(
        target = %target,
        plans = results.len(),
        best = results.first().map(|a| a.rating),
        "attack search finished"
    );
    results
}

/// Search every enemy the side could attack; all plans, best first
pub fn analyze_targets(ctx: &mut AttackContext<'_>) -> Vec<AttackAnalysis> {
    let candidates: Vec<UnitId> = ctx
        .field
        .units_of(ctx.side)
        .into_iter()
        .filter(|id| {
            let unit = ctx.field.unit(*id);
            !unit.incapacitated() && unit.can_initiate()
        })
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    let targets: Vec<UnitId> = ctx
        .field
        .enemies_of(ctx.side)
        .into_iter()
        .filter(|id| !ctx.field.unit(*id).incapacitated())
        .collect();

    let mut all = Vec::new();
    for target in targets {
        all.extend(search_attacks(ctx, target, &candidates));
    }
    all.sort_by_key(|a| Reverse(OrderedFloat(a.rating)));
    all
}

/// The best plan with a positive rating, if any
pub fn best_attack(ctx: &mut AttackContext<'_>) -> Option<AttackAnalysis> {
    analyze_targets(ctx).into_iter().find(|a| a.rating > 0.0)
}
