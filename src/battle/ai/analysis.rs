//! Attack plans and how they are scored
//!
//! An `AttackAnalysis` is one candidate plan: which units move where to
//! strike one target. `analyze` fills in the expected outcome by playing
//! the plan out many times; `rating` turns that outcome into a single
//! number the search can compare.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::ai::search::{choose_weapon, AttackContext};
use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::combat::simulation::{simulate_exchange, Vitals};
use crate::combat::stats::BattleStats;
use crate::core::types::{Side, UnitId};

/// Rating returned for plans that must not be executed
pub const REJECTED: f64 = -1.0;

/// Gold above which a leader is better off recruiting than fighting
const LEADER_GOLD_THRESHOLD: i32 = 20;
/// Allied attacks closer than this to the target count as an engagement
const ENGAGEMENT_RADIUS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackAnalysis {
    pub target: UnitId,
    pub target_hex: BattleHexCoord,
    /// Attacker and the hex it strikes from, in attack order
    pub movements: Vec<(UnitId, BattleHexCoord)>,
    /// Weapon each attacker uses; `None` when it has nothing to strike with
    pub weapons: Vec<Option<usize>>,
    /// Stats of each attacker's exchange, as of the last `analyze`
    pub stats: Vec<Option<BattleStats>>,

    /// Cost of the target, scaled up by its experience
    pub target_value: f64,
    /// Expected cost of attackers lost
    pub avg_losses: f64,
    pub chance_to_kill: f64,
    pub avg_damage_inflicted: f64,
    pub target_starting_damage: u32,
    pub avg_damage_taken: f64,
    /// Total cost of the attackers
    pub resources_used: f64,
    /// Cost-weighted chance to be hit on the assigned hexes (lower is better)
    pub terrain_quality: f64,
    /// Same, on the best hexes the attackers could reach instead
    pub alternative_terrain_quality: f64,
    /// Enemy power projected onto the assigned hexes
    pub vulnerability: f64,
    /// Allied power projected onto the assigned hexes
    pub support: f64,

    /// The target stands next to one of our leaders
    pub leader_threat: bool,
    /// One of the attackers is our leader
    pub uses_leader: bool,
    pub is_surrounded: bool,

    /// Last computed rating
    pub rating: f64,
}

impl AttackAnalysis {
    pub fn new(target: UnitId, target_hex: BattleHexCoord) -> Self {
        Self {
            target,
            target_hex,
            movements: Vec::new(),
            weapons: Vec::new(),
            stats: Vec::new(),
            target_value: 0.0,
            avg_losses: 0.0,
            chance_to_kill: 0.0,
            avg_damage_inflicted: 0.0,
            target_starting_damage: 0,
            avg_damage_taken: 0.0,
            resources_used: 0.0,
            terrain_quality: 0.0,
            alternative_terrain_quality: 0.0,
            vulnerability: 0.0,
            support: 0.0,
            leader_threat: false,
            uses_leader: false,
            is_surrounded: false,
            rating: 0.0,
        }
    }

    pub fn attackers(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.movements.iter().map(|(id, _)| *id)
    }

    /// Recompute the expected outcome of the current movements
    pub fn analyze(&mut self, ctx: &mut AttackContext<'_>) {
        let aggression = ctx.personality.behavior.aggression;
        let trials = ctx.personality.search.simulation_trials;

        let (target_value, starting_damage, defender_vitals) = {
            let target = ctx.field.unit(self.target);
            let xp = if target.max_experience > 0 {
                target.experience as f64 / target.max_experience as f64
            } else {
                0.0
            };
            (
                target.cost as f64 * (1.0 + xp),
                target.max_hitpoints.saturating_sub(target.hitpoints),
                Vitals {
                    hitpoints: target.hitpoints,
                    max_hitpoints: target.max_hitpoints,
                },
            )
        };
        self.target_value = target_value;
        self.target_starting_damage = starting_damage;
        self.leader_threat = threatens_leader(ctx.field, ctx.side, self.target_hex);

        self.uses_leader = false;
        self.resources_used = 0.0;
        self.terrain_quality = 0.0;
        self.alternative_terrain_quality = 0.0;
        let mut attackers: Vec<(UnitId, u32, Vitals)> = Vec::with_capacity(self.movements.len());
        for &(id, dst) in &self.movements {
            let alternative = ctx.best_defensive_position(id).chance_to_be_hit;
            let unit = ctx.field.unit(id);
            let cost = unit.cost as f64;
            self.uses_leader |= unit.can_recruit;
            self.resources_used += cost;
            self.terrain_quality += cost * unit.chance_to_be_hit(ctx.field.terrain_at(dst)) as f64 / 100.0;
            self.alternative_terrain_quality += cost * alternative;
            attackers.push((
                id,
                unit.cost,
                Vitals {
                    hitpoints: unit.hitpoints,
                    max_hitpoints: unit.max_hitpoints,
                },
            ));
        }
        if self.resources_used > 0.0 {
            self.terrain_quality /= self.resources_used;
            self.alternative_terrain_quality /= self.resources_used;
        }

        // Stats depend on where everyone stands, so evaluate them with the
        // attackers in place
        {
            let relocation = Relocation::new(ctx.field, &self.movements);
            let field = relocation.field();
            self.weapons.clear();
            self.stats.clear();
            for (id, _, _) in &attackers {
                match choose_weapon(field, *id, self.target, aggression) {
                    Some((weapon, stats)) => {
                        self.weapons.push(Some(weapon));
                        self.stats.push(Some(stats));
                    }
                    None => {
                        self.weapons.push(None);
                        self.stats.push(None);
                    }
                }
            }
        }

        let mut kills = 0u32;
        let mut losses = 0.0;
        let mut inflicted = 0u64;
        let mut taken = 0u64;
        for _ in 0..trials {
            let mut defender = defender_vitals;
            for ((_, cost, vitals), stats) in attackers.iter().zip(&self.stats) {
                let Some(stats) = stats else {
                    continue;
                };
                let outcome = simulate_exchange(stats, *vitals, defender, &mut ctx.rolls);
                taken += vitals.hitpoints.saturating_sub(outcome.attacker_hp) as u64;
                if outcome.attacker_died() {
                    losses += *cost as f64;
                }
                defender.hitpoints = outcome.defender_hp;
                if outcome.defender_died() || outcome.defender_petrified {
                    kills += 1;
                    break;
                }
                if outcome.attacker_petrified {
                    losses += *cost as f64;
                }
            }
            inflicted += defender_vitals.hitpoints.saturating_sub(defender.hitpoints) as u64;
        }

        if trials > 0 {
            let n = trials as f64;
            self.chance_to_kill = kills as f64 / n;
            self.avg_losses = losses / n;
            self.avg_damage_inflicted = inflicted as f64 / n;
            self.avg_damage_taken = taken as f64 / n;
        } else {
            self.chance_to_kill = 0.0;
            self.avg_losses = 0.0;
            self.avg_damage_inflicted = 0.0;
            self.avg_damage_taken = 0.0;
        }
    }

    /// Score this plan; higher is better, `REJECTED` means never
    pub fn rating(&self, aggression: f64, ctx: &AttackContext<'_>) -> f64 {
        let mut aggression = aggression;
        if self.leader_threat {
            aggression = 1.0;
        } else if self.uses_leader
            && !(self.chance_to_kill >= 0.9 && self.avg_losses == 0.0)
        {
            aggression = aggression.min(ctx.personality.behavior.caution);
        }

        let mut value = self.chance_to_kill * self.target_value - self.avg_losses * (1.0 - aggression);

        if self.terrain_quality > self.alternative_terrain_quality {
            // moving out of better cover to make this attack
            let exposure_mod = if self.uses_leader {
                2.0
            } else {
                ctx.personality.behavior.caution
            };
            let exposure = exposure_mod
                * self.resources_used
                * (self.terrain_quality - self.alternative_terrain_quality)
                * self.vulnerability
                / self.support.max(0.01);
            value -= exposure * (1.0 - aggression);
        }

        if self.uses_leader && !self.leader_threat && self.leader_could_recruit(ctx) {
            value -= ctx.field.teams.gold(ctx.side) as f64 * 0.5;
        }

        value += ((self.target_starting_damage as f64 / 3.0 + self.avg_damage_inflicted)
            - (1.0 - aggression) * self.avg_damage_taken)
            / 10.0;

        // a cornered unit skips the sanity check and fights its way out
        if !self.is_surrounded || (self.support != 0.0 && self.avg_damage_taken != 0.0) {
            if self.vulnerability > 50.0
                && self.vulnerability > self.support * 2.0
                && self.chance_to_kill < 0.02
                && aggression < 1.0
                && !self.engagement_nearby(ctx)
            {
                debug!(
                    target = %self.target,
                    vulnerability = self.vulnerability,
                    support = self.support,
                    "plan rejected as reckless"
                );
                return REJECTED;
            }
        }

        if !self.leader_threat && self.vulnerability * self.terrain_quality > 0.0 {
            value *= self.support / (self.vulnerability * self.terrain_quality);
        }

        let normalizer = self.resources_used / 2.0 + self.resources_used / 2.0 * self.terrain_quality;
        if normalizer > 0.0 {
            value /= normalizer;
        }

        if self.leader_threat {
            value *= 5.0;
        }

        debug!(
            target = %self.target,
            attackers = self.movements.len(),
            chance_to_kill = self.chance_to_kill,
            avg_losses = self.avg_losses,
            vulnerability = self.vulnerability,
            support = self.support,
            rating = value,
            "rated attack plan"
        );
        value
    }

    /// Our leader is in this plan, could get back to a keep this turn, and
    /// there is gold to spend
    fn leader_could_recruit(&self, ctx: &AttackContext<'_>) -> bool {
        if ctx.field.teams.gold(ctx.side) <= LEADER_GOLD_THRESHOLD {
            return false;
        }
        let keeps = ctx.field.map.keeps();
        self.attackers()
            .filter(|id| ctx.field.unit(*id).can_recruit)
            .any(|leader| {
                ctx.own_moves
                    .destinations(leader)
                    .iter()
                    .any(|hex| keeps.binary_search(hex).is_ok())
            })
    }

    fn engagement_nearby(&self, ctx: &AttackContext<'_>) -> bool {
        ctx.engaged
            .iter()
            .any(|hex| hex.distance(&self.target_hex) < ENGAGEMENT_RADIUS)
    }
}

/// Whether a leader friendly to `side` stands next to `target_hex`
fn threatens_leader(field: &Battlefield, side: Side, target_hex: BattleHexCoord) -> bool {
    target_hex.neighbors().iter().any(|hex| {
        field
            .units
            .unit_at(*hex)
            .is_some_and(|u| u.can_recruit && !field.is_enemy(u.side, side))
    })
}

/// Attackers moved onto their assigned hexes for as long as this lives
struct Relocation<'f> {
    field: &'f mut Battlefield,
    /// Unit and the hex it came from, in move order
    moved: Vec<(UnitId, BattleHexCoord)>,
}

impl<'f> Relocation<'f> {
    fn new(field: &'f mut Battlefield, movements: &[(UnitId, BattleHexCoord)]) -> Self {
        let mut moved = Vec::with_capacity(movements.len());
        for &(id, dst) in movements {
            let from = field.unit(id).hex;
            if from == dst {
                continue;
            }
            match field.units.relocate(id, dst) {
                Ok(()) => moved.push((id, from)),
                Err(e) => debug!(unit = %id, error = %e, "attacker left in place"),
            }
        }
        Self { field, moved }
    }

    fn field(&self) -> &Battlefield {
        self.field
    }
}

impl Drop for Relocation<'_> {
    fn drop(&mut self) {
        while let Some((id, from)) = self.moved.pop() {
            // vacated by this same unit on the way out
            let _ = self.field.units.relocate(id, from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::personality::AiPersonality;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::pathfinding::TerrainPathfinder;
    use crate::battle::teams::{Team, Teams};
    use crate::battle::units::Combatant;
    use crate::combat::weapons::{DamageType, RangeClass, Weapon};

    fn field() -> Battlefield {
        Battlefield::new(BattleMap::new(10, 10), Teams::two_sides())
    }

    #[test]
    fn test_relocation_restores_positions() {
        let mut f = field();
        let a = f
            .add_unit(Combatant::new("Grunt", Side(1), BattleHexCoord::new(1, 1), 30))
            .unwrap();
        let b = f
            .add_unit(Combatant::new("Grunt", Side(1), BattleHexCoord::new(2, 1), 30))
            .unwrap();
        {
            let r = Relocation::new(
                &mut f,
                &[(a, BattleHexCoord::new(5, 5)), (b, BattleHexCoord::new(1, 1))],
            );
            // b could not move onto a's old hex until a left; both moved
            assert_eq!(r.field().unit(a).hex, BattleHexCoord::new(5, 5));
            assert_eq!(r.field().unit(b).hex, BattleHexCoord::new(1, 1));
        }
        assert_eq!(f.unit(a).hex, BattleHexCoord::new(1, 1));
        assert_eq!(f.unit(b).hex, BattleHexCoord::new(2, 1));
        assert_eq!(f.units.id_at(BattleHexCoord::new(5, 5)), None);
    }

    fn plan_with(f: &mut Battlefield, personality: &AiPersonality) -> (AttackAnalysis, f64) {
        let target = f.units.id_at(BattleHexCoord::new(5, 5)).unwrap();
        let attacker = f.units.id_at(BattleHexCoord::new(2, 5)).unwrap();
        let mut ctx = AttackContext::new(f, Side(1), personality, &TerrainPathfinder);
        let mut plan = AttackAnalysis::new(target, BattleHexCoord::new(5, 5));
        plan.movements.push((attacker, BattleHexCoord::new(4, 5)));
        plan.analyze(&mut ctx);
        let rating = plan.rating(personality.behavior.aggression, &ctx);
        (plan, rating)
    }

    #[test]
    fn test_analyze_sure_kill() {
        let mut f = field();
        f.add_unit(
            Combatant::new("Knight", Side(1), BattleHexCoord::new(2, 5), 40)
                .with_weapon(Weapon::new("lance", 20, 6, RangeClass::Melee, DamageType::Pierce)),
        )
        .unwrap();
        f.add_unit(
            Combatant::new("Peasant", Side(2), BattleHexCoord::new(5, 5), 18)
                .with_hitpoints(5)
                .with_cost(8),
        )
        .unwrap();
        // six 60% swings, one hit kills
        let (plan, rating) = plan_with(&mut f, &AiPersonality::default());

        assert_eq!(plan.weapons, vec![Some(0)]);
        assert!(plan.chance_to_kill > 0.9);
        assert_eq!(plan.avg_losses, 0.0);
        assert_eq!(plan.target_starting_damage, 13);
        assert!((plan.target_value - 8.0).abs() < 1e-9);
        assert!(rating > 0.0);
        // positions are back after analysis
        assert_eq!(f.units.id_at(BattleHexCoord::new(4, 5)), None);
    }

    #[test]
    fn test_leader_threat_detected() {
        let mut f = field();
        f.add_unit(
            Combatant::new("Grunt", Side(1), BattleHexCoord::new(2, 5), 30).with_weapon(Weapon::sword()),
        )
        .unwrap();
        f.add_unit(Combatant::new("Chief", Side(1), BattleHexCoord::new(6, 5), 40).as_leader())
            .unwrap();
        f.add_unit(Combatant::new("Raider", Side(2), BattleHexCoord::new(5, 5), 30).with_weapon(Weapon::sword()))
            .unwrap();
        let (plan, _) = plan_with(&mut f, &AiPersonality::default());
        assert!(plan.leader_threat);
        assert!(!plan.uses_leader);
    }

    fn rated(plan: &AttackAnalysis, gold: i32) -> f64 {
        let mut f = Battlefield::new(
            BattleMap::new(10, 10),
            Teams::new(vec![Team::new(Side(1), 1).with_gold(gold), Team::new(Side(2), 2)]),
        );
        let personality = AiPersonality::default();
        let ctx = AttackContext::new(&mut f, Side(1), &personality, &TerrainPathfinder);
        plan.rating(personality.behavior.aggression, &ctx)
    }

    fn base_plan() -> AttackAnalysis {
        let mut plan = AttackAnalysis::new(UnitId(1), BattleHexCoord::new(5, 5));
        plan.target_value = 20.0;
        plan.chance_to_kill = 0.5;
        plan.resources_used = 14.0;
        plan.terrain_quality = 0.6;
        plan.alternative_terrain_quality = 0.6;
        plan
    }

    #[test]
    fn test_sanity_veto() {
        let mut plan = base_plan();
        plan.chance_to_kill = 0.0;
        plan.vulnerability = 80.0;
        plan.support = 10.0;
        assert_eq!(rated(&plan, 0), REJECTED);

        // a cornered unit with nothing to lose fights anyway
        plan.is_surrounded = true;
        assert_ne!(rated(&plan, 0), REJECTED);
    }

    #[test]
    fn test_nearby_engagement_lifts_veto() {
        let mut plan = base_plan();
        plan.chance_to_kill = 0.0;
        plan.vulnerability = 80.0;
        plan.support = 10.0;
        let personality = AiPersonality::default();
        let aggression = personality.behavior.aggression;

        let mut f = field();
        let ctx = AttackContext::new(&mut f, Side(1), &personality, &TerrainPathfinder)
            .with_engaged(vec![BattleHexCoord::new(8, 8)]);
        assert_eq!(plan.rating(aggression, &ctx), REJECTED);

        let mut f = field();
        let ctx = AttackContext::new(&mut f, Side(1), &personality, &TerrainPathfinder)
            .with_engaged(vec![BattleHexCoord::new(8, 8), BattleHexCoord::new(6, 4)]);
        assert_ne!(plan.rating(aggression, &ctx), REJECTED);
    }

    #[test]
    fn test_exposure_lowers_rating() {
        let mut plan = base_plan();
        plan.vulnerability = 10.0;
        plan.support = 10.0;
        let sheltered = rated(&plan, 0);
        plan.terrain_quality = 0.7;
        plan.alternative_terrain_quality = 0.4;
        let exposed = rated(&plan, 0);
        assert!(exposed < sheltered);
    }

    #[test]
    fn test_leader_threat_multiplies() {
        let mut plan = base_plan();
        let plain = rated(&plan, 0);
        plan.leader_threat = true;
        let threatened = rated(&plan, 0);
        assert!(plain > 0.0);
        assert!(threatened > plain * 4.0);
    }
}
