//! Movement range for battle maps
//!
//! Bounded Dijkstra over terrain movement costs. Enemy units block,
//! allies may be passed through but not stopped on, and entering an enemy
//! zone of control ends movement unless the mover is a skirmisher.

use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::core::types::UnitId;

/// A hex a unit can end its move on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachable {
    pub hex: BattleHexCoord,
    /// Movement points spent to get there
    pub cost: u32,
}

/// Movement-range service
pub trait Pathfinder {
    /// Hexes `mover` can end its move on this turn, including its own, in
    /// any order
    fn reachable(&self, field: &Battlefield, mover: UnitId) -> Vec<Reachable>;
}

/// Node in the open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    coord: BattleHexCoord,
    cost: u32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.coord == other.coord
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; coordinate breaks ties deterministically
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Terrain-cost pathfinder honoring zones of control
#[derive(Debug, Clone, Copy, Default)]
pub struct TerrainPathfinder;

impl Pathfinder for TerrainPathfinder {
    fn reachable(&self, field: &Battlefield, mover: UnitId) -> Vec<Reachable> {
        let unit = field.unit(mover);
        let start = unit.hex;
        let budget = if unit.incapacitated() { 0 } else { unit.movement };

        let mut open_set = BinaryHeap::new();
        let mut costs: AHashMap<BattleHexCoord, u32> = AHashMap::new();
        costs.insert(start, 0);
        open_set.push(PathNode {
            coord: start,
            cost: 0,
        });

        while let Some(current) = open_set.pop() {
            if costs.get(&current.coord).is_some_and(|c| *c < current.cost) {
                continue;
            }
            if current.coord != start
                && !unit.abilities.skirmisher
                && field.enemy_adjacent(current.coord, unit.side)
            {
                continue;
            }

            for neighbor in current.coord.neighbors() {
                if !field.map.in_bounds(neighbor) {
                    continue;
                }
                let Some(step) = unit.movement_type.movement_cost(field.terrain_at(neighbor)) else {
                    continue;
                };
                if field
                    .units
                    .unit_at(neighbor)
                    .is_some_and(|other| field.is_enemy(other.side, unit.side))
                {
                    continue;
                }

                let cost = current.cost + step;
                if cost > budget {
                    continue;
                }
                if costs.get(&neighbor).map_or(true, |c| cost < *c) {
                    costs.insert(neighbor, cost);
                    open_set.push(PathNode {
                        coord: neighbor,
                        cost,
                    });
                }
            }
        }

        let mut reachable: Vec<Reachable> = costs
            .into_iter()
            .filter(|(hex, _)| *hex == start || field.units.id_at(*hex).is_none())
            .map(|(hex, cost)| Reachable { hex, cost })
            .collect();
        reachable.sort_by_key(|r| r.hex);
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::teams::Teams;
    use crate::battle::terrain::{BattleTerrain, MovementType};
    use crate::battle::units::Combatant;
    use crate::core::types::Side;

    fn field() -> Battlefield {
        Battlefield::new(BattleMap::new(10, 10), Teams::two_sides())
    }

    fn hexes(r: &[Reachable]) -> Vec<BattleHexCoord> {
        r.iter().map(|x| x.hex).collect()
    }

    #[test]
    fn test_open_ground_range() {
        let mut f = field();
        let id = f
            .add_unit(
                Combatant::new("Scout", Side(1), BattleHexCoord::new(5, 5), 30)
                    .with_movement(1, MovementType::Infantry),
            )
            .unwrap();
        let r = TerrainPathfinder.reachable(&f, id);
        assert_eq!(r.len(), 7);
        assert!(hexes(&r).contains(&BattleHexCoord::new(5, 5)));
    }

    #[test]
    fn test_impassable_terrain() {
        let mut f = field();
        for n in BattleHexCoord::new(5, 5).neighbors() {
            f.map.set_terrain(n, BattleTerrain::DeepWater);
        }
        let id = f
            .add_unit(Combatant::new("Grunt", Side(1), BattleHexCoord::new(5, 5), 30))
            .unwrap();
        let r = TerrainPathfinder.reachable(&f, id);
        assert_eq!(hexes(&r), vec![BattleHexCoord::new(5, 5)]);
    }

    #[test]
    fn test_zone_of_control_stops_movement() {
        let mut f = field();
        let id = f
            .add_unit(
                Combatant::new("Grunt", Side(1), BattleHexCoord::new(3, 5), 30)
                    .with_movement(3, MovementType::Infantry),
            )
            .unwrap();
        f.add_unit(Combatant::new("Guard", Side(2), BattleHexCoord::new(5, 5), 30))
            .unwrap();
        let r = hexes(&TerrainPathfinder.reachable(&f, id));
        // zone hexes can be entered but not left
        assert!(r.contains(&BattleHexCoord::new(4, 5)));
        assert!(r.contains(&BattleHexCoord::new(5, 4)));
        assert!(!r.contains(&BattleHexCoord::new(5, 5)));
        assert!(!r.contains(&BattleHexCoord::new(6, 4)));
    }

    #[test]
    fn test_skirmisher_ignores_zone() {
        let mut f = field();
        let mut unit = Combatant::new("Thief", Side(1), BattleHexCoord::new(3, 5), 24)
            .with_movement(3, MovementType::Elusive);
        unit.abilities.skirmisher = true;
        let id = f.add_unit(unit).unwrap();
        f.add_unit(Combatant::new("Guard", Side(2), BattleHexCoord::new(5, 5), 30))
            .unwrap();
        let r = hexes(&TerrainPathfinder.reachable(&f, id));
        assert!(r.contains(&BattleHexCoord::new(6, 4)));
    }

    #[test]
    fn test_allies_passable_not_stoppable() {
        let mut f = field();
        let id = f
            .add_unit(
                Combatant::new("Grunt", Side(1), BattleHexCoord::new(2, 5), 30)
                    .with_movement(2, MovementType::Infantry),
            )
            .unwrap();
        f.add_unit(Combatant::new("Friend", Side(1), BattleHexCoord::new(3, 5), 30))
            .unwrap();
        let r = hexes(&TerrainPathfinder.reachable(&f, id));
        assert!(!r.contains(&BattleHexCoord::new(3, 5)));
        assert!(r.contains(&BattleHexCoord::new(4, 5)));
    }

    #[test]
    fn test_petrified_cannot_move() {
        let mut f = field();
        let id = f
            .add_unit(Combatant::new("Statue", Side(1), BattleHexCoord::new(2, 5), 30))
            .unwrap();
        f.unit_mut(id).status.petrified = true;
        assert_eq!(TerrainPathfinder.reachable(&f, id).len(), 1);
    }
}
