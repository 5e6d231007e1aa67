//! Move maps: where each unit can go, and who can get to each hex
//!
//! Lists inside both maps are kept sorted so every consumer sees the same
//! order regardless of hash iteration.

use ahash::AHashMap;

use crate::battle::field::Battlefield;
use crate::battle::hex::BattleHexCoord;
use crate::battle::pathfinding::Pathfinder;
use crate::core::types::{Side, UnitId};

#[derive(Debug, Clone, Default)]
pub struct MoveMaps {
    /// Destinations per unit, including its own hex
    pub srcdst: AHashMap<UnitId, Vec<BattleHexCoord>>,
    /// Units that can end their move on each hex
    pub dstsrc: AHashMap<BattleHexCoord, Vec<UnitId>>,
}

impl MoveMaps {
    /// Build maps for `movers`; incapacitated units are left out
    pub fn build(field: &Battlefield, pathfinder: &dyn Pathfinder, movers: &[UnitId]) -> Self {
        let mut maps = MoveMaps::default();
        let mut ids: Vec<UnitId> = movers
            .iter()
            .copied()
            .filter(|id| field.units.get(*id).is_some_and(|u| !u.incapacitated()))
            .collect();
        ids.sort();
        ids.dedup();

        for id in ids {
            let mut hexes: Vec<BattleHexCoord> = pathfinder
                .reachable(field, id)
                .into_iter()
                .map(|r| r.hex)
                .collect();
            // pathfinders need not return coordinate order
            hexes.sort();
            hexes.dedup();
            for hex in &hexes {
                maps.dstsrc.entry(*hex).or_default().push(id);
            }
            maps.srcdst.insert(id, hexes);
        }
        maps
    }

    /// Maps for `side` and every side allied with it
    pub fn for_allies_of(field: &Battlefield, pathfinder: &dyn Pathfinder, side: Side) -> Self {
        let movers: Vec<UnitId> = field
            .units
            .iter()
            .filter(|(_, u)| !field.is_enemy(u.side, side))
            .map(|(id, _)| id)
            .collect();
        Self::build(field, pathfinder, &movers)
    }

    /// Maps for every enemy of `side`
    pub fn for_enemies_of(field: &Battlefield, pathfinder: &dyn Pathfinder, side: Side) -> Self {
        Self::build(field, pathfinder, &field.enemies_of(side))
    }

    pub fn reaches(&self, unit: UnitId, hex: BattleHexCoord) -> bool {
        self.srcdst
            .get(&unit)
            .is_some_and(|hexes| hexes.binary_search(&hex).is_ok())
    }

    pub fn destinations(&self, unit: UnitId) -> &[BattleHexCoord] {
        self.srcdst.get(&unit).map_or(&[], |v| v.as_slice())
    }

    pub fn movers_to(&self, hex: BattleHexCoord) -> &[UnitId] {
        self.dstsrc.get(&hex).map_or(&[], |v| v.as_slice())
    }
}
