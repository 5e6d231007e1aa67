//! Battle map: a rectangular grid of terrain
//!
//! Hexes live at `0 <= q < width`, `0 <= r < height`. Anything outside is
//! off the board and has no terrain.

use serde::{Deserialize, Serialize};

use crate::battle::hex::BattleHexCoord;
use crate::battle::terrain::BattleTerrain;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleMap {
    pub width: u32,
    pub height: u32,
    /// Row-major by `r`, then `q`
    terrain: Vec<BattleTerrain>,
}

impl BattleMap {
    /// Create a map of flat terrain
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            terrain: vec![BattleTerrain::Flat; (width * height) as usize],
        }
    }

    pub fn in_bounds(&self, coord: BattleHexCoord) -> bool {
        coord.q >= 0
            && coord.r >= 0
            && coord.q < self.width as i32
            && coord.r < self.height as i32
    }

    fn index(&self, coord: BattleHexCoord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| coord.r as usize * self.width as usize + coord.q as usize)
    }

    /// Terrain at a coordinate, `None` off the map
    pub fn terrain_at(&self, coord: BattleHexCoord) -> Option<BattleTerrain> {
        self.index(coord).map(|i| self.terrain[i])
    }

    /// Set terrain; ignored off the map
    pub fn set_terrain(&mut self, coord: BattleHexCoord, terrain: BattleTerrain) {
        if let Some(i) = self.index(coord) {
            self.terrain[i] = terrain;
        }
    }

    pub fn is_village(&self, coord: BattleHexCoord) -> bool {
        self.terrain_at(coord).is_some_and(|t| t.is_village())
    }

    /// Every on-board coordinate with its terrain
    pub fn hexes(&self) -> impl Iterator<Item = (BattleHexCoord, BattleTerrain)> + '_ {
        let width = self.width as usize;
        self.terrain.iter().enumerate().map(move |(i, t)| {
            (
                BattleHexCoord::new((i % width) as i32, (i / width) as i32),
                *t,
            )
        })
    }

    /// All keep hexes, in coordinate order
    pub fn keeps(&self) -> Vec<BattleHexCoord> {
        let mut keeps: Vec<_> = self
            .hexes()
            .filter(|(_, t)| t.is_keep())
            .map(|(c, _)| c)
            .collect();
        keeps.sort();
        keeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_is_flat() {
        let map = BattleMap::new(6, 4);
        assert_eq!(map.hexes().count(), 24);
        assert!(map.hexes().all(|(_, t)| t == BattleTerrain::Flat));
        assert_eq!(map.terrain_at(BattleHexCoord::new(5, 3)), Some(BattleTerrain::Flat));
    }

    #[test]
    fn test_bounds() {
        let map = BattleMap::new(10, 8);
        assert!(map.in_bounds(BattleHexCoord::new(0, 0)));
        assert!(map.in_bounds(BattleHexCoord::new(9, 7)));
        assert!(!map.in_bounds(BattleHexCoord::new(10, 0)));
        assert!(!map.in_bounds(BattleHexCoord::new(0, 8)));
        assert!(!map.in_bounds(BattleHexCoord::new(-1, 0)));
        assert_eq!(map.terrain_at(BattleHexCoord::new(-1, 0)), None);
    }

    #[test]
    fn test_set_terrain() {
        let mut map = BattleMap::new(10, 10);
        let coord = BattleHexCoord::new(5, 3);
        map.set_terrain(coord, BattleTerrain::Village);
        assert!(map.is_village(coord));
        assert!(!map.is_village(BattleHexCoord::new(3, 5)));

        map.set_terrain(BattleHexCoord::new(7, 2), BattleTerrain::Keep);
        map.set_terrain(BattleHexCoord::new(2, 2), BattleTerrain::Keep);
        assert_eq!(
            map.keeps(),
            vec![BattleHexCoord::new(2, 2), BattleHexCoord::new(7, 2)]
        );

        // off the board is a no-op
        map.set_terrain(BattleHexCoord::new(20, 20), BattleTerrain::Keep);
        assert_eq!(map.keeps().len(), 2);
    }
}
