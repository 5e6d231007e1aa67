//! Battle system - the hex board and everything standing on it
//!
//! Terrain decides how often a unit is hit and how far it moves; sides
//! decide who may attack whom; the AI decides which attacks are worth
//! making.

pub mod ai;
pub mod battle_map;
pub mod field;
pub mod hex;
pub mod pathfinding;
pub mod teams;
pub mod terrain;
pub mod time_of_day;
pub mod units;

// Re-exports for convenient access
pub use battle_map::BattleMap;
pub use field::Battlefield;
pub use hex::{BattleHexCoord, HexDirection};
pub use pathfinding::{Pathfinder, Reachable, TerrainPathfinder};
pub use teams::{Team, Teams};
pub use terrain::{BattleTerrain, MovementType};
pub use time_of_day::{Alignment, TimeOfDay};
pub use units::{Abilities, Combatant, StatusFlags, UnitArena};
