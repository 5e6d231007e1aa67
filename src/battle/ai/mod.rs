//! Enemy AI attack planning
//!
//! - `moves` builds who-can-reach-where maps from the pathfinder
//! - `power` estimates the damage a faction can bring onto a hex
//! - `search` explores attacker/hex combinations against one target
//! - `analysis` scores a combination
//! - `personality` holds the TOML-loaded weights and search bounds

pub mod analysis;
pub mod moves;
pub mod personality;
pub mod power;
pub mod search;

pub use analysis::{AttackAnalysis, REJECTED};
pub use moves::MoveMaps;
pub use personality::{load_personality, AiPersonality, BehaviorConfig, SearchConfig};
pub use power::power_projection;
pub use search::{
    analyze_targets, best_attack, choose_weapon, search_attacks, AttackContext, DefensivePosition,
};
