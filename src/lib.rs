//! Tactica - combat resolution and attack planning for hex wargames

pub mod battle;
pub mod combat;
pub mod core;
pub mod scenario;
