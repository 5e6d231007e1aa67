pub mod config;
pub mod error;
pub mod types;

pub use config::CombatRules;
pub use error::{Result, TacticaError};
pub use types::{Side, UnitId};
