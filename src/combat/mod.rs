//! Combat resolution: the numbers behind an attack and the swing-by-swing
//! exchange that plays it out

pub mod events;
pub mod executor;
pub mod forecast;
pub mod probability;
pub mod simulation;
pub mod stats;
pub mod sync;
pub mod weapons;

pub use events::{
    CombatEvent, CombatEventLog, CombatEventType, CombatHooks, NoHooks, TemplateCatalog,
    UnitCatalog,
};
pub use executor::{
    resolve_attack, AppliedSwing, CombatEnv, Exchange, ExchangeEnd, ExchangeReport, Role,
};
pub use forecast::{forecast, Forecast};
pub use probability::{
    probability_at_least, probability_between, probability_kill_during_swing, swing_schedule,
    Striker,
};
pub use simulation::{run_trials, simulate_exchange, ExchangeSummary, SimulatedOutcome, Vitals};
pub use stats::{
    backstab_check, choose_defender_weapon, evaluate_battle_stats, round_damage, BattleStats,
    BattleStatsStrings, StrikeStats,
};
pub use sync::{Discrepancy, RandomSource, ScriptedRolls, SeededRolls, SwingResult};
pub use weapons::{DamageType, RangeClass, Resistances, Weapon, WeaponSpecial};
