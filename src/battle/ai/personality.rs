//! AI personality configuration loaded from TOML
//!
//! A personality sets how eagerly the attack search trades units for kills
//! and how much work it is allowed to do.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, TacticaError};

/// Behavioral tendencies (0.0 to 1.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Willingness to accept losses for a kill (0.0 = defensive, 1.0 = reckless)
    pub aggression: f64,
    /// Aggression ceiling when the plan commits our own leader; also scales
    /// the exposure penalty
    pub caution: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            aggression: 0.4,
            caution: 0.25,
        }
    }
}

/// Bounds on the attack search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Most attackers committed against one target
    pub attack_depth: usize,
    /// Monte Carlo exchanges per plan refresh
    pub simulation_trials: u32,
    /// Plans kept per target; the worst are dropped past this
    pub max_results: usize,
    /// Seed for the simulation RNG
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            attack_depth: 5,
            simulation_trials: 50,
            max_results: 1000,
            seed: 42,
        }
    }
}

/// Complete AI personality configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPersonality {
    /// Name of this personality (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            behavior: BehaviorConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AiPersonality {
    pub fn validate(&self) -> std::result::Result<(), String> {
        let b = &self.behavior;
        if !(0.0..=1.0).contains(&b.aggression) {
            return Err(format!("aggression must be in [0, 1], got {}", b.aggression));
        }
        if !(0.0..=1.0).contains(&b.caution) {
            return Err(format!("caution must be in [0, 1], got {}", b.caution));
        }
        if self.search.attack_depth == 0 {
            return Err("attack_depth must be at least 1".into());
        }
        if self.search.max_results == 0 {
            return Err("max_results must be at least 1".into());
        }
        Ok(())
    }
}

/// Load personality from TOML file
///
/// Loads from `data/ai_personalities/{name}.toml`
pub fn load_personality(name: &str) -> Result<AiPersonality> {
    let path = personality_path(name);
    let contents = fs::read_to_string(&path)?;

    let mut personality: AiPersonality = toml::from_str(&contents)?;
    personality.name = name.to_string();
    personality
        .validate()
        .map_err(|e| TacticaError::Config(format!("{:?}: {}", path, e)))?;
    Ok(personality)
}

/// Get path to personality file
fn personality_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai_personalities").join(format!("{}.toml", name))
}
