//! Random rolls and the per-swing synchronization record
//!
//! The authoritative peer rolls locally and publishes the `SwingResult` of
//! every swing; followers pass those records back into the executor, which
//! compares them against its own outcome before applying anything.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of per-swing rolls in `0..100`
pub trait RandomSource {
    fn roll(&mut self) -> u32;
}

/// Seeded generator for deterministic runs
#[derive(Debug, Clone)]
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRolls {
    fn roll(&mut self) -> u32 {
        self.rng.gen_range(0..100)
    }
}

/// Replays a fixed list of rolls, then repeats the last one
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    rolls: Vec<u32>,
    next: usize,
}

impl ScriptedRolls {
    pub fn new(rolls: Vec<u32>) -> Self {
        Self { rolls, next: 0 }
    }
}

impl RandomSource for ScriptedRolls {
    fn roll(&mut self) -> u32 {
        let value = self
            .rolls
            .get(self.next)
            .or_else(|| self.rolls.last())
            .copied()
            .unwrap_or(0);
        self.next += 1;
        value.min(99)
    }
}

/// Outcome of one swing, as applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwingResult {
    pub hit: bool,
    pub damage: u32,
    /// Chance to hit (percent) the swing was rolled against
    pub chance: u32,
    pub dies: bool,
}

/// A field that disagreed between the local and the supplied outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discrepancy {
    Hit { local: bool, expected: bool },
    Damage { local: u32, expected: u32 },
    Chance { local: u32, expected: u32 },
    Dies { local: bool, expected: bool },
}

impl SwingResult {
    /// Fields where `self` (local) disagrees with `expected`
    pub fn discrepancies(&self, expected: &SwingResult) -> Vec<Discrepancy> {
        let mut found = Vec::new();
        if self.hit != expected.hit {
            found.push(Discrepancy::Hit {
                local: self.hit,
                expected: expected.hit,
            });
        }
        if self.damage != expected.damage {
            found.push(Discrepancy::Damage {
                local: self.damage,
                expected: expected.damage,
            });
        }
        if self.chance != expected.chance {
            found.push(Discrepancy::Chance {
                local: self.chance,
                expected: expected.chance,
            });
        }
        if self.dies != expected.dies {
            found.push(Discrepancy::Dies {
                local: self.dies,
                expected: expected.dies,
            });
        }
        found
    }
}
