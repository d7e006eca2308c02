//! Reward and level-up math
//!
//! Rewards scale linearly with the loser's level. A beast levels up when its
//! accumulated experience reaches `level * 100`; at most one level is gained
//! per reward event.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Experience granted for any win
pub const BASE_EXPERIENCE: u32 = 10;
/// Extra experience per level of the loser
pub const EXPERIENCE_PER_LEVEL: u32 = 2;
/// Primary currency granted for any win
pub const BASE_CURRENCY: i64 = 50;
/// Extra currency per level of the loser
pub const CURRENCY_PER_LEVEL: i64 = 5;
/// Consolation paid to a losing player
pub const BASE_CONSOLATION: i64 = 10;
/// Extra consolation per level of the winner
pub const CONSOLATION_PER_LEVEL: i64 = 2;
/// Experience needed per current level to advance
pub const LEVEL_THRESHOLD_PER_LEVEL: u32 = 100;

/// Stat increments rolled on level-up
pub const POWER_GAIN: RangeInclusive<u32> = 1..=3;
pub const HEALTH_GAIN: RangeInclusive<u32> = 5..=10;
pub const MAGIC_GAIN: RangeInclusive<u32> = 1..=3;

/// Tunable reward constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub base_experience: u32,
    pub experience_per_level: u32,
    pub base_currency: i64,
    pub currency_per_level: i64,
    pub base_consolation: i64,
    pub consolation_per_level: i64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            base_experience: BASE_EXPERIENCE,
            experience_per_level: EXPERIENCE_PER_LEVEL,
            base_currency: BASE_CURRENCY,
            currency_per_level: CURRENCY_PER_LEVEL,
            base_consolation: BASE_CONSOLATION,
            consolation_per_level: CONSOLATION_PER_LEVEL,
        }
    }
}

/// Rewards for winning a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: u32,
    pub currency: i64,
}

impl RewardTable {
    /// Rewards for beating a beast of `loser_level`
    pub fn compute_rewards(&self, loser_level: u32) -> Rewards {
        Rewards {
            experience: self
                .base_experience
                .saturating_add(loser_level.saturating_mul(self.experience_per_level)),
            currency: self.base_currency + loser_level as i64 * self.currency_per_level,
        }
    }

    /// Consolation for losing to a beast of `winner_level`
    pub fn consolation(&self, winner_level: u32) -> i64 {
        self.base_consolation + winner_level as i64 * self.consolation_per_level
    }
}

/// Experience at which a beast of `level` advances
pub fn level_threshold(level: u32) -> u32 {
    level.saturating_mul(LEVEL_THRESHOLD_PER_LEVEL)
}

/// Whether `experience_after_gain` is enough to leave `level`
pub fn check_level_up(level: u32, experience_after_gain: u32) -> bool {
    experience_after_gain >= level_threshold(level)
}

/// Stat increments from a level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGains {
    pub power: u32,
    pub health: u32,
    pub magic: u32,
}

/// A single level advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub gains: StatGains,
}

/// Roll a level-up if the threshold is met
pub fn roll_level_up<R: Rng + ?Sized>(
    level: u32,
    experience_after_gain: u32,
    rng: &mut R,
) -> Option<LevelUp> {
    if !check_level_up(level, experience_after_gain) {
        return None;
    }

    Some(LevelUp {
        old_level: level,
        new_level: level + 1,
        gains: roll_stat_gains(rng),
    })
}

/// Roll the stat increments for one level
pub fn roll_stat_gains<R: Rng + ?Sized>(rng: &mut R) -> StatGains {
    StatGains {
        power: rng.random_range(POWER_GAIN),
        health: rng.random_range(HEALTH_GAIN),
        magic: rng.random_range(MAGIC_GAIN),
    }
}

/// Experience still missing for the next level
pub fn experience_to_next(level: u32, experience: u32) -> u32 {
    level_threshold(level).saturating_sub(experience)
}
