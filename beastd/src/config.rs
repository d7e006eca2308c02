//! Server configuration
//!
//! Layered with figment, later layers win:
//! - built-in defaults
//! - an optional TOML file
//! - `BEASTD_` environment variables (`__` separates nested keys, e.g.
//!   `BEASTD_BATTLE__ACTION_TIMEOUT_MS`)
//!
//! Command-line flags are applied on top by the binary.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::battle::{BattleRules, RewardTable, SessionSettings, DEFAULT_CRIT_CHANCE};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Battle pacing and tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// How long an interactive battle waits for the next action
    pub action_timeout_ms: u64,
    /// Pause before each AI turn in interactive battles
    pub turn_delay_ms: u64,
    /// Critical-hit chance in unattended battles
    pub crit_chance: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: 60_000,
            turn_delay_ms: 500,
            crit_chance: DEFAULT_CRIT_CHANCE,
        }
    }
}

impl BattleConfig {
    /// Pacing for interactive sessions
    pub fn session(&self) -> SessionSettings {
        SessionSettings {
            action_timeout: Duration::from_millis(self.action_timeout_ms),
            turn_delay: Duration::from_millis(self.turn_delay_ms),
        }
    }

    /// Rules for unattended battles
    pub fn unattended_rules(&self) -> BattleRules {
        BattleRules {
            crit_chance: self.crit_chance,
            ..BattleRules::unattended()
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// None = in-memory
    pub db_path: Option<String>,
    /// Accounts allowed to use admin commands, in addition to those
    /// registered in the database
    pub owner_ids: Vec<i64>,
    pub log_format: LogFormat,
    /// Per-user command cooldowns
    pub cooldowns: bool,
    pub battle: BattleConfig,
    pub rewards: RewardTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: None,
            owner_ids: Vec::new(),
            log_format: LogFormat::Text,
            cooldowns: true,
            battle: BattleConfig::default(),
            rewards: RewardTable::default(),
        }
    }
}

impl Config {
    /// Build the figment for defaults, an optional TOML file and the
    /// environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("BEASTD_").split("__"))
    }

    /// Load configuration. A named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
        }
        Ok(Self::figment(path).extract()?)
    }
}
