//! Battle system module
//!
//! Turn-based beast battles:
//! - Elemental effectiveness table
//! - Round resolution (attack, special, defend)
//! - Opponent decision policy
//! - Battle orchestration and outcomes
//! - Reward and level-up math
//! - Async sessions with an input channel and a snapshot feed

mod combatant;
mod element;
mod engine;
mod policy;
mod registry;
mod rewards;
mod roll;
mod round;
mod session;

pub use combatant::{BeastRef, Combatant, Fighter};
pub use element::{effectiveness_of, Effectiveness, Element};
pub use engine::{
    Battle, BattleMode, BattleOutcome, BattleResult, BattleSnapshot, BattleState, FighterView,
};
pub use policy::{max_attack_damage, OpponentPolicy};
pub use registry::BattleRegistry;
pub use rewards::{
    check_level_up, experience_to_next, level_threshold, roll_level_up, roll_stat_gains, LevelUp,
    RewardTable, Rewards, StatGains,
};
pub use round::{resolve_round, Action, BattleRules, RoundResult, Side, DEFAULT_CRIT_CHANCE};
pub use session::{spawn_unattended, spawn_versus_ai, BattleHandle, SessionSettings};

/// Battle errors
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("action is not valid for the current turn")]
    StaleAction,

    /// `beast_id` is None when the player has no beast at all
    #[error("{}", missing_combatant(.owner, .beast_id))]
    CombatantNotFound { owner: i64, beast_id: Option<i64> },

    #[error("special is on cooldown for {0} more turns")]
    SpecialOnCooldown(u32),

    #[error("battle is not finished")]
    NotFinished,

    #[error("player {0} is already in a battle")]
    AlreadyInBattle(i64),
}

fn missing_combatant(owner: &i64, beast_id: &Option<i64>) -> String {
    match beast_id {
        Some(beast_id) => format!("beast {} of player {} not found", beast_id, owner),
        None => format!("player {} has no beast to battle with", owner),
    }
}
