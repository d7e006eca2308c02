//! Game services over the SQLite store
//!
//! - Players, daily rewards and profiles
//! - Beast summoning, training and battle reward persistence
//! - Gambling (coinflip, slots, elemental wheel)
//! - Market buy/sell and inventory
//! - Guilds
//! - Per-user command cooldowns

mod beasts;
mod bestiary;
mod cooldown;
mod gambling;
mod guilds;
mod market;
mod players;
mod wallet;

pub use beasts::{Beast, BeastStore, TrainingResult};
pub use bestiary::{random_species, species, wild_opponent, NewBeast, Rarity};
pub use cooldown::{Command, CommandCooldowns, CooldownRule};
pub use gambling::{
    coinflip_payout, slots_payout, wheel_payout, CoinSide, CoinflipResult, GamblingService,
    SlotsResult, WheelResult, SLOT_SYMBOLS,
};
pub use guilds::{Guild, GuildInfo, GuildService, GUILD_CREATION_COST, MAX_GUILD_MEMBERS};
pub use market::{
    catalog, find_item, sell_price, GiveResult, InventoryItem, MarketItem, MarketService,
    PurchaseResult, SaleResult, MANA_PACK,
};
pub use players::{DailyReward, Player, PlayerService, Profile};
pub use wallet::{balance, credit, debit};

use crate::battle::BattleError;

/// Game errors
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("player {0} not found")]
    PlayerNotFound(i64),

    #[error("beast {0} not found")]
    BeastNotFound(i64),

    #[error("not enough eldergems: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("minimum bet is {0}")]
    BetTooSmall(i64),

    #[error("bet of {0} is too large")]
    BetTooLarge(i64),

    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    #[error("item '{0}' is not sold here")]
    ItemNotFound(String),

    #[error("inventory item {0} not found")]
    InventoryItemNotFound(i64),

    #[error("guild name must be 3-32 characters")]
    InvalidGuildName,

    #[error("already in a guild")]
    AlreadyInGuild,

    #[error("guild '{0}' already exists")]
    GuildExists(String),

    #[error("guild '{0}' not found")]
    GuildNotFound(String),

    #[error("guild '{0}' is full")]
    GuildFull(String),

    #[error("on cooldown, retry in {0:.1}s")]
    OnCooldown(f64),

    #[error("permission denied")]
    PermissionDenied,

    #[error("battle error: {0}")]
    Battle(#[from] BattleError),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
