//! Scenario tests for Beast Arena
//!
//! - Economy: daily rewards, summoning, training, gambling, market
//! - Battles: interactive wild battles over WebSocket and unattended PvP
//! - Guilds: creation, membership and limits

pub mod battles;
pub mod economy;
pub mod guilds;
