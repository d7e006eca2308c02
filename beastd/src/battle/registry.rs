//! Active battle tracking
//!
//! A player takes part in at most one battle at a time. The registry maps each
//! busy player to the id of the battle they are in.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BattleError;

/// Players currently locked into a battle
#[derive(Debug, Default)]
pub struct BattleRegistry {
    active: RwLock<HashMap<i64, Uuid>>,
}

impl BattleRegistry {
    /// Create a new registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Lock every player in `players` into `battle_id`. Either all of them are
    /// registered or none are.
    pub async fn try_register(&self, battle_id: Uuid, players: &[i64]) -> Result<(), BattleError> {
        let mut active = self.active.write().await;

        if let Some(busy) = players.iter().find(|p| active.contains_key(p)) {
            return Err(BattleError::AlreadyInBattle(*busy));
        }
        for player in players {
            active.insert(*player, battle_id);
        }
        Ok(())
    }

    /// Release every player held by `battle_id`
    pub async fn release(&self, battle_id: Uuid) {
        let mut active = self.active.write().await;
        active.retain(|_, id| *id != battle_id);
    }

    /// Check if a player is in a battle
    pub async fn is_battling(&self, player: i64) -> bool {
        self.active.read().await.contains_key(&player)
    }
}
