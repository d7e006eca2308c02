//! Combatant stat snapshots and per-battle fighter state
//!
//! A `Combatant` is taken from the beast store when a battle starts. Only its
//! current health changes while the battle runs; training or level-ups that
//! land in the store mid-battle never reach an in-progress fight.

use serde::{Deserialize, Serialize};

use super::element::Element;
use super::round::Action;

/// Where a combatant came from, so rewards can be written back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeastRef {
    /// Owning player (chat-platform user id)
    pub owner: i64,
    /// Beast row id
    pub beast_id: i64,
}

/// One side's beast, reduced to a stat snapshot plus mutable health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub element: Element,
    pub level: u32,
    pub experience: u32,
    pub power: u32,
    pub magic: u32,
    max_health: u32,
    current_health: u32,
    /// None for wild beasts
    pub source: Option<BeastRef>,
}

impl Combatant {
    /// Create a combatant at full health
    pub fn new(
        name: impl Into<String>,
        element: Element,
        level: u32,
        power: u32,
        max_health: u32,
        magic: u32,
    ) -> Self {
        Self {
            name: name.into(),
            element,
            level: level.max(1),
            experience: 0,
            power,
            magic,
            max_health,
            current_health: max_health,
            source: None,
        }
    }

    /// Attach the store reference this snapshot was taken from
    pub fn with_source(mut self, source: BeastRef) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the experience carried into the battle
    pub fn with_experience(mut self, experience: u32) -> Self {
        self.experience = experience;
        self
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn current_health(&self) -> u32 {
        self.current_health
    }

    /// Check if the combatant has been knocked out
    pub fn is_defeated(&self) -> bool {
        self.current_health == 0
    }

    /// Subtract damage, flooring at zero. Returns the health left.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.current_health = self.current_health.saturating_sub(amount);
        self.current_health
    }

    /// Health as a whole percentage of max
    pub fn health_percent(&self) -> u32 {
        if self.max_health == 0 {
            return 0;
        }
        (self.current_health as u64 * 100 / self.max_health as u64) as u32
    }
}

/// A combatant plus the turn-scoped flags the resolver tracks for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub combatant: Combatant,
    /// Set by Defend, cleared by the next incoming hit or the owner's next turn
    pub defended: bool,
    /// Own turns left before Special can be used again
    pub special_cooldown: u32,
}

impl Fighter {
    pub fn new(combatant: Combatant) -> Self {
        Self {
            combatant,
            defended: false,
            special_cooldown: 0,
        }
    }

    /// Whether Special can be used this turn
    pub fn special_ready(&self) -> bool {
        self.special_cooldown == 0
    }

    /// Start of this fighter's turn: an unconsumed defend expires
    pub fn begin_turn(&mut self) {
        self.defended = false;
    }

    /// End of this fighter's turn
    pub fn end_turn(&mut self, action: Action, cooldown: u32) {
        match action {
            Action::Special => self.special_cooldown = cooldown,
            _ => self.special_cooldown = self.special_cooldown.saturating_sub(1),
        }
    }

    /// Consume the defend flag, returning whether it was set
    pub fn consume_defend(&mut self) -> bool {
        std::mem::take(&mut self.defended)
    }
}
