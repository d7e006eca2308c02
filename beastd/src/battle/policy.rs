//! Opponent decision policy
//!
//! Rules are evaluated top to bottom and the first match wins:
//! 1. Finish the foe with an Attack when one could be lethal (70%)
//! 2. Use Special when it is ready (40%)
//! 3. Defend

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::combatant::Fighter;
use super::element::effectiveness_of;
use super::roll::{roll_chance, truncate, ATTACK_VARIANCE};
use super::round::Action;

/// Weighted priority policy for computer-controlled beasts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpponentPolicy {
    /// Chance to attack when an attack could finish the foe
    pub finish_chance: f64,
    /// Chance to use Special when it is off cooldown
    pub special_chance: f64,
}

impl Default for OpponentPolicy {
    fn default() -> Self {
        Self {
            finish_chance: 0.7,
            special_chance: 0.4,
        }
    }
}

impl OpponentPolicy {
    /// Pick the next action for `me` against `foe`
    pub fn decide<R: Rng + ?Sized>(&self, me: &Fighter, foe: &Fighter, rng: &mut R) -> Action {
        if foe.combatant.current_health() <= max_attack_damage(me, foe)
            && roll_chance(self.finish_chance, rng)
        {
            return Action::Attack;
        }

        if me.special_ready() && roll_chance(self.special_chance, rng) {
            return Action::Special;
        }

        Action::Defend
    }
}

/// Highest damage an Attack from `me` could deal to `foe` this turn
pub fn max_attack_damage(me: &Fighter, foe: &Fighter) -> u32 {
    let multiplier = effectiveness_of(me.combatant.element, foe.combatant.element);
    truncate(me.combatant.power as f64 * multiplier * ATTACK_VARIANCE.end())
}
