//! Single round resolution
//!
//! One actor performs one action against one target:
//! - Attack: power scaled by element effectiveness and variance
//! - Special: magic scaled by variance, then a cooldown
//! - Defend: halves the next incoming hit

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::combatant::Fighter;
use super::element::effectiveness_of;
use super::roll::{critical, roll_chance, scaled_roll, ATTACK_VARIANCE, SPECIAL_VARIANCE};
use super::BattleError;

/// Own turns Special stays unusable after it is used
pub const SPECIAL_COOLDOWN_TURNS: u32 = 3;

/// Critical-hit chance used by unattended battles
pub const DEFAULT_CRIT_CHANCE: f64 = 0.1;

/// Lower bound on the damage of any landed hit
pub const MIN_DAMAGE: u32 = 1;

/// A battle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Attack,
    Special,
    Defend,
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "attack" | "a" => Ok(Action::Attack),
            "special" | "s" => Ok(Action::Special),
            "defend" | "d" => Ok(Action::Defend),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Attack => "attack",
            Action::Special => "special",
            Action::Defend => "defend",
        };
        write!(f, "{}", s)
    }
}

/// Which side of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The player who started the battle
    Challenger,
    /// The wild beast or the challenged player's beast
    Opponent,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Challenger => Side::Opponent,
            Side::Opponent => Side::Challenger,
        }
    }
}

/// Tunables for round resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleRules {
    /// Chance of a critical Attack (0 disables crits)
    pub crit_chance: f64,
    /// Cooldown applied after Special
    pub special_cooldown: u32,
}

impl BattleRules {
    /// Interactive battles roll no crits
    pub fn interactive() -> Self {
        Self {
            crit_chance: 0.0,
            special_cooldown: SPECIAL_COOLDOWN_TURNS,
        }
    }

    /// Unattended battles roll crits
    pub fn unattended() -> Self {
        Self {
            crit_chance: DEFAULT_CRIT_CHANCE,
            special_cooldown: SPECIAL_COOLDOWN_TURNS,
        }
    }
}

impl Default for BattleRules {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Log entry for one resolved round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub actor: Side,
    pub actor_name: String,
    pub action: Action,
    /// Damage before health was floored at zero
    pub damage_dealt: u32,
    pub was_critical: bool,
    /// Halved by the target's defend
    pub was_reduced: bool,
    /// Target health after the round
    pub target_health: u32,
}

impl std::fmt::Display for RoundResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.action {
            Action::Defend => write!(f, "{} defends", self.actor_name),
            Action::Attack | Action::Special => {
                let verb = if self.action == Action::Attack {
                    "attacks"
                } else {
                    "uses special"
                };
                write!(f, "{} {} for {} damage", self.actor_name, verb, self.damage_dealt)?;
                if self.was_critical {
                    write!(f, " (critical)")?;
                }
                if self.was_reduced {
                    write!(f, " (reduced)")?;
                }
                Ok(())
            }
        }
    }
}

/// Resolve one action of `actor` against `target`.
///
/// Rejects Special while it is on cooldown without touching either fighter.
pub fn resolve_round<R: Rng + ?Sized>(
    side: Side,
    actor: &mut Fighter,
    target: &mut Fighter,
    action: Action,
    rules: &BattleRules,
    rng: &mut R,
) -> Result<RoundResult, BattleError> {
    if action == Action::Special && !actor.special_ready() {
        return Err(BattleError::SpecialOnCooldown(actor.special_cooldown));
    }

    actor.begin_turn();

    let (damage, was_critical, was_reduced) = match action {
        Action::Attack => {
            let multiplier = effectiveness_of(actor.combatant.element, target.combatant.element);
            let base = scaled_roll(
                actor.combatant.power as f64 * multiplier,
                ATTACK_VARIANCE,
                rng,
            );
            let (damage, reduced) = land_hit(base, target);
            if roll_chance(rules.crit_chance, rng) {
                (critical(damage), true, reduced)
            } else {
                (damage, false, reduced)
            }
        }
        Action::Special => {
            let base = scaled_roll(actor.combatant.magic as f64, SPECIAL_VARIANCE, rng);
            let (damage, reduced) = land_hit(base, target);
            (damage, false, reduced)
        }
        Action::Defend => {
            actor.defended = true;
            (0, false, false)
        }
    };

    let target_health = target.combatant.take_damage(damage);
    actor.end_turn(action, rules.special_cooldown);

    Ok(RoundResult {
        actor: side,
        actor_name: actor.combatant.name.clone(),
        action,
        damage_dealt: damage,
        was_critical,
        was_reduced,
        target_health,
    })
}

/// Apply the target's defend to a base roll
fn land_hit(base: u32, target: &mut Fighter) -> (u32, bool) {
    let damage = base.max(MIN_DAMAGE);
    if target.consume_defend() {
        ((damage / 2).max(MIN_DAMAGE), true)
    } else {
        (damage, false)
    }
}
