//! Per-user command cooldowns
//!
//! Each (user, command) pair keeps a sliding window of recent uses. A command
//! allows `rate` uses per `per` window; rejected calls report how long until
//! the oldest use leaves the window.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::GameError;

/// Commands subject to a cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Profile,
    Beasts,
    Beast,
    Summon,
    Train,
    Battle,
    Coinflip,
    Slots,
    Wheel,
    Buy,
    Sell,
    CreateGuild,
    JoinGuild,
}

/// `rate` uses per `per`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRule {
    pub rate: usize,
    pub per: Duration,
}

impl CooldownRule {
    const fn new(rate: usize, secs: u64) -> Self {
        Self {
            rate,
            per: Duration::from_secs(secs),
        }
    }
}

impl Command {
    pub fn rule(&self) -> CooldownRule {
        match self {
            Command::Profile | Command::Beasts | Command::Beast => CooldownRule::new(2, 10),
            Command::Summon | Command::Train | Command::Battle => CooldownRule::new(1, 30),
            Command::Coinflip => CooldownRule::new(1, 5),
            Command::Slots => CooldownRule::new(1, 10),
            Command::Wheel => CooldownRule::new(1, 15),
            Command::Buy => CooldownRule::new(1, 5),
            Command::Sell => CooldownRule::new(1, 10),
            Command::CreateGuild => CooldownRule::new(1, 30),
            Command::JoinGuild => CooldownRule::new(1, 10),
        }
    }
}

/// Sliding-window limiter keyed by user and command
#[derive(Debug)]
pub struct CommandCooldowns {
    uses: Mutex<HashMap<(i64, Command), VecDeque<Instant>>>,
    enabled: bool,
}

impl CommandCooldowns {
    /// Create a new limiter
    pub fn new() -> Self {
        Self {
            uses: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    /// A limiter that allows everything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Record a use of `command` by `user`, or fail with the seconds to wait
    pub fn check(&self, user: i64, command: Command) -> Result<(), GameError> {
        self.check_at(user, command, Instant::now())
    }

    pub fn check_at(&self, user: i64, command: Command, now: Instant) -> Result<(), GameError> {
        if !self.enabled {
            return Ok(());
        }

        let rule = command.rule();
        let mut uses = self.uses.lock();
        // Keys whose newest use has left the window hold nothing
        uses.retain(|(_, tracked), window| {
            window
                .back()
                .is_some_and(|last| now.saturating_duration_since(*last) < tracked.rule().per)
        });
        let window = uses.entry((user, command)).or_default();

        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= rule.per {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= rule.rate {
            let waited = window
                .front()
                .map(|oldest| now.saturating_duration_since(*oldest))
                .unwrap_or_default();
            return Err(GameError::OnCooldown(
                rule.per.saturating_sub(waited).as_secs_f64(),
            ));
        }

        window.push_back(now);
        Ok(())
    }
}

impl Default for CommandCooldowns {
    fn default() -> Self {
        Self::new()
    }
}
