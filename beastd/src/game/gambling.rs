//! Eldergem games of chance
//!
//! Payout tables are pure functions; the service rolls, debits the bet and
//! credits the payout in one transaction. A payout that does not fit in an
//! `i64` is refused after the bet is known to be affordable.

use std::str::FromStr;
use std::sync::LazyLock;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use super::players::PlayerService;
use super::wallet;
use super::GameError;
use crate::battle::Element;

pub const COINFLIP_MIN_BET: i64 = 10;
pub const SLOTS_MIN_BET: i64 = 20;
pub const WHEEL_MIN_BET: i64 = 50;

/// Slot reel symbols; three of the first one is the top prize
pub const SLOT_SYMBOLS: [&str; 6] = ["💎", "🔥", "💧", "🌿", "✨", "🌑"];

/// A coin face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl FromStr for CoinSide {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heads" => Ok(CoinSide::Heads),
            "tails" => Ok(CoinSide::Tails),
            _ => Err(()),
        }
    }
}

/// 1.9x the bet on a correct call, rounded down. None on overflow.
pub fn coinflip_payout(bet: i64, choice: CoinSide, result: CoinSide) -> Option<i64> {
    if choice == result {
        bet.checked_mul(19).map(|p| p / 10)
    } else {
        Some(0)
    }
}

/// Three 💎 pay 10x, any other triple 5x, any pair 2x
pub fn slots_payout(bet: i64, reels: [&str; 3]) -> Option<i64> {
    let [a, b, c] = reels;
    let multiplier = if a == b && b == c {
        if a == SLOT_SYMBOLS[0] {
            10
        } else {
            5
        }
    } else if a == b || b == c || a == c {
        2
    } else {
        0
    };
    bet.checked_mul(multiplier)
}

/// 5x the bet when the wheel lands on the chosen element
pub fn wheel_payout(bet: i64, choice: Element, landed: Element) -> Option<i64> {
    if choice == landed {
        bet.checked_mul(5)
    } else {
        Some(0)
    }
}

/// Wheel weight in percent: Dark and Light are the rare slices
pub fn wheel_weight(element: Element) -> u32 {
    match element {
        Element::Dark | Element::Light => 14,
        _ => 18,
    }
}

static WHEEL: LazyLock<WeightedIndex<u32>> = LazyLock::new(|| {
    WeightedIndex::new(Element::all().iter().map(|e| wheel_weight(*e)))
        .expect("wheel weights are positive")
});

/// Spin the weighted elemental wheel
pub fn spin_wheel<R: Rng + ?Sized>(rng: &mut R) -> Element {
    Element::all()[WHEEL.sample(rng)]
}

fn spin_reel<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SLOT_SYMBOLS.choose(rng).copied().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinflipResult {
    pub bet: i64,
    pub choice: CoinSide,
    pub result: CoinSide,
    pub payout: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsResult {
    pub bet: i64,
    pub reels: [String; 3],
    pub payout: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelResult {
    pub bet: i64,
    pub choice: Element,
    pub landed: Element,
    pub payout: i64,
    pub balance: i64,
}

/// Runs the games against player balances
pub struct GamblingService {
    pool: SqlitePool,
}

impl GamblingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Take the bet and pay out, atomically. Returns the payout and the
    /// final balance.
    async fn settle(
        &self,
        user_id: i64,
        bet: i64,
        payout: Option<i64>,
        game: &str,
    ) -> Result<(i64, i64), GameError> {
        let mut tx = self.pool.begin().await?;
        PlayerService::get_or_create_with(&mut tx, user_id).await?;
        let mut balance = wallet::debit(&mut tx, user_id, bet, game).await?;
        let payout = payout.ok_or(GameError::BetTooLarge(bet))?;
        if payout > 0 {
            balance = wallet::credit(&mut tx, user_id, payout, game).await?;
        }
        tx.commit().await?;

        debug!("{} for {}: bet {}, payout {}", game, user_id, bet, payout);
        Ok((payout, balance))
    }

    pub async fn coinflip(&self, user_id: i64, bet: i64, choice: &str) -> Result<CoinflipResult, GameError> {
        let choice: CoinSide = choice
            .parse()
            .map_err(|_| GameError::InvalidChoice(choice.to_string()))?;
        if bet < COINFLIP_MIN_BET {
            return Err(GameError::BetTooSmall(COINFLIP_MIN_BET));
        }

        let result = if rand::rng().random_bool(0.5) {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        };
        let (payout, balance) = self
            .settle(user_id, bet, coinflip_payout(bet, choice, result), "coinflip")
            .await?;

        Ok(CoinflipResult {
            bet,
            choice,
            result,
            payout,
            balance,
        })
    }

    pub async fn slots(&self, user_id: i64, bet: i64) -> Result<SlotsResult, GameError> {
        if bet < SLOTS_MIN_BET {
            return Err(GameError::BetTooSmall(SLOTS_MIN_BET));
        }

        let reels = {
            let mut rng = rand::rng();
            [spin_reel(&mut rng), spin_reel(&mut rng), spin_reel(&mut rng)]
        };
        let (payout, balance) = self
            .settle(user_id, bet, slots_payout(bet, reels), "slots")
            .await?;

        Ok(SlotsResult {
            bet,
            reels: reels.map(str::to_string),
            payout,
            balance,
        })
    }

    pub async fn wheel(&self, user_id: i64, bet: i64, choice: &str) -> Result<WheelResult, GameError> {
        let choice: Element = choice
            .parse()
            .map_err(|_| GameError::InvalidChoice(choice.to_string()))?;
        if bet < WHEEL_MIN_BET {
            return Err(GameError::BetTooSmall(WHEEL_MIN_BET));
        }

        let landed = spin_wheel(&mut rand::rng());
        let (payout, balance) = self
            .settle(user_id, bet, wheel_payout(bet, choice, landed), "wheel")
            .await?;

        Ok(WheelResult {
            bet,
            choice,
            landed,
            payout,
            balance,
        })
    }
}
