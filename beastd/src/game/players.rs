//! Player lifecycle: creation with a starter beast, profiles and the daily
//! reward

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::beasts::{Beast, BeastStore};
use super::bestiary::{NewBeast, Rarity};
use super::market::InventoryItem;
use super::wallet;
use super::GameError;

/// Time between daily claims
pub const DAILY_COOLDOWN_HOURS: i64 = 24;
/// Chance of a bonus item with the daily reward
pub const DAILY_BONUS_CHANCE: f64 = 0.3;

/// A player record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: i64,
    pub eldergems: i64,
    pub mana_crystals: i64,
    pub guild_id: Option<i64>,
    pub rank: String,
    pub last_daily_claim: Option<DateTime<Utc>>,
}

/// Player overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub player: Player,
    pub beast_count: i64,
    pub strongest_beast: Option<Beast>,
    pub guild: Option<String>,
}

/// What a daily claim paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReward {
    pub eldergems: i64,
    pub mana_crystals: i64,
    pub bonus: Option<InventoryItem>,
}

/// Manages player records
pub struct PlayerService {
    pool: SqlitePool,
    beasts: BeastStore,
}

impl PlayerService {
    /// Create a new PlayerService
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            beasts: BeastStore::new(pool.clone()),
            pool,
        }
    }

    /// Get a player, creating it with a starter beast on first sight
    pub async fn get_or_create(&self, user_id: i64) -> Result<Player, GameError> {
        let mut tx = self.pool.begin().await?;
        let player = Self::get_or_create_with(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(player)
    }

    pub(crate) async fn get_or_create_with(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Player, GameError> {
        let created = sqlx::query("INSERT OR IGNORE INTO players (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected()
            > 0;

        if created {
            let starter = NewBeast::starter(&mut rand::rng());
            BeastStore::insert_with(conn, user_id, &starter).await?;
            info!(
                "Created player {} with starter {} {}",
                user_id, starter.element, starter.species
            );
        }

        Self::fetch(conn, user_id)
            .await?
            .ok_or(GameError::PlayerNotFound(user_id))
    }

    /// Get a player without creating it
    pub async fn get(&self, user_id: i64) -> Result<Option<Player>, GameError> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, user_id).await
    }

    async fn fetch(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<Player>, GameError> {
        let row: Option<PlayerRow> = sqlx::query_as(
            r#"
            SELECT user_id, eldergems, mana_crystals, guild_id, rank, last_daily_claim
            FROM players WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(PlayerRow::into_player).transpose()
    }

    /// Balances, beast count, strongest beast and guild
    pub async fn profile(&self, user_id: i64) -> Result<Profile, GameError> {
        let player = self.get_or_create(user_id).await?;
        let beast_count = self.beasts.count(user_id).await?;
        let strongest_beast = self.beasts.strongest(user_id).await?;

        let guild = match player.guild_id {
            Some(guild_id) => {
                let row: Option<(String,)> =
                    sqlx::query_as("SELECT guild_name FROM guilds WHERE guild_id = ?")
                        .bind(guild_id)
                        .fetch_optional(&self.pool)
                        .await?;
                row.map(|(name,)| name)
            }
            None => None,
        };

        Ok(Profile {
            player,
            beast_count,
            strongest_beast,
            guild,
        })
    }

    /// Claim the daily reward: 100-300 eldergems, 10-30 mana crystals and a
    /// 30% chance of a bonus item. One claim per 24 hours.
    pub async fn claim_daily(&self, user_id: i64, now: DateTime<Utc>) -> Result<DailyReward, GameError> {
        let (eldergems, mana_crystals, bonus) = {
            let mut rng = rand::rng();
            let eldergems = rng.random_range(100..=300i64);
            let mana = rng.random_range(10..=30i64);
            let bonus = rng.random_bool(DAILY_BONUS_CHANCE).then(|| {
                let prefix = if rng.random_bool(0.5) { "Ancient" } else { "Mystic" };
                let kind = if rng.random_bool(0.5) { "Scroll" } else { "Potion" };
                (format!("{} {}", prefix, kind), Rarity::roll(&mut rng))
            });
            (eldergems, mana, bonus)
        };

        let cutoff = timestamp(now - Duration::hours(DAILY_COOLDOWN_HOURS));
        let mut tx = self.pool.begin().await?;
        let player = Self::get_or_create_with(&mut tx, user_id).await?;

        let claimed = sqlx::query(
            r#"
            UPDATE players SET mana_crystals = mana_crystals + ?, last_daily_claim = ?
            WHERE user_id = ? AND (last_daily_claim IS NULL OR last_daily_claim <= ?)
            "#,
        )
        .bind(mana_crystals)
        .bind(timestamp(now))
        .bind(user_id)
        .bind(&cutoff)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !claimed {
            let next = player
                .last_daily_claim
                .map(|last| last + Duration::hours(DAILY_COOLDOWN_HOURS))
                .unwrap_or(now);
            let remaining = (next - now).num_milliseconds().max(0) as f64 / 1000.0;
            return Err(GameError::OnCooldown(remaining));
        }

        wallet::credit(&mut tx, user_id, eldergems, "daily reward").await?;

        let bonus = match bonus {
            Some((name, rarity)) => {
                let result = sqlx::query(
                    "INSERT INTO inventory (user_id, item_name, item_type, rarity) VALUES (?, ?, 'Consumable', ?)",
                )
                .bind(user_id)
                .bind(&name)
                .bind(rarity.as_str())
                .execute(&mut *tx)
                .await?;
                Some(InventoryItem {
                    inventory_id: result.last_insert_rowid(),
                    item_name: name,
                    item_type: "Consumable".to_string(),
                    rarity,
                    quantity: 1,
                })
            }
            None => None,
        };

        tx.commit().await?;
        info!("Player {} claimed daily: {} gems, {} mana", user_id, eldergems, mana_crystals);

        Ok(DailyReward {
            eldergems,
            mana_crystals,
            bonus,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct PlayerRow {
    user_id: i64,
    eldergems: i64,
    mana_crystals: i64,
    guild_id: Option<i64>,
    rank: String,
    last_daily_claim: Option<String>,
}

impl PlayerRow {
    fn into_player(self) -> Result<Player, GameError> {
        let last_daily_claim = match self.last_daily_claim {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|_| GameError::Corrupt(format!("player {} daily claim", self.user_id)))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(Player {
            user_id: self.user_id,
            eldergems: self.eldergems,
            mana_crystals: self.mana_crystals,
            guild_id: self.guild_id,
            rank: self.rank,
            last_daily_claim,
        })
    }
}
