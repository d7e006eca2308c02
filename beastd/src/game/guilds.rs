//! Guild creation and membership

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::players::PlayerService;
use super::wallet;
use super::GameError;

/// Eldergems needed to found a guild
pub const GUILD_CREATION_COST: i64 = 1000;
/// Member cap per guild
pub const MAX_GUILD_MEMBERS: i64 = 10;

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 32;

/// A guild record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guild {
    pub guild_id: i64,
    pub guild_name: String,
    pub leader_id: i64,
    pub members_count: i64,
    pub guild_level: i64,
    pub guild_power: i64,
}

/// A guild with its member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    #[serde(flatten)]
    pub guild: Guild,
    pub members: Vec<i64>,
}

/// Guild operations
pub struct GuildService {
    pool: SqlitePool,
}

impl GuildService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Found a guild and make `user_id` its leader and first member
    pub async fn create(&self, user_id: i64, name: &str) -> Result<Guild, GameError> {
        let name = name.trim();
        let len = name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
            return Err(GameError::InvalidGuildName);
        }

        let mut tx = self.pool.begin().await?;
        let player = PlayerService::get_or_create_with(&mut tx, user_id).await?;
        if player.guild_id.is_some() {
            return Err(GameError::AlreadyInGuild);
        }
        if fetch(&mut tx, name).await?.is_some() {
            return Err(GameError::GuildExists(name.to_string()));
        }

        wallet::debit(&mut tx, user_id, GUILD_CREATION_COST, "guild creation").await?;

        let inserted = sqlx::query("INSERT INTO guilds (guild_name, leader_id) VALUES (?, ?)")
            .bind(name)
            .bind(user_id)
            .execute(&mut *tx)
            .await;
        let guild_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(GameError::GuildExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("UPDATE players SET guild_id = ? WHERE user_id = ?")
            .bind(guild_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let guild = fetch(&mut tx, name)
            .await?
            .ok_or_else(|| GameError::GuildNotFound(name.to_string()))?;
        tx.commit().await?;

        info!("Player {} founded guild '{}'", user_id, name);
        Ok(guild)
    }

    /// Join an existing guild
    pub async fn join(&self, user_id: i64, name: &str) -> Result<Guild, GameError> {
        let name = name.trim();

        let mut tx = self.pool.begin().await?;
        let player = PlayerService::get_or_create_with(&mut tx, user_id).await?;
        if player.guild_id.is_some() {
            return Err(GameError::AlreadyInGuild);
        }

        let guild = fetch(&mut tx, name)
            .await?
            .ok_or_else(|| GameError::GuildNotFound(name.to_string()))?;

        let joined = sqlx::query(
            "UPDATE guilds SET members_count = members_count + 1 WHERE guild_id = ? AND members_count < ?",
        )
        .bind(guild.guild_id)
        .bind(MAX_GUILD_MEMBERS)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if joined == 0 {
            return Err(GameError::GuildFull(guild.guild_name));
        }

        sqlx::query("UPDATE players SET guild_id = ? WHERE user_id = ?")
            .bind(guild.guild_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let guild = fetch(&mut tx, name)
            .await?
            .ok_or_else(|| GameError::GuildNotFound(name.to_string()))?;
        tx.commit().await?;

        info!("Player {} joined guild '{}'", user_id, guild.guild_name);
        Ok(guild)
    }

    /// Guild details and member ids
    pub async fn info(&self, name: &str) -> Result<GuildInfo, GameError> {
        let mut conn = self.pool.acquire().await?;
        let guild = fetch(&mut conn, name.trim())
            .await?
            .ok_or_else(|| GameError::GuildNotFound(name.trim().to_string()))?;

        let members: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM players WHERE guild_id = ? ORDER BY user_id")
                .bind(guild.guild_id)
                .fetch_all(&mut *conn)
                .await?;

        Ok(GuildInfo {
            guild,
            members: members.into_iter().map(|(id,)| id).collect(),
        })
    }
}

async fn fetch(conn: &mut SqliteConnection, name: &str) -> Result<Option<Guild>, GameError> {
    let guild: Option<Guild> = sqlx::query_as(
        r#"
        SELECT guild_id, guild_name, leader_id, members_count, guild_level, guild_power
        FROM guilds WHERE guild_name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(guild)
}
