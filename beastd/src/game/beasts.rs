//! Beast persistence, summoning, training and battle rewards

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::bestiary::{NewBeast, Rarity};
use super::wallet;
use super::GameError;
use crate::battle::{
    check_level_up, experience_to_next, roll_stat_gains, BattleError, BattleOutcome,
    BattleResult, BeastRef, Combatant, Element, LevelUp, StatGains,
};

/// Eldergems per summon
pub const SUMMON_COST: i64 = 300;
/// Training cost per beast level
pub const TRAINING_COST_PER_LEVEL: i64 = 20;

const BEAST_COLUMNS: &str =
    "beast_id, user_id, beast_name, beast_type, element, rarity, level, experience, power, health, magic";

/// A stored beast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beast {
    pub beast_id: i64,
    pub owner: i64,
    pub name: String,
    pub species: String,
    pub element: Element,
    pub rarity: Rarity,
    pub level: u32,
    pub experience: u32,
    pub power: u32,
    pub health: u32,
    pub magic: u32,
}

impl Beast {
    /// Battle snapshot of this beast
    pub fn combatant(&self) -> Combatant {
        Combatant::new(
            self.name.clone(),
            self.element,
            self.level,
            self.power,
            self.health,
            self.magic,
        )
        .with_experience(self.experience)
        .with_source(BeastRef {
            owner: self.owner,
            beast_id: self.beast_id,
        })
    }

    /// Sum of all stats, used to rank beasts
    pub fn total_stats(&self) -> u32 {
        self.power + self.health + self.magic
    }
}

/// Result of one training session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub beast: Beast,
    pub cost: i64,
    pub experience_gained: u32,
    pub level_up: Option<LevelUp>,
    pub experience_to_next: u32,
}

/// Beast storage with database backing
pub struct BeastStore {
    pool: SqlitePool,
}

impl BeastStore {
    /// Create a new beast store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a beast for `owner` on an existing connection
    pub(crate) async fn insert_with(
        conn: &mut SqliteConnection,
        owner: i64,
        beast: &NewBeast,
    ) -> Result<i64, GameError> {
        let result = sqlx::query(
            r#"
            INSERT INTO beasts (user_id, beast_name, beast_type, element, rarity, power, health, magic)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(owner)
        .bind(&beast.name)
        .bind(&beast.species)
        .bind(beast.element.as_str())
        .bind(beast.rarity.as_str())
        .bind(beast.power as i64)
        .bind(beast.health as i64)
        .bind(beast.magic as i64)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a beast for `owner`
    pub async fn insert(&self, owner: i64, beast: &NewBeast) -> Result<Beast, GameError> {
        let mut conn = self.pool.acquire().await?;
        let beast_id = Self::insert_with(&mut conn, owner, beast).await?;
        Self::get_with(&mut conn, owner, beast_id)
            .await?
            .ok_or(GameError::BeastNotFound(beast_id))
    }

    /// Get a beast owned by `owner`
    pub async fn get(&self, owner: i64, beast_id: i64) -> Result<Option<Beast>, GameError> {
        let mut conn = self.pool.acquire().await?;
        Self::get_with(&mut conn, owner, beast_id).await
    }

    async fn get_with(
        conn: &mut SqliteConnection,
        owner: i64,
        beast_id: i64,
    ) -> Result<Option<Beast>, GameError> {
        let sql = format!(
            "SELECT {} FROM beasts WHERE beast_id = ? AND user_id = ?",
            BEAST_COLUMNS
        );
        let row: Option<BeastRow> = sqlx::query_as(&sql)
            .bind(beast_id)
            .bind(owner)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(BeastRow::into_beast).transpose()
    }

    /// All beasts of `owner`, highest level first
    pub async fn list(&self, owner: i64) -> Result<Vec<Beast>, GameError> {
        let sql = format!(
            "SELECT {} FROM beasts WHERE user_id = ? ORDER BY level DESC, beast_id",
            BEAST_COLUMNS
        );
        let rows: Vec<BeastRow> = sqlx::query_as(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BeastRow::into_beast).collect()
    }

    pub async fn count(&self, owner: i64) -> Result<i64, GameError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM beasts WHERE user_id = ?")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Beast of `owner` with the highest stat total
    pub async fn strongest(&self, owner: i64) -> Result<Option<Beast>, GameError> {
        let sql = format!(
            "SELECT {} FROM beasts WHERE user_id = ? ORDER BY (power + health + magic) DESC, beast_id LIMIT 1",
            BEAST_COLUMNS
        );
        let row: Option<BeastRow> = sqlx::query_as(&sql)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BeastRow::into_beast).transpose()
    }

    /// Battle snapshot of a stored beast
    pub async fn combatant(&self, owner: i64, beast_id: i64) -> Result<Combatant, GameError> {
        match self.get(owner, beast_id).await? {
            Some(beast) => Ok(beast.combatant()),
            None => Err(BattleError::CombatantNotFound {
                owner,
                beast_id: Some(beast_id),
            }
            .into()),
        }
    }

    /// Pay the summon cost and create a beast with a rolled rarity
    pub async fn summon(&self, owner: i64) -> Result<Beast, GameError> {
        let new_beast = NewBeast::summoned(&mut rand::rng());

        let mut tx = self.pool.begin().await?;
        wallet::debit(&mut tx, owner, SUMMON_COST, "summon").await?;
        let beast_id = Self::insert_with(&mut tx, owner, &new_beast).await?;
        let beast = Self::get_with(&mut tx, owner, beast_id)
            .await?
            .ok_or(GameError::BeastNotFound(beast_id))?;
        tx.commit().await?;

        info!(
            "Player {} summoned {} {} (#{})",
            owner, beast.rarity, beast.species, beast.beast_id
        );
        Ok(beast)
    }

    /// Pay `20 * level` and grant `U(10..20) * rarity multiplier` experience
    pub async fn train(&self, owner: i64, beast_id: i64) -> Result<TrainingResult, GameError> {
        let mut tx = self.pool.begin().await?;
        let beast = Self::get_with(&mut tx, owner, beast_id)
            .await?
            .ok_or(GameError::BeastNotFound(beast_id))?;
        let cost = TRAINING_COST_PER_LEVEL * beast.level as i64;

        let (experience_gained, gains) = {
            let mut rng = rand::rng();
            let gained = (rng.random_range(10..=20u32) as f64
                * beast.rarity.training_multiplier()) as u32;
            (gained, roll_stat_gains(&mut rng))
        };

        wallet::debit(&mut tx, owner, cost, "training").await?;
        let level_up = grow(&mut tx, beast_id, experience_gained, gains).await?;
        let beast = Self::get_with(&mut tx, owner, beast_id)
            .await?
            .ok_or(GameError::BeastNotFound(beast_id))?;
        tx.commit().await?;

        debug!(
            "Trained beast {} (+{} exp, level {})",
            beast_id, experience_gained, beast.level
        );
        Ok(TrainingResult {
            experience_to_next: experience_to_next(beast.level, beast.experience),
            beast,
            cost,
            experience_gained,
            level_up,
        })
    }

    /// Persist a finished battle in one transaction: the winner's
    /// experience, level-up stats and currency, plus the challenger's
    /// consolation on defeat. Abandoned battles change nothing.
    ///
    /// The level-up is decided against the stored experience, so the
    /// returned outcome reports what was actually applied.
    pub async fn apply_battle_outcome(
        &self,
        mut outcome: BattleOutcome,
    ) -> Result<BattleOutcome, GameError> {
        if outcome.result == BattleResult::Abandoned {
            return Ok(outcome);
        }

        let gains = match outcome.stat_gains {
            Some(gains) => gains,
            None => roll_stat_gains(&mut rand::rng()),
        };

        let mut tx = self.pool.begin().await?;

        if let Some(winner) = outcome.winner_source() {
            let level_up = grow(&mut tx, winner.beast_id, outcome.reward_experience, gains).await?;
            outcome.leveled_up = level_up.is_some();
            outcome.new_level = level_up.map(|l| l.new_level);
            outcome.stat_gains = level_up.map(|l| l.gains);
            wallet::credit(&mut tx, winner.owner, outcome.reward_currency, "battle victory")
                .await?;
        }

        if outcome.result == BattleResult::Defeat {
            if let Some(challenger) = outcome.challenger {
                wallet::credit(
                    &mut tx,
                    challenger.owner,
                    outcome.consolation_currency,
                    "battle consolation",
                )
                .await?;
            }
        }

        tx.commit().await?;
        info!(
            "Applied battle outcome: {:?}, winner {:?}",
            outcome.result,
            outcome.victor_name
        );
        Ok(outcome)
    }
}

/// Add experience, then advance one level with `gains` if the stored
/// experience now meets the threshold. Returns the applied level-up.
async fn grow(
    conn: &mut SqliteConnection,
    beast_id: i64,
    experience: u32,
    gains: StatGains,
) -> Result<Option<LevelUp>, GameError> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        "UPDATE beasts SET experience = experience + ? WHERE beast_id = ? RETURNING level, experience",
    )
    .bind(experience as i64)
    .bind(beast_id)
    .fetch_optional(&mut *conn)
    .await?;
    let (level, total) = row.ok_or(GameError::BeastNotFound(beast_id))?;
    let level = level as u32;

    if !check_level_up(level, total as u32) {
        return Ok(None);
    }

    let level_up = LevelUp {
        old_level: level,
        new_level: level + 1,
        gains,
    };
    sqlx::query(
        r#"
        UPDATE beasts
        SET level = ?, power = power + ?, health = health + ?, magic = magic + ?
        WHERE beast_id = ?
        "#,
    )
    .bind(level_up.new_level as i64)
    .bind(gains.power as i64)
    .bind(gains.health as i64)
    .bind(gains.magic as i64)
    .bind(beast_id)
    .execute(&mut *conn)
    .await?;
    info!("Beast {} reached level {}", beast_id, level_up.new_level);

    Ok(Some(level_up))
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct BeastRow {
    beast_id: i64,
    user_id: i64,
    beast_name: String,
    beast_type: String,
    element: String,
    rarity: String,
    level: i64,
    experience: i64,
    power: i64,
    health: i64,
    magic: i64,
}

impl BeastRow {
    fn into_beast(self) -> Result<Beast, GameError> {
        let element: Element = self
            .element
            .parse()
            .map_err(|_| GameError::Corrupt(format!("beast {} element", self.beast_id)))?;
        let rarity: Rarity = self
            .rarity
            .parse()
            .map_err(|_| GameError::Corrupt(format!("beast {} rarity", self.beast_id)))?;

        Ok(Beast {
            beast_id: self.beast_id,
            owner: self.user_id,
            name: self.beast_name,
            species: self.beast_type,
            element,
            rarity,
            level: self.level as u32,
            experience: self.experience as u32,
            power: self.power as u32,
            health: self.health as u32,
            magic: self.magic as u32,
        })
    }
}
