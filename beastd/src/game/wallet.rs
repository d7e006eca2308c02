//! Eldergem balance changes
//!
//! Every change is a conditional UPDATE plus a ledger row, run on the
//! caller's connection so it joins the caller's transaction.

use sqlx::SqliteConnection;
use tracing::debug;

use super::GameError;

/// Current eldergem balance
pub async fn balance(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, GameError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT eldergems FROM players WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|(b,)| b).ok_or(GameError::PlayerNotFound(user_id))
}

/// Take `amount` from a player. Fails without change when the balance is
/// short. Returns the new balance.
pub async fn debit(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
    reason: &str,
) -> Result<i64, GameError> {
    let result = sqlx::query(
        "UPDATE players SET eldergems = eldergems - ? WHERE user_id = ? AND eldergems >= ?",
    )
    .bind(amount)
    .bind(user_id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available = balance(conn, user_id).await?;
        debug!(
            "Insufficient eldergems: {} has {} but needs {}",
            user_id, available, amount
        );
        return Err(GameError::InsufficientFunds {
            needed: amount,
            available,
        });
    }

    record(conn, user_id, -amount, reason).await?;
    balance(conn, user_id).await
}

/// Give `amount` to a player. Returns the new balance.
pub async fn credit(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
    reason: &str,
) -> Result<i64, GameError> {
    let result = sqlx::query("UPDATE players SET eldergems = eldergems + ? WHERE user_id = ?")
        .bind(amount)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(GameError::PlayerNotFound(user_id));
    }

    record(conn, user_id, amount, reason).await?;
    balance(conn, user_id).await
}

async fn record(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
    reason: &str,
) -> Result<(), GameError> {
    sqlx::query("INSERT INTO ledger (user_id, amount, reason) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(amount)
        .bind(reason)
        .execute(&mut *conn)
        .await?;

    debug!("Ledger: user={}, amount={}, reason={}", user_id, amount, reason);
    Ok(())
}
