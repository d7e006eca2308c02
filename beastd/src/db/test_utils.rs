//! Shared test utilities for database operations
//!
//! Every store test runs against the same schema as production.

use sqlx::SqlitePool;

use super::Database;

/// Create an in-memory test database pool with full schema
pub async fn test_pool() -> SqlitePool {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    db.pool().clone()
}

/// Insert a bare player row with the given eldergem balance
pub async fn seed_player(pool: &SqlitePool, user_id: i64, eldergems: i64) {
    sqlx::query("INSERT INTO players (user_id, eldergems) VALUES (?, ?)")
        .bind(user_id)
        .bind(eldergems)
        .execute(pool)
        .await
        .expect("Failed to seed player");
}
