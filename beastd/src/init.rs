//! Database initialization module
//!
//! Provides one-time database setup for the beastd_init tool.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use tracing::info;

use crate::db::Database;

/// Initialize a new game server database
///
/// # Arguments
/// * `path` - Path to the SQLite database file (must not exist)
/// * `owners` - Account ids allowed to use admin commands
///
/// # Errors
/// * Database file already exists
/// * Database creation fails
pub async fn init_database(path: &Path, owners: &[i64]) -> Result<()> {
    if path.exists() {
        bail!(
            "Database file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Invalid database path: {}", path.display()))?;

    info!("Creating new database at {}", path.display());
    let db = Database::new(Some(path_str)).await?;

    for owner in owners {
        db.add_owner(*owner).await?;
        info!("Registered owner {}", owner);
    }

    info!("Database initialization complete");
    Ok(())
}
