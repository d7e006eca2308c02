//! beastd_init - One-time database initialization tool
//!
//! Creates a fresh game database and registers the owner accounts.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Beast Arena database initialization tool
#[derive(Parser, Debug)]
#[command(
    name = "beastd_init",
    version,
    about = "Initialize a new Beast Arena database"
)]
struct Args {
    /// Path to SQLite database file to create (must not exist)
    #[arg(short, long)]
    database: PathBuf,

    /// Owner account id (can be specified multiple times)
    #[arg(long = "owner")]
    owners: Vec<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beastd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    beastd::init::init_database(&args.database, &args.owners).await?;

    Ok(())
}
