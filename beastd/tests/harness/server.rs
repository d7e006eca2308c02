//! TestServer - in-process server on a random port
//!
//! Each instance gets its own on-disk SQLite database in a temp directory.
//! Cooldowns are off and AI turns are not delayed so scenarios run fast.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use beastd::battle::RewardTable;
use beastd::config::BattleConfig;
use beastd::{Config, Server};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::client::BattleClient;

/// Test harness running a real beastd server
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub db_path: PathBuf,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Start a server with test defaults
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start a server after adjusting the test config
    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("beasts.db");

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let mut config = Config {
            bind_addr: addr,
            db_path: Some(db_path.to_string_lossy().into_owned()),
            cooldowns: false,
            battle: BattleConfig {
                action_timeout_ms: 5_000,
                turn_delay_ms: 0,
                ..BattleConfig::default()
            },
            rewards: RewardTable::default(),
            ..Config::default()
        };
        configure(&mut config);

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.serve(listener).await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            db_path,
            server,
            _handle: handle,
            _temp_dir: temp_dir,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// POST with an empty JSON object
    pub async fn post_empty(&self, path: &str) -> Result<reqwest::Response> {
        self.post(path, &json!({})).await
    }

    /// GET and decode a successful JSON response
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let resp = self.get(path).await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "GET {} returned {}",
            path,
            resp.status()
        );
        Ok(resp.json().await?)
    }

    /// Direct database access for setup and assertions
    pub fn pool(&self) -> sqlx::SqlitePool {
        self.server.db().pool().clone()
    }

    /// Set a player's eldergem balance
    pub async fn set_eldergems(&self, user_id: i64, eldergems: i64) -> Result<()> {
        sqlx::query("UPDATE players SET eldergems = ? WHERE user_id = ?")
            .bind(eldergems)
            .bind(user_id)
            .execute(&self.pool())
            .await?;
        Ok(())
    }

    /// Create the player through the API; returns the profile
    pub async fn create_player(&self, user_id: i64) -> Result<Value> {
        self.get_json(&format!("/players/{}", user_id)).await
    }

    /// Id of the player's first (starter) beast
    pub async fn starter_beast(&self, user_id: i64) -> Result<i64> {
        let beasts = self.get_json(&format!("/players/{}/beasts", user_id)).await?;
        beasts[0]["beast_id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("player {} has no beasts", user_id))
    }

    /// WebSocket URL for a player
    pub fn ws_url(&self, player: i64) -> String {
        format!("ws://{}/ws?player={}", self.addr, player)
    }

    /// Open a battle connection for a player
    pub async fn connect(&self, player: i64) -> Result<BattleClient> {
        BattleClient::connect(&self.ws_url(player)).await
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
