//! HTTP API module - REST endpoints and WebSocket

mod battles;
mod games;
mod guilds;
mod market;
mod players;
mod websocket;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::battle::{BattleError, BattleRegistry};
use crate::config::Config;
use crate::db::Database;
use crate::game::{
    BeastStore, CommandCooldowns, GameError, GamblingService, GuildService, MarketService,
    PlayerService,
};
pub use websocket::{ClientMessage, ServerMessage};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub players: Arc<PlayerService>,
    pub beasts: Arc<BeastStore>,
    pub gambling: Arc<GamblingService>,
    pub market: Arc<MarketService>,
    pub guilds: Arc<GuildService>,
    pub cooldowns: Arc<CommandCooldowns>,
    pub battles: Arc<BattleRegistry>,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Self {
        let pool = db.pool().clone();
        let cooldowns = if config.cooldowns {
            CommandCooldowns::new()
        } else {
            CommandCooldowns::disabled()
        };

        Self {
            players: Arc::new(PlayerService::new(pool.clone())),
            beasts: Arc::new(BeastStore::new(pool.clone())),
            gambling: Arc::new(GamblingService::new(pool.clone())),
            market: Arc::new(MarketService::new(pool.clone())),
            guilds: Arc::new(GuildService::new(pool)),
            cooldowns: Arc::new(cooldowns),
            battles: BattleRegistry::shared(),
            db,
            config,
        }
    }

    /// Owners come from the config file and the owners table
    pub async fn is_owner(&self, user_id: i64) -> Result<bool, ApiError> {
        if self.config.owner_ids.contains(&user_id) {
            return Ok(true);
        }
        let owners = self
            .db
            .owners()
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(owners.contains(&user_id))
    }
}

/// Build the API router
pub fn router(db: Arc<Database>, config: Arc<Config>) -> Router {
    let state = AppState::new(db, config);

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/ws", get(websocket::ws_handler))
        .merge(players::router())
        .merge(games::router())
        .merge(market::router())
        .merge(guilds::router())
        .merge(battles::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "beastd",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by handlers
#[derive(Debug)]
pub enum ApiError {
    Game(GameError),
    Internal(String),
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        ApiError::Game(e)
    }
}

impl From<BattleError> for ApiError {
    fn from(e: BattleError) -> Self {
        ApiError::Game(GameError::Battle(e))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        let game = match self {
            ApiError::Game(e) => e,
            ApiError::Internal(_) => return StatusCode::INTERNAL_SERVER_ERROR,
        };

        match game {
            GameError::PlayerNotFound(_)
            | GameError::BeastNotFound(_)
            | GameError::ItemNotFound(_)
            | GameError::InventoryItemNotFound(_)
            | GameError::GuildNotFound(_)
            | GameError::Battle(BattleError::CombatantNotFound { .. }) => StatusCode::NOT_FOUND,

            GameError::AlreadyInGuild
            | GameError::GuildExists(_)
            | GameError::GuildFull(_)
            | GameError::Battle(BattleError::AlreadyInBattle(_)) => StatusCode::CONFLICT,

            GameError::InsufficientFunds { .. }
            | GameError::BetTooSmall(_)
            | GameError::BetTooLarge(_)
            | GameError::InvalidChoice(_)
            | GameError::InvalidGuildName
            | GameError::Battle(_) => StatusCode::BAD_REQUEST,

            GameError::OnCooldown(_) => StatusCode::TOO_MANY_REQUESTS,
            GameError::PermissionDenied => StatusCode::FORBIDDEN,
            GameError::Corrupt(_) | GameError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Game(e) if status != StatusCode::INTERNAL_SERVER_ERROR => e.to_string(),
            other => {
                error!("Request failed: {:?}", other);
                "internal error".to_string()
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
