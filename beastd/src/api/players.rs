//! Player API - profiles, daily rewards and beasts

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use super::{ApiError, AppState};
use crate::battle::BattleError;
use crate::game::{Beast, Command, DailyReward, GameError, InventoryItem, Profile, TrainingResult};

/// Build the player router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{id}", get(profile))
        .route("/players/{id}/daily", post(daily))
        .route("/players/{id}/beasts", get(list_beasts))
        .route("/players/{id}/beasts/{beast_id}", get(get_beast))
        .route("/players/{id}/beasts/{beast_id}/train", post(train))
        .route("/players/{id}/summon", post(summon))
        .route("/players/{id}/inventory", get(inventory))
}

/// Profile overview; first contact creates the player
async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Profile>, ApiError> {
    state.cooldowns.check(user_id, Command::Profile)?;
    Ok(Json(state.players.profile(user_id).await?))
}

/// Claim the daily reward
async fn daily(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<DailyReward>, ApiError> {
    Ok(Json(state.players.claim_daily(user_id, Utc::now()).await?))
}

async fn list_beasts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Beast>>, ApiError> {
    state.cooldowns.check(user_id, Command::Beasts)?;
    state.players.get_or_create(user_id).await?;
    Ok(Json(state.beasts.list(user_id).await?))
}

async fn get_beast(
    State(state): State<AppState>,
    Path((user_id, beast_id)): Path<(i64, i64)>,
) -> Result<Json<Beast>, ApiError> {
    state.cooldowns.check(user_id, Command::Beast)?;
    let beast = state
        .beasts
        .get(user_id, beast_id)
        .await?
        .ok_or(GameError::BeastNotFound(beast_id))?;
    Ok(Json(beast))
}

/// Summon a new beast for eldergems
async fn summon(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Beast>, ApiError> {
    state.cooldowns.check(user_id, Command::Summon)?;
    state.players.get_or_create(user_id).await?;
    Ok(Json(state.beasts.summon(user_id).await?))
}

async fn train(
    State(state): State<AppState>,
    Path((user_id, beast_id)): Path<(i64, i64)>,
) -> Result<Json<TrainingResult>, ApiError> {
    state.cooldowns.check(user_id, Command::Train)?;
    // No training mid-battle
    if state.battles.is_battling(user_id).await {
        return Err(BattleError::AlreadyInBattle(user_id).into());
    }
    Ok(Json(state.beasts.train(user_id, beast_id).await?))
}

async fn inventory(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    Ok(Json(state.market.inventory(user_id).await?))
}
