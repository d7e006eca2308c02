//! Gambling API

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::game::{CoinflipResult, Command, SlotsResult, WheelResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{id}/coinflip", post(coinflip))
        .route("/players/{id}/slots", post(slots))
        .route("/players/{id}/wheel", post(wheel))
}

/// A bet on a named outcome: a coin face or an element
#[derive(Debug, Deserialize)]
struct ChoiceBet {
    bet: i64,
    choice: String,
}

#[derive(Debug, Deserialize)]
struct Bet {
    bet: i64,
}

async fn coinflip(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<ChoiceBet>,
) -> Result<Json<CoinflipResult>, ApiError> {
    state.cooldowns.check(user_id, Command::Coinflip)?;
    Ok(Json(
        state.gambling.coinflip(user_id, req.bet, &req.choice).await?,
    ))
}

async fn slots(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<Bet>,
) -> Result<Json<SlotsResult>, ApiError> {
    state.cooldowns.check(user_id, Command::Slots)?;
    Ok(Json(state.gambling.slots(user_id, req.bet).await?))
}

async fn wheel(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<ChoiceBet>,
) -> Result<Json<WheelResult>, ApiError> {
    state.cooldowns.check(user_id, Command::Wheel)?;
    Ok(Json(state.gambling.wheel(user_id, req.bet, &req.choice).await?))
}
