//! Market API - catalog, buy, sell and the owner-only give command

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{ApiError, AppState};
use crate::game::{catalog, Command, GameError, GiveResult, MarketItem, PurchaseResult, SaleResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/market", get(list_catalog))
        .route("/players/{id}/buy", post(buy))
        .route("/players/{id}/sell", post(sell))
        .route("/admin/give", post(give))
}

#[derive(Debug, Deserialize)]
struct BuyRequest {
    item: String,
}

#[derive(Debug, Deserialize)]
struct SellRequest {
    inventory_id: i64,
}

/// Copy an inventory row to another player
#[derive(Debug, Deserialize)]
struct GiveRequest {
    /// Account issuing the command; must be an owner
    caller: i64,
    inventory_id: i64,
    #[serde(default = "default_quantity")]
    quantity: i64,
    recipient: i64,
}

fn default_quantity() -> i64 {
    1
}

async fn list_catalog() -> Json<&'static [MarketItem]> {
    Json(catalog())
}

async fn buy(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<BuyRequest>,
) -> Result<Json<PurchaseResult>, ApiError> {
    state.cooldowns.check(user_id, Command::Buy)?;
    Ok(Json(state.market.buy(user_id, &req.item).await?))
}

async fn sell(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<SellRequest>,
) -> Result<Json<SaleResult>, ApiError> {
    state.cooldowns.check(user_id, Command::Sell)?;
    Ok(Json(state.market.sell(user_id, req.inventory_id).await?))
}

async fn give(
    State(state): State<AppState>,
    Json(req): Json<GiveRequest>,
) -> Result<(StatusCode, Json<GiveResult>), ApiError> {
    if !state.is_owner(req.caller).await? {
        return Err(GameError::PermissionDenied.into());
    }

    let result = state
        .market
        .give(req.inventory_id, req.quantity, req.recipient)
        .await?;
    info!(
        "Owner {} gave {} x{} to {}",
        req.caller, result.item_name, result.quantity, result.recipient
    );
    Ok((StatusCode::CREATED, Json(result)))
}
