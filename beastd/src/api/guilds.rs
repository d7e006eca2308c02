//! Guild API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::game::{Command, Guild, GuildInfo};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/guilds", post(create_guild))
        .route("/guilds/{name}", get(guild_info))
        .route("/guilds/{name}/join", post(join_guild))
}

#[derive(Debug, Deserialize)]
struct CreateGuildRequest {
    user_id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct JoinGuildRequest {
    user_id: i64,
}

async fn create_guild(
    State(state): State<AppState>,
    Json(req): Json<CreateGuildRequest>,
) -> Result<(StatusCode, Json<Guild>), ApiError> {
    state.cooldowns.check(req.user_id, Command::CreateGuild)?;
    let guild = state.guilds.create(req.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(guild)))
}

async fn join_guild(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<JoinGuildRequest>,
) -> Result<Json<Guild>, ApiError> {
    state.cooldowns.check(req.user_id, Command::JoinGuild)?;
    Ok(Json(state.guilds.join(req.user_id, &name).await?))
}

async fn guild_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GuildInfo>, ApiError> {
    Ok(Json(state.guilds.info(&name).await?))
}
