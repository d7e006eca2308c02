//! Battle API
//!
//! Unattended PvP battles run to completion inside the request. Interactive
//! battles against wild beasts are started here and driven over the
//! WebSocket.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::battle::{
    spawn_unattended, spawn_versus_ai, Battle, BattleError, BattleHandle, BattleOutcome,
    BattleRules, Combatant, SessionSettings,
};
use crate::game::{wild_opponent, Command, GameError};

pub fn router() -> Router<AppState> {
    Router::new().route("/players/{id}/battles", post(pvp_battle))
}

/// Challenge another player's beast
#[derive(Debug, Deserialize)]
struct BattleRequest {
    /// Challenger's beast
    beast_id: i64,
    /// Defending player
    opponent: i64,
    /// Defending beast; the opponent's strongest when omitted
    opponent_beast_id: Option<i64>,
}

async fn pvp_battle(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<BattleRequest>,
) -> Result<Json<BattleOutcome>, ApiError> {
    if req.opponent == user_id {
        return Err(GameError::InvalidChoice("cannot battle yourself".to_string()).into());
    }
    state.cooldowns.check(user_id, Command::Battle)?;

    let challenger = state.beasts.combatant(user_id, req.beast_id).await?;
    let opponent = match req.opponent_beast_id {
        Some(beast_id) => state.beasts.combatant(req.opponent, beast_id).await?,
        None => state
            .beasts
            .strongest(req.opponent)
            .await?
            .ok_or(BattleError::CombatantNotFound {
                owner: req.opponent,
                beast_id: None,
            })?
            .combatant(),
    };

    let battle_id = Uuid::new_v4();
    state
        .battles
        .try_register(battle_id, &[user_id, req.opponent])
        .await?;
    info!(
        "Battle {}: {} ({}) vs {} ({})",
        battle_id, user_id, challenger.name, req.opponent, opponent.name
    );

    let result = run_unattended(&state, challenger, opponent).await;
    state.battles.release(battle_id).await;

    let outcome = state.beasts.apply_battle_outcome(result?).await?;
    Ok(Json(outcome))
}

async fn run_unattended(
    state: &AppState,
    challenger: Combatant,
    opponent: Combatant,
) -> Result<BattleOutcome, ApiError> {
    let mut rng = StdRng::from_os_rng();
    let battle = Battle::unattended(
        challenger,
        opponent,
        state.config.battle.unattended_rules(),
        &mut rng,
    );
    let settings = SessionSettings::immediate(state.config.battle.session().action_timeout);

    let (_, task) = spawn_unattended(battle, state.config.rewards, settings, rng);
    join(task).await
}

/// A running interactive battle
pub(super) struct WildBattle {
    pub id: Uuid,
    pub handle: BattleHandle,
    pub task: JoinHandle<Result<BattleOutcome, BattleError>>,
}

/// Start an interactive battle between `player`'s beast and a wild beast
/// mirroring it. The player stays registered until `finish_wild` runs.
pub(super) async fn start_wild(
    state: &AppState,
    player: i64,
    beast_id: i64,
) -> Result<WildBattle, ApiError> {
    state.cooldowns.check(player, Command::Battle)?;
    let challenger = state.beasts.combatant(player, beast_id).await?;

    let id = Uuid::new_v4();
    state.battles.try_register(id, &[player]).await?;

    let mut rng = StdRng::from_os_rng();
    let opponent = wild_opponent(&challenger, &mut rng);
    info!(
        "Battle {}: {} ({}) vs wild {} ({})",
        id, player, challenger.name, opponent.name, opponent.element
    );

    let battle = Battle::versus_ai(challenger, opponent, BattleRules::interactive());
    let (handle, task) = spawn_versus_ai(
        battle,
        state.config.rewards,
        state.config.battle.session(),
        rng,
    );

    Ok(WildBattle { id, handle, task })
}

/// Await the battle task, persist the outcome and release the player
pub(super) async fn finish_wild(
    state: &AppState,
    id: Uuid,
    task: JoinHandle<Result<BattleOutcome, BattleError>>,
) -> Result<BattleOutcome, ApiError> {
    let result = join(task).await;
    state.battles.release(id).await;

    Ok(state.beasts.apply_battle_outcome(result?).await?)
}

async fn join(
    task: JoinHandle<Result<BattleOutcome, BattleError>>,
) -> Result<BattleOutcome, ApiError> {
    match task.await {
        Ok(outcome) => Ok(outcome?),
        Err(e) => Err(ApiError::Internal(format!("battle task failed: {}", e))),
    }
}
