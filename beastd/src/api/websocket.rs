//! WebSocket handler for interactive battles
//!
//! A connection belongs to one player (`/ws?player=<id>`). The client starts a
//! battle against a wild beast, then submits one action per turn. Every
//! resolved round is pushed as a snapshot, followed by the outcome once the
//! battle ends.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::battles::{finish_wild, start_wild, WildBattle};
use super::{ApiError, AppState};
use crate::battle::{Action, BattleHandle, BattleOutcome, BattleSnapshot};

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// A battle began; the snapshot shows turn 0
    #[serde(rename = "started")]
    Started {
        battle_id: Uuid,
        snapshot: BattleSnapshot,
    },
    /// State after a resolved round
    #[serde(rename = "snapshot")]
    Snapshot { snapshot: BattleSnapshot },
    /// Final result, already persisted
    #[serde(rename = "outcome")]
    Outcome { outcome: BattleOutcome },
    /// Error message
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "pong")]
    Pong,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Battle a wild beast with one of the player's beasts
    #[serde(rename = "start")]
    Start { beast_id: i64 },
    /// Act on the given turn
    #[serde(rename = "action")]
    Action { turn: u32, action: Action },
    /// Ping to keep connection alive
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    player: i64,
}

/// Handle WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.player))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState, player: i64) {
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);
    let mut battle: Option<BattleHandle> = None;

    info!("WebSocket connected: player {}", player);

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => handle_client_message(&state, player, msg, &mut battle, &tx).await,
                            Err(e) => send_error(&tx, format!("invalid message: {}", e)).await,
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    // Dropping the handle closes the action channel; a running battle is
    // abandoned and its forwarder releases the player.
    drop(battle);
    info!("WebSocket disconnected: player {}", player);
}

/// Handle a message from the client
async fn handle_client_message(
    state: &AppState,
    player: i64,
    msg: ClientMessage,
    battle: &mut Option<BattleHandle>,
    tx: &mpsc::Sender<ServerMessage>,
) {
    match msg {
        ClientMessage::Start { beast_id } => match start_wild(state, player, beast_id).await {
            Ok(WildBattle { id, handle, task }) => {
                let _ = tx
                    .send(ServerMessage::Started {
                        battle_id: id,
                        snapshot: handle.current(),
                    })
                    .await;

                let forwarder_state = state.clone();
                let snapshots = handle.snapshots();
                let forwarder_tx = tx.clone();
                tokio::spawn(async move {
                    forward_snapshots(snapshots, &forwarder_tx).await;
                    let message = match finish_wild(&forwarder_state, id, task).await {
                        Ok(outcome) => ServerMessage::Outcome { outcome },
                        Err(e) => {
                            warn!("Battle {} failed: {:?}", id, e);
                            ServerMessage::Error {
                                message: describe(&e),
                            }
                        }
                    };
                    let _ = forwarder_tx.send(message).await;
                });

                *battle = Some(handle);
            }
            Err(e) => send_error(tx, describe(&e)).await,
        },
        ClientMessage::Action { turn, action } => {
            let Some(handle) = battle.as_ref() else {
                send_error(tx, "no battle in progress".to_string()).await;
                return;
            };
            // Snapshots reach the client through the forwarder
            if let Err(e) = handle.submit(turn, action).await {
                debug!("Player {} action rejected: {}", player, e);
                send_error(tx, e.to_string()).await;
            }
        }
        ClientMessage::Ping => {
            let _ = tx.send(ServerMessage::Pong).await;
        }
    }
}

/// Push every new snapshot until the battle task drops its sender
async fn forward_snapshots(
    mut snapshots: watch::Receiver<BattleSnapshot>,
    tx: &mpsc::Sender<ServerMessage>,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let _ = tx.send(ServerMessage::Snapshot { snapshot }).await;
    }
}

async fn send_error(tx: &mpsc::Sender<ServerMessage>, message: String) {
    let _ = tx.send(ServerMessage::Error { message }).await;
}

fn describe(e: &ApiError) -> String {
    match e {
        ApiError::Game(e) => e.to_string(),
        ApiError::Internal(_) => "internal error".to_string(),
    }
}
