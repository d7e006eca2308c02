//! BattleClient - WebSocket client speaking the battle protocol

#![allow(dead_code)]

use std::time::Duration;

use anyhow::{bail, Result};
use beastd::api::{ClientMessage, ServerMessage};
use beastd::battle::{Action, BattleOutcome, BattleSnapshot};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// One player's battle connection
pub struct BattleClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl BattleClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Send a protocol message
    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Receive the next protocol message
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        let next = async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                    Some(Ok(Message::Close(_))) | None => bail!("WebSocket closed"),
                    Some(Err(e)) => return Err(e.into()),
                    _ => continue,
                }
            }
        };
        match tokio::time::timeout(RECV_TIMEOUT, next).await {
            Ok(result) => result,
            Err(_) => bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Start a battle and return the initial snapshot
    pub async fn start(&mut self, beast_id: i64) -> Result<BattleSnapshot> {
        self.send(&ClientMessage::Start { beast_id }).await?;
        match self.recv().await? {
            ServerMessage::Started { snapshot, .. } => Ok(snapshot),
            other => bail!("expected started, got {:?}", other),
        }
    }

    /// Submit an action and wait until the snapshot for the next turn of the
    /// challenger arrives, or the battle ends
    pub async fn act(&mut self, turn: u32, action: Action) -> Result<Step> {
        self.send(&ClientMessage::Action { turn, action }).await?;
        loop {
            match self.recv().await? {
                ServerMessage::Snapshot { snapshot } => {
                    if snapshot.state.is_terminal() {
                        return Ok(Step::Finished(self.outcome().await?));
                    }
                    if snapshot.turn >= turn + 2 {
                        return Ok(Step::Next(snapshot));
                    }
                }
                ServerMessage::Outcome { outcome } => return Ok(Step::Finished(outcome)),
                ServerMessage::Error { message } => return Ok(Step::Rejected(message)),
                other => bail!("unexpected message {:?}", other),
            }
        }
    }

    /// Wait for the outcome, skipping snapshots
    pub async fn outcome(&mut self) -> Result<BattleOutcome> {
        loop {
            match self.recv().await? {
                ServerMessage::Outcome { outcome } => return Ok(outcome),
                ServerMessage::Snapshot { .. } => continue,
                other => bail!("expected outcome, got {:?}", other),
            }
        }
    }

    /// Wait for an error message, skipping snapshots
    pub async fn error(&mut self) -> Result<String> {
        loop {
            match self.recv().await? {
                ServerMessage::Error { message } => return Ok(message),
                ServerMessage::Snapshot { .. } => continue,
                other => bail!("expected error, got {:?}", other),
            }
        }
    }

    /// Fight with plain attacks until the battle ends
    pub async fn fight_to_end(&mut self, mut snapshot: BattleSnapshot) -> Result<BattleOutcome> {
        loop {
            match self.act(snapshot.turn, Action::Attack).await? {
                Step::Next(next) => snapshot = next,
                Step::Finished(outcome) => return Ok(outcome),
                Step::Rejected(message) => bail!("attack rejected: {}", message),
            }
        }
    }

    pub async fn close(&mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Result of one submitted action
#[derive(Debug)]
pub enum Step {
    /// Both sides acted; the challenger is up again
    Next(BattleSnapshot),
    Finished(BattleOutcome),
    Rejected(String),
}
