//! Async battle sessions
//!
//! Each battle runs in its own tokio task that owns the `Battle` value:
//! - actions arrive on an mpsc channel, each tagged with the turn it targets
//! - a bounded wait per turn; silence abandons the battle
//! - every resolved round is published on a `watch` channel
//! - the task's result is the finalized `BattleOutcome`

use std::time::Duration;

use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use super::engine::{Battle, BattleOutcome, BattleSnapshot};
use super::rewards::RewardTable;
use super::round::{Action, Side};
use super::BattleError;

/// Pacing for a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long to wait for the next challenger action
    pub action_timeout: Duration,
    /// Pause before each computer-controlled turn
    pub turn_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(60),
            turn_delay: Duration::from_millis(500),
        }
    }
}

impl SessionSettings {
    /// No pacing; used when nobody watches the snapshot feed
    pub fn immediate(action_timeout: Duration) -> Self {
        Self {
            action_timeout,
            turn_delay: Duration::ZERO,
        }
    }
}

struct ActionRequest {
    turn: u32,
    action: Action,
    reply: oneshot::Sender<Result<BattleSnapshot, BattleError>>,
}

/// Input side of an interactive session
#[derive(Clone)]
pub struct BattleHandle {
    id: Uuid,
    actions: mpsc::Sender<ActionRequest>,
    snapshots: watch::Receiver<BattleSnapshot>,
}

impl BattleHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to the snapshot feed
    pub fn snapshots(&self) -> watch::Receiver<BattleSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    pub fn current(&self) -> BattleSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Submit the challenger's action for `turn`. Resolves once the action
    /// and the opponent's reply are applied. A submission for any other turn,
    /// or after the battle ended, fails with `StaleAction`.
    pub async fn submit(&self, turn: u32, action: Action) -> Result<BattleSnapshot, BattleError> {
        let (reply, response) = oneshot::channel();
        self.actions
            .send(ActionRequest {
                turn,
                action,
                reply,
            })
            .await
            .map_err(|_| BattleError::StaleAction)?;

        response.await.map_err(|_| BattleError::StaleAction)?
    }
}

/// Run an interactive battle against the AI in a new task
pub fn spawn_versus_ai(
    mut battle: Battle,
    rewards: RewardTable,
    settings: SessionSettings,
    mut rng: StdRng,
) -> (BattleHandle, JoinHandle<Result<BattleOutcome, BattleError>>) {
    let id = Uuid::new_v4();
    let (actions_tx, mut actions) = mpsc::channel::<ActionRequest>(1);
    let (snapshots_tx, snapshots) = watch::channel(battle.snapshot());

    let task = tokio::spawn(async move {
        let mut deadline = Instant::now() + settings.action_timeout;

        while !battle.is_terminal() {
            let request = match timeout_at(deadline, actions.recv()).await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    info!("Battle {}: input closed, abandoning", id);
                    battle.abandon();
                    break;
                }
                Err(_) => {
                    info!("Battle {}: no action within {:?}, abandoning", id, settings.action_timeout);
                    battle.abandon();
                    break;
                }
            };

            if request.turn != battle.turn() {
                debug!(
                    "Battle {}: stale action for turn {} (at {})",
                    id,
                    request.turn,
                    battle.turn()
                );
                let _ = request.reply.send(Err(BattleError::StaleAction));
                continue;
            }

            if let Err(e) = battle.submit(Side::Challenger, request.action, &mut rng) {
                let _ = request.reply.send(Err(e));
                continue;
            }
            snapshots_tx.send_replace(battle.snapshot());

            if !battle.is_terminal() {
                if !settings.turn_delay.is_zero() {
                    sleep(settings.turn_delay).await;
                }
                battle.auto_step(&mut rng)?;
                snapshots_tx.send_replace(battle.snapshot());
            }

            let _ = request.reply.send(Ok(battle.snapshot()));
            deadline = Instant::now() + settings.action_timeout;
        }

        snapshots_tx.send_replace(battle.snapshot());
        info!("Battle {} ended: {:?}", id, battle.state());
        battle.finalize(&rewards, &mut rng)
    });

    let handle = BattleHandle {
        id,
        actions: actions_tx,
        snapshots,
    };
    (handle, task)
}

/// Run an unattended battle in a new task
pub fn spawn_unattended(
    mut battle: Battle,
    rewards: RewardTable,
    settings: SessionSettings,
    mut rng: StdRng,
) -> (
    watch::Receiver<BattleSnapshot>,
    JoinHandle<Result<BattleOutcome, BattleError>>,
) {
    let (snapshots_tx, snapshots) = watch::channel(battle.snapshot());

    let task = tokio::spawn(async move {
        while !battle.is_terminal() {
            battle.auto_step(&mut rng)?;
            snapshots_tx.send_replace(battle.snapshot());

            if !battle.is_terminal() && !settings.turn_delay.is_zero() {
                sleep(settings.turn_delay).await;
            }
        }
        debug!("Unattended battle ended after {} rounds", battle.turn());
        battle.finalize(&rewards, &mut rng)
    });

    (snapshots, task)
}
