//! Battle orchestrator
//!
//! A small state machine:
//! `AwaitingAction -> ResolvingRound -> (AwaitingAction | Victory | Defeat)`,
//! plus `Abandoned` when the input channel gives up. Terminal states are
//! absorbing and `finalize` turns a finished battle into its outcome.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combatant::{BeastRef, Combatant, Fighter};
use super::element::Element;
use super::policy::OpponentPolicy;
use super::rewards::{roll_level_up, RewardTable, StatGains};
use super::round::{resolve_round, Action, BattleRules, RoundResult, Side};
use super::BattleError;

/// Number of log entries carried in a snapshot
pub const SNAPSHOT_LOG_LEN: usize = 3;

/// How turns are supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleMode {
    /// A player picks each challenger action, the policy answers once
    VersusAi,
    /// The policy drives both sides
    Unattended,
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "side", rename_all = "snake_case")]
pub enum BattleState {
    AwaitingAction(Side),
    ResolvingRound(Side),
    /// The challenger won
    Victory,
    /// The challenger lost
    Defeat,
    /// No action arrived in time
    Abandoned,
}

impl BattleState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BattleState::Victory | BattleState::Defeat | BattleState::Abandoned
        )
    }
}

/// Final result from the challenger's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleResult {
    Victory,
    Defeat,
    Abandoned,
}

/// Public view of one fighter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterView {
    pub name: String,
    pub element: Element,
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub health_percent: u32,
    pub defended: bool,
    pub special_cooldown: u32,
}

impl From<&Fighter> for FighterView {
    fn from(fighter: &Fighter) -> Self {
        let c = &fighter.combatant;
        Self {
            name: c.name.clone(),
            element: c.element,
            level: c.level,
            health: c.current_health(),
            max_health: c.max_health(),
            health_percent: c.health_percent(),
            defended: fighter.defended,
            special_cooldown: fighter.special_cooldown,
        }
    }
}

/// Renderable state handed to the presentation layer after every round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub state: BattleState,
    /// Rounds resolved so far; submissions must name this turn
    pub turn: u32,
    pub challenger: FighterView,
    pub opponent: FighterView,
    /// Most recent log entries, oldest first
    pub recent: Vec<RoundResult>,
}

/// Everything a caller needs to persist a finished battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub result: BattleResult,
    pub victor: Option<Side>,
    pub victor_name: Option<String>,
    pub challenger: Option<BeastRef>,
    pub opponent: Option<BeastRef>,
    pub rounds: Vec<RoundResult>,
    pub reward_experience: u32,
    pub reward_currency: i64,
    pub consolation_currency: i64,
    pub leveled_up: bool,
    pub new_level: Option<u32>,
    pub stat_gains: Option<StatGains>,
}

impl BattleOutcome {
    /// Store reference of the winning beast, if it has one
    pub fn winner_source(&self) -> Option<BeastRef> {
        match self.victor? {
            Side::Challenger => self.challenger,
            Side::Opponent => self.opponent,
        }
    }

    /// Store reference of the losing beast, if it has one
    pub fn loser_source(&self) -> Option<BeastRef> {
        match self.victor? {
            Side::Challenger => self.opponent,
            Side::Opponent => self.challenger,
        }
    }
}

/// A single battle between two fighters
#[derive(Debug, Clone)]
pub struct Battle {
    mode: BattleMode,
    rules: BattleRules,
    policy: OpponentPolicy,
    challenger: Fighter,
    opponent: Fighter,
    state: BattleState,
    rounds: Vec<RoundResult>,
}

impl Battle {
    /// Interactive battle against a computer-controlled opponent. The
    /// challenger always moves first.
    pub fn versus_ai(challenger: Combatant, opponent: Combatant, rules: BattleRules) -> Self {
        Self::build(
            BattleMode::VersusAi,
            challenger,
            opponent,
            rules,
            Side::Challenger,
        )
    }

    /// Unattended battle; the first actor is picked once, 50/50
    pub fn unattended<R: Rng + ?Sized>(
        challenger: Combatant,
        opponent: Combatant,
        rules: BattleRules,
        rng: &mut R,
    ) -> Self {
        let first = if rng.random_bool(0.5) {
            Side::Challenger
        } else {
            Side::Opponent
        };
        Self::build(BattleMode::Unattended, challenger, opponent, rules, first)
    }

    fn build(
        mode: BattleMode,
        challenger: Combatant,
        opponent: Combatant,
        rules: BattleRules,
        first: Side,
    ) -> Self {
        Self {
            mode,
            rules,
            policy: OpponentPolicy::default(),
            challenger: Fighter::new(challenger),
            opponent: Fighter::new(opponent),
            state: BattleState::AwaitingAction(first),
            rounds: Vec::new(),
        }
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Rounds resolved so far
    pub fn turn(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn rounds(&self) -> &[RoundResult] {
        &self.rounds
    }

    pub fn fighter(&self, side: Side) -> &Fighter {
        match side {
            Side::Challenger => &self.challenger,
            Side::Opponent => &self.opponent,
        }
    }

    fn fighters_mut(&mut self, side: Side) -> (&mut Fighter, &mut Fighter) {
        match side {
            Side::Challenger => (&mut self.challenger, &mut self.opponent),
            Side::Opponent => (&mut self.opponent, &mut self.challenger),
        }
    }

    /// Resolve one action for `side`. Fails with `StaleAction` when it is not
    /// that side's turn or the battle is over; nothing changes on failure.
    pub fn submit<R: Rng + ?Sized>(
        &mut self,
        side: Side,
        action: Action,
        rng: &mut R,
    ) -> Result<&RoundResult, BattleError> {
        match self.state {
            BattleState::AwaitingAction(expected) if expected == side => {}
            _ => return Err(BattleError::StaleAction),
        }

        let rules = self.rules;
        self.state = BattleState::ResolvingRound(side);

        let (actor, target) = self.fighters_mut(side);
        let result = match resolve_round(side, actor, target, action, &rules, rng) {
            Ok(result) => result,
            Err(e) => {
                self.state = BattleState::AwaitingAction(side);
                return Err(e);
            }
        };
        let knocked_out = target.combatant.is_defeated();

        debug!(
            "Round {}: {} (target at {})",
            self.rounds.len() + 1,
            result,
            result.target_health
        );
        self.rounds.push(result);

        self.state = match (knocked_out, side) {
            (true, Side::Challenger) => BattleState::Victory,
            (true, Side::Opponent) => BattleState::Defeat,
            (false, _) => BattleState::AwaitingAction(side.other()),
        };

        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// Let the policy pick and resolve the action for whichever side is up.
    /// In an interactive battle only the opponent is computer-controlled.
    pub fn auto_step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&RoundResult, BattleError> {
        let side = match self.state {
            BattleState::AwaitingAction(side) => side,
            _ => return Err(BattleError::StaleAction),
        };
        if self.mode == BattleMode::VersusAi && side == Side::Challenger {
            return Err(BattleError::StaleAction);
        }

        let action = self
            .policy
            .decide(self.fighter(side), self.fighter(side.other()), rng);
        self.submit(side, action, rng)
    }

    /// Interactive turn: the challenger's action followed by exactly one
    /// opponent reply. Returns the rounds this produced.
    pub fn play<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        rng: &mut R,
    ) -> Result<&[RoundResult], BattleError> {
        if self.mode != BattleMode::VersusAi {
            return Err(BattleError::StaleAction);
        }

        let start = self.rounds.len();
        self.submit(Side::Challenger, action, rng)?;
        if !self.is_terminal() {
            self.auto_step(rng)?;
        }
        Ok(&self.rounds[start..])
    }

    /// Force the absorbing `Abandoned` state
    pub fn abandon(&mut self) {
        if !self.is_terminal() {
            self.state = BattleState::Abandoned;
        }
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let from = self.rounds.len().saturating_sub(SNAPSHOT_LOG_LEN);
        BattleSnapshot {
            state: self.state,
            turn: self.turn(),
            challenger: FighterView::from(&self.challenger),
            opponent: FighterView::from(&self.opponent),
            recent: self.rounds[from..].to_vec(),
        }
    }

    /// Consume a finished battle and compute its outcome
    pub fn finalize<R: Rng + ?Sized>(
        self,
        table: &RewardTable,
        rng: &mut R,
    ) -> Result<BattleOutcome, BattleError> {
        let (result, victor) = match self.state {
            BattleState::Victory => (BattleResult::Victory, Some(Side::Challenger)),
            BattleState::Defeat => (BattleResult::Defeat, Some(Side::Opponent)),
            BattleState::Abandoned => (BattleResult::Abandoned, None),
            _ => return Err(BattleError::NotFinished),
        };

        let mut outcome = BattleOutcome {
            result,
            victor,
            victor_name: None,
            challenger: self.challenger.combatant.source,
            opponent: self.opponent.combatant.source,
            rounds: Vec::new(),
            reward_experience: 0,
            reward_currency: 0,
            consolation_currency: 0,
            leveled_up: false,
            new_level: None,
            stat_gains: None,
        };

        if let Some(side) = victor {
            let winner = &self.fighter(side).combatant;
            let loser = &self.fighter(side.other()).combatant;

            let rewards = table.compute_rewards(loser.level);
            let level_up = roll_level_up(
                winner.level,
                winner.experience.saturating_add(rewards.experience),
                rng,
            );

            outcome.victor_name = Some(winner.name.clone());
            outcome.reward_experience = rewards.experience;
            outcome.reward_currency = rewards.currency;
            outcome.consolation_currency = table.consolation(winner.level);
            outcome.leveled_up = level_up.is_some();
            outcome.new_level = level_up.map(|l| l.new_level);
            outcome.stat_gains = level_up.map(|l| l.gains);
        }

        outcome.rounds = self.rounds;
        Ok(outcome)
    }
}
