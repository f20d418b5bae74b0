//! The session aggregate: identity registry, phase machine, token
//! economy, showdown wiring, and the per-viewer snapshot builder.
//!
//! A [`Game`] is a single shared mutable resource. It exposes only
//! synchronous state-transition operations and never initiates I/O;
//! the session actor owns it and serializes all access.

use chrono::{TimeDelta, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use thiserror::Error;

use super::constants;
use super::entities::{
    Card, ChatEntry, ConnectionId, Deck, Phase, Player, PlayerId, PlayerView, SessionView,
    TablePhase, TokenRecord, TokenValue, TomatoEvent,
};
use super::eval::{FiveCardEvaluator, HandEvaluator};
use super::showdown::{self, Claimant, PhaseDetail, ShowdownReport};
use crate::session::SessionConfig;

/// Errors reported to the acting player. Every variant is recoverable:
/// a rejected action leaves the session in a valid state, and the
/// message is meant for direct display to the requester.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("player id cannot be empty")]
    EmptyPlayerId,
    #[error("name cannot be empty")]
    EmptyName,
    #[error("name already taken")]
    NameTaken,
    #[error("need at least {needed} players to start a heist")]
    NotEnoughPlayers { needed: usize },
    #[error("player does not exist")]
    UnknownPlayer,
    #[error("not joined yet")]
    NotJoined,
    #[error("player is still connected")]
    StillConnected,
    #[error("observers sit this hand out")]
    ObserverExcluded,
    #[error("already settled")]
    AlreadySettled,
    #[error("no hand dealt yet")]
    NoHandDealt,
    #[error("token {0} is not in the bank")]
    TokenUnavailable(TokenValue),
    #[error("that player is not holding token {0}")]
    TokenNotHeldBy(TokenValue),
    #[error("no token to return")]
    NoTokenHeld,
    #[error("chat message cannot be empty")]
    EmptyChatMessage,
}

/// Where a taken token comes from: the shared bank, or another
/// player's hand (a steal).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TokenSource {
    Bank,
    Player(PlayerId),
}

/// What a successful join did.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum JoinOutcome {
    Joined,
    Reconnected,
    QueuedForNextHand,
}

impl fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Joined => "joined the table",
            Self::Reconnected => "reconnected",
            Self::QueuedForNextHand => "queued for the next hand",
        };
        write!(f, "{repr}")
    }
}

/// The singleton session aggregate. Created once per process; hands
/// are reset in place by `start`/`restart_full_game`.
pub struct Game {
    config: SessionConfig,
    evaluator: Box<dyn HandEvaluator>,
    /// Insertion-ordered so snapshots list players in join order.
    players: Vec<Player>,
    /// Many connections may map to one identity; a surviving mapping
    /// is what keeps a player "connected".
    connections: HashMap<ConnectionId, PlayerId>,
    deck: Deck,
    community: Vec<Card>,
    phase_idx: usize,
    started: bool,
    /// Kept sorted ascending at all times.
    tokens_available: Vec<TokenValue>,
    vaults: u8,
    alarms: u8,
    result: Option<ShowdownReport>,
    chat: VecDeque<ChatEntry>,
    tomato: Option<TomatoEvent>,
}

impl Game {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_evaluator(config, Box::new(FiveCardEvaluator))
    }

    #[must_use]
    pub fn with_evaluator(config: SessionConfig, evaluator: Box<dyn HandEvaluator>) -> Self {
        Self {
            config,
            evaluator,
            players: Vec::new(),
            connections: HashMap::new(),
            deck: Deck::default(),
            community: Vec::with_capacity(5),
            phase_idx: 0,
            started: false,
            tokens_available: Vec::new(),
            vaults: 0,
            alarms: 0,
            result: None,
            chat: VecDeque::with_capacity(constants::CHAT_LOG_CAP),
            tomato: None,
        }
    }

    // --- Identity & connection registry ---

    /// Join as a new player or reconnect an existing identity. The
    /// connection mapping is always (re)established on success.
    pub fn join_or_reconnect(
        &mut self,
        conn: &str,
        id: &PlayerId,
        name: &str,
        wants_observer: bool,
    ) -> Result<JoinOutcome, GameError> {
        if id.is_empty() {
            return Err(GameError::EmptyPlayerId);
        }
        let name = clip(name, constants::MAX_NAME_LEN);
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.name_taken(&name, id) {
            return Err(GameError::NameTaken);
        }

        let outcome = match self.player_index(id) {
            Some(idx) => {
                {
                    let player = &mut self.players[idx];
                    player.name = name;
                    player.is_connected = true;
                    player.disconnected_at = None;
                }
                if wants_observer {
                    self.enter_observer_mode(idx);
                    JoinOutcome::Reconnected
                } else if self.started && self.players[idx].hole_cards.is_empty() {
                    // No hand to pick back up, so sit out until the
                    // next deal rather than rejecting the reconnect.
                    self.enter_observer_mode(idx);
                    self.players[idx].queued_to_join = true;
                    JoinOutcome::QueuedForNextHand
                } else {
                    self.players[idx].is_observer = false;
                    self.players[idx].queued_to_join = false;
                    JoinOutcome::Reconnected
                }
            }
            None => {
                let mut player = Player::new(id.clone(), name, wants_observer);
                if self.started && !wants_observer {
                    player.is_observer = true;
                    player.queued_to_join = true;
                    self.players.push(player);
                    JoinOutcome::QueuedForNextHand
                } else {
                    self.players.push(player);
                    JoinOutcome::Joined
                }
            }
        };

        self.connections.insert(conn.to_string(), id.clone());
        info!("{id} {outcome}");
        Ok(outcome)
    }

    /// Drop a connection mapping. The owning player is marked
    /// disconnected only once no other live connection remains.
    pub fn handle_disconnect(&mut self, conn: &str) -> bool {
        let Some(id) = self.connections.remove(conn) else {
            return false;
        };
        let still_connected = self.connections.values().any(|mapped| *mapped == id);
        if !still_connected
            && let Some(idx) = self.player_index(&id)
        {
            self.players[idx].is_connected = false;
            self.players[idx].disconnected_at = Some(Utc::now());
            info!("{id} disconnected");
        }
        true
    }

    /// Permanently purge a disconnected player: their connection
    /// mappings, held token, and accumulated state are all dropped.
    pub fn remove_disconnected_player(&mut self, id: &PlayerId) -> Result<(), GameError> {
        let idx = self.player_index(id).ok_or(GameError::UnknownPlayer)?;
        if self.players[idx].is_connected {
            return Err(GameError::StillConnected);
        }
        self.connections.retain(|_, mapped| mapped != id);
        if let Some(value) = self.players[idx].held_token.take() {
            self.release_to_bank(value);
        }
        self.players.remove(idx);
        info!("{id} removed while disconnected");
        Ok(())
    }

    pub fn change_display_name(&mut self, id: &PlayerId, name: &str) -> Result<(), GameError> {
        let name = clip(name, constants::MAX_NAME_LEN);
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.name_taken(&name, id) {
            return Err(GameError::NameTaken);
        }
        let idx = self.player_index(id).ok_or(GameError::UnknownPlayer)?;
        self.players[idx].name = name;
        Ok(())
    }

    pub fn player_id_for_connection(&self, conn: &str) -> Option<PlayerId> {
        self.connections.get(conn).cloned()
    }

    // --- Phase state machine ---

    /// Deal a fresh hand. Requires enough participants (players who
    /// are active now or queued to join); promotes the queued, resets
    /// maxed-out counters, and initializes the token bank.
    pub fn start(&mut self) -> Result<(), GameError> {
        let participating = self
            .players
            .iter()
            .filter(|p| !p.is_observer || p.queued_to_join)
            .count();
        if participating < self.config.min_players {
            return Err(GameError::NotEnoughPlayers {
                needed: self.config.min_players,
            });
        }

        if self.vaults >= constants::COUNTER_LIMIT || self.alarms >= constants::COUNTER_LIMIT {
            self.vaults = 0;
            self.alarms = 0;
        }

        for player in &mut self.players {
            if player.queued_to_join {
                player.is_observer = false;
                player.queued_to_join = false;
            }
        }

        self.deck.shuffle();
        self.community.clear();
        self.phase_idx = 0;
        self.result = None;
        self.started = true;

        for idx in 0..self.players.len() {
            self.players[idx].reset_hand();
            if !self.players[idx].is_observer {
                self.players[idx].hole_cards = self.deck.deal(constants::HOLE_CARDS);
            }
        }
        self.setup_phase_tokens();

        info!("hand started with {participating} players");
        Ok(())
    }

    /// Zero both counters unconditionally and deal a fresh hand.
    pub fn restart_full_game(&mut self) -> Result<(), GameError> {
        self.vaults = 0;
        self.alarms = 0;
        self.start()
    }

    /// Advance to the next phase. No-op past the terminal phase.
    /// Reached only through the settle quorum.
    fn advance_phase(&mut self) {
        if self.phase_idx + 1 >= Phase::ALL.len() {
            return;
        }

        // Archive held tokens under the phase that is ending.
        let current = self.current_phase();
        for player in &mut self.players {
            if let Some(value) = player.held_token {
                player.token_history.push(TokenRecord {
                    phase: current,
                    color: current.color(),
                    value,
                });
            }
        }

        self.phase_idx += 1;
        let phase = self.current_phase();
        debug!("phase advanced to {phase}");
        match phase {
            Phase::Flop => {
                self.reveal_community(3);
                self.setup_phase_tokens();
            }
            Phase::Turn | Phase::River => {
                self.reveal_community(1);
                self.setup_phase_tokens();
            }
            Phase::Showdown => {
                // No observable pause at SHOWDOWN: score and land on
                // RESULT within the same transition.
                self.evaluate_showdown();
                self.phase_idx += 1;
            }
            Phase::Preflop | Phase::Result => {}
        }
    }

    fn reveal_community(&mut self, count: usize) {
        let cards = self.deck.deal(count);
        self.community.extend(cards);
    }

    /// Return every token to the bank and clear settlement for a new
    /// betting phase. Token values run 1..=N for the current count of
    /// non-observer players.
    fn setup_phase_tokens(&mut self) {
        let n = self.players.iter().filter(|p| !p.is_observer).count();
        self.tokens_available = (1..=n as TokenValue).collect();
        for player in &mut self.players {
            player.held_token = None;
            player.is_settled = false;
        }
    }

    // --- Token economy ---

    /// Claim a token from the bank or steal it from another player.
    /// Any token the actor already holds goes back to the bank first.
    pub fn take_token(
        &mut self,
        actor: &PlayerId,
        value: TokenValue,
        source: &TokenSource,
    ) -> Result<(), GameError> {
        let actor_idx = self.player_index(actor).ok_or(GameError::UnknownPlayer)?;
        {
            let player = &self.players[actor_idx];
            if player.is_settled {
                return Err(GameError::AlreadySettled);
            }
            if player.is_observer {
                return Err(GameError::ObserverExcluded);
            }
            if player.hole_cards.is_empty() {
                return Err(GameError::NoHandDealt);
            }
        }

        if let Some(held) = self.players[actor_idx].held_token.take() {
            self.release_to_bank(held);
        }

        match source {
            TokenSource::Bank => {
                let pos = self
                    .tokens_available
                    .iter()
                    .position(|&t| t == value)
                    .ok_or(GameError::TokenUnavailable(value))?;
                self.tokens_available.remove(pos);
            }
            TokenSource::Player(victim_id) => {
                let victim_idx = self
                    .player_index(victim_id)
                    .filter(|&idx| self.players[idx].held_token == Some(value))
                    .ok_or(GameError::TokenNotHeldBy(value))?;
                // The victim has to re-settle after losing the token.
                self.players[victim_idx].held_token = None;
                self.players[victim_idx].is_settled = false;
            }
        }

        self.players[actor_idx].held_token = Some(value);
        Ok(())
    }

    pub fn return_token(&mut self, id: &PlayerId) -> Result<(), GameError> {
        let idx = self.player_index(id).ok_or(GameError::UnknownPlayer)?;
        {
            let player = &self.players[idx];
            if player.is_settled {
                return Err(GameError::AlreadySettled);
            }
            if player.is_observer {
                return Err(GameError::ObserverExcluded);
            }
        }
        let value = self.players[idx]
            .held_token
            .take()
            .ok_or(GameError::NoTokenHeld)?;
        self.release_to_bank(value);
        Ok(())
    }

    /// Flip the caller's settlement flag. When every connected
    /// non-observer is settled on a held token, the phase advances as
    /// a side effect; absent players never block the table.
    pub fn toggle_settle(&mut self, id: &PlayerId) -> Result<(), GameError> {
        let idx = self.player_index(id).ok_or(GameError::UnknownPlayer)?;
        {
            let player = &self.players[idx];
            if player.is_observer {
                return Err(GameError::ObserverExcluded);
            }
            if player.held_token.is_none() {
                return Err(GameError::NoTokenHeld);
            }
        }
        self.players[idx].is_settled = !self.players[idx].is_settled;

        let all_settled = {
            let mut quorum = self
                .players
                .iter()
                .filter(|p| p.is_connected && !p.is_observer)
                .peekable();
            quorum.peek().is_some() && quorum.all(|p| p.is_settled && p.held_token.is_some())
        };
        if all_settled {
            self.advance_phase();
        }
        Ok(())
    }

    // --- Chat & tomato ---

    pub fn add_chat_message(&mut self, id: &PlayerId, text: &str) -> Result<(), GameError> {
        let idx = self.player_index(id).ok_or(GameError::UnknownPlayer)?;
        let text = clip(text, self.config.max_chat_len);
        if text.is_empty() {
            return Err(GameError::EmptyChatMessage);
        }
        let entry = ChatEntry {
            author: self.players[idx].name.clone(),
            text,
            from_observer: self.players[idx].is_observer,
            sent_at: Utc::now(),
        };
        if self.chat.len() >= self.config.chat_log_cap {
            self.chat.pop_front();
        }
        self.chat.push_back(entry);
        Ok(())
    }

    /// Record a tomato throw. The returned event lets the transport
    /// fan it out immediately; snapshots drop it after the TTL.
    pub fn throw_tomato(
        &mut self,
        from: &PlayerId,
        target: &PlayerId,
    ) -> Result<TomatoEvent, GameError> {
        let from_idx = self.player_index(from).ok_or(GameError::UnknownPlayer)?;
        let target_idx = self.player_index(target).ok_or(GameError::UnknownPlayer)?;
        let event = TomatoEvent {
            from: self.players[from_idx].name.clone(),
            to: self.players[target_idx].name.clone(),
            thrown_at: Utc::now(),
        };
        self.tomato = Some(event.clone());
        Ok(event)
    }

    // --- Showdown ---

    fn evaluate_showdown(&mut self) {
        let claimants: Vec<Claimant> = self
            .players
            .iter()
            .filter(|p| !p.is_observer && !p.hole_cards.is_empty())
            .filter_map(|p| {
                p.held_token.map(|token| Claimant {
                    name: p.name.clone(),
                    token,
                    hole_cards: p.hole_cards.clone(),
                })
            })
            .collect();

        let claims = showdown::score_claims(&claimants, &self.community, self.evaluator.as_ref());
        let total_error = showdown::total_error(&claims);
        let max_error = showdown::max_error(&claims);
        let success = max_error == 0;

        let limit = constants::COUNTER_LIMIT;
        let mut lines = Vec::new();
        if success {
            self.vaults += 1;
            lines.push(format!("VAULT CRACKED! ({}/{limit})", self.vaults));
        } else {
            self.alarms += 1;
            lines.push(format!("ALARM TRIPPED! ({}/{limit})", self.alarms));
        }
        lines.extend(showdown::narrative_lines(&claims));
        if self.alarms >= limit {
            lines.push("GAME OVER! THE POLICE ARRIVED!".to_string());
        } else if self.vaults >= limit {
            lines.push("YOU WIN! RETIRE RICH!".to_string());
        }

        let phase_details = self.build_phase_details();
        info!(
            "showdown scored: success={success} total_error={total_error} max_error={max_error}"
        );

        self.result = Some(ShowdownReport {
            success,
            total_error,
            max_error,
            claims,
            narrative: lines.join("\n"),
            phase_details,
        });
    }

    /// Retrospective per-phase accuracy: judge each earlier betting
    /// phase with only the community cards revealed by then and the
    /// tokens archived for it.
    fn build_phase_details(&self) -> Vec<PhaseDetail> {
        [Phase::Flop, Phase::Turn, Phase::River]
            .into_iter()
            .map(|phase| {
                let visible = phase.community_len().min(self.community.len());
                let holders: Vec<Claimant> = self
                    .players
                    .iter()
                    .filter(|p| !p.is_observer && !p.hole_cards.is_empty())
                    .filter_map(|p| {
                        archived_token(p, phase).map(|value| Claimant {
                            name: p.name.clone(),
                            token: value,
                            hole_cards: p.hole_cards.clone(),
                        })
                    })
                    .collect();
                PhaseDetail {
                    phase,
                    rows: showdown::phase_rows(
                        &holders,
                        &self.community[..visible],
                        self.evaluator.as_ref(),
                    ),
                }
            })
            .collect()
    }

    // --- Snapshots ---

    /// Project the session for one viewer, applying the hole-card
    /// visibility rules and the lazy tomato expiry.
    pub fn get_state(&self, viewer: Option<&PlayerId>) -> SessionView {
        let phase = self.current_phase();
        let reported = if self.started {
            TablePhase::from(phase)
        } else {
            TablePhase::Lobby
        };
        let show_all = reported == TablePhase::Result;
        let viewer_player = viewer.and_then(|id| {
            self.player_index(id)
                .map(|idx| &self.players[idx])
        });
        let viewer_is_observer = viewer_player.is_some_and(|p| p.is_observer);

        let players = self
            .players
            .iter()
            .map(|p| {
                let reveal = show_all
                    || viewer_is_observer
                    || viewer_player.is_some_and(|viewer| viewer.id == p.id);
                player_view(p, reveal)
            })
            .collect();
        let me = viewer_player.map(|p| player_view(p, true));

        let ttl = TimeDelta::milliseconds(self.config.tomato_ttl_ms as i64);
        let tomato_event = self
            .tomato
            .as_ref()
            .filter(|event| Utc::now() - event.thrown_at < ttl)
            .cloned();

        SessionView {
            phase: reported,
            chip_color: phase.color(),
            community_cards: self.community.clone(),
            tokens_available: self.tokens_available.clone(),
            players,
            me,
            vaults: self.vaults,
            alarms: self.alarms,
            result_message: self
                .result
                .as_ref()
                .map(|r| r.narrative.clone())
                .unwrap_or_default(),
            result_details: if show_all {
                self.result.as_ref().map(|r| r.phase_details.clone())
            } else {
                None
            },
            chat_log: self.chat.iter().cloned().collect(),
            tomato_event,
        }
    }

    pub fn state_for_connection(&self, conn: &str) -> SessionView {
        let viewer = self.connections.get(conn).cloned();
        self.get_state(viewer.as_ref())
    }

    // --- Helpers ---

    fn current_phase(&self) -> Phase {
        *Phase::ALL.get(self.phase_idx).unwrap_or(&Phase::Result)
    }

    fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *id)
    }

    fn name_taken(&self, name: &str, except: &PlayerId) -> bool {
        self.players
            .iter()
            .any(|p| p.id != *except && p.name.eq_ignore_ascii_case(name))
    }

    fn release_to_bank(&mut self, value: TokenValue) {
        if let Err(pos) = self.tokens_available.binary_search(&value) {
            self.tokens_available.insert(pos, value);
        }
    }

    /// Move a player into observer mode: any held token goes back to
    /// the bank and their hand/settlement state is cleared.
    fn enter_observer_mode(&mut self, idx: usize) {
        if let Some(value) = self.players[idx].held_token.take() {
            self.release_to_bank(value);
        }
        let player = &mut self.players[idx];
        player.is_observer = true;
        player.queued_to_join = false;
        player.hole_cards.clear();
        player.is_settled = false;
    }
}

/// Archived token for a phase: exact phase-name match first, falling
/// back to the first record with the phase's chip color.
fn archived_token(player: &Player, phase: Phase) -> Option<TokenValue> {
    player
        .token_history
        .iter()
        .find(|record| record.phase == phase)
        .or_else(|| {
            player
                .token_history
                .iter()
                .find(|record| record.color == phase.color())
        })
        .map(|record| record.value)
}

fn player_view(player: &Player, reveal_hand: bool) -> PlayerView {
    PlayerView {
        id: player.id.clone(),
        name: player.name.clone(),
        hole_cards: if reveal_hand {
            player.hole_cards.clone()
        } else {
            Vec::new()
        },
        held_token: player.held_token,
        token_history: player.token_history.clone(),
        is_settled: player.is_settled,
        is_observer: player.is_observer,
        queued_to_join: player.queued_to_join,
        is_connected: player.is_connected,
    }
}

/// Trim and truncate user-supplied text to a character cap.
fn clip(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}
