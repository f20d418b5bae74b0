use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

/// A card is a tuple of a uInt8 value (2u8 ... ace=14u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    pub deck_idx: usize,
}

impl Deck {
    pub fn deal_card(&mut self) -> Card {
        let card = self.cards[self.deck_idx];
        self.deck_idx += 1;
        card
    }

    pub fn deal(&mut self, count: usize) -> Vec<Card> {
        (0..count).map(|_| self.deal_card()).collect()
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
        self.deck_idx = 0;
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards: [Card; 52] = [Card(2, Suit::Club); 52];
        for (i, value) in (2u8..=14u8).enumerate() {
            for (j, suit) in [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart]
                .into_iter()
                .enumerate()
            {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Durable identity token supplied by the client. Survives reconnects;
/// independent of the transient connection handle.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Type alias for transient transport connection handles.
pub type ConnectionId = String;

/// Type alias for numbered rank tokens. Tokens run 1..=N each phase,
/// N being the count of non-observer players at phase start.
pub type TokenValue = u8;

/// Betting phases in their fixed order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Result,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Preflop,
        Phase::Flop,
        Phase::Turn,
        Phase::River,
        Phase::Showdown,
        Phase::Result,
    ];

    /// Community cards visible as of this phase.
    pub fn community_len(self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River | Self::Showdown | Self::Result => 5,
        }
    }

    pub fn color(self) -> ChipColor {
        match self {
            Self::Preflop => ChipColor::White,
            Self::Flop => ChipColor::Yellow,
            Self::Turn => ChipColor::Orange,
            Self::River | Self::Showdown | Self::Result => ChipColor::Red,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "PREFLOP",
            Self::Flop => "FLOP",
            Self::Turn => "TURN",
            Self::River => "RIVER",
            Self::Showdown => "SHOWDOWN",
            Self::Result => "RESULT",
        };
        write!(f, "{repr}")
    }
}

/// Color of the rank tokens handed out for a given phase.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipColor {
    White,
    Yellow,
    Orange,
    Red,
}

impl fmt::Display for ChipColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::White => "white",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        };
        write!(f, "{repr}")
    }
}

/// One archived token claim, appended per player per phase transition
/// where a token was held.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TokenRecord {
    pub phase: Phase,
    pub color: ChipColor,
    pub value: TokenValue,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Empty until a hand is dealt; exactly two cards otherwise.
    pub hole_cards: Vec<Card>,
    pub held_token: Option<TokenValue>,
    pub token_history: Vec<TokenRecord>,
    pub is_settled: bool,
    pub is_observer: bool,
    pub queued_to_join: bool,
    pub is_connected: bool,
    pub disconnected_at: Option<DateTime<Utc>>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: String, is_observer: bool) -> Self {
        Self {
            id,
            name,
            hole_cards: Vec::with_capacity(constants::HOLE_CARDS),
            held_token: None,
            token_history: Vec::new(),
            is_settled: false,
            is_observer,
            queued_to_join: false,
            is_connected: true,
            disconnected_at: None,
        }
    }

    /// Clear all per-hand state. Identity, connection liveness, and
    /// observer flags are untouched.
    pub fn reset_hand(&mut self) {
        self.hole_cards.clear();
        self.held_token = None;
        self.token_history.clear();
        self.is_settled = false;
    }
}

/// One bounded chat log entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatEntry {
    pub author: String,
    pub text: String,
    pub from_observer: bool,
    pub sent_at: DateTime<Utc>,
}

/// A short-lived, purely cosmetic targeted notification. Expiry is
/// evaluated lazily when snapshots are built.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TomatoEvent {
    pub from: String,
    pub to: String,
    pub thrown_at: DateTime<Utc>,
}

/// Phase as reported to viewers: the `LOBBY` pseudo-state before any
/// hand has started, otherwise the running phase.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TablePhase {
    Lobby,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Result,
}

impl From<Phase> for TablePhase {
    fn from(value: Phase) -> Self {
        match value {
            Phase::Preflop => Self::Preflop,
            Phase::Flop => Self::Flop,
            Phase::Turn => Self::Turn,
            Phase::River => Self::River,
            Phase::Showdown => Self::Showdown,
            Phase::Result => Self::Result,
        }
    }
}

/// A player as seen by one viewer. `hole_cards` is empty unless the
/// visibility rules reveal it to that viewer.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub hole_cards: Vec<Card>,
    pub held_token: Option<TokenValue>,
    pub token_history: Vec<TokenRecord>,
    pub is_settled: bool,
    pub is_observer: bool,
    pub queued_to_join: bool,
    pub is_connected: bool,
}

/// The session projected for a single viewer.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SessionView {
    pub phase: TablePhase,
    pub chip_color: ChipColor,
    pub community_cards: Vec<Card>,
    /// Always sorted ascending for deterministic display.
    pub tokens_available: Vec<TokenValue>,
    pub players: Vec<PlayerView>,
    pub me: Option<PlayerView>,
    pub vaults: u8,
    pub alarms: u8,
    pub result_message: String,
    /// Per-phase retrospective rows; present only once the hand has
    /// reached `RESULT`.
    pub result_details: Option<Vec<crate::game::showdown::PhaseDetail>>,
    pub chat_log: Vec<ChatEntry>,
    pub tomato_event: Option<TomatoEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Spade).to_string(), "A♠");
        assert_eq!(Card(13, Suit::Heart).to_string(), "K♥");
        assert_eq!(Card(12, Suit::Diamond).to_string(), "Q♦");
        assert_eq!(Card(11, Suit::Club).to_string(), "J♣");
        assert_eq!(Card(10, Suit::Spade).to_string(), "10♠");
        assert_eq!(Card(2, Suit::Club).to_string(), "2♣");
    }

    #[test]
    fn test_deck_deals_all_unique_cards() {
        let mut deck = Deck::default();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..52 {
            seen.insert(deck.deal_card());
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(deck.deck_idx, 52);
    }

    #[test]
    fn test_deck_shuffle_resets_index() {
        let mut deck = Deck::default();
        deck.deal_card();
        deck.deal_card();
        assert_eq!(deck.deck_idx, 2);
        deck.shuffle();
        assert_eq!(deck.deck_idx, 0);
    }

    #[test]
    fn test_deck_values_in_range() {
        let mut deck = Deck::default();
        for _ in 0..52 {
            let Card(value, _) = deck.deal_card();
            assert!((2..=14).contains(&value));
        }
    }

    #[test]
    fn test_player_id_trims() {
        let id = PlayerId::new("  abc-123  ");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn test_player_id_empty_after_trim() {
        assert!(PlayerId::new("   ").is_empty());
        assert!(!PlayerId::new("x").is_empty());
    }

    #[test]
    fn test_phase_sequence_order() {
        assert_eq!(Phase::ALL[0], Phase::Preflop);
        assert_eq!(Phase::ALL[5], Phase::Result);
        assert_eq!(Phase::ALL.len(), 6);
    }

    #[test]
    fn test_phase_community_lengths() {
        assert_eq!(Phase::Preflop.community_len(), 0);
        assert_eq!(Phase::Flop.community_len(), 3);
        assert_eq!(Phase::Turn.community_len(), 4);
        assert_eq!(Phase::River.community_len(), 5);
        assert_eq!(Phase::Result.community_len(), 5);
    }

    #[test]
    fn test_phase_colors() {
        assert_eq!(Phase::Preflop.color(), ChipColor::White);
        assert_eq!(Phase::Flop.color(), ChipColor::Yellow);
        assert_eq!(Phase::Turn.color(), ChipColor::Orange);
        assert_eq!(Phase::River.color(), ChipColor::Red);
        assert_eq!(Phase::Showdown.color(), ChipColor::Red);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Preflop.to_string(), "PREFLOP");
        assert_eq!(Phase::Showdown.to_string(), "SHOWDOWN");
    }

    #[test]
    fn test_player_new_defaults() {
        let player = Player::new(PlayerId::new("p1"), "alice".to_string(), false);
        assert!(player.hole_cards.is_empty());
        assert!(player.held_token.is_none());
        assert!(player.is_connected);
        assert!(!player.is_observer);
        assert!(!player.queued_to_join);
        assert!(player.disconnected_at.is_none());
    }

    #[test]
    fn test_player_reset_hand() {
        let mut player = Player::new(PlayerId::new("p1"), "alice".to_string(), false);
        player.hole_cards = vec![Card(14, Suit::Spade), Card(13, Suit::Heart)];
        player.held_token = Some(2);
        player.token_history.push(TokenRecord {
            phase: Phase::Preflop,
            color: ChipColor::White,
            value: 2,
        });
        player.is_settled = true;

        player.reset_hand();

        assert!(player.hole_cards.is_empty());
        assert!(player.held_token.is_none());
        assert!(player.token_history.is_empty());
        assert!(!player.is_settled);
    }

    #[test]
    fn test_table_phase_from_phase() {
        assert_eq!(TablePhase::from(Phase::Preflop), TablePhase::Preflop);
        assert_eq!(TablePhase::from(Phase::Result), TablePhase::Result);
    }
}
