//! Session actor message types.
//!
//! One variant per transport-facing operation. Mutating variants carry
//! a oneshot responder; the reply is for the requester only and is
//! never broadcast.

use tokio::sync::{mpsc, oneshot};

use crate::game::TokenSource;
use crate::game::entities::{ConnectionId, PlayerId, SessionView, TokenValue};

/// Messages that can be sent to a `SessionActor`.
#[derive(Debug)]
pub enum SessionMessage {
    /// Join as a new player or reconnect an existing identity.
    Join {
        connection_id: ConnectionId,
        player_id: PlayerId,
        name: String,
        observer: bool,
        response: oneshot::Sender<SessionResponse>,
    },

    /// A transport connection dropped. Fire-and-forget.
    Disconnect { connection_id: ConnectionId },

    /// Purge a disconnected player permanently.
    RemovePlayer {
        connection_id: ConnectionId,
        target: PlayerId,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Change the caller's display name.
    ChangeName {
        connection_id: ConnectionId,
        name: String,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Append to the session chat log.
    Chat {
        connection_id: ConnectionId,
        text: String,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Throw a tomato at another player.
    ThrowTomato {
        connection_id: ConnectionId,
        target: PlayerId,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Deal a fresh hand.
    StartHand {
        response: oneshot::Sender<SessionResponse>,
    },

    /// Zero both counters and deal a fresh hand.
    RestartRun {
        response: oneshot::Sender<SessionResponse>,
    },

    /// Claim a token from the bank or another player.
    TakeToken {
        connection_id: ConnectionId,
        value: TokenValue,
        source: TokenSource,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Put the caller's held token back in the bank.
    ReturnToken {
        connection_id: ConnectionId,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Flip the caller's settlement flag.
    ToggleSettle {
        connection_id: ConnectionId,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Snapshot the session from one connection's point of view.
    GetState {
        connection_id: ConnectionId,
        response: oneshot::Sender<SessionView>,
    },

    /// Subscribe to state change notifications.
    Subscribe {
        connection_id: ConnectionId,
        sender: mpsc::Sender<StateChange>,
    },

    /// Unsubscribe from state change notifications.
    Unsubscribe { connection_id: ConnectionId },
}

/// Notification sent when session state changes. Receivers are
/// expected to pull a fresh snapshot; the notification itself carries
/// no game state.
#[derive(Debug, Clone)]
pub enum StateChange {
    /// Any accepted mutation.
    Updated,
    /// A tomato was thrown; transports may surface it immediately.
    TomatoThrown { from: String, to: String },
}

/// Response from session operations.
#[derive(Debug, Clone)]
pub enum SessionResponse {
    /// Operation succeeded.
    Success,

    /// Operation succeeded with a message for the requester.
    SuccessWithMessage(String),

    /// Operation rejected with a displayable reason.
    Error(String),
}

impl SessionResponse {
    /// Check if the response is a success.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SessionResponse::Success | SessionResponse::SuccessWithMessage(_)
        )
    }

    /// Get the rejection reason if the response is an error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionResponse::Error(msg) => Some(msg),
            _ => None,
        }
    }
}
