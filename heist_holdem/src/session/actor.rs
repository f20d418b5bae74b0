//! Session actor with serialized message handling.

use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use super::messages::{SessionMessage, SessionResponse, StateChange};
use crate::game::{Game, GameError};
use crate::game::entities::{ConnectionId, PlayerId};

/// Cloneable handle for sending messages to the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub fn new(sender: mpsc::Sender<SessionMessage>) -> Self {
        Self { sender }
    }

    /// Send a message to the session.
    pub async fn send(&self, message: SessionMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Session is closed".to_string())
    }
}

/// Actor owning the game aggregate. All mutations flow through its
/// inbox one at a time, which is the entire concurrency story: an
/// action either completes atomically or is rejected synchronously.
pub struct SessionActor {
    game: Game,

    /// Message inbox.
    inbox: mpsc::Receiver<SessionMessage>,

    /// Subscribers for state change notifications, keyed by the
    /// connection that registered them.
    subscribers: HashMap<ConnectionId, mpsc::Sender<StateChange>>,
}

impl SessionActor {
    /// Create the actor and a handle for sending messages to it.
    pub fn new(game: Game) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let actor = Self {
            game,
            inbox,
            subscribers: HashMap::new(),
        };
        (actor, SessionHandle::new(sender))
    }

    /// Run the actor event loop until every handle is dropped.
    pub async fn run(mut self) {
        info!("session actor started");
        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
        }
        info!("session actor stopped");
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join {
                connection_id,
                player_id,
                name,
                observer,
                response,
            } => {
                let result = self
                    .game
                    .join_or_reconnect(&connection_id, &player_id, &name, observer)
                    .map(|outcome| outcome.to_string());
                let ok = result.is_ok();
                let _ = response.send(to_response(result));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::Disconnect { connection_id } => {
                self.subscribers.remove(&connection_id);
                if self.game.handle_disconnect(&connection_id) {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::RemovePlayer {
                connection_id,
                target,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|_| self.game.remove_disconnected_player(&target));
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::ChangeName {
                connection_id,
                name,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|id| self.game.change_display_name(&id, &name));
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::Chat {
                connection_id,
                text,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|id| self.game.add_chat_message(&id, &text));
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::ThrowTomato {
                connection_id,
                target,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|id| self.game.throw_tomato(&id, &target));
                match result {
                    Ok(event) => {
                        let _ = response.send(SessionResponse::Success);
                        self.notify_state_change(StateChange::TomatoThrown {
                            from: event.from,
                            to: event.to,
                        });
                    }
                    Err(err) => {
                        let _ = response.send(SessionResponse::Error(err.to_string()));
                    }
                }
            }

            SessionMessage::StartHand { response } => {
                let result = self.game.start();
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::RestartRun { response } => {
                let result = self.game.restart_full_game();
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::TakeToken {
                connection_id,
                value,
                source,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|id| self.game.take_token(&id, value, &source));
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::ReturnToken {
                connection_id,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|id| self.game.return_token(&id));
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::ToggleSettle {
                connection_id,
                response,
            } => {
                let result = self
                    .require_player(&connection_id)
                    .and_then(|id| self.game.toggle_settle(&id));
                let ok = result.is_ok();
                let _ = response.send(to_response(result.map(|()| String::new())));
                if ok {
                    self.notify_state_change(StateChange::Updated);
                }
            }

            SessionMessage::GetState {
                connection_id,
                response,
            } => {
                let _ = response.send(self.game.state_for_connection(&connection_id));
            }

            SessionMessage::Subscribe {
                connection_id,
                sender,
            } => {
                debug!("connection {connection_id} subscribed to state changes");
                self.subscribers.insert(connection_id, sender);
            }

            SessionMessage::Unsubscribe { connection_id } => {
                debug!("connection {connection_id} unsubscribed from state changes");
                self.subscribers.remove(&connection_id);
            }
        }
    }

    /// Resolve the player behind a connection, rejecting unjoined
    /// connections uniformly.
    fn require_player(&self, connection_id: &str) -> Result<PlayerId, GameError> {
        self.game
            .player_id_for_connection(connection_id)
            .ok_or(GameError::NotJoined)
    }

    /// Broadcast a state change to all subscribers, dropping the ones
    /// whose channels have closed.
    fn notify_state_change(&mut self, change: StateChange) {
        self.subscribers.retain(|connection_id, sender| {
            match sender.try_send(change.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("subscriber {connection_id} channel full, dropping notification");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("subscriber {connection_id} gone, removing");
                    false
                }
            }
        });
    }
}

fn to_response(result: Result<String, GameError>) -> SessionResponse {
    match result {
        Ok(message) if message.is_empty() => SessionResponse::Success,
        Ok(message) => SessionResponse::SuccessWithMessage(message),
        Err(err) => SessionResponse::Error(err.to_string()),
    }
}
