//! WebSocket handler for real-time session play.
//!
//! Each connection gets a fresh UUID handle; identity lives entirely in
//! the `player_id` the client presents on join, so a page refresh makes
//! a new connection but resumes the same player.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server subscribes the connection to session change notifications
//!    and prompts the client with `request_join`
//! 3. Client sends tagged commands (join, take_token, settle, ...);
//!    each gets an `ok`/`error` response addressed to it alone
//! 4. After every accepted mutation the send task pulls a fresh
//!    per-viewer snapshot and pushes it as a `state` message
//! 5. On disconnect, the connection is unsubscribed and unmapped
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//! ws.send(JSON.stringify({
//!   type: "join",
//!   player_id: localStorage.playerId,
//!   name: "Lefty",
//! }));
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use heist_holdem::game::entities::{PlayerId, SessionView, TokenValue};
use heist_holdem::session::StateChange;
use heist_holdem::{SessionMessage, SessionResponse, TokenSource};

use super::AppState;

/// Client commands received over the WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Join as a new player or reconnect a stored identity.
    Join {
        player_id: String,
        name: String,
        #[serde(default)]
        observer: bool,
    },
    /// Change display name.
    ChangeName { name: String },
    /// Send a chat message.
    Chat { text: String },
    /// Deal a fresh hand.
    StartHand,
    /// Zero the counters and deal a fresh hand.
    Restart,
    /// Claim a token from the bank, or from another player when
    /// `from` carries their player id.
    TakeToken {
        value: TokenValue,
        #[serde(default)]
        from: Option<String>,
    },
    /// Put the held token back in the bank.
    ReturnToken,
    /// Flip the settlement flag.
    ToggleSettle,
    /// Purge a disconnected player.
    RemovePlayer { player_id: String },
    /// Throw a tomato at another player.
    ThrowTomato { target: String },
}

/// Messages sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    /// Prompt sent on connect: the client should send `join`.
    RequestJoin,
    /// A fresh per-viewer snapshot.
    State { state: SessionView },
    /// The last command succeeded.
    Ok { message: String },
    /// The last command was rejected; the message is displayable.
    Error { message: String },
    /// Someone threw a tomato.
    Tomato { from: String, to: String },
}

/// Upgrade an HTTP connection to the game WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one established WebSocket connection to completion.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();

    info!("websocket connected: {connection_id}");

    // Channel for command responses produced by the receive loop.
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    // Subscribe to session state change notifications.
    let (notification_tx, mut notification_rx) = mpsc::channel::<StateChange>(32);
    if state
        .session
        .send(SessionMessage::Subscribe {
            connection_id: connection_id.clone(),
            sender: notification_tx,
        })
        .await
        .is_err()
    {
        error!("failed to subscribe connection {connection_id}");
        return;
    }

    // Identity is claimed via a join command, not on connect.
    if let Ok(json) = serde_json::to_string(&ServerMessage::RequestJoin)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        return;
    }

    // Send task: push snapshots on notifications and relay responses.
    let send_state = state.clone();
    let send_connection_id = connection_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(change) = notification_rx.recv() => {
                    if let StateChange::TomatoThrown { from, to } = &change {
                        let tomato = ServerMessage::Tomato {
                            from: from.clone(),
                            to: to.clone(),
                        };
                        match serde_json::to_string(&tomato) {
                            Ok(json) => {
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => error!("failed to serialize tomato event: {e}"),
                        }
                    }

                    match fetch_state(&send_state, &send_connection_id).await {
                        Some(view) => {
                            let message = ServerMessage::State { state: view };
                            let json = match serde_json::to_string(&message) {
                                Ok(json) => json,
                                Err(e) => {
                                    error!("failed to serialize state: {e}");
                                    continue;
                                }
                            };
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(response_json) = response_rx.recv() => {
                    if sender.send(Message::Text(response_json.into())).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    // Receive loop: parse and dispatch client commands.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, &connection_id, &state).await
                    }
                    Err(e) => {
                        warn!("unparseable client message on {connection_id}: {e}");
                        ServerMessage::Error {
                            message: "Invalid message format".to_string(),
                        }
                    }
                };

                if let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("websocket closed: {connection_id}");
                break;
            }
            Err(e) => {
                error!("websocket error on {connection_id}: {e}");
                break;
            }
            _ => {}
        }
    }

    // Cleanup: stop pushing, then release the connection mapping so
    // the player shows as disconnected (their identity survives).
    send_task.abort();

    let _ = state
        .session
        .send(SessionMessage::Unsubscribe {
            connection_id: connection_id.clone(),
        })
        .await;
    let _ = state
        .session
        .send(SessionMessage::Disconnect {
            connection_id: connection_id.clone(),
        })
        .await;

    info!("websocket disconnected: {connection_id}");
}

/// Pull a fresh snapshot for one connection. `None` means the session
/// is gone and the send task should stop.
async fn fetch_state(state: &AppState, connection_id: &str) -> Option<SessionView> {
    let (tx, rx) = oneshot::channel();
    state
        .session
        .send(SessionMessage::GetState {
            connection_id: connection_id.to_string(),
            response: tx,
        })
        .await
        .ok()?;
    rx.await.ok()
}

/// Dispatch one parsed client command to the session actor and wait
/// for its verdict.
async fn handle_client_message(
    msg: ClientMessage,
    connection_id: &str,
    state: &AppState,
) -> ServerMessage {
    let connection_id = connection_id.to_string();
    match msg {
        ClientMessage::Join {
            player_id,
            name,
            observer,
        } => {
            send_and_wait(state, |response| SessionMessage::Join {
                connection_id,
                player_id: PlayerId::new(&player_id),
                name,
                observer,
                response,
            })
            .await
        }

        ClientMessage::ChangeName { name } => {
            send_and_wait(state, |response| SessionMessage::ChangeName {
                connection_id,
                name,
                response,
            })
            .await
        }

        ClientMessage::Chat { text } => {
            send_and_wait(state, |response| SessionMessage::Chat {
                connection_id,
                text,
                response,
            })
            .await
        }

        ClientMessage::StartHand => {
            send_and_wait(state, |response| SessionMessage::StartHand { response }).await
        }

        ClientMessage::Restart => {
            send_and_wait(state, |response| SessionMessage::RestartRun { response }).await
        }

        ClientMessage::TakeToken { value, from } => {
            let source = match from.as_deref() {
                None | Some("bank") => TokenSource::Bank,
                Some(victim) => TokenSource::Player(PlayerId::new(victim)),
            };
            send_and_wait(state, |response| SessionMessage::TakeToken {
                connection_id,
                value,
                source,
                response,
            })
            .await
        }

        ClientMessage::ReturnToken => {
            send_and_wait(state, |response| SessionMessage::ReturnToken {
                connection_id,
                response,
            })
            .await
        }

        ClientMessage::ToggleSettle => {
            send_and_wait(state, |response| SessionMessage::ToggleSettle {
                connection_id,
                response,
            })
            .await
        }

        ClientMessage::RemovePlayer { player_id } => {
            send_and_wait(state, |response| SessionMessage::RemovePlayer {
                connection_id,
                target: PlayerId::new(&player_id),
                response,
            })
            .await
        }

        ClientMessage::ThrowTomato { target } => {
            send_and_wait(state, |response| SessionMessage::ThrowTomato {
                connection_id,
                target: PlayerId::new(&target),
                response,
            })
            .await
        }
    }
}

/// Send a command to the session actor and convert its response.
async fn send_and_wait<F>(state: &AppState, build: F) -> ServerMessage
where
    F: FnOnce(oneshot::Sender<SessionResponse>) -> SessionMessage,
{
    let (tx, rx) = oneshot::channel();
    if state.session.send(build(tx)).await.is_err() {
        return ServerMessage::Error {
            message: "Session is closed".to_string(),
        };
    }
    match rx.await {
        Ok(SessionResponse::Success) => ServerMessage::Ok {
            message: String::new(),
        },
        Ok(SessionResponse::SuccessWithMessage(message)) => ServerMessage::Ok { message },
        Ok(SessionResponse::Error(message)) => ServerMessage::Error { message },
        Err(_) => ServerMessage::Error {
            message: "Session dropped the request".to_string(),
        },
    }
}
