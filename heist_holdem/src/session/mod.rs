//! Session actor providing single-writer access to the game aggregate.
//!
//! The aggregate is a single shared mutable resource hit by many
//! concurrent client actions. Each session runs as a Tokio task with an
//! mpsc inbox; mutating operations carry a oneshot responder and are
//! applied one at a time, so no action ever interleaves with another.
//! Transports subscribe for change notifications and pull a fresh
//! per-viewer snapshot after every accepted mutation - the core never
//! pushes on its own.
//!
//! ## Example
//!
//! ```no_run
//! use heist_holdem::{Game, SessionActor, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SessionConfig::default();
//!     let (actor, handle) = SessionActor::new(Game::new(config));
//!     tokio::spawn(actor.run());
//!     // handle.send(SessionMessage::Join { .. }).await;
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{SessionActor, SessionHandle};
pub use config::{ConfigError, SessionConfig};
pub use messages::{SessionMessage, SessionResponse, StateChange};
