//! # Heist Hold'em
//!
//! A cooperative hold'em party game: everyone gets two hole cards, the
//! board is revealed across the usual betting phases, and each phase
//! the crew claims numbered rank tokens guessing where their hand will
//! finish relative to the table. Nailing the full order at showdown
//! cracks a vault; any miss trips an alarm. Three vaults win the run,
//! three alarms end it.
//!
//! ## Architecture
//!
//! The session state engine is a single mutable aggregate
//! ([`game::Game`]) exposing pure state-transition operations: the
//! identity/reconnection registry, the phase state machine, the token
//! economy, the showdown scorer, and the per-viewer snapshot builder.
//! It never initiates I/O.
//!
//! Concurrency follows a single-writer actor model: a
//! [`session::SessionActor`] owns the aggregate and drains a message
//! inbox serially, so every action applies atomically. Transports talk
//! to it through a cloneable [`session::SessionHandle`] and pull a
//! fresh [`game::entities::SessionView`] per connection after each
//! accepted mutation.
//!
//! Hand strength is an external capability behind the
//! [`game::eval::HandEvaluator`] trait; the built-in adapter scores
//! the best five-card combination.
//!
//! ## Example
//!
//! ```
//! use heist_holdem::{Game, SessionConfig};
//! use heist_holdem::game::entities::PlayerId;
//!
//! let mut game = Game::new(SessionConfig::default());
//! let alice = PlayerId::new("alice-device-token");
//! game.join_or_reconnect("conn-1", &alice, "Alice", false).unwrap();
//! let view = game.get_state(Some(&alice));
//! assert_eq!(view.players.len(), 1);
//! ```

/// Core game logic, entities, and the session aggregate.
pub mod game;
pub use game::{
    Game, GameError, JoinOutcome, TokenSource,
    constants::{self, COUNTER_LIMIT, MIN_PLAYERS},
    entities, eval, showdown,
};

/// Single-writer session actor and its message protocol.
pub mod session;
pub use session::{SessionActor, SessionConfig, SessionHandle, SessionMessage, SessionResponse};
