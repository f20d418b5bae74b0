//! Session state engine - entities, hand evaluation, showdown scoring,
//! and the mutable session aggregate.

pub mod constants;
pub mod entities;
pub mod eval;
pub mod showdown;
pub mod state;

pub use state::{Game, GameError, JoinOutcome, TokenSource};
