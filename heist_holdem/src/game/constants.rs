//! Fixed limits for the session engine.

/// Minimum number of participating (non-observer) players for a hand.
pub const MIN_PLAYERS: usize = 3;

/// Hole cards dealt to each participating player.
pub const HOLE_CARDS: usize = 2;

/// Vaults needed to win the run, and alarms that end it. Both counters
/// reset together on the next start once either hits this limit.
pub const COUNTER_LIMIT: u8 = 3;

/// Chat log capacity. The oldest entry is evicted past this point.
pub const CHAT_LOG_CAP: usize = 100;

/// Chat messages are truncated to this many characters.
pub const MAX_CHAT_LEN: usize = 300;

/// Display names are truncated to this many characters.
pub const MAX_NAME_LEN: usize = 32;

/// Default lifetime of a tomato event before snapshots omit it.
pub const DEFAULT_TOMATO_TTL_MS: u64 = 3_000;
