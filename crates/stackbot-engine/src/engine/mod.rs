//! Live game state driven by gravity and discrete actions.
//!
//! - [`GameSession`] - the board engine: settled grid, falling piece, next
//!   piece, gravity and the actions a player (or the move driver) can take
//! - [`GameStats`] - score, lines and dropped piece counter
//! - [`PieceBuffer`] - seeded 7-bag piece generation
//!
//! # Example
//!
//! ```
//! use stackbot_engine::{BoardAction, GameSession};
//!
//! let mut session = GameSession::with_seed(60, 42);
//! session.apply(BoardAction::ShiftLeft).ok();
//! session.apply(BoardAction::HardDrop).unwrap();
//!
//! assert_eq!(session.snapshot().dropped_pieces, 1);
//! ```

pub use self::{game_session::*, game_stats::*, piece_buffer::*};

mod game_session;
mod game_stats;
mod piece_buffer;
