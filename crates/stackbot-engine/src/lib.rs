//! Minimal block-stacking board engine.
//!
//! This crate provides the pieces the placement search and the trainer are
//! driven against:
//!
//! - [`core`] - the grid data model ([`Cell`], [`Grid`]) and the fixed piece
//!   shape catalog ([`PieceKind`], [`Shape`], [`ActivePiece`])
//! - [`engine`] - a live game ([`GameSession`]) with gravity, discrete key
//!   actions ([`BoardAction`]) and statistics ([`GameStats`])
//!
//! The engine is intentionally small: a single 7-bag randomizer, rotation with
//! a four-offset kick, and no rendering.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("piece colliding with the board")]
pub struct PieceCollisionError;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ActionError {
    #[display("piece colliding when applying action")]
    PieceCollision(PieceCollisionError),
    #[display("session is not in the playing state")]
    NotPlaying,
}

impl From<PieceCollisionError> for ActionError {
    fn from(err: PieceCollisionError) -> Self {
        Self::PieceCollision(err)
    }
}
