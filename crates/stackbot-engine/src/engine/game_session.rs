use std::time::Duration;

use crate::{
    ActionError, PieceCollisionError,
    core::{
        grid::{Cell, Grid},
        piece::{ActivePiece, PieceKind},
    },
};

use super::{GameStats, PieceBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

/// A discrete input the board accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BoardAction {
    #[display("rotate")]
    Rotate,
    #[display("shift-left")]
    ShiftLeft,
    #[display("shift-right")]
    ShiftRight,
    #[display("soft-drop")]
    SoftDrop,
    #[display("hard-drop")]
    HardDrop,
}

/// One consistent read of a [`GameSession`].
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    /// Settled cells plus the falling piece marked as [`Cell::Active`].
    pub grid: Grid,
    pub active: ActivePiece,
    pub next: PieceKind,
    /// Number of pieces locked so far.
    pub dropped_pieces: usize,
    pub state: SessionState,
    pub score: usize,
}

/// Offsets tried, in order, when a rotation collides in place.
const ROTATION_KICKS: [(i32, i32); 5] = [(0, 0), (0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Debug, Clone)]
pub struct GameSession {
    grid: Grid,
    active: ActivePiece,
    piece_buffer: PieceBuffer,
    stats: GameStats,
    session_state: SessionState,
    fps: u64,
    total_frames: u64,
    drop_frames: u64,
}

fn drop_frames(level: u64, fps: u64) -> u64 {
    let millis = 100 + u64::saturating_sub(900, level * 100);
    (millis * fps / 1000).max(1)
}

impl GameSession {
    /// Starts a game on an empty standard-size grid with a random seed.
    #[must_use]
    pub fn new(fps: u64) -> Self {
        Self::with_grid(fps, rand::random(), Grid::default())
    }

    #[must_use]
    pub fn with_seed(fps: u64, seed: u64) -> Self {
        Self::with_grid(fps, seed, Grid::default())
    }

    /// Starts a game on a prepared grid.
    ///
    /// Any [`Cell::Active`] cell of `grid` is treated as settled.
    #[must_use]
    pub fn with_grid(fps: u64, seed: u64, mut grid: Grid) -> Self {
        grid.replace(Cell::Active, Cell::Settled);
        let mut piece_buffer = PieceBuffer::with_seed(seed);
        let active = ActivePiece::spawn(piece_buffer.pop_next(), grid.width());
        let session_state = if grid.is_colliding(&active) {
            SessionState::GameOver
        } else {
            SessionState::Playing
        };
        Self {
            grid,
            active,
            piece_buffer,
            stats: GameStats::new(),
            session_state,
            fps: fps.max(1),
            total_frames: 0,
            drop_frames: drop_frames(0, fps),
        }
    }

    /// The settled cells, without the falling piece.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn active_piece(&self) -> &ActivePiece {
        &self.active
    }

    #[must_use]
    pub fn next_piece(&self) -> PieceKind {
        self.piece_buffer.peek_next()
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session_state
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        const NANOS_PER_SEC: u64 = 1_000_000_000;
        let secs = self.total_frames / self.fps;
        let nanos = (self.total_frames % self.fps) * NANOS_PER_SEC / self.fps;
        Duration::new(secs, u32::try_from(nanos).unwrap_or(0))
    }

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let mut grid = self.grid.clone();
        if !self.session_state.is_game_over() {
            grid.fill_piece(&self.active, Cell::Active);
        }
        BoardSnapshot {
            grid,
            active: self.active,
            next: self.next_piece(),
            dropped_pieces: self.stats.completed_pieces(),
            state: self.session_state,
            score: self.stats.score(),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.session_state = match self.session_state {
            SessionState::Playing => SessionState::Paused,
            SessionState::Paused => SessionState::Playing,
            SessionState::GameOver => SessionState::GameOver,
        };
    }

    /// Advances one frame, applying gravity when the drop timer expires.
    pub fn increment_frame(&mut self) {
        if !self.session_state.is_playing() {
            return;
        }
        self.total_frames += 1;
        self.drop_frames = self.drop_frames.saturating_sub(1);
        if self.drop_frames == 0 {
            self.drop_frames = drop_frames(self.stats.level() as u64, self.fps);
            self.soft_drop();
        }
    }

    pub fn apply(&mut self, action: BoardAction) -> Result<(), ActionError> {
        if !self.session_state.is_playing() {
            return Err(ActionError::NotPlaying);
        }
        match action {
            BoardAction::Rotate => self.try_rotate()?,
            BoardAction::ShiftLeft => self.try_move_left()?,
            BoardAction::ShiftRight => self.try_move_right()?,
            BoardAction::SoftDrop => self.soft_drop(),
            BoardAction::HardDrop => self.hard_drop_and_complete(),
        }
        Ok(())
    }

    /// Turns the falling piece to its next rotation, nudging it by one cell
    /// up, right, down or left if it collides in place.
    pub fn try_rotate(&mut self) -> Result<(), PieceCollisionError> {
        let rotated = self.active.rotated();
        let piece = ROTATION_KICKS
            .iter()
            .map(|(dx, dy)| rotated.shifted(*dx, *dy))
            .find(|piece| !self.grid.is_colliding(piece))
            .ok_or(PieceCollisionError)?;
        self.active = piece;
        Ok(())
    }

    pub fn try_move_left(&mut self) -> Result<(), PieceCollisionError> {
        self.set_active(self.active.shifted(-1, 0))
    }

    pub fn try_move_right(&mut self) -> Result<(), PieceCollisionError> {
        self.set_active(self.active.shifted(1, 0))
    }

    /// Moves the falling piece down one row, locking it if it cannot move.
    pub fn soft_drop(&mut self) {
        if self.set_active(self.active.shifted(0, 1)).is_err() {
            self.complete_piece_drop();
        }
    }

    pub fn hard_drop_and_complete(&mut self) {
        while self.set_active(self.active.shifted(0, 1)).is_ok() {}
        self.complete_piece_drop();
    }

    /// Places the falling piece directly at `rotation` and `column` and hard
    /// drops it.
    ///
    /// If the requested position collides at the current row, the piece is
    /// hard dropped where it is and the collision is reported.
    pub fn place(&mut self, rotation: usize, column: i32) -> Result<(), ActionError> {
        if !self.session_state.is_playing() {
            return Err(ActionError::NotPlaying);
        }
        let target = self.active.moved_to(rotation, column);
        if rotation >= self.active.kind().rotation_count() || self.set_active(target).is_err() {
            self.hard_drop_and_complete();
            return Err(PieceCollisionError.into());
        }
        self.hard_drop_and_complete();
        Ok(())
    }

    fn set_active(&mut self, piece: ActivePiece) -> Result<(), PieceCollisionError> {
        if self.grid.is_colliding(&piece) {
            return Err(PieceCollisionError);
        }
        self.active = piece;
        Ok(())
    }

    fn complete_piece_drop(&mut self) {
        self.grid.fill_piece(&self.active, Cell::Settled);
        let mut cleared_lines = 0;
        while self.grid.clear_lowest_full_row() {
            cleared_lines += 1;
        }
        self.stats.complete_piece_drop(cleared_lines);

        self.active = ActivePiece::spawn(self.piece_buffer.pop_next(), self.grid.width());
        if self.grid.is_colliding(&self.active) {
            self.session_state = SessionState::GameOver;
        }
    }
}
