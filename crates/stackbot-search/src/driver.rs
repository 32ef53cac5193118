//! Paced execution of placements against a live board.
//!
//! [`MoveDriver`] walks one piece to a chosen [`Placement`] with discrete
//! [`BoardAction`]s: rotate until the rotation matches, shift until the
//! column matches, then soft drop until the piece locks. If an action has no
//! visible effect the piece is hard dropped where it is, so a failed rotation
//! or a blocked shift can never stall the game.
//!
//! [`AutoPlayer`] is the cooperative loop around it: search, drive, wait for
//! the next piece, until the game ends or the [`CancelToken`] fires.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use stackbot_engine::{ActionError, BoardAction, BoardSnapshot, GameSession};

use crate::{placement::Placement, search::PlacementSearch};

/// Access to a live board.
///
/// Every call must observe or mutate the board atomically, so a snapshot is
/// never torn by a concurrent gravity tick.
pub trait BoardControl {
    fn snapshot(&self) -> BoardSnapshot;
    fn apply(&self, action: BoardAction) -> Result<(), ActionError>;
}

impl BoardControl for Mutex<GameSession> {
    fn snapshot(&self) -> BoardSnapshot {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    fn apply(&self, action: BoardAction) -> Result<(), ActionError> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(action)
    }
}

impl<B> BoardControl for Arc<B>
where
    B: BoardControl + ?Sized,
{
    fn snapshot(&self) -> BoardSnapshot {
        (**self).snapshot()
    }

    fn apply(&self, action: BoardAction) -> Result<(), ActionError> {
        (**self).apply(action)
    }
}

/// Shared stop flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Wait after every action before looking at the board again.
    pub action_delay: Duration,
    /// Wait after a forced hard drop.
    pub stuck_delay: Duration,
    /// Wait between polls while no new piece is available.
    pub poll_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            action_delay: Duration::from_millis(2),
            stuck_delay: Duration::from_millis(3),
            poll_interval: Duration::from_millis(2),
        }
    }
}

impl DriverConfig {
    /// No waiting at all, for boards without a gravity thread.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            action_delay: Duration::ZERO,
            stuck_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
        }
    }
}

/// How a move sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MoveOutcome {
    /// The piece locked and a new piece was spawned.
    Settled,
    /// An action had no effect and the piece was hard dropped in place.
    ForcedDrop,
    /// The board stopped playing or the token was cancelled.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MovePhase {
    Rotating,
    Shifting,
    Dropping,
}

#[derive(Debug, Clone)]
pub struct MoveDriver {
    config: DriverConfig,
    cancel: CancelToken,
}

impl MoveDriver {
    #[must_use]
    pub fn new(config: DriverConfig, cancel: CancelToken) -> Self {
        Self { config, cancel }
    }

    /// Moves the current piece to `target` and drops it.
    ///
    /// `start_pieces` is the [`BoardSnapshot::dropped_pieces`] count the
    /// target was chosen for. If the board has moved on to another piece by
    /// the time the driver looks at it, no input is sent and the move is
    /// reported as [`MoveOutcome::Settled`].
    pub fn execute<B>(&self, board: &B, target: Placement, start_pieces: usize) -> MoveOutcome
    where
        B: BoardControl + ?Sized,
    {
        let start = board.snapshot();
        if let Some(outcome) = self.check(&start, start_pieces) {
            return outcome;
        }

        let initial_rotation = start.active.rotation();
        let mut current = start;
        let mut phase = MovePhase::Rotating;
        loop {
            let active = current.active;
            let action = match phase {
                MovePhase::Rotating if active.rotation() == target.rotation => {
                    phase = MovePhase::Shifting;
                    continue;
                }
                MovePhase::Shifting if active.column() == target.column => {
                    phase = MovePhase::Dropping;
                    continue;
                }
                MovePhase::Rotating => BoardAction::Rotate,
                MovePhase::Shifting if active.column() < target.column => BoardAction::ShiftRight,
                MovePhase::Shifting => BoardAction::ShiftLeft,
                MovePhase::Dropping => BoardAction::SoftDrop,
            };

            let next = match self.step(board, action, start_pieces) {
                Ok(next) => next,
                Err(outcome) => return outcome,
            };
            let stuck = match phase {
                MovePhase::Rotating => {
                    let rotation = next.active.rotation();
                    rotation == active.rotation() || rotation == initial_rotation
                }
                MovePhase::Shifting => next.active.column() == active.column(),
                MovePhase::Dropping => false,
            };
            if stuck {
                log::debug!(
                    "{action} had no effect on {} (target rotation {} column {}), forcing drop",
                    active.kind(),
                    target.rotation,
                    target.column
                );
                return self.force_drop(board);
            }
            current = next;
        }
    }

    /// Applies `action`, waits, and reads the board back.
    ///
    /// Fails with the outcome to report if the move sequence must stop.
    fn step<B>(
        &self,
        board: &B,
        action: BoardAction,
        start_pieces: usize,
    ) -> Result<BoardSnapshot, MoveOutcome>
    where
        B: BoardControl + ?Sized,
    {
        if let Err(err) = board.apply(action) {
            log::trace!("{action} rejected: {err}");
        } else {
            log::trace!("{action}");
        }
        thread::sleep(self.config.action_delay);
        let snapshot = board.snapshot();
        match self.check(&snapshot, start_pieces) {
            Some(outcome) => Err(outcome),
            None => Ok(snapshot),
        }
    }

    fn check(&self, snapshot: &BoardSnapshot, start_pieces: usize) -> Option<MoveOutcome> {
        if self.cancel.is_cancelled() || !snapshot.state.is_playing() {
            return Some(MoveOutcome::Interrupted);
        }
        (snapshot.dropped_pieces != start_pieces).then_some(MoveOutcome::Settled)
    }

    fn force_drop<B>(&self, board: &B) -> MoveOutcome
    where
        B: BoardControl + ?Sized,
    {
        if let Err(err) = board.apply(BoardAction::HardDrop) {
            log::trace!("forced hard drop rejected: {err}");
        }
        thread::sleep(self.config.stuck_delay);
        MoveOutcome::ForcedDrop
    }
}

/// Counters of one [`AutoPlayer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoPlaySummary {
    /// Pieces the player searched and drove.
    pub pieces: usize,
    /// Pieces that had to be hard dropped away from their target.
    pub forced_drops: usize,
}

/// Searches a placement for every new piece and drives it there.
#[derive(Debug)]
pub struct AutoPlayer<'a> {
    search: PlacementSearch<'a>,
    driver: MoveDriver,
    config: DriverConfig,
    cancel: CancelToken,
    max_pieces: Option<usize>,
}

impl<'a> AutoPlayer<'a> {
    #[must_use]
    pub fn new(search: PlacementSearch<'a>, config: DriverConfig, cancel: CancelToken) -> Self {
        Self {
            search,
            driver: MoveDriver::new(config, cancel.clone()),
            config,
            cancel,
            max_pieces: None,
        }
    }

    /// Stops after `max_pieces` pieces have been played.
    #[must_use]
    pub fn with_max_pieces(mut self, max_pieces: Option<usize>) -> Self {
        self.max_pieces = max_pieces;
        self
    }

    /// Plays until the game is over, the token is cancelled or the piece
    /// limit is reached.
    pub fn run<B>(&self, board: &B) -> AutoPlaySummary
    where
        B: BoardControl + ?Sized,
    {
        let mut summary = AutoPlaySummary::default();
        let mut handled_piece = None;
        while !self.cancel.is_cancelled()
            && self.max_pieces.is_none_or(|max| summary.pieces < max)
        {
            let snapshot = board.snapshot();
            if snapshot.state.is_game_over() {
                break;
            }
            if snapshot.state.is_paused() || handled_piece == Some(snapshot.dropped_pieces) {
                thread::sleep(self.config.poll_interval);
                continue;
            }

            let kind = snapshot.active.kind();
            let Some(result) = self
                .search
                .find_best_placement(&snapshot.grid, kind, snapshot.next)
            else {
                thread::sleep(self.config.poll_interval);
                continue;
            };
            let outcome = self
                .driver
                .execute(board, result.placement, snapshot.dropped_pieces);
            log::trace!("{kind} to {:?}: {outcome:?}", result.placement);
            match outcome {
                MoveOutcome::Interrupted => continue,
                MoveOutcome::ForcedDrop => summary.forced_drops += 1,
                MoveOutcome::Settled => {}
            }
            summary.pieces += 1;
            handled_piece = Some(snapshot.dropped_pieces);
        }
        summary
    }
}
