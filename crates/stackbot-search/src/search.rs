//! Exhaustive two-piece lookahead search.
//!
//! For every candidate placement of the current piece, every candidate
//! placement of the next piece is simulated on top of it. The current-piece
//! placement of the best scoring pair is returned; the next-piece placement
//! only serves as lookahead and is discarded.
//!
//! Pairs are visited current-major, next-minor, each in
//! [`placements`](crate::placement::placements) order. Scores are compared
//! with `>=`, so among equal maximal scores the pair visited last wins.

use stackbot_engine::{GameSession, Grid, PieceKind};

use crate::{
    heuristic::PlacementEvaluator,
    placement::{Placement, placements},
};

/// Best placement found for the current piece.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub placement: Placement,
    pub score: f64,
    /// Grid after both pieces of the winning pair, if the pair was scored.
    pub grid: Option<Grid>,
}

#[derive(Debug)]
pub struct PlacementSearch<'a> {
    evaluator: Box<dyn PlacementEvaluator + 'a>,
}

impl<'a> PlacementSearch<'a> {
    #[must_use]
    pub fn new(evaluator: Box<dyn PlacementEvaluator + 'a>) -> Self {
        Self { evaluator }
    }

    /// Chooses where to drop `current` on `grid`, looking ahead at `next`.
    ///
    /// Returns `None` only if no placement pair exists at all. A board on
    /// which every pair is unfittable still yields a placement.
    #[must_use]
    pub fn find_best_placement(
        &self,
        grid: &Grid,
        current: PieceKind,
        next: PieceKind,
    ) -> Option<SearchResult> {
        let seconds = placements(next, grid.width()).collect::<Vec<_>>();

        let mut best_score = f64::NEG_INFINITY;
        let mut best = None;
        for first in placements(current, grid.width()) {
            for second in &seconds {
                let evaluation = self.evaluator.evaluate(grid, current, first, next, *second);
                let score = evaluation.score();
                if score >= best_score {
                    best_score = score;
                    best = Some((first, evaluation));
                }
            }
        }

        let (placement, evaluation) = best?;
        log::trace!(
            "best placement for {current} (next {next}): rotation {} column {} score {best_score}",
            placement.rotation,
            placement.column
        );
        Some(SearchResult {
            placement,
            score: best_score,
            grid: evaluation.grid().cloned(),
        })
    }

    /// Plays `session` headlessly, placing pieces directly until the game
    /// ends or `turn_limit` pieces have been placed.
    ///
    /// Returns the number of pieces placed.
    pub fn play_session(&self, session: &mut GameSession, turn_limit: usize) -> usize {
        let mut turns = 0;
        while turns < turn_limit && session.session_state().is_playing() {
            let current = session.active_piece().kind();
            let Some(result) =
                self.find_best_placement(session.grid(), current, session.next_piece())
            else {
                break;
            };
            let Placement { rotation, column } = result.placement;
            if let Err(err) = session.place(rotation, column) {
                log::debug!("placement of {current} at rotation {rotation} column {column} failed: {err}");
            }
            turns += 1;
        }
        turns
    }
}
