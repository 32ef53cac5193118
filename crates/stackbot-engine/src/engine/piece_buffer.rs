use std::collections::VecDeque;

use rand::{Rng as _, SeedableRng as _, seq::SliceRandom};
use rand_pcg::Pcg32;

use crate::PieceKind;

/// Seeded 7-bag piece generator.
///
/// Every bag holds each of the seven piece kinds once in shuffled order, so
/// no kind is ever absent for more than twelve pieces in a row. The buffer
/// keeps at least one whole bag queued, which makes the next piece always
/// available for preview.
#[derive(Debug, Clone)]
pub struct PieceBuffer {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl Default for PieceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceBuffer {
    /// Creates a buffer with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Creates a buffer whose piece sequence is fully determined by `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut this = Self {
            rng: Pcg32::seed_from_u64(seed),
            bag: VecDeque::with_capacity(PieceKind::LEN * 2),
        };
        this.fill_bag();
        this
    }

    fn fill_bag(&mut self) {
        while self.bag.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }

    /// Draws the next piece.
    pub fn pop_next(&mut self) -> PieceKind {
        self.fill_bag();
        let next = self.bag.pop_front();
        self.fill_bag();
        next.unwrap_or(PieceKind::I)
    }

    /// The piece [`Self::pop_next`] will return.
    #[must_use]
    pub fn peek_next(&self) -> PieceKind {
        self.bag.front().copied().unwrap_or(PieceKind::I)
    }

    /// Upcoming pieces in draw order.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }
}
