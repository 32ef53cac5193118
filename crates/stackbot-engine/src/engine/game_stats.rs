/// Points awarded for one lock event, indexed by the number of lines it
/// cleared:
///
/// - 0 lines: 0 points
/// - 1 line: 100 points
/// - 2 lines: 300 points
/// - 3 lines: 500 points
/// - 4 lines: 800 points
const SCORE_TABLE: [usize; 5] = [0, 100, 300, 500, 800];

/// Score, cleared lines and piece count of one game.
///
/// - **Score**: sum of the points in the score table over every lock event
/// - **Level**: one level per 10 cleared lines
/// - **Completed pieces**: pieces locked into the grid
/// - **Line clear histogram**: lock events by the number of lines cleared
///
/// There are no combo, back-to-back or spin bonuses. The trainer uses
/// [`score`](Self::score) as the fitness of a game.
///
/// # Example
///
/// ```
/// use stackbot_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(4);
///
/// assert_eq!(stats.score(), 800);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GameStats {
    score: usize,
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

impl GameStats {
    /// Creates statistics with every counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    /// Points earned so far.
    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    /// Level derived from cleared lines, one level per 10 lines.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.total_cleared_lines / 10
    }

    /// Number of pieces locked so far. This is the dropped piece counter the
    /// move driver watches.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    /// Lines cleared so far, counting a four-line clear as four.
    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Histogram of lock events by the number of lines they cleared.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Records one locked piece that cleared `cleared_lines` lines.
    ///
    /// Clears of more than four lines cannot happen with four-cell pieces and
    /// score like a four-line clear.
    pub fn complete_piece_drop(&mut self, cleared_lines: usize) {
        let bucket = cleared_lines.min(SCORE_TABLE.len() - 1);
        self.completed_pieces += 1;
        self.total_cleared_lines += cleared_lines;
        self.line_cleared_counter[bucket] += 1;
        self.score += SCORE_TABLE[bucket];
    }
}
