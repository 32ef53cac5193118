//! Weighted board-quality heuristic.
//!
//! A placement pair is scored by simulating both pieces on a copy of the
//! grid and summing seven weighted features of the final grid:
//!
//! | feature     | counts                                                      |
//! |-------------|-------------------------------------------------------------|
//! | `edges`     | adjacent pairs of one settled and one simulated cell        |
//! | `walls`     | simulated cells in the leftmost or rightmost column         |
//! | `floor`     | simulated cells in the bottom row                           |
//! | `height`    | for every occupied cell, its height above the bottom edge   |
//! | `holes`     | empty cells with an occupied cell above in the same column  |
//! | `blockades` | occupied cells with an empty cell below in the same column  |
//! | `clears`    | lines cleared by both pieces                                |
//!
//! No feature is normalized, so the relative size of the weights alone sets
//! the play style.

use std::fmt;

use stackbot_engine::{Cell, Grid, PieceKind};

use crate::{
    placement::Placement,
    simulator::{self, DropOutcome, SimulationError},
};

/// Score of a placement pair that cannot be played or could not be simulated.
pub const CATASTROPHIC_SCORE: f64 = -99_999_999.0;

/// The seven feature weights, in canonical chromosome order.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Weights {
    pub edges: f64,
    pub walls: f64,
    pub floor: f64,
    pub height: f64,
    pub holes: f64,
    pub blockades: f64,
    pub clears: f64,
}

impl Default for Weights {
    /// Hand-tuned weights that play reasonably without training.
    fn default() -> Self {
        Self::from_array([3.97, 6.52, 0.65, -6.78, -3.31, -0.59, 3.6])
    }
}

impl Weights {
    pub const LEN: usize = 7;

    pub const FEATURE_NAMES: [&'static str; Self::LEN] = [
        "edges",
        "walls",
        "floor",
        "height",
        "holes",
        "blockades",
        "clears",
    ];

    #[must_use]
    pub const fn from_array(weights: [f64; Self::LEN]) -> Self {
        let [edges, walls, floor, height, holes, blockades, clears] = weights;
        Self {
            edges,
            walls,
            floor,
            height,
            holes,
            blockades,
            clears,
        }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; Self::LEN] {
        [
            self.edges,
            self.walls,
            self.floor,
            self.height,
            self.holes,
            self.blockades,
            self.clears,
        ]
    }
}

impl From<[f64; Weights::LEN]> for Weights {
    fn from(weights: [f64; Weights::LEN]) -> Self {
        Self::from_array(weights)
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in Self::FEATURE_NAMES
            .iter()
            .zip(self.to_array())
            .enumerate()
        {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value:.3}")?;
        }
        Ok(())
    }
}

/// Raw feature counts of a simulated grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardFeatures {
    pub edges: u32,
    pub walls: u32,
    pub floor: u32,
    pub height: u32,
    pub holes: u32,
    pub blockades: u32,
    pub clears: u32,
}

impl BoardFeatures {
    /// Measures `grid`, in which simulated pieces are marked
    /// [`Cell::Active`], after `clears` lines have been removed.
    #[must_use]
    pub fn measure(grid: &Grid, clears: u32) -> Self {
        let mut features = Self {
            clears,
            ..Self::default()
        };
        let is_edge = |a: Cell, b: Cell| a.value() + b.value() == 3;

        let height = grid.height();
        for (y, row) in grid.rows().enumerate() {
            features.edges += count(row.windows(2).filter(|pair| is_edge(pair[0], pair[1])));
            if row.len() > 1 {
                let wall_cells = [row[0], row[row.len() - 1]];
                features.walls += count(wall_cells.iter().filter(|c| **c == Cell::Active));
            }
            if y + 1 == height {
                features.floor += count(row.iter().filter(|c| **c == Cell::Active));
            }
            let row_height = u32::try_from(height - y).unwrap_or(u32::MAX);
            features.height += row_height * count(row.iter().filter(|c| c.is_occupied()));
        }

        for x in 0..grid.width() {
            let column = grid.column(x).collect::<Vec<_>>();
            features.edges += count(column.windows(2).filter(|pair| is_edge(pair[0], pair[1])));
            features.holes += count(
                column
                    .iter()
                    .skip_while(|c| c.is_empty())
                    .filter(|c| c.is_empty()),
            );
            features.blockades += count(
                column
                    .iter()
                    .rev()
                    .skip_while(|c| c.is_occupied())
                    .filter(|c| c.is_occupied()),
            );
        }

        features
    }

    /// Weighted sum of the features.
    #[must_use]
    pub fn score(&self, weights: &Weights) -> f64 {
        weights.edges * f64::from(self.edges)
            + weights.walls * f64::from(self.walls)
            + weights.floor * f64::from(self.floor)
            + weights.height * f64::from(self.height)
            + weights.holes * f64::from(self.holes)
            + weights.blockades * f64::from(self.blockades)
            + weights.clears * f64::from(self.clears)
    }
}

fn count<I: Iterator>(iter: I) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

/// Result of evaluating one placement pair.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum Evaluation {
    /// Both pieces were placed; `grid` is the board after both drops and
    /// their line clears.
    Scored { score: f64, grid: Grid },
    /// One of the pieces could only be placed sticking out of the top.
    Unfittable,
    /// The placement could not be simulated.
    Faulted(SimulationError),
}

impl Evaluation {
    /// The score, or [`CATASTROPHIC_SCORE`] if the pair was not scored.
    #[must_use]
    pub fn score(&self) -> f64 {
        match self {
            Evaluation::Scored { score, .. } => *score,
            Evaluation::Unfittable | Evaluation::Faulted(_) => CATASTROPHIC_SCORE,
        }
    }

    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        match self {
            Evaluation::Scored { grid, .. } => Some(grid),
            Evaluation::Unfittable | Evaluation::Faulted(_) => None,
        }
    }
}

/// Scores a current-piece placement together with a next-piece placement.
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    fn evaluate(
        &self,
        grid: &Grid,
        current: PieceKind,
        first: Placement,
        next: PieceKind,
        second: Placement,
    ) -> Evaluation;
}

/// [`PlacementEvaluator`] using the seven-feature weighted sum.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEvaluator {
    weights: Weights,
}

impl HeuristicEvaluator {
    #[must_use]
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }
}

impl PlacementEvaluator for HeuristicEvaluator {
    fn evaluate(
        &self,
        grid: &Grid,
        current: PieceKind,
        first: Placement,
        next: PieceKind,
        second: Placement,
    ) -> Evaluation {
        let mut grid = simulator::copy_grid(grid);
        let mut clears = 0;
        for (kind, placement) in [(current, first), (next, second)] {
            match place(&mut grid, kind, placement) {
                Ok(Some(lines)) => clears += lines,
                Ok(None) => return Evaluation::Unfittable,
                Err(err) => {
                    log::error!(
                        "cannot simulate piece {kind} rotation {} column {}: {err}",
                        placement.rotation,
                        placement.column
                    );
                    return Evaluation::Faulted(err);
                }
            }
        }
        let features = BoardFeatures::measure(&grid, clears);
        Evaluation::Scored {
            score: features.score(&self.weights),
            grid,
        }
    }
}

/// Drops, applies and clears one piece. Returns `None` on a game over.
fn place(
    grid: &mut Grid,
    kind: PieceKind,
    placement: Placement,
) -> Result<Option<u32>, SimulationError> {
    let DropOutcome::Rests { row } = simulator::drop_shape(grid, kind, placement)? else {
        return Ok(None);
    };
    simulator::apply_shape(grid, kind, placement, row, Cell::Active)?;
    let cleared = simulator::clear_full_lines(grid);
    Ok(Some(u32::try_from(cleared).unwrap_or(u32::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rotation: usize, column: i32) -> Placement {
        Placement { rotation, column }
    }

    #[test]
    fn test_measure_counts_each_feature() {
        let grid = Grid::from_ascii(
            r"
            @@..
            #...
            .#@#
            ",
        );
        assert_eq!(
            BoardFeatures::measure(&grid, 2),
            BoardFeatures {
                edges: 3,
                walls: 1,
                floor: 1,
                height: 11,
                holes: 2,
                blockades: 3,
                clears: 2,
            }
        );
    }

    #[test]
    fn test_active_pairs_are_not_edges() {
        let grid = Grid::from_ascii(
            r"
            .@@.
            .@@.
            ",
        );
        let features = BoardFeatures::measure(&grid, 0);
        assert_eq!(features.edges, 0);
        assert_eq!(features.floor, 2);
        assert_eq!(features.walls, 0);
    }

    #[test]
    fn test_score_is_weighted_sum() {
        let features = BoardFeatures {
            edges: 1,
            walls: 2,
            floor: 3,
            height: 4,
            holes: 5,
            blockades: 6,
            clears: 7,
        };
        let weights = Weights::from_array([1.0, 1.0, 1.0, -1.0, 0.0, 0.5, 2.0]);
        assert!((features.score(&weights) - 19.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_evaluate_scores_both_pieces() {
        let floor_only = Weights::from_array([0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let evaluator = HeuristicEvaluator::new(floor_only);
        let grid = Grid::default();
        let evaluation =
            evaluator.evaluate(&grid, PieceKind::O, at(0, 0), PieceKind::O, at(0, 4));
        // Four cells of the two O pieces touch the floor.
        assert!((evaluation.score() - 4.0).abs() < f64::EPSILON);
        assert_eq!(evaluation.grid().unwrap().count(Cell::Active), 8);
    }

    #[test]
    fn test_evaluate_does_not_touch_input_grid() {
        let grid = Grid::from_ascii_bottom(20, "##.#######");
        let before = grid.clone();
        let evaluation = HeuristicEvaluator::default().evaluate(
            &grid,
            PieceKind::I,
            at(1, 0),
            PieceKind::O,
            at(0, 0),
        );
        assert!(evaluation.is_scored());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_unfittable_pair_is_catastrophic() {
        let mut grid = Grid::default();
        for y in 0..grid.height() {
            grid.set(5, y, Cell::Settled);
        }
        let evaluation = HeuristicEvaluator::default().evaluate(
            &grid,
            PieceKind::I,
            at(0, 3),
            PieceKind::O,
            at(0, 0),
        );
        assert_eq!(evaluation, Evaluation::Unfittable);
        assert!((evaluation.score() - CATASTROPHIC_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_placement_is_faulted() {
        let evaluation = HeuristicEvaluator::default().evaluate(
            &Grid::default(),
            PieceKind::T,
            at(0, 0),
            PieceKind::O,
            at(2, 0),
        );
        assert!(evaluation.is_faulted());
        assert!((evaluation.score() - CATASTROPHIC_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let grid = Grid::from_ascii_bottom(
            20,
            r"
            ..#.......
            .###..#.##
            ####.#####
            ",
        );
        let evaluator = HeuristicEvaluator::default();
        let a = evaluator.evaluate(&grid, PieceKind::S, at(1, 3), PieceKind::L, at(2, 6));
        let b = evaluator.evaluate(&grid, PieceKind::S, at(1, 3), PieceKind::L, at(2, 6));
        assert_eq!(a.score().to_bits(), b.score().to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn test_weights_array_order_and_serde() {
        let weights = Weights::default();
        assert_eq!(weights.to_array(), [3.97, 6.52, 0.65, -6.78, -3.31, -0.59, 3.6]);
        assert_eq!(Weights::from(weights.to_array()), weights);

        let json = serde_json::to_value(weights).unwrap();
        assert_eq!(json["blockades"], serde_json::json!(-0.59));
        let parsed: Weights = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, weights);
    }
}
