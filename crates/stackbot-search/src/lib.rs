//! Placement search and move execution for an automatic player.
//!
//! The crate is layered bottom-up:
//!
//! 1. **Simulation** ([`simulator`]) - drops shapes into owned copies of a
//!    grid and clears full lines. The live board is never touched.
//! 2. **Enumeration** ([`placement`]) - every `(rotation, column)` a piece can
//!    be dropped at.
//! 3. **Evaluation** ([`heuristic`]) - scores a current/next placement pair
//!    with a weighted sum of seven board features.
//! 4. **Search** ([`search`]) - exhaustive two-piece lookahead returning the
//!    best placement for the current piece.
//! 5. **Driving** ([`driver`]) - turns a chosen placement into paced board
//!    actions against a live engine.
//!
//! # Example
//!
//! ```
//! use stackbot_engine::{Grid, PieceKind};
//! use stackbot_search::{heuristic::HeuristicEvaluator, search::PlacementSearch};
//!
//! let search = PlacementSearch::new(Box::new(HeuristicEvaluator::default()));
//! let grid = Grid::default();
//! let best = search
//!     .find_best_placement(&grid, PieceKind::T, PieceKind::I)
//!     .unwrap();
//! assert!(best.placement.rotation < PieceKind::T.rotation_count());
//! ```

pub mod driver;
pub mod heuristic;
pub mod placement;
pub mod search;
pub mod simulator;
