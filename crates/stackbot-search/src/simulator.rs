//! Drop simulation on owned grid copies.
//!
//! The functions here operate on a [`Grid`] the caller owns, typically one
//! made by [`copy_grid`]. Simulated pieces are written as [`Cell::Active`] so
//! the evaluator can tell them apart from the settled stack.

use arrayvec::ArrayVec;
use stackbot_engine::{Cell, Grid, PieceKind, Shape};

use crate::placement::Placement;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SimulationError {
    #[display("piece {kind} has no rotation {rotation}")]
    UnknownRotation { kind: PieceKind, rotation: usize },
    #[display("piece {kind} rotation {rotation} leaves the grid at column {column}")]
    ColumnOutOfBounds {
        kind: PieceKind,
        rotation: usize,
        column: i32,
    },
    #[display("piece {kind} rotation {rotation} leaves the grid at row {row}")]
    RowOutOfBounds {
        kind: PieceKind,
        rotation: usize,
        row: i32,
    },
}

/// Where a dropped shape ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum DropOutcome {
    /// The shape's 4×4 box rests with its top edge at `row`.
    Rests { row: i32 },
    /// The shape can only fit by sticking out above the top of the grid.
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FitState {
    Fits,
    Blocked,
    Overflow,
}

/// Absolute column and row offset of every occupied cell of a shape.
type ShapeCells = ArrayVec<(usize, i32), { Shape::SIZE * Shape::SIZE }>;

/// Copies the settled part of `grid`. Active cells become empty.
#[must_use]
pub fn copy_grid(grid: &Grid) -> Grid {
    let mut copy = grid.clone();
    copy.replace(Cell::Active, Cell::Empty);
    copy
}

/// Finds the row the shape comes to rest at when dropped at `placement`.
///
/// Candidate rows are scanned from the bottom up. A row is accepted when
/// every occupied cell of the shape lands inside the grid on an empty cell
/// with no occupied cell above it in the same column, so the shape can only
/// reach positions open from the top. Cells are checked column by column;
/// a cell above the grid marks the row as game over unless a later cell of
/// the same row is blocked, in which case the scan moves on.
pub fn drop_shape(
    grid: &Grid,
    kind: PieceKind,
    placement: Placement,
) -> Result<DropOutcome, SimulationError> {
    let cells = shape_cells(grid, kind, placement)?;
    let height = i32::try_from(grid.height()).unwrap_or(i32::MAX);

    let mut top = height - 1;
    loop {
        let mut state = FitState::Fits;
        for &(x, dy) in &cells {
            let y = top + dy;
            if y >= height {
                state = FitState::Blocked;
            } else if let Ok(y) = usize::try_from(y) {
                if grid.get(x, y).is_occupied() {
                    state = FitState::Blocked;
                }
                if state == FitState::Fits && grid.column(x).take(y).any(Cell::is_occupied) {
                    state = FitState::Blocked;
                }
            } else {
                state = FitState::Overflow;
            }
        }
        match state {
            FitState::Fits => return Ok(DropOutcome::Rests { row: top }),
            FitState::Overflow => return Ok(DropOutcome::GameOver),
            FitState::Blocked => top -= 1,
        }
    }
}

/// Writes `marker` into every cell the shape covers with its box top at
/// `row`.
pub fn apply_shape(
    grid: &mut Grid,
    kind: PieceKind,
    placement: Placement,
    row: i32,
    marker: Cell,
) -> Result<(), SimulationError> {
    let cells = shape_cells(grid, kind, placement)?;
    let out_of_bounds = || SimulationError::RowOutOfBounds {
        kind,
        rotation: placement.rotation,
        row,
    };
    let mut rows = ArrayVec::<usize, { Shape::SIZE * Shape::SIZE }>::new();
    for &(_, dy) in &cells {
        let y = usize::try_from(row + dy).map_err(|_| out_of_bounds())?;
        if y >= grid.height() {
            return Err(out_of_bounds());
        }
        rows.push(y);
    }
    for (&(x, _), y) in cells.iter().zip(rows) {
        grid.set(x, y, marker);
    }
    Ok(())
}

/// Removes full rows one at a time, lowest first, until none is left.
///
/// Returns the number of rows removed.
pub fn clear_full_lines(grid: &mut Grid) -> usize {
    let mut cleared = 0;
    while grid.clear_lowest_full_row() {
        cleared += 1;
    }
    cleared
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn shape_cells(
    grid: &Grid,
    kind: PieceKind,
    placement: Placement,
) -> Result<ShapeCells, SimulationError> {
    let Placement { rotation, column } = placement;
    let shape = kind
        .shape(rotation)
        .ok_or(SimulationError::UnknownRotation { kind, rotation })?;
    shape
        .occupied_cells()
        .map(|(dx, dy)| {
            usize::try_from(column + dx as i32)
                .ok()
                .filter(|x| *x < grid.width())
                .map(|x| (x, dy as i32))
                .ok_or(SimulationError::ColumnOutOfBounds {
                    kind,
                    rotation,
                    column,
                })
        })
        .collect()
}
