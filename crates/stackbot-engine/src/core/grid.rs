use std::fmt;

use super::piece::ActivePiece;

/// Width of the standard playfield.
pub const DEFAULT_WIDTH: usize = 10;
/// Height of the standard playfield.
pub const DEFAULT_HEIGHT: usize = 20;

/// A single cell of a [`Grid`].
///
/// The discriminants are part of the scoring contract: two horizontally or
/// vertically adjacent cells whose values sum to 3 are one settled and one
/// active cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum Cell {
    /// Nothing in this cell.
    #[default]
    Empty = 0,
    /// A block that has already landed.
    Settled = 1,
    /// A block of a piece that is still being placed (or simulated).
    Active = 2,
}

impl Cell {
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[must_use]
    pub const fn is_occupied(self) -> bool {
        !self.is_empty()
    }

    const fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Settled => '#',
            Cell::Active => '@',
        }
    }

    const fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Cell::Empty),
            '#' => Some(Cell::Settled),
            '@' => Some(Cell::Active),
            _ => None,
        }
    }
}

/// Rectangular playfield of [`Cell`]s.
///
/// Coordinates are `(x, y)` with `x` the column (0 = leftmost) and `y` the row
/// (0 = top). Cells are stored row by row.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Grid {
    /// Creates an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid must not be empty");
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    /// Returns the cell at signed coordinates, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        let x = usize::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(y).ok().filter(|y| *y < self.height)?;
        Some(self.get(x, y))
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        let index = self.index(x, y);
        self.cells[index] = cell;
    }

    #[must_use]
    pub fn row(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.width..][..self.width]
    }

    /// Iterates the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks_exact(self.width)
    }

    /// Iterates the cells of column `x` from top to bottom.
    pub fn column(&self, x: usize) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).map(move |y| self.get(x, y))
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y).iter().all(|cell| cell.is_occupied())
    }

    /// Number of cells equal to `cell`.
    #[must_use]
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    /// Replaces every `from` cell with `to`.
    pub fn replace(&mut self, from: Cell, to: Cell) {
        for cell in &mut self.cells {
            if *cell == from {
                *cell = to;
            }
        }
    }

    /// Removes the lowest full row, if any.
    ///
    /// Every row above the removed one moves down by one and the top row
    /// becomes empty. Returns `true` if a row was removed.
    pub fn clear_lowest_full_row(&mut self) -> bool {
        let Some(y) = (0..self.height).rev().find(|y| self.is_row_full(*y)) else {
            return false;
        };
        self.cells.copy_within(..y * self.width, self.width);
        self.cells[..self.width].fill(Cell::Empty);
        true
    }

    /// Checks if the piece leaves the grid or overlaps an occupied cell.
    #[must_use]
    pub fn is_colliding(&self, piece: &ActivePiece) -> bool {
        piece
            .cells()
            .any(|(x, y)| self.cell(x, y).is_none_or(Cell::is_occupied))
    }

    /// Writes `marker` into every in-bounds cell of the piece.
    pub fn fill_piece(&mut self, piece: &ActivePiece, marker: Cell) {
        for (x, y) in piece.cells() {
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
                && x < self.width
                && y < self.height
            {
                self.set(x, y, marker);
            }
        }
    }

    /// Creates a grid from ASCII art for testing.
    ///
    /// `.` is an empty cell, `#` a settled cell and `@` an active cell. Rows
    /// are given top to bottom; blank lines and other characters are ignored.
    ///
    /// # Panics
    ///
    /// Panics if the rows have different widths or no row is given.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let rows = parse_ascii_rows(art);
        let height = rows.len();
        Self::from_ascii_rows(height, &rows)
    }

    /// Like [`Self::from_ascii`], but the art describes the bottom rows of a
    /// grid `height` rows tall; the rows above are empty.
    ///
    /// # Panics
    ///
    /// Panics if the art is taller than `height` or its rows differ in width.
    #[must_use]
    pub fn from_ascii_bottom(height: usize, art: &str) -> Self {
        let rows = parse_ascii_rows(art);
        Self::from_ascii_rows(height, &rows)
    }

    fn from_ascii_rows(height: usize, rows: &[Vec<Cell>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        assert!(rows.len() <= height, "art has more rows than the grid");
        let mut grid = Self::new(width, height);
        let offset = height - rows.len();
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                width,
                "Each row must have exactly {width} cells, got {} at row {y}",
                row.len()
            );
            for (x, cell) in row.iter().enumerate() {
                grid.set(x, y + offset, *cell);
            }
        }
        grid
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }
}

fn parse_ascii_rows(art: &str) -> Vec<Vec<Cell>> {
    art.lines()
        .map(|line| line.chars().filter_map(Cell::from_char).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect()
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                write!(f, "{}", cell.as_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}", self.width, self.height)?;
        fmt::Display::fmt(self, f)
    }
}
