use std::fmt;

use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::O,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::T,
    ];

    /// Number of distinct rotations defined in the shape catalog.
    ///
    /// Symmetric pieces only define the rotations that produce a different
    /// footprint: `O` has one, `I`, `S` and `Z` have two, the rest have four.
    #[must_use]
    pub const fn rotation_count(self) -> usize {
        match self {
            PieceKind::O => 1,
            PieceKind::I | PieceKind::S | PieceKind::Z => 2,
            PieceKind::J | PieceKind::L | PieceKind::T => 4,
        }
    }

    /// Returns the shapes of every rotation, in rotation index order.
    #[must_use]
    pub fn shapes(self) -> &'static [Shape] {
        &SHAPES[self as usize][..self.rotation_count()]
    }

    /// Returns the shape for `rotation`, or `None` if the catalog does not
    /// define that rotation for this piece.
    #[must_use]
    pub fn shape(self, rotation: usize) -> Option<Shape> {
        self.shapes().get(rotation).copied()
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackbot_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackbot_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A 4×4 occupancy mask of one piece rotation.
///
/// Each row is stored as a bitmask where bit `x` is column `x`. Row 0 is the
/// top of the bounding box, matching the grid's coordinate system.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: [u8; 4],
}

impl Shape {
    /// Width and height of the bounding box.
    pub const SIZE: usize = 4;

    #[must_use]
    pub const fn from_rows(rows: [u8; 4]) -> Self {
        Self { rows }
    }

    #[must_use]
    pub const fn is_occupied(self, col: usize, row: usize) -> bool {
        col < Self::SIZE && row < Self::SIZE && (self.rows[row] & (1 << col)) != 0
    }

    /// Returns `true` if no row of the mask occupies column `col`.
    #[must_use]
    pub const fn is_column_empty(self, col: usize) -> bool {
        let mut row = 0;
        while row < Self::SIZE {
            if self.is_occupied(col, row) {
                return false;
            }
            row += 1;
        }
        true
    }

    /// Iterates the occupied `(col, row)` offsets of the mask.
    ///
    /// Cells are yielded column by column, top to bottom within a column.
    pub fn occupied_cells(self) -> impl Iterator<Item = (usize, usize)> {
        (0..Self::SIZE).flat_map(move |col| {
            (0..Self::SIZE).filter_map(move |row| self.is_occupied(col, row).then_some((col, row)))
        })
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows.map(|bits| {
            (0..Self::SIZE)
                .map(|col| if bits & (1 << col) != 0 { '#' } else { '.' })
                .collect::<String>()
        });
        f.debug_tuple("Shape").field(&rows).finish()
    }
}

/// Generates all 4 rotation states of a piece mask by rotating 90° clockwise.
///
/// # Arguments
///
/// * `size` - Effective size of the piece (3 for most pieces, 4 for I, 2 for O)
/// * `rows` - Initial piece mask at rotation 0
const fn shape_rotations(size: usize, rows: [u8; 4]) -> [Shape; 4] {
    let mut shapes = [Shape { rows }; 4];
    let mut i = 1;
    while i < 4 {
        let prev = shapes[i - 1].rows;
        let mut next = [0; 4];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                if (prev[size - 1 - x] & (1 << y)) != 0 {
                    next[y] |= 1 << x;
                }
                x += 1;
            }
            y += 1;
        }
        shapes[i] = Shape { rows: next };
        i += 1;
    }
    shapes
}

const SHAPES: [[Shape; 4]; PieceKind::LEN] = {
    const fn m(bits: [bool; 4]) -> u8 {
        let mut mask = 0;
        let mut i = 0;
        while i < 4 {
            if bits[i] {
                mask |= 1 << i;
            }
            i += 1;
        }
        mask
    }

    const C: bool = true;
    const E: bool = false;
    const EEEE: u8 = m([E; 4]);

    [
        // I-piece
        shape_rotations(4, [EEEE, m([C, C, C, C]), EEEE, EEEE]),
        // O-piece
        shape_rotations(2, [m([C, C, E, E]), m([C, C, E, E]), EEEE, EEEE]),
        // S-piece
        shape_rotations(3, [m([E, C, C, E]), m([C, C, E, E]), EEEE, EEEE]),
        // Z-piece
        shape_rotations(3, [m([C, C, E, E]), m([E, C, C, E]), EEEE, EEEE]),
        // J-piece
        shape_rotations(3, [m([C, E, E, E]), m([C, C, C, E]), EEEE, EEEE]),
        // L-piece
        shape_rotations(3, [m([E, E, C, E]), m([C, C, C, E]), EEEE, EEEE]),
        // T-piece
        shape_rotations(3, [m([E, C, E, E]), m([C, C, C, E]), EEEE, EEEE]),
    ]
};

/// The falling piece of a live game.
///
/// `column` and `row` locate the top-left corner of the piece's 4×4 box on
/// the grid. Either may be negative while the box overhangs an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    kind: PieceKind,
    rotation: usize,
    column: i32,
    row: i32,
}

impl ActivePiece {
    #[must_use]
    pub const fn new(kind: PieceKind, rotation: usize, column: i32, row: i32) -> Self {
        Self {
            kind,
            rotation,
            column,
            row,
        }
    }

    /// Creates a piece at rotation 0, horizontally centered on the top row.
    #[must_use]
    pub fn spawn(kind: PieceKind, board_width: usize) -> Self {
        let width = i32::try_from(board_width).unwrap_or(i32::MAX);
        Self::new(kind, 0, (width - 4) / 2, 0)
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    #[must_use]
    pub fn column(&self) -> i32 {
        self.column
    }

    #[must_use]
    pub fn row(&self) -> i32 {
        self.row
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.kind.shapes()[self.rotation % self.kind.rotation_count()]
    }

    /// Iterates the absolute `(x, y)` grid coordinates covered by the piece.
    #[expect(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape()
            .occupied_cells()
            .map(move |(dx, dy)| (self.column + dx as i32, self.row + dy as i32))
    }

    #[must_use]
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            column: self.column + dx,
            row: self.row + dy,
            ..*self
        }
    }

    /// Returns the piece turned to its next rotation, wrapping around.
    #[must_use]
    pub fn rotated(&self) -> Self {
        Self {
            rotation: (self.rotation + 1) % self.kind.rotation_count(),
            ..*self
        }
    }

    /// Returns the piece with the given rotation and column, keeping its row.
    #[must_use]
    pub fn moved_to(&self, rotation: usize, column: i32) -> Self {
        Self {
            rotation,
            column,
            ..*self
        }
    }
}
