use stackbot_engine::{PieceKind, Shape};

/// A candidate drop position: rotation index and the column of the left edge
/// of the piece's 4×4 box.
///
/// The column can be negative, or larger than `width - 4`, when the shape
/// leaves the outer columns of its box empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub rotation: usize,
    pub column: i32,
}

/// Number of entirely empty columns on the left and on the right of a shape's
/// 4×4 box.
#[must_use]
pub fn free_columns(shape: Shape) -> (usize, usize) {
    let left = (0..Shape::SIZE)
        .take_while(|col| shape.is_column_empty(*col))
        .count();
    let right = (0..Shape::SIZE)
        .rev()
        .take_while(|col| shape.is_column_empty(*col))
        .count();
    (left, right)
}

/// Enumerates every candidate placement of `kind` on a grid `width` columns
/// wide, rotation-major and column-minor.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn placements(kind: PieceKind, width: usize) -> impl Iterator<Item = Placement> {
    let width = width as i32;
    kind.shapes()
        .iter()
        .enumerate()
        .flat_map(move |(rotation, shape)| {
            let (free_left, free_right) = free_columns(*shape);
            let min = -(free_left as i32);
            let max = width - Shape::SIZE as i32 + free_right as i32;
            (min..=max).map(move |column| Placement { rotation, column })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_columns() {
        let i_flat = PieceKind::I.shape(0).unwrap();
        assert_eq!(free_columns(i_flat), (0, 0));
        let i_upright = PieceKind::I.shape(1).unwrap();
        assert_eq!(free_columns(i_upright), (2, 1));
        let o = PieceKind::O.shape(0).unwrap();
        assert_eq!(free_columns(o), (0, 2));
    }

    #[test]
    fn test_placement_counts_on_standard_grid() {
        let count = |kind| placements(kind, 10).count();
        assert_eq!(count(PieceKind::O), 9);
        assert_eq!(count(PieceKind::I), 7 + 10);
        assert_eq!(count(PieceKind::S), 8 + 9);
        assert_eq!(count(PieceKind::T), 8 + 9 + 8 + 9);
    }

    #[test]
    fn test_placements_are_rotation_major() {
        let all = placements(PieceKind::I, 10).collect::<Vec<_>>();
        assert_eq!(all.first(), Some(&Placement { rotation: 0, column: 0 }));
        assert_eq!(all[6], Placement { rotation: 0, column: 6 });
        assert_eq!(all[7], Placement { rotation: 1, column: -2 });
        assert_eq!(all.last(), Some(&Placement { rotation: 1, column: 7 }));
    }

    #[test]
    fn test_placements_cover_every_column() {
        for kind in PieceKind::ALL {
            for (rotation, shape) in kind.shapes().iter().enumerate() {
                let mut covered = [false; 10];
                for placement in placements(kind, 10).filter(|p| p.rotation == rotation) {
                    for (dx, _) in shape.occupied_cells() {
                        let x = usize::try_from(placement.column + i32::try_from(dx).unwrap());
                        covered[x.unwrap()] = true;
                    }
                }
                assert!(covered.iter().all(|c| *c), "{kind} rotation {rotation}");
            }
        }
    }
}
