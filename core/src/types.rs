/// Single coordinate axis, wide enough for the largest supported board.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Addresses one cell as `(row, col)`, counted from the top-left corner.
pub type CellId = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for CellId {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn square(side: Coord) -> CellCount {
    let side = side as CellCount;
    side * side
}

const DISPLACEMENTS: [(i16, i16); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Applies `delta` to `at`, returning a value only when it remains on the board.
fn apply_delta(at: CellId, delta: (i16, i16), side: Coord) -> Option<CellId> {
    let row = i16::from(at.0) + delta.0;
    let col = i16::from(at.1) + delta.1;

    if row < 0 || col < 0 || row >= i16::from(side) || col >= i16::from(side) {
        return None;
    }

    Some((row as Coord, col as Coord))
}

/// Iterates the Moore neighborhood of a cell, skipping positions that fall
/// off the edge of the board.
#[derive(Debug)]
pub struct NeighborIter {
    center: CellId,
    side: Coord,
    index: u8,
}

impl NeighborIter {
    pub(crate) fn new(center: CellId, side: Coord) -> Self {
        Self {
            center,
            side,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = CellId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= DISPLACEMENTS.len() {
                return None;
            }

            let next_item = apply_delta(self.center, DISPLACEMENTS[self.index as usize], self.side);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}
