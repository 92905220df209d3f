use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::cell::Cell;
use crate::error::{GameError, Result};
use crate::types::{CellCount, CellId, Coord, NeighborIter, ToNdIndex, square};

/// The playing field: a square grid of cells plus the mine budget it was
/// configured with. A fresh board carries the budget but no mines; they are
/// physically placed by a [`MinePlacer`](crate::MinePlacer) once the first
/// command names its seed cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mines: CellCount,
}

impl Board {
    /// A fully closed board with no mines placed and no adjacency computed.
    pub fn empty(size: Coord, mines: CellCount) -> Board {
        Board {
            cells: Array2::default((size as usize, size as usize)),
            mines,
        }
    }

    /// Builds a board with an exact mine layout and adjacency already
    /// computed. Duplicate coordinates collapse into one mine.
    pub fn with_mines(size: Coord, mine_cells: &[CellId]) -> Result<Board> {
        let mut board = Board::empty(size, 0);

        for &id in mine_cells {
            if board.place_mine(id)? {
                board.mines += 1;
            }
        }

        if board.mines >= board.total_cells() {
            return Err(GameError::TooManyMines);
        }

        board.compute_adjacency();
        Ok(board)
    }

    /// Side length of the square grid. Every constructor takes the side as
    /// a [`Coord`], and snapshot decoding shape-checks foreign grids before
    /// using them, so the narrowing holds.
    pub fn size(&self) -> Coord {
        self.cells.dim().0.try_into().unwrap()
    }

    /// Raw grid dimensions. A deserialized grid has not proven it is
    /// square or fits a [`Coord`], so there is no narrowing here.
    pub(crate) fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn total_cells(&self) -> CellCount {
        square(self.size())
    }

    /// Cells that have to be opened to win the game.
    pub fn safe_cells(&self) -> CellCount {
        self.total_cells() - self.mines
    }

    /// The configured mine budget, whether or not mines are placed yet.
    pub fn mine_count(&self) -> CellCount {
        self.mines
    }

    pub fn contains(&self, id: CellId) -> bool {
        id.0 < self.size() && id.1 < self.size()
    }

    pub fn validate(&self, id: CellId) -> Result<CellId> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(GameError::InvalidCell(id.0, id.1))
        }
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.to_nd_index())
    }

    pub fn neighbors(&self, id: CellId) -> NeighborIter {
        NeighborIter::new(id, self.size())
    }

    /// All cells with their ids, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells
            .indexed_iter()
            .map(|((row, col), cell)| ((row as Coord, col as Coord), cell))
    }

    /// Marks `id` as a mine. Returns whether the board changed; placing on
    /// an existing mine is a no-op. The configured budget is not touched,
    /// placers are expected to fill exactly that many cells.
    pub fn place_mine(&mut self, id: CellId) -> Result<bool> {
        let id = self.validate(id)?;
        if self[id].is_mine() {
            Ok(false)
        } else {
            self.cell_mut(id).set_mine();
            Ok(true)
        }
    }

    /// Counts mines around `id` directly off the grid.
    pub fn count_adjacent_mines(&self, id: CellId) -> u8 {
        self.neighbors(id)
            .filter(|&pos| self[pos].is_mine())
            .count()
            .try_into()
            .unwrap()
    }

    /// Stores the neighbor mine count on every non-mine cell. Runs once per
    /// game, after mine placement and before the first reveal.
    pub(crate) fn compute_adjacency(&mut self) {
        for id in self.ids() {
            if self[id].is_mine() {
                continue;
            }
            let count = self.count_adjacent_mines(id);
            self.cell_mut(id).set_adjacent(count);
        }
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.to_nd_index()]
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = CellId> + use<> {
        let side = self.size();
        (0..side).flat_map(move |row| (0..side).map(move |col| (row, col)))
    }

    pub(crate) fn count_mines(&self) -> CellCount {
        self.count_cells(|cell| cell.is_mine())
    }

    pub(crate) fn count_open(&self) -> CellCount {
        self.count_cells(|cell| cell.is_open())
    }

    pub(crate) fn count_flagged(&self) -> CellCount {
        self.count_cells(|cell| cell.is_flagged())
    }

    fn count_cells(&self, pred: impl Fn(&Cell) -> bool) -> CellCount {
        self.cells.iter().filter(|cell| pred(cell)).count().try_into().unwrap()
    }
}

impl Index<CellId> for Board {
    type Output = Cell;

    fn index(&self, id: CellId) -> &Self::Output {
        &self.cells[id.to_nd_index()]
    }
}
