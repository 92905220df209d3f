use serde::{Deserialize, Serialize};

/// Player-visible marking of a single cell.
///
/// `WrongFlag` only exists on finished boards: it is the end-of-game stamp
/// for a flag that did not cover a mine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellMark {
    Closed,
    Flagged,
    Open,
    WrongFlag,
}

impl Default for CellMark {
    fn default() -> Self {
        Self::Closed
    }
}

/// One grid position: whether it hides a mine, how many mines surround it,
/// and how the player has marked it so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    mine: bool,
    adjacent: u8,
    mark: CellMark,
}

impl Cell {
    pub const fn is_mine(self) -> bool {
        self.mine
    }

    /// Mines in the Moore neighborhood, valid once the board is generated.
    pub const fn adjacent_mines(self) -> u8 {
        self.adjacent
    }

    pub const fn mark(self) -> CellMark {
        self.mark
    }

    pub const fn is_open(self) -> bool {
        matches!(self.mark, CellMark::Open)
    }

    /// Flags keep counting as flags after they are stamped wrong.
    pub const fn is_flagged(self) -> bool {
        matches!(self.mark, CellMark::Flagged | CellMark::WrongFlag)
    }

    pub const fn is_wrong_flag(self) -> bool {
        matches!(self.mark, CellMark::WrongFlag)
    }

    pub(crate) fn set_mine(&mut self) {
        self.mine = true;
    }

    pub(crate) fn set_adjacent(&mut self, count: u8) {
        self.adjacent = count;
    }

    pub(crate) fn set_mark(&mut self, mark: CellMark) {
        self.mark = mark;
    }
}
