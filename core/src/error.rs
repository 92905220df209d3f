use thiserror::Error;

use crate::types::{CellCount, Coord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Cell ({0}, {1}) is outside the board")]
    InvalidCell(Coord, Coord),
    #[error("Mine count {0} is not accepted for this board")]
    InvalidMineCount(CellCount),
    #[error("Game already started, mine count is frozen")]
    AlreadyStarted,
    #[error("Unknown level `{0}`")]
    UnknownLevel(String),
    #[error("Too many mines, no safe cell would remain")]
    TooManyMines,
}

pub type Result<T> = std::result::Result<T, GameError>;
