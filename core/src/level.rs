use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::types::{CellCount, Coord, square};

/// Bounds for mine counts requested by hand, independent of board size.
pub const MIN_CUSTOM_MINES: CellCount = 10;
pub const MAX_CUSTOM_MINES: CellCount = 99;

/// Board side and mine budget: everything a board needs besides where the
/// mines actually sit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    size: Coord,
    mines: CellCount,
}

impl LevelConfig {
    /// Rejects configs that could not leave a safe cell (`mines ≥ size²`).
    pub fn new(size: Coord, mines: CellCount) -> Result<LevelConfig> {
        if mines >= square(size) {
            return Err(GameError::TooManyMines);
        }
        Ok(LevelConfig { size, mines })
    }

    pub const fn size(&self) -> Coord {
        self.size
    }

    pub const fn mines(&self) -> CellCount {
        self.mines
    }

    pub const fn total_cells(&self) -> CellCount {
        square(self.size)
    }

    /// Whether `mines` would be accepted as a custom budget for this board.
    pub fn allows_custom_mines(&self, mines: CellCount) -> bool {
        (MIN_CUSTOM_MINES..=MAX_CUSTOM_MINES).contains(&mines) && mines < square(self.size)
    }

    pub(crate) fn with_mines(self, mines: CellCount) -> LevelConfig {
        LevelConfig { mines, ..self }
    }
}

/// Named level presets in display order. The table is injected into a
/// session so hosts can swap difficulty sets without touching game logic;
/// the first entry is the level a fresh session starts on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    levels: Vec<(String, LevelConfig)>,
}

impl LevelTable {
    pub fn new(levels: Vec<(String, LevelConfig)>) -> LevelTable {
        debug_assert!(!levels.is_empty(), "a level table needs at least one entry");
        LevelTable { levels }
    }

    /// The level a fresh session starts on.
    pub fn default_level(&self) -> LevelConfig {
        self.levels[0].1
    }

    pub fn get(&self, name: &str) -> Option<LevelConfig> {
        self.levels
            .iter()
            .find(|(level_name, _)| level_name == name)
            .map(|(_, config)| *config)
    }

    /// Resolves a config back to its preset name, if it matches one.
    pub fn name_for(&self, config: LevelConfig) -> Option<&str> {
        self.levels
            .iter()
            .find(|(_, level_config)| *level_config == config)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, LevelConfig)> {
        self.levels
            .iter()
            .map(|(name, config)| (name.as_str(), *config))
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        let presets = [("easy", 10, 10), ("medium", 15, 40), ("hard", 25, 99)];
        LevelTable::new(
            presets
                .into_iter()
                .map(|(name, size, mines)| (name.to_string(), LevelConfig { size, mines }))
                .collect(),
        )
    }
}
