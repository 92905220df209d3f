use serde::{Deserialize, Serialize};

use crate::types::CellCount;

/// One won game, as the score table remembers it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Preset name the win was played on, or `"custom"` for a hand-tuned
    /// mine budget.
    pub level_name: String,
    pub mines: CellCount,
    pub clicks: u32,
    pub elapsed_secs: u32,
}

/// Most-recent-first history of won games. Holds at most
/// [`ScoreLedger::CAPACITY`] entries; older wins fall off the end.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    entries: Vec<ScoreEntry>,
}

impl ScoreLedger {
    pub const CAPACITY: usize = 10;

    pub fn new() -> ScoreLedger {
        ScoreLedger::default()
    }

    /// Puts `entry` first and evicts the oldest once the ledger is full.
    pub fn record(&mut self, entry: ScoreEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(Self::CAPACITY);
    }

    /// Entries newest first.
    pub fn history(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
