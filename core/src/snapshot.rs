use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::level::{LevelConfig, LevelTable};
use crate::session::{Session, SessionStatus};
use crate::types::{CellCount, CellId, Coord};

/// Storage key hosts are expected to file the active session under.
pub const SNAPSHOT_KEY: &str = "buscaminas:session";

/// Everything needed to rebuild a session after a reload, as one record of
/// named fields. Meaning travels with the names, not with positions, so the
/// format can grow without breaking older snapshots.
///
/// The score ledger is deliberately not part of this record; it spans
/// sessions and hosts persist it under its own key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Board,
    pub level: LevelConfig,
    pub clicks_count: u32,
    pub opened_count: CellCount,
    pub flag_count: CellCount,
    pub elapsed_seconds: u32,
    pub status: SessionStatus,
    pub exploded: Option<CellId>,
}

impl Snapshot {
    pub fn capture(session: &Session) -> Snapshot {
        let counters = session.counters();
        Snapshot {
            board: session.board().clone(),
            level: session.level(),
            clicks_count: counters.clicks,
            opened_count: counters.opened,
            flag_count: counters.flags,
            elapsed_seconds: counters.elapsed_secs,
            status: session.status(),
            exploded: session.exploded_cell(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes and validates in one step. Anything that does not parse or
    /// does not hold together comes back as `None`, the same as no saved
    /// game at all.
    pub fn from_json(text: &str) -> Option<Snapshot> {
        let snapshot: Snapshot = match serde_json::from_str(text) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("Discarding unreadable snapshot: {}", err);
                return None;
            }
        };
        snapshot.is_valid().then_some(snapshot)
    }

    /// Cross-checks the stored counters and status against the grid itself.
    /// A snapshot from a foreign or broken writer must not be able to put a
    /// session into a state the engine could never reach. Shape comes
    /// first: nothing below may touch the grid until its dimensions fit a
    /// board.
    pub(crate) fn is_valid(&self) -> bool {
        let board = &self.board;

        let (rows, cols) = board.shape();
        if rows == 0 || rows != cols || rows > usize::from(Coord::MAX) {
            log::warn!("Snapshot grid {}x{} does not fit a square board", rows, cols);
            return false;
        }

        let side = board.size();
        if side != self.level.size() {
            log::warn!(
                "Snapshot board side {} does not match level side {}",
                side,
                self.level.size()
            );
            return false;
        }
        if self.level.mines() >= self.level.total_cells() {
            log::warn!("Snapshot level leaves no safe cell");
            return false;
        }
        if board.mine_count() != self.level.mines() {
            log::warn!(
                "Snapshot mine budget {} does not match level {}",
                board.mine_count(),
                self.level.mines()
            );
            return false;
        }
        if board.count_open() != self.opened_count || board.count_flagged() != self.flag_count {
            log::warn!("Snapshot counters disagree with the grid");
            return false;
        }

        let placed = board.count_mines();
        match self.status {
            SessionStatus::NotStarted => {
                let pristine = placed == 0
                    && self.opened_count == 0
                    && self.flag_count == 0
                    && self.clicks_count == 0
                    && self.elapsed_seconds == 0;
                if !pristine {
                    log::warn!("Snapshot claims NotStarted but is not pristine");
                    return false;
                }
            }
            _ => {
                if placed != self.level.mines() {
                    log::warn!(
                        "Snapshot has {} mines placed, expected {}",
                        placed,
                        self.level.mines()
                    );
                    return false;
                }
                if !self.adjacency_consistent() {
                    log::warn!("Snapshot adjacency counts do not match the mine layout");
                    return false;
                }
            }
        }

        if self.status.is_terminal() {
            let all_mines_open = board.cells().all(|(_, cell)| !cell.is_mine() || cell.is_open());
            if !all_mines_open {
                log::warn!("Snapshot of a finished game still hides mines");
                return false;
            }
        } else {
            let end_markings = board
                .cells()
                .any(|(_, cell)| (cell.is_mine() && cell.is_open()) || cell.is_wrong_flag());
            if end_markings {
                log::warn!("Snapshot of a running game carries end-of-game markings");
                return false;
            }
        }

        match (self.status, self.exploded) {
            (SessionStatus::Lost, Some(id)) => {
                let open_mine = board.get(id).is_some_and(|cell| cell.is_mine() && cell.is_open());
                if !open_mine {
                    log::warn!("Snapshot exploded cell {:?} is not an open mine", id);
                    return false;
                }
            }
            (SessionStatus::Lost, None) | (_, Some(_)) => {
                log::warn!("Snapshot exploded marker does not fit its status");
                return false;
            }
            _ => {}
        }

        true
    }

    fn adjacency_consistent(&self) -> bool {
        self.board.cells().all(|(id, cell)| {
            cell.is_mine() || cell.adjacent_mines() == self.board.count_adjacent_mines(id)
        })
    }
}

/// Where snapshots live between runs. The engine only decides what the
/// bytes mean; when to read or write, and what sits behind the key-value
/// pairs, is the host's business.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// Writes the current session under `key`. An encoding failure is logged
/// and the previous stored value is left in place.
pub fn save_session(store: &mut impl SnapshotStore, key: &str, session: &Session) {
    match Snapshot::capture(session).to_json() {
        Ok(text) => store.set(key, text),
        Err(err) => log::error!("Could not encode session snapshot: {}", err),
    }
}

/// Reads and validates the snapshot under `key`. `None` covers missing,
/// unreadable and inconsistent data alike.
pub fn load_session(
    store: &impl SnapshotStore,
    key: &str,
    levels: LevelTable,
    seed: u64,
) -> Option<Session> {
    let text = store.get(key)?;
    let snapshot = Snapshot::from_json(&text)?;
    Session::resume(snapshot, levels, seed)
}

/// The reload path: the saved session if one round-trips, a fresh session
/// on the default level otherwise.
pub fn resume_or_new(
    store: &impl SnapshotStore,
    key: &str,
    levels: LevelTable,
    seed: u64,
) -> Session {
    match load_session(store, key, levels.clone(), seed) {
        Some(session) => session,
        None => Session::new(levels, seed),
    }
}
