use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Board;
use crate::cascade::{FloodResult, flood_open};
use crate::cell::{Cell, CellMark};
use crate::error::{GameError, Result};
use crate::generator::{MinePlacer, RandomMinePlacer};
use crate::level::{LevelConfig, LevelTable};
use crate::scores::{ScoreEntry, ScoreLedger};
use crate::snapshot::Snapshot;
use crate::types::{CellCount, CellId};

/// Valid transitions:
/// - NotStarted -> InProgress
/// - InProgress -> Won
/// - InProgress -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Level chosen, no mines placed yet
    NotStarted,
    /// First cell command arrived, clock is running
    InProgress,
    /// Game ended and the player won
    Won,
    /// Game ended and the player lost
    Lost,
}

impl SessionStatus {
    /// Indicates the game has ended and cell commands are ignored until a reset.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Command tallies for one play-through.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Primary actions that actually opened something.
    pub clicks: u32,
    /// Cells currently open, cascades included.
    pub opened: CellCount,
    /// Cells currently flagged.
    pub flags: CellCount,
    /// Whole seconds the game has been running.
    pub elapsed_secs: u32,
}

/// Outcome of a primary (open) action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    NoChange,
    Opened,
    Exploded,
    Won,
}

impl OpenOutcome {
    /// Whether this outcome could have caused an update to the game.
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Outcome of a secondary (flag) action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl FlagOutcome {
    /// Whether this outcome could have caused an update to the game.
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// The complete state of one game and the only way to change it.
///
/// Commands run to completion before returning, so hosts read a consistent
/// state between calls. The clock is host-driven: schedule [`Session::tick`]
/// once per second and the InProgress gate takes care of the rest.
pub struct Session {
    levels: LevelTable,
    level: LevelConfig,
    board: Board,
    counters: Counters,
    status: SessionStatus,
    exploded: Option<CellId>,
    scores: ScoreLedger,
    placer: Box<dyn MinePlacer>,
}

impl Session {
    /// Fresh session on the table's first level. `seed` feeds mine
    /// placement; hosts draw it from whatever entropy they have.
    pub fn new(levels: LevelTable, seed: u64) -> Session {
        Session::with_placer(levels, Box::new(RandomMinePlacer::from_seed(seed)))
    }

    /// Like [`Session::new`] with a caller-chosen placement strategy.
    pub fn with_placer(levels: LevelTable, placer: Box<dyn MinePlacer>) -> Session {
        let level = levels.default_level();
        Session {
            board: Board::empty(level.size(), level.mines()),
            levels,
            level,
            counters: Counters::default(),
            status: Default::default(),
            exploded: None,
            scores: ScoreLedger::new(),
            placer,
        }
    }

    /// Rebuilds a session from a snapshot that passed validation. `None`
    /// means the snapshot did not stand up and the caller should start
    /// fresh instead.
    pub fn resume(snapshot: Snapshot, levels: LevelTable, seed: u64) -> Option<Session> {
        if !snapshot.is_valid() {
            return None;
        }
        let Snapshot {
            board,
            level,
            clicks_count,
            opened_count,
            flag_count,
            elapsed_seconds,
            status,
            exploded,
        } = snapshot;
        Some(Session {
            levels,
            level,
            board,
            counters: Counters {
                clicks: clicks_count,
                opened: opened_count,
                flags: flag_count,
                elapsed_secs: elapsed_seconds,
            },
            status,
            exploded,
            scores: ScoreLedger::new(),
            placer: Box::new(RandomMinePlacer::from_seed(seed)),
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.board.get(id)
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn level(&self) -> LevelConfig {
        self.level
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    /// Name of the current level in the table, `None` once the mine budget
    /// was tuned by hand.
    pub fn level_name(&self) -> Option<&str> {
        self.levels.name_for(self.level)
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.level.mines() as isize) - (self.counters.flags as isize)
    }

    /// The mine whose opening ended the game, if it ended that way.
    pub fn exploded_cell(&self) -> Option<CellId> {
        self.exploded
    }

    pub fn scores(&self) -> &ScoreLedger {
        &self.scores
    }

    /// Hands a previously persisted ledger back to the session, replacing
    /// the empty one a fresh or resumed session starts with.
    pub fn restore_scores(&mut self, scores: ScoreLedger) {
        self.scores = scores;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Opens a cell. The first command of a session places mines before
    /// anything else, seeded by this cell, so the first open never hits one.
    pub fn primary_action(&mut self, id: CellId) -> Result<OpenOutcome> {
        use OpenOutcome::*;

        let id = self.board.validate(id)?;

        if self.status.is_terminal() {
            log::debug!("Primary action at {:?} ignored, game over", id);
            return Ok(NoChange);
        }
        self.ensure_started(id);

        if self.board[id].mark() != CellMark::Closed {
            return Ok(NoChange);
        }

        self.counters.clicks = self.counters.clicks.saturating_add(1);
        Ok(match flood_open(&mut self.board, id) {
            FloodResult::Ignored => NoChange,
            FloodResult::Mine => {
                self.counters.opened += 1;
                self.exploded = Some(id);
                log::debug!("Mine at {:?} went off", id);
                self.finish(false);
                Exploded
            }
            FloodResult::Opened(count) => {
                self.counters.opened += count;
                if self.counters.opened == self.board.safe_cells() {
                    self.finish(true);
                    Won
                } else {
                    Opened
                }
            }
        })
    }

    /// Toggles a flag. Also a session-starting command: flagging before any
    /// open seeds mine placement at the flagged cell.
    pub fn secondary_action(&mut self, id: CellId) -> Result<FlagOutcome> {
        use FlagOutcome::*;

        let id = self.board.validate(id)?;

        if self.status.is_terminal() {
            log::debug!("Secondary action at {:?} ignored, game over", id);
            return Ok(NoChange);
        }
        self.ensure_started(id);

        Ok(match self.board[id].mark() {
            CellMark::Open => NoChange,
            CellMark::Closed => {
                self.board.cell_mut(id).set_mark(CellMark::Flagged);
                self.counters.flags += 1;
                log::debug!("Flagged {:?}", id);
                Flagged
            }
            CellMark::Flagged | CellMark::WrongFlag => {
                self.board.cell_mut(id).set_mark(CellMark::Closed);
                self.counters.flags -= 1;
                log::debug!("Unflagged {:?}", id);
                Unflagged
            }
        })
    }

    /// Advances the clock by one second. Hosts call this from their 1 Hz
    /// timer; the status gate is the whole lifecycle of that timer, so a
    /// stale or duplicate tick after the game ends is harmless.
    pub fn tick(&mut self) {
        if self.status == SessionStatus::InProgress {
            self.counters.elapsed_secs = self.counters.elapsed_secs.saturating_add(1);
        }
    }

    /// Back to a pristine NotStarted board on the current level. The score
    /// ledger survives, it spans games.
    pub fn reset(&mut self) {
        log::debug!("Reset at level {:?}", self.level);
        self.board = Board::empty(self.level.size(), self.level.mines());
        self.counters = Counters::default();
        self.status = SessionStatus::NotStarted;
        self.exploded = None;
    }

    /// Switches to a named preset, which implies a reset. Unknown names are
    /// rejected and leave the session untouched.
    pub fn change_level(&mut self, name: &str) -> Result<()> {
        match self.levels.get(name) {
            Some(config) => {
                self.level = config;
                self.reset();
                Ok(())
            }
            None => {
                log::warn!("Rejected change to unknown level `{}`", name);
                Err(GameError::UnknownLevel(name.to_string()))
            }
        }
    }

    /// Tunes the mine budget by hand, allowed only before the first move.
    /// A rejected count leaves the previous budget in place.
    pub fn change_mine_count(&mut self, mines: CellCount) -> Result<()> {
        if self.status != SessionStatus::NotStarted {
            log::warn!("Rejected mine count change, game already started");
            return Err(GameError::AlreadyStarted);
        }
        if !self.level.allows_custom_mines(mines) {
            log::warn!(
                "Rejected mine count {}, keeping {}",
                mines,
                self.level.mines()
            );
            return Err(GameError::InvalidMineCount(mines));
        }
        self.level = self.level.with_mines(mines);
        self.board = Board::empty(self.level.size(), mines);
        Ok(())
    }

    /// First command of a session: the board gets its mines, seeded by the
    /// acted-on cell, adjacency is computed once, and the clock goes live.
    fn ensure_started(&mut self, seed: CellId) {
        if self.status != SessionStatus::NotStarted {
            return;
        }
        self.placer.place_mines(&mut self.board, seed);
        self.board.compute_adjacency();
        self.status = SessionStatus::InProgress;
        log::debug!("Game started, seed cell {:?}", seed);
    }

    /// Freezes the status, shows every mine, stamps wrong flags, and books
    /// the score on a win.
    fn finish(&mut self, won: bool) {
        self.status = if won {
            SessionStatus::Won
        } else {
            SessionStatus::Lost
        };
        log::debug!(
            "Game over after {}s, won: {}",
            self.counters.elapsed_secs,
            won
        );
        self.reveal_mines();
        if won {
            self.record_score();
        }
    }

    /// Opens all mines, lifting their flags first, and stamps flags that
    /// covered no mine. Already-open mines are left alone, so running this
    /// again is a no-op.
    fn reveal_mines(&mut self) {
        for id in self.board.ids() {
            let cell = self.board[id];
            if cell.is_mine() {
                if cell.is_open() {
                    continue;
                }
                if cell.is_flagged() {
                    self.counters.flags -= 1;
                }
                self.board.cell_mut(id).set_mark(CellMark::Open);
                self.counters.opened += 1;
            } else if cell.is_flagged() {
                self.board.cell_mut(id).set_mark(CellMark::WrongFlag);
            }
        }
    }

    fn record_score(&mut self) {
        let level_name = self.level_name().unwrap_or("custom").to_string();
        let entry = ScoreEntry {
            level_name,
            mines: self.level.mines(),
            clicks: self.counters.clicks,
            elapsed_secs: self.counters.elapsed_secs,
        };
        log::debug!("Recording win: {:?}", entry);
        self.scores.record(entry);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("level", &self.level)
            .field("status", &self.status)
            .field("counters", &self.counters)
            .field("exploded", &self.exploded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    fn table(size: Coord, mines: CellCount) -> LevelTable {
        LevelTable::new(vec![(
            "test".to_string(),
            LevelConfig::new(size, mines).unwrap(),
        )])
    }

    /// Plays back a fixed layout and ignores the seed cell, so tests can
    /// steer games onto known mines.
    struct FixedPlacer(Vec<CellId>);

    impl MinePlacer for FixedPlacer {
        fn place_mines(&mut self, board: &mut Board, _seed: CellId) {
            for &id in &self.0 {
                board.place_mine(id).unwrap();
            }
        }
    }

    fn fixed_session(size: Coord, mines: &[CellId]) -> Session {
        Session::with_placer(
            table(size, mines.len().try_into().unwrap()),
            Box::new(FixedPlacer(mines.to_vec())),
        )
    }

    fn assert_cell_accounting(session: &Session) {
        let mut open: CellCount = 0;
        let mut flagged: CellCount = 0;
        let mut closed: CellCount = 0;
        for (_, cell) in session.board().cells() {
            if cell.is_open() {
                open += 1;
            } else if cell.is_flagged() {
                flagged += 1;
            } else {
                closed += 1;
            }
        }
        assert_eq!(open + flagged + closed, session.board().total_cells());
        assert_eq!(open, session.counters().opened);
        assert_eq!(flagged, session.counters().flags);
    }

    #[test]
    fn first_open_is_always_safe() {
        for seed in 0..16 {
            let mut session = Session::new(LevelTable::default(), seed);

            let outcome = session.primary_action((4, 7)).unwrap();

            assert!(matches!(outcome, OpenOutcome::Opened | OpenOutcome::Won));
            assert_ne!(session.status(), SessionStatus::Lost);
            assert!(!session.board()[(4, 7)].is_mine());
            assert_eq!(session.board().count_mines(), 10);
        }
    }

    #[test]
    fn opening_every_safe_cell_wins() {
        let mut session = fixed_session(2, &[(0, 0)]);

        assert_eq!(session.primary_action((1, 1)).unwrap(), OpenOutcome::Opened);
        session.tick();
        session.tick();
        assert_eq!(session.primary_action((0, 1)).unwrap(), OpenOutcome::Opened);
        assert_eq!(session.primary_action((1, 0)).unwrap(), OpenOutcome::Won);

        assert_eq!(session.status(), SessionStatus::Won);
        assert!(session.board()[(0, 0)].is_open());
        assert_cell_accounting(&session);

        let entry = &session.scores().history()[0];
        assert_eq!(entry.level_name, "test");
        assert_eq!(entry.mines, 1);
        assert_eq!(entry.clicks, 3);
        assert_eq!(entry.elapsed_secs, 2);
    }

    #[test]
    fn opening_a_mine_loses_and_reveals_everything() {
        let mut session = fixed_session(3, &[(0, 0), (2, 2)]);

        assert_eq!(session.primary_action((0, 2)).unwrap(), OpenOutcome::Opened);
        session.secondary_action((2, 2)).unwrap();
        session.secondary_action((2, 0)).unwrap();
        assert_eq!(
            session.primary_action((0, 0)).unwrap(),
            OpenOutcome::Exploded
        );

        assert_eq!(session.status(), SessionStatus::Lost);
        assert_eq!(session.exploded_cell(), Some((0, 0)));
        // every mine ends up open, the correct flag was lifted first
        assert!(session.board()[(0, 0)].is_open());
        assert!(session.board()[(2, 2)].is_open());
        assert!(!session.board()[(2, 2)].is_flagged());
        // the flag that covered no mine is stamped wrong
        assert!(session.board()[(2, 0)].is_wrong_flag());
        assert_eq!(session.counters().flags, 1);
        assert!(session.scores().is_empty());
        assert_cell_accounting(&session);
    }

    #[test]
    fn flagged_cells_cannot_be_opened() {
        let mut session = fixed_session(3, &[(2, 2)]);

        let opened = session.primary_action((1, 1)).unwrap();
        assert_eq!(opened, OpenOutcome::Opened);
        assert!(opened.has_update());

        let flagged = session.secondary_action((2, 2)).unwrap();
        assert_eq!(flagged, FlagOutcome::Flagged);
        assert!(flagged.has_update());
        let clicks_before = session.counters().clicks;

        let blocked = session.primary_action((2, 2)).unwrap();
        assert_eq!(blocked, OpenOutcome::NoChange);
        assert!(!blocked.has_update());
        assert!(!session.board()[(2, 2)].is_open());
        assert_eq!(session.counters().clicks, clicks_before);

        assert_eq!(
            session.secondary_action((2, 2)).unwrap(),
            FlagOutcome::Unflagged
        );
        assert_eq!(
            session.primary_action((2, 2)).unwrap(),
            OpenOutcome::Exploded
        );
    }

    #[test]
    fn custom_mine_counts_are_validated() {
        let mut session = Session::new(LevelTable::default(), 3);

        assert_eq!(session.change_mine_count(42), Ok(()));
        assert_eq!(session.level().mines(), 42);
        assert_eq!(session.board().mine_count(), 42);
        assert_eq!(session.level_name(), None);

        assert_eq!(
            session.change_mine_count(5),
            Err(GameError::InvalidMineCount(5))
        );
        assert_eq!(
            session.change_mine_count(9),
            Err(GameError::InvalidMineCount(9))
        );
        assert_eq!(
            session.change_mine_count(100),
            Err(GameError::InvalidMineCount(100))
        );
        assert_eq!(session.level().mines(), 42);

        // 99 is the cap and still fits a 10×10 board
        assert_eq!(session.change_mine_count(99), Ok(()));

        session.primary_action((5, 5)).unwrap();
        assert_eq!(
            session.change_mine_count(50),
            Err(GameError::AlreadyStarted)
        );
    }

    #[test]
    fn ledger_keeps_the_last_ten_wins() {
        let mut session = fixed_session(2, &[(0, 0)]);

        for game in 1..=11u32 {
            session.primary_action((1, 1)).unwrap();
            for _ in 0..game {
                session.tick();
            }
            session.primary_action((0, 1)).unwrap();
            session.primary_action((1, 0)).unwrap();
            assert_eq!(session.status(), SessionStatus::Won);
            session.reset();
        }

        assert_eq!(session.scores().len(), ScoreLedger::CAPACITY);
        // newest win first, the very first win fell off
        assert_eq!(session.scores().history()[0].elapsed_secs, 11);
        assert_eq!(session.scores().history()[9].elapsed_secs, 2);
    }

    #[test]
    fn a_first_flag_places_mines_and_starts_the_clock() {
        let mut session = Session::new(LevelTable::default(), 5);

        assert_eq!(
            session.secondary_action((3, 3)).unwrap(),
            FlagOutcome::Flagged
        );

        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.board().count_mines(), 10);
        // the flagged seed cell is guaranteed mine-free
        assert!(!session.board()[(3, 3)].is_mine());
        session.tick();
        assert_eq!(session.counters().elapsed_secs, 1);
        assert_eq!(session.counters().clicks, 0);
    }

    #[test]
    fn clock_only_runs_while_in_progress() {
        let mut session = fixed_session(2, &[(0, 0)]);

        session.tick();
        session.tick();
        assert_eq!(session.counters().elapsed_secs, 0);

        session.primary_action((1, 1)).unwrap();
        session.tick();
        assert_eq!(session.counters().elapsed_secs, 1);

        session.primary_action((0, 1)).unwrap();
        session.primary_action((1, 0)).unwrap();
        assert_eq!(session.status(), SessionStatus::Won);

        // a stale timer firing after the end changes nothing
        session.tick();
        session.tick();
        assert_eq!(session.counters().elapsed_secs, 1);
    }

    #[test]
    fn finished_game_ignores_cell_commands() {
        let mut session = fixed_session(2, &[(0, 0)]);
        session.primary_action((1, 1)).unwrap();
        session.primary_action((0, 1)).unwrap();
        session.primary_action((1, 0)).unwrap();
        assert_eq!(session.status(), SessionStatus::Won);
        let counters = session.counters();

        assert_eq!(
            session.primary_action((0, 0)).unwrap(),
            OpenOutcome::NoChange
        );
        assert_eq!(
            session.secondary_action((0, 0)).unwrap(),
            FlagOutcome::NoChange
        );
        assert_eq!(session.counters(), counters);
    }

    #[test]
    fn reopening_an_open_cell_changes_nothing() {
        let mut session = fixed_session(3, &[(0, 0), (2, 2)]);
        session.primary_action((0, 2)).unwrap();
        let counters = session.counters();

        assert_eq!(
            session.primary_action((0, 2)).unwrap(),
            OpenOutcome::NoChange
        );
        assert_eq!(
            session.primary_action((1, 1)).unwrap(),
            OpenOutcome::NoChange
        );
        assert_eq!(
            session.secondary_action((0, 2)).unwrap(),
            FlagOutcome::NoChange
        );
        assert_eq!(session.counters(), counters);
    }

    #[test]
    fn reset_returns_to_a_pristine_board() {
        let mut session = fixed_session(3, &[(0, 0), (2, 2)]);
        session.primary_action((0, 2)).unwrap();
        session.secondary_action((2, 2)).unwrap();
        session.tick();

        session.reset();

        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.counters(), Counters::default());
        assert_eq!(session.board().count_mines(), 0);
        assert!(
            session
                .board()
                .cells()
                .all(|(_, cell)| cell.mark() == CellMark::Closed)
        );
        assert_eq!(session.exploded_cell(), None);
        assert_eq!(session.level().mines(), 2);
    }

    #[test]
    fn change_level_switches_presets_and_resets() {
        let mut session = Session::new(LevelTable::default(), 9);
        session.primary_action((0, 0)).unwrap();

        session.change_level("hard").unwrap();

        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.level_name(), Some("hard"));
        assert_eq!(Some(session.level()), session.levels().get("hard"));
        assert_eq!(session.board().size(), 25);
        assert_eq!(session.board().mine_count(), 99);
        assert_eq!(session.counters(), Counters::default());

        assert_eq!(
            session.change_level("impossible"),
            Err(GameError::UnknownLevel("impossible".to_string()))
        );
        assert_eq!(session.level_name(), Some("hard"));
    }

    #[test]
    fn out_of_range_commands_are_rejected() {
        let mut session = Session::new(LevelTable::default(), 1);

        assert_eq!(
            session.primary_action((10, 0)),
            Err(GameError::InvalidCell(10, 0))
        );
        assert_eq!(
            session.secondary_action((0, 10)),
            Err(GameError::InvalidCell(0, 10))
        );
        // a rejected command must not start the game
        assert_eq!(session.status(), SessionStatus::NotStarted);

        assert!(session.cell((10, 0)).is_none());
        assert!(session.cell((9, 9)).is_some());
    }

    #[test]
    fn mines_left_can_go_negative() {
        let mut session = fixed_session(3, &[(0, 0), (2, 2)]);

        assert_eq!(session.mines_left(), 2);
        session.secondary_action((0, 1)).unwrap();
        session.secondary_action((1, 0)).unwrap();
        session.secondary_action((1, 1)).unwrap();
        assert_eq!(session.mines_left(), -1);
    }

    #[test]
    fn winning_lifts_the_remaining_flags() {
        let mut session = fixed_session(2, &[(0, 0)]);

        session.secondary_action((0, 0)).unwrap();
        session.primary_action((1, 1)).unwrap();
        session.primary_action((0, 1)).unwrap();
        session.primary_action((1, 0)).unwrap();

        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.counters().flags, 0);
        assert!(session.board()[(0, 0)].is_open());
        assert!(!session.board()[(0, 0)].is_wrong_flag());
        assert_cell_accounting(&session);
    }

    #[test]
    fn same_seed_gives_the_same_game() {
        let mut first = Session::new(LevelTable::default(), 77);
        let mut second = Session::new(LevelTable::default(), 77);

        first.primary_action((5, 5)).unwrap();
        second.primary_action((5, 5)).unwrap();

        assert_eq!(first.board(), second.board());
    }

    #[test]
    fn restored_scores_keep_recording() {
        let mut ledger = ScoreLedger::new();
        ledger.record(ScoreEntry {
            level_name: "easy".to_string(),
            mines: 10,
            clicks: 40,
            elapsed_secs: 90,
        });

        let mut session = fixed_session(2, &[(0, 0)]);
        session.restore_scores(ledger);
        session.primary_action((1, 1)).unwrap();
        session.primary_action((0, 1)).unwrap();
        session.primary_action((1, 0)).unwrap();

        assert_eq!(session.scores().len(), 2);
        assert_eq!(session.scores().history()[0].level_name, "test");
        assert_eq!(session.scores().history()[1].level_name, "easy");
    }
}
