use std::collections::{HashSet, VecDeque};

use crate::board::Board;
use crate::cell::CellMark;
use crate::types::{CellCount, CellId};

/// What a single open request did to the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FloodResult {
    /// Target was already open or carries a flag; nothing changed.
    Ignored,
    /// Target opened, along with any cascaded region; carries how many
    /// cells opened in total.
    Opened(CellCount),
    /// Target hid a mine. It is now open and no cascade follows.
    Mine,
}

/// Opens `at` and, when it touches no mines, the whole connected region of
/// zero-adjacency cells plus their numbered frontier. Iterative on purpose:
/// a sparse board cascades hundreds of cells from one command, too deep to
/// trust to the call stack.
pub(crate) fn flood_open(board: &mut Board, at: CellId) -> FloodResult {
    if board[at].mark() != CellMark::Closed {
        return FloodResult::Ignored;
    }

    let cell = board[at];
    board.cell_mut(at).set_mark(CellMark::Open);

    if cell.is_mine() {
        return FloodResult::Mine;
    }

    let mut opened: CellCount = 1;
    log::debug!("Opened cell {:?}, {} adjacent mines", at, cell.adjacent_mines());

    if cell.adjacent_mines() == 0 {
        let mut visited = HashSet::from([at]);
        let mut to_visit: VecDeque<_> = board
            .neighbors(at)
            .filter(|&pos| board[pos].mark() == CellMark::Closed)
            .collect();
        log::trace!(
            "Starting flood-fill from {:?}, initial neighbors: {:?}",
            at,
            to_visit
        );

        while let Some(visit_id) = to_visit.pop_front() {
            if !visited.insert(visit_id) {
                continue;
            }

            // skip flagged or already opened cells
            if board[visit_id].mark() != CellMark::Closed {
                log::trace!("Skipping cell {:?}", visit_id);
                continue;
            }

            let visit_cell = board[visit_id];
            board.cell_mut(visit_id).set_mark(CellMark::Open);
            opened += 1;
            log::trace!(
                "Flood opened cell {:?}, {} adjacent mines",
                visit_id,
                visit_cell.adjacent_mines()
            );

            // only zero cells pull their neighbors into the region
            if visit_cell.adjacent_mines() == 0 {
                to_visit.extend(
                    board
                        .neighbors(visit_id)
                        .filter(|&pos| board[pos].mark() == CellMark::Closed)
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    FloodResult::Opened(opened)
}
