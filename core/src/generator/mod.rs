use crate::*;
pub use random::*;

mod random;

/// Strategy that fills a fresh board with mines, keeping the seed cell out.
///
/// The seed cell is the one the first command of a session acted on;
/// leaving it mine-free is what makes the first open always survivable.
/// Implementations place exactly [`Board::mine_count`] mines and leave
/// marks and adjacency alone.
pub trait MinePlacer {
    fn place_mines(&mut self, board: &mut Board, seed: CellId);
}
