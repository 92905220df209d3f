use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Uniform rejection sampling: draw random cells and keep the distinct,
/// non-seed ones until the budget is met. Termination needs at least one
/// spare safe cell besides the seed, which level validation guarantees
/// before a board ever reaches a placer.
#[derive(Clone, Debug)]
pub struct RandomMinePlacer {
    rng: SmallRng,
}

impl RandomMinePlacer {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl MinePlacer for RandomMinePlacer {
    fn place_mines(&mut self, board: &mut Board, seed: CellId) {
        let side = board.size();
        let wanted = board.mine_count();
        debug_assert!(
            wanted < square(side),
            "mine budget must leave a safe cell besides the seed"
        );

        let mut placed = 0;
        while placed < wanted {
            let id = (
                self.rng.random_range(0..side),
                self.rng.random_range(0..side),
            );
            if id == seed {
                continue;
            }
            if matches!(board.place_mine(id), Ok(true)) {
                placed += 1;
            }
        }
        log::debug!("Placed {} mines, seed cell {:?} kept clear", placed, seed);
    }
}
