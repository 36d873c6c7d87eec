use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::geometry::Point;

/// Random state owned by the board and lent to every operation that draws from it.
///
/// Nothing in the crate keeps a hidden random source; seeding the board with a
/// fixed value replays the same shuffles, edges and cheat picks.
#[derive(Clone, Debug)]
pub struct RngState {
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        RngState {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        RngState {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform shuffle of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut items: Vec<usize> = (0..n).collect();
        items.shuffle(&mut self.rng);
        items
    }

    /// Whole-number offset inside `[-bound, bound]²`.
    pub fn offset(&mut self, bound: i32) -> Point {
        let x = self.rng.gen_range(-bound..=bound);
        let y = self.rng.gen_range(-bound..=bound);
        Point::new(f64::from(x), f64::from(y))
    }

    pub fn coin(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Uniform index into a collection of `len` items, `None` when empty.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }
}
