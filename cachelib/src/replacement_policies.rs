use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use crate::cache::CacheLine;

/// A generic trait for implementing new replacement policies. Used to parameterise a
/// `CacheSimulator`.
///
/// The set only asks for a victim once it is full and the requested tag is absent, so every line
/// passed in is valid
pub trait ReplacementPolicy {
    /// Chooses the line to evict from a full set
    ///
    /// Implementations must not assume anything about the line order, the index of a line is only
    /// its identity within the set. The set performs the replacement itself
    ///
    /// # Arguments
    ///
    /// * `lines`: Every line of the set, never empty
    ///
    /// returns: usize, an index into `lines`
    fn select_victim(&mut self, lines: &[CacheLine]) -> usize;
}

/// Least Recently Used replacement policy
///
/// Lines carry the value of the simulator's logical clock from their last access, so the victim is
/// simply the line with the oldest timestamp. Ties go to the lowest index
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn select_victim(&mut self, lines: &[CacheLine]) -> usize {
        // Strict comparison keeps the lowest index on ties
        let mut min_value = u64::MAX;
        let mut min_index = 0;
        let mut index = 0;
        while index < lines.len() {
            if lines[index].last_access < min_value {
                min_value = lines[index].last_access;
                min_index = index;
            }
            index += 1;
        }
        min_index
    }
}

/// Most Recently Used replacement policy
///
/// Evicts the line touched last. Ties go to the lowest index
#[derive(Debug, Default, Clone, Copy)]
pub struct MostRecentlyUsed;

impl ReplacementPolicy for MostRecentlyUsed {
    fn select_victim(&mut self, lines: &[CacheLine]) -> usize {
        let mut max_index = 0;
        let mut index = 1;
        while index < lines.len() {
            if lines[index].last_access > lines[max_index].last_access {
                max_index = index;
            }
            index += 1;
        }
        max_index
    }
}

/// Uniformly random replacement policy
///
/// The random source is always handed in by the caller, so a run can be reproduced from its seed
#[derive(Debug, Clone)]
pub struct RandomReplacement<G: Rng = ChaCha8Rng> {
    rng: G,
}

impl<G: Rng> RandomReplacement<G> {
    pub fn new(rng: G) -> Self {
        Self { rng }
    }
}

impl RandomReplacement<ChaCha8Rng> {
    /// Random replacement driven by a ChaCha8 generator seeded with `seed`
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<G: Rng> ReplacementPolicy for RandomReplacement<G> {
    fn select_victim(&mut self, lines: &[CacheLine]) -> usize {
        self.rng.gen_range(0..lines.len())
    }
}
