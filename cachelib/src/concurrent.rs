use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use log::debug;
use crate::address::AddressDecoder;
use crate::cache::{CacheLine, CacheResult, CacheSet};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::replacement_policies::ReplacementPolicy;

/// A cache simulator that several trace replay threads can share
///
/// Each access only locks the set it maps to, so threads hitting different sets never contend.
/// The access counter is a single atomic sequence, giving a total order of accesses across all
/// sets. The policy has its own lock, only taken while a victim is chosen, and always after the
/// set lock
#[derive(Debug)]
pub struct SharedCacheSimulator<R: ReplacementPolicy> {
    config: CacheConfig,
    decoder: AddressDecoder,
    sets: Vec<Mutex<CacheSet>>,
    replacement_policy: Mutex<R>,
    access_counter: AtomicU64,
}

impl<R: ReplacementPolicy> SharedCacheSimulator<R> {
    pub fn new(config: CacheConfig, policy: R) -> Result<Self, CacheError> {
        config.validate()?;
        let num_sets = config.num_sets();
        let mut sets = Vec::new();
        let allocation_failed = || CacheError::AllocationFailed {
            sets: num_sets,
            lines_per_set: config.lines_per_set,
        };
        sets.try_reserve_exact(num_sets as usize).map_err(|_| allocation_failed())?;
        for index in 0..num_sets {
            sets.push(Mutex::new(CacheSet::new(index, config.lines_per_set).map_err(|_| allocation_failed())?));
        }
        debug!("Built shared cache of {num_sets} sets x {} lines", config.lines_per_set);
        Ok(Self {
            decoder: AddressDecoder::new(&config),
            config,
            sets,
            replacement_policy: Mutex::new(policy),
            access_counter: AtomicU64::new(0),
        })
    }

    /// Same contract as `CacheTrait::access` on the single threaded simulator
    pub fn access(&self, input: u64) -> Result<CacheResult, CacheError> {
        if !self.decoder.contains(input) {
            return Err(CacheError::AddressOutOfRange {
                address: input,
                address_bits: self.config.address_bits,
            });
        }
        let (tag, set) = self.decoder.decode(input);
        let mut set = lock(&self.sets[set as usize]);
        // Taken under the set lock, so the order of stamps within a set matches the order of accesses
        let counter = self.access_counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(set.access(tag, counter, &mut PolicyGuard(&self.replacement_policy), &self.decoder))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn access_count(&self) -> u64 {
        self.access_counter.load(Ordering::Relaxed)
    }

    pub fn valid_line_counts(&self) -> Vec<usize> {
        self.sets.iter().map(|set| lock(set).valid_line_count()).collect()
    }

    /// Consumes the simulator, handing back plain sets for inspection
    pub fn into_sets(self) -> Vec<CacheSet> {
        self.sets
            .into_iter()
            .map(|set| set.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }
}

// A panic mid access can only leave a single line half written, which is still a usable cache
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Locks the shared policy only when the set actually needs a victim
struct PolicyGuard<'a, R>(&'a Mutex<R>);

impl<R: ReplacementPolicy> ReplacementPolicy for PolicyGuard<'_, R> {
    fn select_victim(&mut self, lines: &[CacheLine]) -> usize {
        lock(self.0).select_victim(lines)
    }
}
