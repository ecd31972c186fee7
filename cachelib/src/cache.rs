use log::trace;
use serde::{Deserialize, Serialize};
use crate::address::AddressDecoder;
use crate::error::CacheError;
use crate::replacement_policies::ReplacementPolicy;

/// A generic trait for caches
///
/// Implemented by every simulator flavour, so a driver can replay a trace without caring which
/// replacement policy was configured
pub trait CacheTrait {
    /// Converts an address into a tag and a set index
    fn address_to_tag_and_set(&self, input: u64) -> (u64, u64);

    /// Accesses the line holding `input`, updating the cache and reporting what happened
    ///
    /// # Arguments
    ///
    /// * `input`: The address of the access. Offset bits are ignored
    ///
    /// returns: Result<CacheResult, CacheError>, only `AddressOutOfRange` is possible and the
    /// cache is left untouched when it is returned
    fn access(&mut self, input: u64) -> Result<CacheResult, CacheError>;

    /// Gets the number of valid lines in each set
    fn valid_line_counts(&self) -> Vec<usize>;

    /// Gets the number of uninitialised cache lines. Useful for analysing cache performance or
    /// debugging
    fn uninitialised_line_count(&self) -> usize;
}

/// The outcome of a single access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheResult {
    Hit,
    /// Miss placed into a line that was still invalid
    MissFill,
    /// Miss that replaced a resident line, whose reconstructed address is reported
    MissEvict { evicted_address: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u64,
    /// Value of the access counter when the line was last filled or hit. Meaningless while invalid
    pub last_access: u64,
}

impl CacheLine {
    #[inline(always)]
    fn store(&mut self, tag: u64, counter: u64) {
        self.valid = true;
        self.tag = tag;
        self.last_access = counter;
    }
}

/// One set of the cache, a fixed number of lines allocated up front
///
/// The position of a line is only its identity. Recency lives in the lines' timestamps
#[derive(Debug, Clone)]
pub struct CacheSet {
    index: u64,
    lines: Box<[CacheLine]>,
}

impl CacheSet {
    /// Builds a set of invalid lines. Fails rather than aborting if the lines can't be allocated
    pub fn new(index: u64, lines_per_set: usize) -> Result<Self, CacheError> {
        let mut lines = Vec::new();
        lines.try_reserve_exact(lines_per_set).map_err(|_| CacheError::AllocationFailed { sets: 1, lines_per_set })?;
        lines.resize(lines_per_set, CacheLine::default());
        Ok(Self {
            index,
            lines: lines.into_boxed_slice(),
        })
    }

    /// Looks `tag` up in the set, filling or replacing a line on a miss
    ///
    /// At most one line is modified. Empty lines are filled lowest index first, the policy is only
    /// consulted once the set is full
    ///
    /// # Arguments
    ///
    /// * `tag`: The tag of the accessed address
    /// * `counter`: The simulator's access counter for this access, stamped onto the touched line
    /// * `policy`: Chooses the victim when the set is full
    /// * `decoder`: Rebuilds the victim's address
    ///
    /// returns: CacheResult
    pub fn access<R: ReplacementPolicy + ?Sized>(&mut self, tag: u64, counter: u64, policy: &mut R, decoder: &AddressDecoder) -> CacheResult {
        // Cache hit
        if let Some(line) = self.lines.iter_mut().find(|line| line.valid && line.tag == tag) {
            line.last_access = counter;
            return CacheResult::Hit;
        }
        // Cache miss with space left
        if let Some(line) = self.lines.iter_mut().find(|line| !line.valid) {
            line.store(tag, counter);
            return CacheResult::MissFill;
        }
        // Cache miss on a full set
        let victim = policy.select_victim(&self.lines);
        let line = &mut self.lines[victim];
        let evicted_address = decoder.reconstruct(line.tag, self.index);
        trace!("set {}: evicting line {victim} ({evicted_address:#x})", self.index);
        line.store(tag, counter);
        CacheResult::MissEvict { evicted_address }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn valid_line_count(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }
}
