use log::debug;
use serde::{Deserialize, Serialize};
use crate::address::AddressDecoder;
use crate::cache::{CacheResult, CacheSet, CacheTrait};
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::error::CacheError;
use crate::replacement_policies::{LeastRecentlyUsed, MostRecentlyUsed, RandomReplacement, ReplacementPolicy};

/// A set-associative cache simulator, parameterised by a replacement policy
///
/// Every set and line is allocated on construction. The simulator keeps one logical clock for the
/// whole cache, bumped once per access and stamped onto the line that access touched, which gives
/// the policies an exact recency order across all lines
///
/// Monomorphising over the policy lets the compiler inline victim selection, see
/// [`GenericCacheSimulator`] for picking the policy at runtime
#[derive(Debug)]
pub struct CacheSimulator<R: ReplacementPolicy> {
    config: CacheConfig,
    decoder: AddressDecoder,
    sets: Vec<CacheSet>,
    replacement_policy: R,
    access_counter: u64,
}

impl<R: ReplacementPolicy> CacheSimulator<R> {
    /// Creates a new simulator for a given configuration
    ///
    /// The policy in `config` is informational here, `policy` is the one used
    ///
    /// # Arguments
    ///
    /// * `config`: The cache geometry, validated before anything is allocated
    /// * `policy`: The replacement policy
    ///
    /// returns: Result<CacheSimulator<R>, CacheError>
    pub fn new(config: CacheConfig, policy: R) -> Result<Self, CacheError> {
        config.validate()?;
        let num_sets = config.num_sets();
        let mut sets = Vec::new();
        sets.try_reserve_exact(num_sets as usize).map_err(|_| CacheError::AllocationFailed {
            sets: num_sets,
            lines_per_set: config.lines_per_set,
        })?;
        for index in 0..num_sets {
            sets.push(CacheSet::new(index, config.lines_per_set).map_err(|_| CacheError::AllocationFailed {
                sets: num_sets,
                lines_per_set: config.lines_per_set,
            })?);
        }
        debug!(
            "Built {num_sets} sets x {} lines ({} tag bits, {} set bits, {} offset bits)",
            config.lines_per_set, config.tag_bits(), config.set_index_bits, config.line_offset_bits
        );
        Ok(Self {
            decoder: AddressDecoder::new(&config),
            config,
            sets,
            replacement_policy: policy,
            access_counter: 0,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// Number of accesses that reached the cache. Rejected addresses aren't counted
    pub fn access_count(&self) -> u64 {
        self.access_counter
    }
}

impl<R: ReplacementPolicy> CacheTrait for CacheSimulator<R> {
    fn address_to_tag_and_set(&self, input: u64) -> (u64, u64) {
        self.decoder.decode(input)
    }

    fn access(&mut self, input: u64) -> Result<CacheResult, CacheError> {
        // Checked before anything changes, so a rejected address leaves no trace
        if !self.decoder.contains(input) {
            return Err(CacheError::AddressOutOfRange {
                address: input,
                address_bits: self.config.address_bits,
            });
        }
        let (tag, set) = self.decoder.decode(input);
        self.access_counter += 1;
        Ok(self.sets[set as usize].access(tag, self.access_counter, &mut self.replacement_policy, &self.decoder))
    }

    fn valid_line_counts(&self) -> Vec<usize> {
        self.sets.iter().map(CacheSet::valid_line_count).collect()
    }

    fn uninitialised_line_count(&self) -> usize {
        self.sets.iter().map(|set| set.lines().len() - set.valid_line_count()).sum()
    }
}

/// Enum for the 3 replacement policies provided by the library
///
/// It's much faster to explicitly branch on all implementations than to go through a trait
/// object, as the compiler can reason about the concrete types and inline the policies
#[derive(Debug)]
pub enum GenericCacheSimulator {
    LeastRecentlyUsed(CacheSimulator<LeastRecentlyUsed>),
    MostRecentlyUsed(CacheSimulator<MostRecentlyUsed>),
    Random(CacheSimulator<RandomReplacement>),
}

impl From<CacheSimulator<LeastRecentlyUsed>> for GenericCacheSimulator {
    fn from(value: CacheSimulator<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<CacheSimulator<MostRecentlyUsed>> for GenericCacheSimulator {
    fn from(value: CacheSimulator<MostRecentlyUsed>) -> Self {
        Self::MostRecentlyUsed(value)
    }
}

impl From<CacheSimulator<RandomReplacement>> for GenericCacheSimulator {
    fn from(value: CacheSimulator<RandomReplacement>) -> Self {
        Self::Random(value)
    }
}

impl GenericCacheSimulator {
    /// Creates a simulator using the policy named in the configuration
    ///
    /// The random policy is seeded with `config.seed`
    ///
    /// ```
    /// use cachelib::cache::{CacheResult, CacheTrait};
    /// use cachelib::config::{CacheConfig, ReplacementPolicyConfig};
    /// use cachelib::simulator::GenericCacheSimulator;
    /// let config = CacheConfig::new(0, 1, 0, 16, ReplacementPolicyConfig::MostRecentlyUsed);
    /// let mut simulator = GenericCacheSimulator::from_config(&config).unwrap();
    /// assert_eq!(simulator.access(0x10).unwrap(), CacheResult::MissFill);
    /// assert_eq!(simulator.access(0x10).unwrap(), CacheResult::Hit);
    /// assert_eq!(simulator.access(0x20).unwrap(), CacheResult::MissEvict { evicted_address: 0x10 });
    /// ```
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let config = config.clone();
        let policy = config.replacement_policy;
        Ok(match policy {
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCacheSimulator::from(CacheSimulator::new(config, LeastRecentlyUsed)?)
            }
            ReplacementPolicyConfig::MostRecentlyUsed => {
                GenericCacheSimulator::from(CacheSimulator::new(config, MostRecentlyUsed)?)
            }
            ReplacementPolicyConfig::Random => {
                let seed = config.seed;
                GenericCacheSimulator::from(CacheSimulator::new(config, RandomReplacement::from_seed(seed))?)
            }
        })
    }

    pub fn config(&self) -> &CacheConfig {
        match self {
            GenericCacheSimulator::LeastRecentlyUsed(c) => c.config(),
            GenericCacheSimulator::MostRecentlyUsed(c) => c.config(),
            GenericCacheSimulator::Random(c) => c.config()
        }
    }

    /// Replays a whole trace, recording the outcome of every access
    ///
    /// Stops at the first address that doesn't fit the cache, everything before it has already
    /// been applied
    pub fn replay<I: IntoIterator<Item = u64>>(&mut self, addresses: I) -> Result<Vec<AccessRecord>, CacheError> {
        addresses
            .into_iter()
            .map(|address| self.access(address).map(|result| AccessRecord { address, result }))
            .collect()
    }
}

impl CacheTrait for GenericCacheSimulator {
    fn address_to_tag_and_set(&self, input: u64) -> (u64, u64) {
        match self {
            GenericCacheSimulator::LeastRecentlyUsed(c) => c.address_to_tag_and_set(input),
            GenericCacheSimulator::MostRecentlyUsed(c) => c.address_to_tag_and_set(input),
            GenericCacheSimulator::Random(c) => c.address_to_tag_and_set(input)
        }
    }

    fn access(&mut self, input: u64) -> Result<CacheResult, CacheError> {
        match self {
            GenericCacheSimulator::LeastRecentlyUsed(c) => c.access(input),
            GenericCacheSimulator::MostRecentlyUsed(c) => c.access(input),
            GenericCacheSimulator::Random(c) => c.access(input)
        }
    }

    fn valid_line_counts(&self) -> Vec<usize> {
        match self {
            GenericCacheSimulator::LeastRecentlyUsed(c) => c.valid_line_counts(),
            GenericCacheSimulator::MostRecentlyUsed(c) => c.valid_line_counts(),
            GenericCacheSimulator::Random(c) => c.valid_line_counts()
        }
    }

    fn uninitialised_line_count(&self) -> usize {
        match self {
            GenericCacheSimulator::LeastRecentlyUsed(c) => c.uninitialised_line_count(),
            GenericCacheSimulator::MostRecentlyUsed(c) => c.uninitialised_line_count(),
            GenericCacheSimulator::Random(c) => c.uninitialised_line_count()
        }
    }
}

/// One access of a replayed trace. Serialised to the output format of the binary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct AccessRecord {
    pub address: u64,
    pub result: CacheResult,
}
