use serde::{Deserialize, Serialize};
use crate::error::CacheError;

/// The geometry and replacement policy of a single set-associative cache
///
/// Addresses are split, from the most significant bit down, into a tag, `set_index_bits` of set
/// index and `line_offset_bits` of offset into the line. Only the low `address_bits` bits of an
/// address may be set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub set_index_bits: u32,
    pub lines_per_set: usize,
    pub line_offset_bits: u32,
    pub address_bits: u32,
    #[serde(default = "ReplacementPolicyConfig::default")]
    pub replacement_policy: ReplacementPolicyConfig,
    /// Seed for the random policy when the simulator is built from this configuration
    #[serde(default)]
    pub seed: u64,
}

/// The replacement policy - lru, mru, or random. Defaults to lru.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "mru")]
    MostRecentlyUsed,
    #[serde(alias = "random")]
    Random,
}

impl Default for ReplacementPolicyConfig {
    fn default() -> Self {
        ReplacementPolicyConfig::LeastRecentlyUsed
    }
}

impl CacheConfig {
    pub fn new(set_index_bits: u32, lines_per_set: usize, line_offset_bits: u32, address_bits: u32, replacement_policy: ReplacementPolicyConfig) -> Self {
        Self {
            set_index_bits,
            lines_per_set,
            line_offset_bits,
            address_bits,
            replacement_policy,
            seed: 0,
        }
    }

    /// Checks the geometry can describe a real cache
    ///
    /// ```
    /// use cachelib::config::{CacheConfig, ReplacementPolicyConfig};
    /// assert!(CacheConfig::new(4, 2, 6, 64, ReplacementPolicyConfig::LeastRecentlyUsed).validate().is_ok());
    /// assert!(CacheConfig::new(4, 0, 6, 64, ReplacementPolicyConfig::LeastRecentlyUsed).validate().is_err());
    /// assert!(CacheConfig::new(8, 1, 8, 12, ReplacementPolicyConfig::Random).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.address_bits == 0 || self.address_bits > u64::BITS {
            return Err(CacheError::InvalidConfig(format!("address_bits must be between 1 and 64, got {}", self.address_bits)));
        }
        if self.lines_per_set == 0 {
            return Err(CacheError::InvalidConfig("lines_per_set must be at least 1".to_string()));
        }
        // Written as a subtraction so huge bit counts can't overflow the sum
        if self.set_index_bits > self.address_bits || self.line_offset_bits > self.address_bits - self.set_index_bits {
            return Err(CacheError::InvalidConfig(format!(
                "set_index_bits ({}) + line_offset_bits ({}) exceeds address_bits ({})",
                self.set_index_bits, self.line_offset_bits, self.address_bits
            )));
        }
        // One set per index value has to be addressable in memory
        if self.set_index_bits >= usize::BITS {
            return Err(CacheError::InvalidConfig(format!("{} set index bits is too many sets to allocate", self.set_index_bits)));
        }
        Ok(())
    }

    /// Number of sets, only meaningful for a validated config
    pub fn num_sets(&self) -> u64 {
        1u64 << self.set_index_bits
    }

    /// Width of the tag stored in each line
    pub fn tag_bits(&self) -> u32 {
        self.address_bits - self.set_index_bits - self.line_offset_bits
    }
}
