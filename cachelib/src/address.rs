use crate::config::CacheConfig;

/// Splits addresses into a tag and a set index, and rebuilds line addresses from the two
///
/// All masks are computed once on construction. Shift amounts can reach 64 (a 64 bit address
/// with no set or offset bits, for example), so every shift by a geometry dependent amount goes
/// through the checked shifts rather than the raw operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDecoder {
    line_offset_bits: u32,
    set_index_bits: u32,
    set_index_mask: u64,
    address_mask: u64,
}

impl AddressDecoder {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            line_offset_bits: config.line_offset_bits,
            set_index_bits: config.set_index_bits,
            set_index_mask: low_bits_mask(config.set_index_bits),
            address_mask: low_bits_mask(config.address_bits),
        }
    }

    /// Converts an address into a tag and a set index
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::address::AddressDecoder;
    /// use cachelib::config::{CacheConfig, ReplacementPolicyConfig};
    /// let config = CacheConfig::new(4, 2, 6, 64, ReplacementPolicyConfig::LeastRecentlyUsed);
    /// let decoder = AddressDecoder::new(&config);
    /// assert_eq!(decoder.decode(0x1_2c0), (0x4, 0xb));
    /// assert_eq!(decoder.decode(u64::MAX), (u64::MAX >> 10, 0xf));
    /// ```
    #[inline(always)]
    pub fn decode(&self, address: u64) -> (u64, u64) {
        let address = address & self.address_mask;
        let set_index = shr(address, self.line_offset_bits) & self.set_index_mask;
        let tag = shr(address, self.set_index_bits + self.line_offset_bits);
        (tag, set_index)
    }

    /// Rebuilds the address of the first byte of a line from its tag and set index. The offset
    /// bits were never observed, so they come back as zero
    #[inline(always)]
    pub fn reconstruct(&self, tag: u64, set_index: u64) -> u64 {
        shl(tag, self.set_index_bits + self.line_offset_bits) | shl(set_index, self.line_offset_bits)
    }

    /// True if the address has no bits set above the configured address width
    #[inline(always)]
    pub fn contains(&self, address: u64) -> bool {
        address & !self.address_mask == 0
    }

    pub fn address_mask(&self) -> u64 {
        self.address_mask
    }
}

/// Mask of the low `bits` bits
///
/// `1 << 64` overflows, so the full width is its own branch
///
/// ```
/// use cachelib::address::low_bits_mask;
/// assert_eq!(low_bits_mask(0), 0);
/// assert_eq!(low_bits_mask(12), 0xfff);
/// assert_eq!(low_bits_mask(64), u64::MAX);
/// ```
pub fn low_bits_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

// Shifting everything out leaves zero, instead of the overflow the operators would give
#[inline(always)]
fn shr(value: u64, bits: u32) -> u64 {
    value.checked_shr(bits).unwrap_or(0)
}

#[inline(always)]
fn shl(value: u64, bits: u32) -> u64 {
    value.checked_shl(bits).unwrap_or(0)
}
