use thiserror::Error;

/// Errors raised by the simulators
///
/// `InvalidConfig` and `AllocationFailed` only come out of construction, no partially built
/// simulator is ever returned. `AddressOutOfRange` is raised per access and leaves the cache
/// untouched, so a caller replaying a trace can skip the address and carry on
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    #[error("address {address:#x} does not fit in {address_bits} address bits")]
    AddressOutOfRange { address: u64, address_bits: u32 },

    #[error("couldn't allocate {sets} sets of {lines_per_set} lines")]
    AllocationFailed { sets: u64, lines_per_set: usize },
}
