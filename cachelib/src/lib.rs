//! # CacheLib
//!
//! Cachelib is a library for simulating a single set-associative cache
//!
//! Each access is classified as a hit, a miss filling an empty line, or a miss evicting a resident
//! line, in which case the address of the evicted line is reported. The cache is parameterised by
//! its geometry (address width, set index bits, line offset bits, lines per set) and a replacement
//! policy
//!
//! It prioritises exact, reproducible results: recency comes from a single logical clock and the
//! random policy only ever draws from a generator supplied by the caller

/// Splits addresses into tags and set indices
pub mod address;

/// Contains the cache lines and sets, and the trait shared by all simulators
pub mod cache;

/// A simulator which can be shared between threads, locking one set per access
pub mod concurrent;

/// Contains definitions for the JSON configuration format
pub mod config;

pub mod error;

/// Reading traces of addresses
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to run a configured cache over addresses
pub mod simulator;
#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
