use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use crate::address::AddressDecoder;
use crate::cache::{CacheLine, CacheResult, CacheTrait};
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::error::CacheError;
use crate::io::{TraceError, TraceReader};
use crate::replacement_policies::{LeastRecentlyUsed, MostRecentlyUsed, RandomReplacement, ReplacementPolicy};
use crate::simulator::{AccessRecord, CacheSimulator, GenericCacheSimulator};
use crate::util::{get_configs, load_config, load_trace};

#[test]
fn run_all_examples() -> Result<(), Box<dyn Error>> {
    let cases = get_configs()?;
    assert!(!cases.is_empty());
    for test in cases {
        println!("Running test for {}", test.output);
        let config = load_config(&test.config)?;
        let trace = load_trace(&test.trace)?;
        // Read expected output
        let expected_output_file = File::open(&test.output)?;
        let expected_output: Vec<AccessRecord> = serde_json::from_reader(BufReader::new(expected_output_file))?;
        // Simulate!
        let mut simulator = GenericCacheSimulator::from_config(&config)?;
        let result = simulator.replay(trace)?;
        assert_eq!(result, expected_output, "{}", test.output);
    }
    Ok(())
}

fn one_set(lines_per_set: usize, policy: ReplacementPolicyConfig) -> CacheConfig {
    CacheConfig::new(0, lines_per_set, 6, 32, policy)
}

// With no set bits, the tag is everything above the offset
fn block(tag: u64) -> u64 {
    tag << 6
}

#[test]
fn lru_evicts_oldest_line() -> Result<(), CacheError> {
    let mut simulator = CacheSimulator::new(one_set(2, ReplacementPolicyConfig::LeastRecentlyUsed), LeastRecentlyUsed)?;
    assert_eq!(simulator.access(block(1))?, CacheResult::MissFill);
    assert_eq!(simulator.access(block(2))?, CacheResult::MissFill);
    assert_eq!(simulator.access(block(3))?, CacheResult::MissEvict { evicted_address: block(1) });
    // A hit refreshes a line, so 2 is now the oldest
    assert_eq!(simulator.access(block(3))?, CacheResult::Hit);
    assert_eq!(simulator.access(block(1))?, CacheResult::MissEvict { evicted_address: block(2) });
    Ok(())
}

#[test]
fn mru_evicts_newest_line() -> Result<(), CacheError> {
    let mut simulator = CacheSimulator::new(one_set(2, ReplacementPolicyConfig::MostRecentlyUsed), MostRecentlyUsed)?;
    assert_eq!(simulator.access(block(1))?, CacheResult::MissFill);
    assert_eq!(simulator.access(block(2))?, CacheResult::MissFill);
    assert_eq!(simulator.access(block(3))?, CacheResult::MissEvict { evicted_address: block(2) });
    assert_eq!(simulator.access(block(1))?, CacheResult::Hit);
    assert_eq!(simulator.access(block(4))?, CacheResult::MissEvict { evicted_address: block(1) });
    Ok(())
}

#[test]
fn repeated_access_hits_without_filling() -> Result<(), CacheError> {
    let config = CacheConfig::new(2, 4, 4, 32, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = GenericCacheSimulator::from_config(&config)?;
    assert_eq!(simulator.access(0xbeef0)?, CacheResult::MissFill);
    let occupied = simulator.valid_line_counts();
    assert_eq!(simulator.access(0xbeef0)?, CacheResult::Hit);
    // Different offset, same line
    assert_eq!(simulator.access(0xbeefc)?, CacheResult::Hit);
    assert_eq!(simulator.valid_line_counts(), occupied);
    Ok(())
}

fn check_fill_order<R: ReplacementPolicy>(policy: R) -> Result<(), CacheError> {
    let mut simulator = CacheSimulator::new(one_set(4, ReplacementPolicyConfig::LeastRecentlyUsed), policy)?;
    for tag in [9, 4, 7, 1] {
        assert_eq!(simulator.access(block(tag))?, CacheResult::MissFill);
    }
    let tags: Vec<u64> = simulator.sets()[0].lines().iter().map(|line| line.tag).collect();
    assert_eq!(tags, vec![9, 4, 7, 1]);
    let stamps: Vec<u64> = simulator.sets()[0].lines().iter().map(|line| line.last_access).collect();
    assert_eq!(stamps, vec![1, 2, 3, 4]);
    assert_eq!(simulator.uninitialised_line_count(), 0);
    Ok(())
}

#[test]
fn empty_set_fills_in_index_order() -> Result<(), CacheError> {
    check_fill_order(LeastRecentlyUsed)?;
    check_fill_order(MostRecentlyUsed)?;
    check_fill_order(RandomReplacement::from_seed(7))
}

#[test]
fn full_width_address_decodes_without_overflow() -> Result<(), CacheError> {
    let config = CacheConfig::new(4, 2, 6, 64, ReplacementPolicyConfig::LeastRecentlyUsed);
    let decoder = AddressDecoder::new(&config);
    assert_eq!(decoder.address_mask(), u64::MAX);
    assert_eq!(decoder.decode(u64::MAX), (u64::MAX >> 10, 0xf));
    assert!(decoder.contains(u64::MAX));

    let mut simulator = GenericCacheSimulator::from_config(&config)?;
    assert_eq!(simulator.address_to_tag_and_set(u64::MAX), (u64::MAX >> 10, 0xf));
    assert_eq!(simulator.access(u64::MAX)?, CacheResult::MissFill);
    assert_eq!(simulator.access(u64::MAX - 0x3f)?, CacheResult::Hit);
    Ok(())
}

#[test]
fn shifts_by_whole_address_width() -> Result<(), CacheError> {
    // Offset covers the whole address, every access lands on the same line
    let config = CacheConfig::new(0, 1, 64, 64, ReplacementPolicyConfig::LeastRecentlyUsed);
    let decoder = AddressDecoder::new(&config);
    assert_eq!(decoder.decode(0xdead_beef), (0, 0));
    assert_eq!(decoder.reconstruct(0, 0), 0);
    let mut simulator = CacheSimulator::new(config, LeastRecentlyUsed)?;
    assert_eq!(simulator.access(0x1234)?, CacheResult::MissFill);
    assert_eq!(simulator.access(u64::MAX)?, CacheResult::Hit);

    // No set or offset bits, the tag is the whole address
    let config = CacheConfig::new(0, 1, 0, 64, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = CacheSimulator::new(config, LeastRecentlyUsed)?;
    assert_eq!(simulator.address_to_tag_and_set(u64::MAX), (u64::MAX, 0));
    simulator.access(u64::MAX)?;
    assert_eq!(simulator.access(1)?, CacheResult::MissEvict { evicted_address: u64::MAX });
    Ok(())
}

#[test]
fn eviction_reports_line_address_in_its_set() -> Result<(), CacheError> {
    // 8 sets of 16 byte lines in a 12 bit address space
    let config = CacheConfig::new(3, 1, 4, 12, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = CacheSimulator::new(config, LeastRecentlyUsed)?;
    assert_eq!(simulator.access(0xa5c)?, CacheResult::MissFill);
    assert_eq!(simulator.address_to_tag_and_set(0xa5c), (0x14, 0x5));
    assert_eq!(simulator.access(0x35f)?, CacheResult::MissEvict { evicted_address: 0xa50 });
    Ok(())
}

#[test]
fn invalid_configs_are_rejected() {
    let invalid = [
        CacheConfig::new(0, 1, 0, 0, ReplacementPolicyConfig::LeastRecentlyUsed),
        CacheConfig::new(0, 1, 0, 65, ReplacementPolicyConfig::LeastRecentlyUsed),
        CacheConfig::new(2, 0, 4, 32, ReplacementPolicyConfig::LeastRecentlyUsed),
        CacheConfig::new(20, 2, 13, 32, ReplacementPolicyConfig::MostRecentlyUsed),
        CacheConfig::new(33, 2, 0, 32, ReplacementPolicyConfig::Random),
        CacheConfig::new(1, 2, u32::MAX, 64, ReplacementPolicyConfig::Random),
    ];
    for config in invalid {
        assert!(matches!(GenericCacheSimulator::from_config(&config), Err(CacheError::InvalidConfig(_))), "{config:?}");
    }
    // Every bit used, but nothing left over
    assert!(CacheConfig::new(20, 2, 12, 32, ReplacementPolicyConfig::LeastRecentlyUsed).validate().is_ok());
}

#[test]
fn out_of_range_address_leaves_cache_untouched() -> Result<(), CacheError> {
    let config = CacheConfig::new(2, 2, 4, 16, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = CacheSimulator::new(config, LeastRecentlyUsed)?;
    simulator.access(0x0010)?;
    let before = simulator.valid_line_counts();
    assert_eq!(
        simulator.access(0x1_0010),
        Err(CacheError::AddressOutOfRange { address: 0x1_0010, address_bits: 16 })
    );
    assert_eq!(simulator.valid_line_counts(), before);
    assert_eq!(simulator.access_count(), 1);
    // The stray address must not have been truncated into a hit
    assert_eq!(simulator.access(0x0010)?, CacheResult::Hit);
    Ok(())
}

#[test]
fn replay_stops_at_first_bad_address() -> Result<(), CacheError> {
    let config = CacheConfig::new(0, 2, 0, 8, ReplacementPolicyConfig::MostRecentlyUsed);
    let mut simulator = GenericCacheSimulator::from_config(&config)?;
    let error = simulator.replay([1, 2, 0x100, 3]).unwrap_err();
    assert_eq!(error, CacheError::AddressOutOfRange { address: 0x100, address_bits: 8 });
    assert_eq!(simulator.valid_line_counts(), vec![2]);
    Ok(())
}

#[test]
fn random_policy_is_reproducible_from_seed() -> Result<(), CacheError> {
    let mut config = CacheConfig::new(1, 4, 2, 16, ReplacementPolicyConfig::Random);
    config.seed = 0xc0ffee;
    let trace: Vec<u64> = (0..500u64).map(|i| (i * 7919) % 0x400).collect();
    let first = GenericCacheSimulator::from_config(&config)?.replay(trace.iter().copied())?;
    let second = GenericCacheSimulator::from_config(&config)?.replay(trace.iter().copied())?;
    assert_eq!(first, second);
    assert!(first.iter().any(|record| matches!(record.result, CacheResult::MissEvict { .. })));
    Ok(())
}

#[test]
fn random_policy_only_evicts_resident_lines() -> Result<(), CacheError> {
    let config = one_set(4, ReplacementPolicyConfig::Random);
    let mut simulator = CacheSimulator::new(config, RandomReplacement::from_seed(3))?;
    for tag in 0..64 {
        let resident: Vec<u64> = simulator.sets()[0].lines().iter().filter(|line| line.valid).map(|line| block(line.tag)).collect();
        if let CacheResult::MissEvict { evicted_address } = simulator.access(block(tag))? {
            assert!(resident.contains(&evicted_address));
        }
        assert!(simulator.valid_line_counts()[0] <= 4);
    }
    Ok(())
}

fn stamped(stamps: &[u64]) -> Vec<CacheLine> {
    stamps
        .iter()
        .enumerate()
        .map(|(tag, &last_access)| CacheLine { valid: true, tag: tag as u64, last_access })
        .collect()
}

#[test]
fn recency_policies_break_ties_on_lowest_index() {
    let lines = stamped(&[5, 2, 9, 2, 9]);
    assert_eq!(LeastRecentlyUsed.select_victim(&lines), 1);
    assert_eq!(MostRecentlyUsed.select_victim(&lines), 2);
    let single = stamped(&[4]);
    assert_eq!(LeastRecentlyUsed.select_victim(&single), 0);
    assert_eq!(MostRecentlyUsed.select_victim(&single), 0);
}

#[test]
fn random_policy_stays_in_range() {
    let lines = stamped(&[1, 2, 3]);
    let mut policy = RandomReplacement::from_seed(42);
    let mut seen = [false; 3];
    for _ in 0..200 {
        let victim = policy.select_victim(&lines);
        assert!(victim < lines.len());
        seen[victim] = true;
    }
    assert_eq!(seen, [true; 3]);
}

#[test]
fn config_parses_with_policy_aliases() -> Result<(), Box<dyn Error>> {
    let config: CacheConfig = serde_json::from_str(
        r#"{ "set_index_bits": 4, "lines_per_set": 8, "line_offset_bits": 6, "address_bits": 48, "replacement_policy": "random", "seed": 11 }"#,
    )?;
    assert_eq!(config.replacement_policy, ReplacementPolicyConfig::Random);
    assert_eq!(config.seed, 11);
    assert_eq!(config.num_sets(), 16);
    assert_eq!(config.tag_bits(), 38);

    let config: CacheConfig = serde_json::from_str(r#"{ "set_index_bits": 0, "lines_per_set": 1, "line_offset_bits": 0, "address_bits": 8 }"#)?;
    assert_eq!(config.replacement_policy, ReplacementPolicyConfig::LeastRecentlyUsed);
    assert_eq!(config.seed, 0);
    Ok(())
}

#[test]
fn trace_reader_reports_bad_lines() {
    let trace = "0x10\n\n  # comment only\nnot an address\n0x20\n";
    let results: Vec<Result<u64, TraceError>> = TraceReader::new(trace.as_bytes()).collect();
    assert_eq!(results.len(), 3);
    assert!(matches!(results[0], Ok(0x10)));
    match &results[1] {
        Err(TraceError::Parse { line, text }) => {
            assert_eq!(*line, 4);
            assert_eq!(text, "not an address");
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(matches!(results[2], Ok(0x20)));
}

#[test]
fn trace_reader_rejects_addresses_wider_than_64_bits() {
    let trace = "0x1ffffffffffffffff\n";
    let results: Vec<Result<u64, TraceError>> = TraceReader::new(trace.as_bytes()).collect();
    assert!(matches!(results.as_slice(), [Err(TraceError::Parse { line: 1, .. })]));
}
