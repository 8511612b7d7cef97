//! Unit tests for configuration and response scanning.

use crate::config::BridgeConfig;
use crate::trampoline::scan_terminator;
use crate::Loader;

#[test]
fn test_config_default() {
    let config = BridgeConfig::default();
    assert_eq!(config.max_memory, 64 * 1024 * 1024);
    assert!(config.fuel_limit.is_none());
    assert_eq!(config.optimization_level, 2);
}

#[test]
fn test_config_minimal() {
    let config = BridgeConfig::minimal();
    assert_eq!(config.max_memory, 16 * 1024 * 1024);
    assert!(config.fuel_limit.is_some());
}

#[test]
fn test_config_builder_chain() {
    let config = BridgeConfig::default()
        .max_memory(128 * 1024 * 1024)
        .fuel_limit(500_000_000)
        .optimize(3);

    assert_eq!(config.max_memory, 128 * 1024 * 1024);
    assert_eq!(config.fuel_limit, Some(500_000_000));
    assert_eq!(config.optimization_level, 3);
}

#[test]
fn test_config_optimize_clamps() {
    let config = BridgeConfig::default().optimize(9);
    assert_eq!(config.optimization_level, 3);
}

#[test]
fn test_loader_creation() {
    let loader = Loader::new(BridgeConfig::default());
    assert!(loader.is_ok());
}

#[test]
fn test_terminator_at_offset() {
    assert_eq!(scan_terminator(b"abc\0def"), Some(3));
}

#[test]
fn test_terminator_first_byte() {
    assert_eq!(scan_terminator(b"\0abc"), Some(0));
}

#[test]
fn test_terminator_missing() {
    assert_eq!(scan_terminator(b"abcdef"), None);
}

#[test]
fn test_terminator_empty_input() {
    assert_eq!(scan_terminator(b""), None);
}
