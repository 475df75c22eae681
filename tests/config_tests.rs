// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Integration tests for node configuration files
//!
//! These tests verify loading node configuration from disk, partial
//! documents falling back to defaults, and the errors reported for bad files.

use alertnode::{AlertPolicy, ConfigError, NodeConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_load_partial_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.json");
    fs::write(
        &path,
        r#"{
            "device_id": "ESP_004",
            "collector": "192.168.4.1:5683",
            "tick_interval_ms": 2000,
            "alert": { "policy": { "command": { "activate": 49, "deactivate": 48 } } }
        }"#,
    )
    .unwrap();

    let config = NodeConfig::load(&path).unwrap();
    assert_eq!(config.device_id, "ESP_004");
    assert_eq!(config.collector, "192.168.4.1:5683".parse().unwrap());
    assert_eq!(config.tick_interval_ms, 2_000);
    assert_eq!(config.alert.policy, AlertPolicy::ascii_command());

    // Everything else keeps its default
    let defaults = NodeConfig::default();
    assert_eq!(config.network_poll_ms, defaults.network_poll_ms);
    assert_eq!(config.alert.resource_path, "alert");
    assert_eq!(config.alert.tone, defaults.alert.tone);
    assert_eq!(config.microphone, defaults.microphone);
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.json");

    let mut original = NodeConfig::new("ESP_003", "10.42.0.1:4832".parse().unwrap());
    original.liveness_probe = true;
    original.alert.chunk_frames = 0;
    original.alert.tone.frequency_hz = 880.0;
    original.motion.debounce_reads = 3;

    fs::write(&path, original.to_json()).unwrap();
    let loaded = NodeConfig::load(&path).unwrap();

    assert_eq!(loaded, original);
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let result = NodeConfig::load(&path);
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn test_load_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.json");
    fs::write(&path, "{ \"device_id\": ").unwrap();

    let result = NodeConfig::load(&path);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.json");

    fs::write(&path, r#"{ "device_id": "ESP\"01" }"#).unwrap();
    assert!(matches!(
        NodeConfig::load(&path),
        Err(ConfigError::Invalid { field: "device_id", .. })
    ));

    fs::write(&path, r#"{ "alert": { "tone": { "frequency_hz": 9000.0 } } }"#).unwrap();
    assert!(matches!(
        NodeConfig::load(&path),
        Err(ConfigError::Invalid { field: "alert.tone.frequency_hz", .. })
    ));

    fs::write(&path, r#"{ "tick_interval_ms": 0 }"#).unwrap();
    assert!(matches!(
        NodeConfig::load(&path),
        Err(ConfigError::Invalid { field: "tick_interval_ms", .. })
    ));
}

#[test]
fn test_binding_fields_are_not_node_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.json");
    // Older files carried the transport's local port
    fs::write(&path, r#"{ "device_id": "ESP_006", "local_port": 4832 }"#).unwrap();

    let config = NodeConfig::load(&path).unwrap();
    assert_eq!(config.device_id, "ESP_006");
    assert!(!config.to_json().contains("local_port"));
}
