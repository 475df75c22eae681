// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Node configuration
//!
//! Everything that used to be hard-coded on the board (device identity,
//! collector address, cadence, tone parameters) is injected through
//! [`NodeConfig`]. Every section has sensible defaults and can be
//! deserialized from a partial JSON document.

use crate::alert::AlertPolicy;
use crate::error::ConfigError;
use crate::tone::AudioWaveform;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default collector port
pub const DEFAULT_PORT: u16 = 4832;

/// Master configuration for a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identifier put in every telemetry payload
    pub device_id: String,

    /// Collector address and port
    pub collector: SocketAddr,

    /// Sleep between publish cycles (ms)
    pub tick_interval_ms: u64,

    /// Poll interval while waiting for network association (ms)
    pub network_poll_ms: u64,

    /// Send a `ping` after each publish cycle
    pub liveness_probe: bool,

    /// Inbound alert handling
    pub alert: AlertConfig,

    /// Microphone envelope analysis
    pub microphone: EnvelopeConfig,

    /// Ultrasonic ranging
    pub distance: DistanceConfig,

    /// Presence detection
    pub motion: MotionConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "ESP_001".to_string(),
            collector: SocketAddr::from(([10, 42, 0, 1], DEFAULT_PORT)),
            tick_interval_ms: 5_000,
            network_poll_ms: 500,
            liveness_probe: false,
            alert: AlertConfig::default(),
            microphone: EnvelopeConfig::default(),
            distance: DistanceConfig::default(),
            motion: MotionConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a configuration for a device and collector
    pub fn new(device_id: impl Into<String>, collector: SocketAddr) -> Self {
        Self {
            device_id: device_id.into(),
            collector,
            ..Default::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> String {
        // Plain structs with string keys always serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every field the node relies on
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::invalid("device_id", "must not be empty"));
        }
        // Telemetry payloads are built without escaping.
        if let Some(c) = self
            .device_id
            .chars()
            .find(|c| *c == '"' || *c == '\\' || c.is_control())
        {
            return Err(ConfigError::invalid(
                "device_id",
                format!("character {:?} would need JSON escaping", c),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms", "must be positive"));
        }
        if self.network_poll_ms == 0 {
            return Err(ConfigError::invalid("network_poll_ms", "must be positive"));
        }
        self.alert.validate()?;
        self.microphone.validate()?;
        self.distance.validate()?;
        Ok(())
    }
}

/// Inbound alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Inbound resource path the dispatcher is registered on
    pub resource_path: String,

    /// Trigger policy
    pub policy: AlertPolicy,

    /// Tone played on alert
    pub tone: ToneConfig,

    /// Frames written per scheduler tick; 0 plays the whole tone at once
    pub chunk_frames: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            resource_path: "alert".to_string(),
            policy: AlertPolicy::default(),
            tone: ToneConfig::default(),
            chunk_frames: 256,
        }
    }
}

impl AlertConfig {
    /// Configuration that plays tones to completion inside the dispatch
    pub fn blocking() -> Self {
        Self {
            chunk_frames: 0,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.resource_path.is_empty() || self.resource_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "alert.resource_path",
                "must be a non-empty relative path",
            ));
        }
        self.tone.validate()
    }
}

/// Alert tone parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Output sample rate (Hz)
    pub sample_rate: u32,
    /// Tone frequency (Hz)
    pub frequency_hz: f32,
    /// Tone length (ms)
    pub duration_ms: u32,
    /// Amplitude, 0.0 - 1.0
    pub amplitude: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frequency_hz: 1_000.0,
            duration_ms: 200,
            amplitude: 0.5,
        }
    }
}

impl ToneConfig {
    /// Waveform described by this configuration
    pub fn waveform(&self) -> AudioWaveform {
        AudioWaveform::new(
            self.sample_rate,
            self.frequency_hz,
            self.duration_ms,
            self.amplitude,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("alert.tone.sample_rate", "must be positive"));
        }
        if !(self.frequency_hz > 0.0 && self.frequency_hz < self.sample_rate as f32 / 2.0) {
            return Err(ConfigError::invalid(
                "alert.tone.frequency_hz",
                format!("must lie in (0, {}) Hz", self.sample_rate / 2),
            ));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(ConfigError::invalid("alert.tone.amplitude", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Microphone envelope analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Sampling window (ms)
    pub window_ms: u64,
    /// Hard cap on reads per window
    ///
    /// Guards against a stalled clock. On an ADC faster than
    /// `max_samples / window_ms` reads per millisecond the cap ends the
    /// window early and slow envelopes read low; raise it for such inputs.
    pub max_samples: u32,
    /// Peak-to-peak below this is silence
    pub noise_floor: u16,
    /// ADC reference voltage (V)
    pub supply_volts: f32,
    /// ADC steps per full scale
    pub adc_steps: f32,
    /// 0 dB reference voltage (V)
    pub reference_volts: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            window_ms: 50,
            max_samples: 4_096,
            noise_floor: 10,
            supply_volts: 3.3,
            adc_steps: 1024.0,
            reference_volts: 0.00631,
        }
    }
}

impl EnvelopeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms == 0 || self.max_samples == 0 {
            return Err(ConfigError::invalid("microphone.window_ms", "window must not be empty"));
        }
        if !(self.supply_volts > 0.0 && self.adc_steps > 0.0 && self.reference_volts > 0.0) {
            return Err(ConfigError::invalid(
                "microphone.reference_volts",
                "voltages and ADC steps must be positive",
            ));
        }
        Ok(())
    }
}

/// Ultrasonic ranging parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Readings beyond this are treated as a missed echo (cm)
    pub max_range_cm: f32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self { max_range_cm: 400.0 }
    }
}

impl DistanceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_range_cm > 0.0 && self.max_range_cm.is_finite()) {
            return Err(ConfigError::invalid("distance.max_range_cm", "must be positive"));
        }
        Ok(())
    }
}

/// Presence detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Consecutive identical reads needed to change the reported state
    pub debounce_reads: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { debounce_reads: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_config_default() {
        let config = NodeConfig::default();
        assert_eq!(config.collector.port(), DEFAULT_PORT);
        assert_eq!(config.tick_interval_ms, 5_000);
        assert_eq!(config.alert.resource_path, "alert");
        assert_eq!(config.alert.policy, AlertPolicy::Unconditional);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = NodeConfig::from_json(
            r#"{ "device_id": "ESP_004", "collector": "192.168.52.241:4832",
                 "alert": { "chunk_frames": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.device_id, "ESP_004");
        assert_eq!(config.collector.ip().to_string(), "192.168.52.241");
        assert_eq!(config.alert.chunk_frames, 0);
        assert_eq!(config.alert.resource_path, "alert");
        assert_eq!(config.microphone.window_ms, 50);
    }

    #[test]
    fn test_command_policy_json() {
        let config = NodeConfig::from_json(
            r#"{ "alert": { "policy": { "command": { "activate": 49, "deactivate": 48 } } } }"#,
        )
        .unwrap();
        assert_eq!(
            config.alert.policy,
            AlertPolicy::Command {
                activate: b'1',
                deactivate: b'0'
            }
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = NodeConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_escaping_device_id() {
        let config = NodeConfig::new("ESP\"7", NodeConfig::default().collector);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "device_id", .. }));
    }

    #[test]
    fn test_rejects_bad_tone() {
        let mut config = NodeConfig::default();
        config.alert.tone.frequency_hz = 9_000.0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.alert.tone.amplitude = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let mut config = NodeConfig::new("ESP_003", "10.0.0.9:5683".parse().unwrap());
        config.liveness_probe = true;
        let parsed = NodeConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_blocking_alert_config() {
        assert_eq!(AlertConfig::blocking().chunk_frames, 0);
        assert_eq!(ToneConfig::default().waveform().total_frames(), 3_200);
    }
}
