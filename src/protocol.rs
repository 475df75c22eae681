// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Protocol definitions for alertnode
//!
//! This module defines the values that flow through the node:
//! - Metric kinds and their outbound resource paths
//! - Sensor readings and their values
//! - Outbound telemetry messages and inbound alert events
//! - Message identifiers returned by the transport

use std::fmt;
use std::net::SocketAddr;

/// Upper bound of a microphone level in decibels
pub const MAX_DECIBELS: f32 = 120.0;

/// Outbound resource path of the liveness probe
pub const PING_PATH: &str = "ping";

/// Kind of metric produced by one of the probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Ultrasonic distance in centimeters
    Distance,
    /// Passive-infrared presence
    Motion,
    /// Microphone envelope level in decibels
    Microphone,
}

impl MetricKind {
    /// All metrics, in publishing order
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Distance,
        MetricKind::Motion,
        MetricKind::Microphone,
    ];

    /// Outbound resource path for this metric
    pub fn resource_path(&self) -> &'static str {
        match self {
            MetricKind::Distance => "distance",
            MetricKind::Motion => "motion",
            MetricKind::Microphone => "microphone",
        }
    }

    /// Number of decimal digits used when a numeric value is rendered
    pub fn decimal_places(&self) -> usize {
        2
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_path())
    }
}

/// Value carried by a sensor reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingValue {
    /// Finite numeric measurement
    Number(f32),
    /// Boolean measurement
    Flag(bool),
    /// The measurement failed (e.g. no ultrasonic echo)
    Missing,
}

impl ReadingValue {
    /// Build a numeric value, turning NaN and infinities into [`ReadingValue::Missing`]
    pub fn number(value: f32) -> Self {
        if value.is_finite() {
            ReadingValue::Number(value)
        } else {
            ReadingValue::Missing
        }
    }

    /// Check if the measurement failed
    pub fn is_missing(&self) -> bool {
        matches!(self, ReadingValue::Missing)
    }

    /// Numeric value, if any
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ReadingValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean value, if any
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ReadingValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// One sample taken from a probe during a sampling pass
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// Identifier of the sampling device
    pub device_id: String,
    /// Which metric was sampled
    pub kind: MetricKind,
    /// The measured value
    pub value: ReadingValue,
    /// Monotonic timestamp in milliseconds
    pub sampled_at_ms: u64,
}

impl SensorReading {
    /// Distance reading; `None` marks a failed measurement
    pub fn distance(device_id: impl Into<String>, centimeters: Option<f32>, at_ms: u64) -> Self {
        let value = match centimeters {
            Some(cm) if cm.is_finite() && cm >= 0.0 => ReadingValue::Number(cm),
            _ => ReadingValue::Missing,
        };
        Self {
            device_id: device_id.into(),
            kind: MetricKind::Distance,
            value,
            sampled_at_ms: at_ms,
        }
    }

    /// Motion reading
    pub fn motion(device_id: impl Into<String>, present: bool, at_ms: u64) -> Self {
        Self {
            device_id: device_id.into(),
            kind: MetricKind::Motion,
            value: ReadingValue::Flag(present),
            sampled_at_ms: at_ms,
        }
    }

    /// Microphone reading, clamped into `[0, MAX_DECIBELS]`
    pub fn microphone(device_id: impl Into<String>, decibels: f32, at_ms: u64) -> Self {
        let value = if decibels.is_finite() {
            ReadingValue::Number(decibels.clamp(0.0, MAX_DECIBELS))
        } else {
            ReadingValue::Number(0.0)
        };
        Self {
            device_id: device_id.into(),
            kind: MetricKind::Microphone,
            value,
            sampled_at_ms: at_ms,
        }
    }
}

/// Correlation identifier assigned by the transport to an outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MessageId(pub u16);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound PUT request carrying one encoded reading
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryMessage {
    /// Collector address and port
    pub destination: SocketAddr,
    /// Resource path on the collector
    pub resource_path: String,
    /// Encoded payload
    pub payload: Vec<u8>,
}

impl TelemetryMessage {
    /// Create a new telemetry message
    pub fn new(destination: SocketAddr, resource_path: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            destination,
            resource_path: resource_path.into(),
            payload,
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as UTF-8 text, if it is valid
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Inbound request delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    /// Address of the requester
    pub source: SocketAddr,
    /// Requested resource path
    pub resource_path: String,
    /// Request payload (advisory)
    pub payload: Vec<u8>,
}

impl AlertEvent {
    /// Create a new inbound event
    pub fn new(source: SocketAddr, resource_path: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            source,
            resource_path: resource_path.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_order_and_paths() {
        let paths: Vec<_> = MetricKind::ALL.iter().map(|k| k.resource_path()).collect();
        assert_eq!(paths, vec!["distance", "motion", "microphone"]);
        assert_eq!(format!("{}", MetricKind::Microphone), "microphone");
    }

    #[test]
    fn test_microphone_clamped() {
        let loud = SensorReading::microphone("ESP_001", 180.0, 0);
        assert_eq!(loud.value, ReadingValue::Number(MAX_DECIBELS));

        let negative = SensorReading::microphone("ESP_001", -3.0, 0);
        assert_eq!(negative.value, ReadingValue::Number(0.0));

        let nan = SensorReading::microphone("ESP_001", f32::NAN, 0);
        assert_eq!(nan.value, ReadingValue::Number(0.0));
    }

    #[test]
    fn test_distance_failure_is_missing() {
        assert!(SensorReading::distance("ESP_002", None, 0).value.is_missing());
        assert!(SensorReading::distance("ESP_002", Some(-1.0), 0).value.is_missing());
        assert!(SensorReading::distance("ESP_002", Some(f32::INFINITY), 0)
            .value
            .is_missing());

        let ok = SensorReading::distance("ESP_002", Some(12.5), 7);
        assert_eq!(ok.value.as_number(), Some(12.5));
        assert_eq!(ok.sampled_at_ms, 7);
    }

    #[test]
    fn test_reading_value_number() {
        assert_eq!(ReadingValue::number(1.5), ReadingValue::Number(1.5));
        assert!(ReadingValue::number(f32::NAN).is_missing());
        assert_eq!(ReadingValue::Flag(true).as_flag(), Some(true));
        assert_eq!(ReadingValue::Flag(true).as_number(), None);
    }

    #[test]
    fn test_message_payload() {
        let msg = TelemetryMessage::new(
            "10.42.0.1:4832".parse().unwrap(),
            "motion",
            b"{}".to_vec(),
        );
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.payload_str(), Some("{}"));
        assert_eq!(format!("{}", MessageId(3)), "#3");
    }
}
