// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Telemetry encoder
//!
//! Renders a reading as the compact JSON object the collector expects:
//!
//! ```text
//! {"deviceId":"ESP_002","value":3.14}
//! ```
//!
//! Keys come in that order with no whitespace. Numbers carry exactly two
//! decimals, flags are `true`/`false`, and a failed measurement is `null`.
//! Device identifiers are validated by [`NodeConfig`](crate::config::NodeConfig)
//! and written without escaping.

use crate::protocol::{MetricKind, ReadingValue, SensorReading};
use std::io::Write;

/// Encoder for telemetry payloads
#[derive(Debug, Clone, Default)]
pub struct TelemetryEncoder {
    /// Payloads produced so far
    encoded: u64,
}

impl TelemetryEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads produced
    pub fn encoded(&self) -> u64 {
        self.encoded
    }

    /// Encode one value into a fresh buffer
    pub fn encode(&mut self, device_id: &str, kind: MetricKind, value: ReadingValue) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + device_id.len());
        self.encode_into(device_id, kind, value, &mut out);
        out
    }

    /// Encode a reading into a fresh buffer
    pub fn encode_reading(&mut self, reading: &SensorReading) -> Vec<u8> {
        self.encode(&reading.device_id, reading.kind, reading.value)
    }

    /// Append the encoded value to `out`
    pub fn encode_into(
        &mut self,
        device_id: &str,
        kind: MetricKind,
        value: ReadingValue,
        out: &mut Vec<u8>,
    ) {
        out.extend_from_slice(b"{\"deviceId\":\"");
        out.extend_from_slice(device_id.as_bytes());
        out.extend_from_slice(b"\",\"value\":");
        match value {
            ReadingValue::Number(v) if v.is_finite() => {
                // Writing into a Vec never fails.
                let _ = write!(out, "{:.*}", kind.decimal_places(), v);
            }
            ReadingValue::Flag(true) => out.extend_from_slice(b"true"),
            ReadingValue::Flag(false) => out.extend_from_slice(b"false"),
            ReadingValue::Number(_) | ReadingValue::Missing => out.extend_from_slice(b"null"),
        }
        out.push(b'}');
        self.encoded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_str(device_id: &str, kind: MetricKind, value: ReadingValue) -> String {
        let mut encoder = TelemetryEncoder::new();
        String::from_utf8(encoder.encode(device_id, kind, value)).unwrap()
    }

    #[test]
    fn test_encode_distance_two_decimals() {
        assert_eq!(
            encode_str("ESP_002", MetricKind::Distance, ReadingValue::Number(3.14159)),
            r#"{"deviceId":"ESP_002","value":3.14}"#
        );
        assert_eq!(
            encode_str("ESP_002", MetricKind::Distance, ReadingValue::Number(3.0)),
            r#"{"deviceId":"ESP_002","value":3.00}"#
        );
    }

    #[test]
    fn test_encode_motion_flag() {
        assert_eq!(
            encode_str("ESP_004", MetricKind::Motion, ReadingValue::Flag(true)),
            r#"{"deviceId":"ESP_004","value":true}"#
        );
        assert_eq!(
            encode_str("ESP_004", MetricKind::Motion, ReadingValue::Flag(false)),
            r#"{"deviceId":"ESP_004","value":false}"#
        );
    }

    #[test]
    fn test_encode_missing_is_null() {
        assert_eq!(
            encode_str("ESP_002", MetricKind::Distance, ReadingValue::Missing),
            r#"{"deviceId":"ESP_002","value":null}"#
        );
        // A non-finite number never renders as a numeric value
        assert_eq!(
            encode_str("ESP_002", MetricKind::Distance, ReadingValue::Number(f32::NAN)),
            r#"{"deviceId":"ESP_002","value":null}"#
        );
    }

    #[test]
    fn test_encode_reading_is_valid_json() {
        let mut encoder = TelemetryEncoder::new();
        let reading = SensorReading::microphone("ESP_003", 54.357, 10);
        let bytes = encoder.encode_reading(&reading);
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["deviceId"], "ESP_003");
        assert_eq!(parsed["value"].as_f64(), Some(54.36));
        assert_eq!(encoder.encoded(), 1);
    }

    #[test]
    fn test_encode_into_appends() {
        let mut encoder = TelemetryEncoder::new();
        let mut out = b"x".to_vec();
        encoder.encode_into("A", MetricKind::Motion, ReadingValue::Flag(true), &mut out);
        assert_eq!(out, br#"x{"deviceId":"A","value":true}"#.to_vec());
    }
}
