// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Telemetry publishing
//!
//! One publish cycle samples every probe in a fixed order (distance,
//! motion, microphone), encodes each reading and issues one independent,
//! unacknowledged PUT per metric. A failed send is logged and reported; it
//! never stops or delays the remaining metrics.

use crate::config::NodeConfig;
use crate::encoder::TelemetryEncoder;
use crate::envelope::EnvelopeAnalyzer;
use crate::error::TransportError;
use crate::hal::Clock;
use crate::probe::{DistanceProbe, MotionProbe, PresenceIndicator};
use crate::protocol::{MessageId, MetricKind, SensorReading, TelemetryMessage, PING_PATH};
use crate::transport::Transport;
use std::net::SocketAddr;

/// The node's probes
pub struct Sensors {
    /// Ultrasonic ranger
    pub distance: DistanceProbe,
    /// PIR input
    pub motion: MotionProbe,
    /// Microphone envelope
    pub microphone: EnvelopeAnalyzer,
    /// Optional inverse presence indicator
    pub indicator: Option<PresenceIndicator>,
}

impl Sensors {
    /// Sample one metric
    pub fn sample(&mut self, kind: MetricKind, device_id: &str, clock: &dyn Clock) -> SensorReading {
        let at = clock.now_ms();
        match kind {
            MetricKind::Distance => {
                SensorReading::distance(device_id, self.distance.measure().centimeters(), at)
            }
            MetricKind::Motion => {
                let present = self.motion.detect();
                if let Some(indicator) = self.indicator.as_mut() {
                    indicator.show(present);
                }
                SensorReading::motion(device_id, present, at)
            }
            MetricKind::Microphone => {
                SensorReading::microphone(device_id, self.microphone.measure_level(clock), at)
            }
        }
    }
}

/// Result of one outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    /// Metric, or `None` for the liveness probe
    pub kind: Option<MetricKind>,
    /// Resource path the request went to
    pub resource_path: String,
    /// Correlation id, or the local send error
    pub result: Result<MessageId, TransportError>,
}

/// Everything one publish cycle did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishReport {
    /// Readings taken, in publishing order
    pub readings: Vec<SensorReading>,
    /// One outcome per request, in sending order
    pub outcomes: Vec<PublishOutcome>,
}

impl PublishReport {
    /// Number of requests handed to the transport
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of requests the transport refused
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    /// Reading of a given metric
    pub fn reading(&self, kind: MetricKind) -> Option<&SensorReading> {
        self.readings.iter().find(|r| r.kind == kind)
    }
}

/// Samples, encodes and sends telemetry
#[derive(Debug, Clone)]
pub struct TelemetryPublisher {
    device_id: String,
    collector: SocketAddr,
    liveness_probe: bool,
    encoder: TelemetryEncoder,
}

impl TelemetryPublisher {
    /// Create a publisher from the node configuration
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            device_id: config.device_id.clone(),
            collector: config.collector,
            liveness_probe: config.liveness_probe,
            encoder: TelemetryEncoder::new(),
        }
    }

    /// Device identifier put in payloads
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Collector address
    pub fn collector(&self) -> SocketAddr {
        self.collector
    }

    /// Run one publish cycle
    pub fn publish_all(
        &mut self,
        sensors: &mut Sensors,
        clock: &dyn Clock,
        transport: &mut dyn Transport,
    ) -> PublishReport {
        let mut report = PublishReport::default();
        let available = transport.is_available();
        if !available {
            log::warn!("transport closed, skipping telemetry sends");
        }

        for kind in MetricKind::ALL {
            let reading = sensors.sample(kind, &self.device_id, clock);
            let result = if available {
                let payload = self.encoder.encode_reading(&reading);
                self.publish_raw(kind.resource_path(), payload, transport)
            } else {
                Err(TransportError::Closed)
            };
            report.outcomes.push(PublishOutcome {
                kind: Some(kind),
                resource_path: kind.resource_path().to_string(),
                result,
            });
            report.readings.push(reading);
        }

        if self.liveness_probe && available {
            let payload = self.device_id.as_bytes().to_vec();
            let result = self.publish_raw(PING_PATH, payload, transport);
            report.outcomes.push(PublishOutcome {
                kind: None,
                resource_path: PING_PATH.to_string(),
                result,
            });
        }

        log::debug!(
            "publish cycle: {} sent, {} failed",
            report.sent(),
            report.failed()
        );
        report
    }

    /// Send an arbitrary payload to a collector resource
    ///
    /// # Errors
    ///
    /// Returns the transport's local send error; the failure is also logged.
    pub fn publish_raw(
        &self,
        resource_path: &str,
        payload: Vec<u8>,
        transport: &mut dyn Transport,
    ) -> Result<MessageId, TransportError> {
        let message = TelemetryMessage::new(self.collector, resource_path, payload);
        if let Some(text) = message.payload_str() {
            log::trace!("PUT {}/{} {}", self.collector, resource_path, text);
        }
        match transport.put(message) {
            Ok(id) => Ok(id),
            Err(e) => {
                log::warn!("telemetry to {} lost: {}", resource_path, e);
                Err(e)
            }
        }
    }
}
