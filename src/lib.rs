// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # alertnode - Sensor telemetry and alert-tone node core
//!
//! The core of a single-MCU IoT node: it samples an ultrasonic ranger, a PIR
//! sensor and a microphone, publishes each reading as compact JSON to a
//! collector over a CoAP-style request/response transport, and plays a sine
//! alert tone whenever its inbound alert resource is hit.
//!
//! ## Key Features
//!
//! - **Envelope analysis**: peak-to-peak microphone window to clamped decibels
//! - **Fire-and-forget telemetry**: one PUT per metric per cycle, never retried
//! - **Chunked synthesis**: tones play while the transport keeps being serviced
//! - **Cooperative scheduling**: one thread, no locks, no globals
//!
//! ## Quick Start
//!
//! ```rust
//! use alertnode::sim::{RecordingSink, ScriptedAnalog, ScriptedRanger, SimClock, SimLink, SimPin};
//! use alertnode::{Device, MemoryTransport, NodeConfig, Scheduler};
//!
//! let clock = SimClock::new();
//! let device = Device::new(
//!     clock.clone(),
//!     SimLink::connected(),
//!     ScriptedAnalog::new(vec![400, 620]),
//!     ScriptedRanger::new(Some(87.5)),
//!     SimPin::new(true),
//!     RecordingSink::new(),
//! );
//! let config = NodeConfig::new("ESP_002", "10.42.0.1:4832".parse().unwrap());
//! let mut node = Scheduler::new(config, device, MemoryTransport::new()).unwrap();
//!
//! node.wait_for_network();
//! let report = node.tick();
//! assert_eq!(report.publish.unwrap().sent(), 3);
//!
//! let (_, distance) = node.transport_mut().pop_outgoing().unwrap();
//! assert_eq!(distance.payload_str(), Some(r#"{"deviceId":"ESP_002","value":87.50}"#));
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: Readings, messages, events and resource paths
//! - [`hal`]: Driver traits the core calls into
//! - [`envelope`]: Microphone level analysis
//! - [`probe`]: Distance and motion probes
//! - [`encoder`]: JSON telemetry encoding
//! - [`tone`]: Sine tone synthesis
//! - [`alert`]: Inbound alert policy and dispatch
//! - [`router`]: Inbound resource table
//! - [`publisher`]: Telemetry publish cycle
//! - [`scheduler`]: The cooperative main loop
//! - [`transport`]: Request/response transport abstraction
//! - [`sim`]: Simulated peripherals for host testing

// Modules
pub mod alert;
pub mod config;
pub mod device;
pub mod encoder;
pub mod envelope;
pub mod error;
pub mod hal;
pub mod metrics;
pub mod probe;
pub mod protocol;
pub mod publisher;
pub mod router;
pub mod scheduler;
pub mod sim;
pub mod tone;
pub mod transport;

// Re-exports for convenient access
pub use alert::{decide, AlertDecision, AlertDispatcher, AlertOutcome, AlertPolicy};
pub use config::{
    AlertConfig, DistanceConfig, EnvelopeConfig, MotionConfig, NodeConfig, ToneConfig,
    DEFAULT_PORT,
};
pub use device::Device;
pub use encoder::TelemetryEncoder;
pub use envelope::{decibels_from_peak_to_peak, EnvelopeAnalyzer, EnvelopeWindow};
pub use error::{AudioError, ConfigError, NodeError, Result, TransportError};
pub use hal::{
    AnalogInput, AudioSink, Clock, ConnectionState, DigitalInput, DigitalOutput, NetworkLink,
    PulseRanger, StdClock,
};
pub use metrics::NodeMetrics;
pub use probe::{Distance, DistanceProbe, MotionProbe, PresenceIndicator};
pub use protocol::{
    AlertEvent, MessageId, MetricKind, ReadingValue, SensorReading, TelemetryMessage,
};
pub use publisher::{PublishOutcome, PublishReport, Sensors, TelemetryPublisher};
pub use router::{DispatchOutcome, Resource, ResourceTable};
pub use scheduler::{Scheduler, TickReport};
pub use tone::{AudioWaveform, PlaybackProgress, StartOutcome, ToneGenerator, ToneSynthesizer};
pub use transport::{LossyTransport, MemoryTransport, Transport, TransportMetrics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
