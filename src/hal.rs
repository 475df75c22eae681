// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Driver interfaces
//!
//! The node core never touches pins, timers or the radio directly. Board
//! support code implements these traits and hands the implementations to
//! [`Device`](crate::device::Device) once at startup.

use crate::error::AudioError;

/// Association state reported by the network layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No association
    #[default]
    Disconnected,
    /// Association in progress
    Associating,
    /// Associated, traffic can flow
    Connected,
}

impl ConnectionState {
    /// Check if traffic can flow
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Monotonic time source
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Block the calling thread for `ms` milliseconds
    fn delay_ms(&mut self, ms: u64);
}

/// Analog input (microphone ADC), raw domain 0..=1023
pub trait AnalogInput {
    /// Take one raw sample
    fn read(&mut self) -> u16;
}

/// Ultrasonic pulse-timing ranger
pub trait PulseRanger {
    /// Measure a distance in centimeters; `None` when the echo times out
    fn range_cm(&mut self) -> Option<f32>;
}

/// Digital input pin
pub trait DigitalInput {
    /// Current logic level
    fn is_high(&mut self) -> bool;
}

/// Digital output pin
pub trait DigitalOutput {
    /// Drive the pin high (`true`) or low (`false`)
    fn set_level(&mut self, high: bool);
}

/// Stereo 16-bit audio sink (I2S DAC or similar)
pub trait AudioSink {
    /// Open the sink at the given sample rate
    fn open(&mut self, sample_rate: u32) -> std::result::Result<(), AudioError>;

    /// Write one stereo frame; blocks until the sink accepts it
    fn write_frame(&mut self, left: i16, right: i16) -> std::result::Result<(), AudioError>;

    /// Release the sink
    fn close(&mut self);
}

/// Network association collaborator
pub trait NetworkLink {
    /// Current association state
    fn state(&mut self) -> ConnectionState;
}

/// Wall-clock backed [`Clock`] for hosted builds
#[derive(Debug, Clone)]
pub struct StdClock {
    origin: std::time::Instant,
}

impl StdClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}
