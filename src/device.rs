// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Device context
//!
//! Every hardware handle the node uses is collected here once at startup
//! and moved into the [`Scheduler`](crate::scheduler::Scheduler). No handle
//! lives in a global.

use crate::hal::{
    AnalogInput, AudioSink, Clock, DigitalInput, DigitalOutput, NetworkLink, PulseRanger,
};

/// Hardware owned by one node
pub struct Device {
    /// Monotonic clock and delay provider
    pub clock: Box<dyn Clock>,
    /// Network association state
    pub link: Box<dyn NetworkLink>,
    /// Microphone envelope ADC
    pub microphone: Box<dyn AnalogInput>,
    /// Ultrasonic ranger
    pub ranger: Box<dyn PulseRanger>,
    /// PIR input
    pub motion: Box<dyn DigitalInput>,
    /// Optional presence indicator output
    pub indicator: Option<Box<dyn DigitalOutput>>,
    /// Audio output
    pub audio: Box<dyn AudioSink>,
}

impl Device {
    /// Assemble a device from its drivers
    pub fn new(
        clock: impl Clock + 'static,
        link: impl NetworkLink + 'static,
        microphone: impl AnalogInput + 'static,
        ranger: impl PulseRanger + 'static,
        motion: impl DigitalInput + 'static,
        audio: impl AudioSink + 'static,
    ) -> Self {
        Self {
            clock: Box::new(clock),
            link: Box::new(link),
            microphone: Box::new(microphone),
            ranger: Box::new(ranger),
            motion: Box::new(motion),
            indicator: None,
            audio: Box::new(audio),
        }
    }

    /// Attach a presence indicator
    pub fn with_indicator(mut self, indicator: impl DigitalOutput + 'static) -> Self {
        self.indicator = Some(Box::new(indicator));
        self
    }
}
