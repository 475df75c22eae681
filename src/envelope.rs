// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Microphone envelope analysis
//!
//! The microphone breakout outputs an AC signal centered on mid-rail. Over a
//! short window we track the raw minimum and maximum; the peak-to-peak span
//! is converted to volts and then to decibels against a fixed reference.
//!
//! ```text
//! volts = p2p * supply / steps
//! dB    = 20 * log10(volts / reference)      clamped to [0, 120]
//! ```

use crate::config::EnvelopeConfig;
use crate::hal::{AnalogInput, Clock};
use crate::protocol::MAX_DECIBELS;

/// Highest raw ADC value
pub const ADC_MAX: u16 = 1023;

/// Running min/max over one sampling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeWindow {
    min: u16,
    max: u16,
    samples: u32,
}

impl EnvelopeWindow {
    /// Create an empty window
    pub fn new() -> Self {
        Self {
            min: ADC_MAX,
            max: 0,
            samples: 0,
        }
    }

    /// Record one raw sample (values above [`ADC_MAX`] are clamped)
    pub fn observe(&mut self, raw: u16) {
        let raw = raw.min(ADC_MAX);
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
        self.samples += 1;
    }

    /// Number of samples observed
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Span between the largest and smallest sample; 0 when empty
    pub fn peak_to_peak(&self) -> u16 {
        if self.samples == 0 {
            return 0;
        }
        self.max - self.min
    }
}

impl Default for EnvelopeWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a peak-to-peak span into a clamped decibel level
///
/// Spans under the noise floor are silence and return exactly `0.0`.
pub fn decibels_from_peak_to_peak(peak_to_peak: u16, config: &EnvelopeConfig) -> f32 {
    if peak_to_peak < config.noise_floor {
        return 0.0;
    }
    let volts = peak_to_peak as f32 * config.supply_volts / config.adc_steps;
    let db = 20.0 * (volts / config.reference_volts).log10();
    if db.is_nan() {
        return 0.0;
    }
    db.clamp(0.0, MAX_DECIBELS)
}

/// Converts a window of raw microphone samples into a decibel level
pub struct EnvelopeAnalyzer {
    input: Box<dyn AnalogInput>,
    config: EnvelopeConfig,
    last_window: EnvelopeWindow,
}

impl EnvelopeAnalyzer {
    /// Create an analyzer over an analog input
    pub fn new(input: Box<dyn AnalogInput>, config: EnvelopeConfig) -> Self {
        Self {
            input,
            config,
            last_window: EnvelopeWindow::new(),
        }
    }

    /// Sample for one window and return the level in decibels
    ///
    /// Sampling stops when the window elapses or after `max_samples` reads,
    /// whichever comes first.
    pub fn measure_level(&mut self, clock: &dyn Clock) -> f32 {
        let start = clock.now_ms();
        let mut window = EnvelopeWindow::new();

        while window.samples() < self.config.max_samples
            && clock.now_ms().saturating_sub(start) < self.config.window_ms
        {
            window.observe(self.input.read());
        }

        self.last_window = window;
        let db = decibels_from_peak_to_peak(window.peak_to_peak(), &self.config);
        log::trace!(
            "envelope: {} samples, p2p {} -> {:.2} dB",
            window.samples(),
            window.peak_to_peak(),
            db
        );
        db
    }

    /// Window of the last measurement
    pub fn last_window(&self) -> EnvelopeWindow {
        self.last_window
    }

    /// Analysis parameters
    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }
}
