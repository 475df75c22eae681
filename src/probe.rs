// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Distance and motion probes
//!
//! Thin adapters over the driver layer. A failed ultrasonic measurement is a
//! distinct [`Distance::NoEcho`] outcome, never a silent zero.

use crate::config::{DistanceConfig, MotionConfig};
use crate::hal::{DigitalInput, DigitalOutput, PulseRanger};

/// Outcome of one ultrasonic measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    /// Echo received
    Centimeters(f32),
    /// Echo timed out or was out of range
    NoEcho,
}

impl Distance {
    /// Distance in centimeters, if measured
    pub fn centimeters(&self) -> Option<f32> {
        match self {
            Distance::Centimeters(cm) => Some(*cm),
            Distance::NoEcho => None,
        }
    }
}

/// Wraps a pulse-timing ranger
pub struct DistanceProbe {
    ranger: Box<dyn PulseRanger>,
    config: DistanceConfig,
}

impl DistanceProbe {
    /// Create a probe over a ranger
    pub fn new(ranger: Box<dyn PulseRanger>, config: DistanceConfig) -> Self {
        Self { ranger, config }
    }

    /// Take one measurement
    pub fn measure(&mut self) -> Distance {
        match self.ranger.range_cm() {
            Some(cm) if cm.is_finite() && (0.0..=self.config.max_range_cm).contains(&cm) => {
                Distance::Centimeters(cm)
            }
            Some(cm) => {
                log::debug!("distance {} cm outside 0..={} cm", cm, self.config.max_range_cm);
                Distance::NoEcho
            }
            None => {
                log::debug!("ultrasonic echo timed out");
                Distance::NoEcho
            }
        }
    }
}

/// Reads a passive-infrared output
///
/// With `debounce_reads` greater than one, the reported state only changes
/// after that many consecutive raw reads disagree with it. Repeated identical
/// states are reported as-is; there is no edge detection.
pub struct MotionProbe {
    pin: Box<dyn DigitalInput>,
    debounce_reads: u32,
    stable: Option<bool>,
    streak: u32,
}

impl MotionProbe {
    /// Create a probe over a digital input
    pub fn new(pin: Box<dyn DigitalInput>, config: &MotionConfig) -> Self {
        Self {
            pin,
            debounce_reads: config.debounce_reads.max(1),
            stable: None,
            streak: 0,
        }
    }

    /// Read presence
    pub fn detect(&mut self) -> bool {
        let raw = self.pin.is_high();
        let stable = match self.stable {
            None => {
                self.stable = Some(raw);
                return raw;
            }
            Some(stable) => stable,
        };

        if raw == stable {
            self.streak = 0;
            return stable;
        }

        self.streak += 1;
        if self.streak >= self.debounce_reads {
            self.stable = Some(raw);
            self.streak = 0;
            raw
        } else {
            stable
        }
    }
}

/// Binary output driven inverse to presence (presence => off)
pub struct PresenceIndicator {
    output: Box<dyn DigitalOutput>,
}

impl PresenceIndicator {
    /// Create an indicator over a digital output
    pub fn new(output: Box<dyn DigitalOutput>) -> Self {
        Self { output }
    }

    /// Mirror a motion reading
    pub fn show(&mut self, present: bool) {
        self.output.set_level(!present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedRanger, SimPin};

    fn distance_probe(ranger: ScriptedRanger) -> DistanceProbe {
        DistanceProbe::new(Box::new(ranger), DistanceConfig::default())
    }

    #[test]
    fn test_distance_measured() {
        let mut probe = distance_probe(ScriptedRanger::new(Some(42.5)));
        assert_eq!(probe.measure(), Distance::Centimeters(42.5));
        assert_eq!(probe.measure().centimeters(), Some(42.5));
    }

    #[test]
    fn test_distance_timeout_is_no_echo() {
        let mut probe = distance_probe(ScriptedRanger::timing_out());
        let measured = probe.measure();
        assert_eq!(measured, Distance::NoEcho);
        assert_eq!(measured.centimeters(), None);
    }

    #[test]
    fn test_distance_out_of_range_is_no_echo() {
        let ranger = ScriptedRanger::new(Some(10.0));
        ranger.push(Some(1_200.0));
        ranger.push(Some(-4.0));
        ranger.push(Some(f32::NAN));
        let mut probe = distance_probe(ranger);
        assert_eq!(probe.measure(), Distance::NoEcho);
        assert_eq!(probe.measure(), Distance::NoEcho);
        assert_eq!(probe.measure(), Distance::NoEcho);
        assert_eq!(probe.measure(), Distance::Centimeters(10.0));
    }

    #[test]
    fn test_motion_without_debounce_follows_pin() {
        let pin = SimPin::new(false);
        let mut probe = MotionProbe::new(Box::new(pin.clone()), &MotionConfig::default());
        assert!(!probe.detect());
        pin.set(true);
        assert!(probe.detect());
        assert!(probe.detect());
        pin.set(false);
        assert!(!probe.detect());
    }

    #[test]
    fn test_motion_debounce() {
        let pin = SimPin::new(false);
        let mut probe = MotionProbe::new(Box::new(pin.clone()), &MotionConfig { debounce_reads: 3 });
        assert!(!probe.detect());

        // A two-read glitch is ignored
        pin.set(true);
        assert!(!probe.detect());
        assert!(!probe.detect());
        pin.set(false);
        assert!(!probe.detect());

        // Three consecutive reads flip the state
        pin.set(true);
        assert!(!probe.detect());
        assert!(!probe.detect());
        assert!(probe.detect());
        assert!(probe.detect());
    }

    #[test]
    fn test_indicator_is_inverse() {
        let led = SimPin::new(false);
        let mut indicator = PresenceIndicator::new(Box::new(led.clone()));
        indicator.show(true);
        assert!(!led.level());
        indicator.show(false);
        assert!(led.level());
        assert_eq!(led.writes(), 2);
    }
}
