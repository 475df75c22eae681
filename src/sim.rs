// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulated peripherals
//!
//! Deterministic implementations of the [`hal`](crate::hal) traits for host
//! testing and demos. Handles are cheap to clone and share their state, so a
//! test can keep one clone while the node owns the other.

use crate::error::AudioError;
use crate::hal::{
    AnalogInput, AudioSink, Clock, ConnectionState, DigitalInput, DigitalOutput, NetworkLink,
    PulseRanger,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Manually driven clock; `delay_ms` advances time instantly
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
    slept: Rc<Cell<u64>>,
}

impl SimClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Total time spent in `delay_ms`
    pub fn slept_ms(&self) -> u64 {
        self.slept.get()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
        self.slept.set(self.slept.get() + ms);
    }
}

/// Analog input replaying a fixed sample pattern in a loop
#[derive(Debug, Clone)]
pub struct ScriptedAnalog {
    samples: Vec<u16>,
    position: usize,
    reads: Rc<Cell<u64>>,
    clock: Option<(SimClock, u64)>,
}

impl ScriptedAnalog {
    /// Replay `samples` forever; an empty pattern reads as zero
    pub fn new(samples: Vec<u16>) -> Self {
        Self {
            samples,
            position: 0,
            reads: Rc::new(Cell::new(0)),
            clock: None,
        }
    }

    /// Constant input
    pub fn constant(level: u16) -> Self {
        Self::new(vec![level])
    }

    /// Advance `clock` by `ms_per_read` on every read
    pub fn with_clock(mut self, clock: SimClock, ms_per_read: u64) -> Self {
        self.clock = Some((clock, ms_per_read));
        self
    }

    /// Number of samples taken so far
    pub fn reads(&self) -> u64 {
        self.reads.get()
    }
}

impl AnalogInput for ScriptedAnalog {
    fn read(&mut self) -> u16 {
        self.reads.set(self.reads.get() + 1);
        if let Some((clock, step)) = &self.clock {
            clock.advance(*step);
        }
        if self.samples.is_empty() {
            return 0;
        }
        let sample = self.samples[self.position % self.samples.len()];
        self.position = self.position.wrapping_add(1);
        sample
    }
}

/// Ranger returning queued results, then a fallback
#[derive(Debug, Clone)]
pub struct ScriptedRanger {
    queued: Rc<RefCell<VecDeque<Option<f32>>>>,
    fallback: Option<f32>,
}

impl ScriptedRanger {
    /// Ranger that always measures `fallback`
    pub fn new(fallback: Option<f32>) -> Self {
        Self {
            queued: Rc::new(RefCell::new(VecDeque::new())),
            fallback,
        }
    }

    /// Ranger whose echo always times out
    pub fn timing_out() -> Self {
        Self::new(None)
    }

    /// Queue the result of the next measurement
    pub fn push(&self, result: Option<f32>) {
        self.queued.borrow_mut().push_back(result);
    }
}

impl PulseRanger for ScriptedRanger {
    fn range_cm(&mut self) -> Option<f32> {
        self.queued.borrow_mut().pop_front().unwrap_or(self.fallback)
    }
}

/// Shared logic level usable as input and output
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl SimPin {
    /// Create a pin at the given level
    pub fn new(level: bool) -> Self {
        let pin = Self::default();
        pin.level.set(level);
        pin
    }

    /// Force the level (as the outside world would)
    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    /// Current level
    pub fn level(&self) -> bool {
        self.level.get()
    }

    /// Number of times the node drove this pin
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl DigitalInput for SimPin {
    fn is_high(&mut self) -> bool {
        self.level.get()
    }
}

impl DigitalOutput for SimPin {
    fn set_level(&mut self, high: bool) {
        self.level.set(high);
        self.writes.set(self.writes.get() + 1);
    }
}

/// Everything a [`RecordingSink`] has seen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkLog {
    /// Number of successful opens
    pub opens: u32,
    /// Number of closes
    pub closes: u32,
    /// Sample rate of the last open
    pub sample_rate: Option<u32>,
    /// Frames written, in order
    pub frames: Vec<(i16, i16)>,
    /// Whether the sink is currently open
    pub is_open: bool,
}

/// Audio sink that records frames instead of playing them
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<SinkLog>>,
    fail_open: bool,
    fail_after: Option<usize>,
}

impl RecordingSink {
    /// Create a working sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose `open` always fails
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Sink that rejects writes once `frames` frames have been recorded
    pub fn failing_after(frames: usize) -> Self {
        Self {
            fail_after: Some(frames),
            ..Self::default()
        }
    }

    /// Snapshot of the log
    pub fn log(&self) -> SinkLog {
        self.log.borrow().clone()
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> usize {
        self.log.borrow().frames.len()
    }
}

impl AudioSink for RecordingSink {
    fn open(&mut self, sample_rate: u32) -> std::result::Result<(), AudioError> {
        if self.fail_open {
            return Err(AudioError::OpenFailed {
                sample_rate,
                reason: "simulated fault".to_string(),
            });
        }
        let mut log = self.log.borrow_mut();
        log.opens += 1;
        log.sample_rate = Some(sample_rate);
        log.is_open = true;
        Ok(())
    }

    fn write_frame(&mut self, left: i16, right: i16) -> std::result::Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        if let Some(limit) = self.fail_after {
            if log.frames.len() >= limit {
                return Err(AudioError::WriteFailed {
                    frame: log.frames.len() as u64,
                    reason: "simulated underrun".to_string(),
                });
            }
        }
        log.frames.push((left, right));
        Ok(())
    }

    fn close(&mut self) {
        let mut log = self.log.borrow_mut();
        log.closes += 1;
        log.is_open = false;
    }
}

/// Network link that associates after a number of polls
#[derive(Debug, Clone)]
pub struct SimLink {
    polls_until_connected: u32,
    polls: Rc<Cell<u32>>,
}

impl SimLink {
    /// Link that reports `Connected` on poll number `polls_until_connected + 1`
    pub fn connecting_after(polls_until_connected: u32) -> Self {
        Self {
            polls_until_connected,
            polls: Rc::new(Cell::new(0)),
        }
    }

    /// Link that is already associated
    pub fn connected() -> Self {
        Self::connecting_after(0)
    }

    /// Number of times the state was polled
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

impl NetworkLink for SimLink {
    fn state(&mut self) -> ConnectionState {
        let polled = self.polls.get();
        self.polls.set(polled + 1);
        if polled >= self.polls_until_connected {
            ConnectionState::Connected
        } else if polled == 0 {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Associating
        }
    }
}
