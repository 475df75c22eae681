// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Alert tone synthesis
//!
//! A tone is a fixed-frequency sine produced sample by sample by a
//! [`ToneGenerator`]. The [`ToneSynthesizer`] owns the audio sink and drives
//! one generator at a time, a bounded chunk of frames per call to
//! [`ToneSynthesizer::pump`], so the scheduler keeps servicing the network
//! while a tone plays. The active generator is the playback-in-progress
//! state: while it exists no second tone can start.

use crate::error::AudioError;
use crate::hal::AudioSink;
use std::f32::consts::TAU;

/// Parameters of one tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioWaveform {
    /// Output sample rate (Hz)
    pub sample_rate: u32,
    /// Tone frequency (Hz)
    pub frequency_hz: f32,
    /// Tone length (ms)
    pub duration_ms: u32,
    /// Amplitude, 0.0 - 1.0
    pub amplitude: f32,
}

impl AudioWaveform {
    /// Create a waveform; amplitude is clamped into [0, 1]
    pub fn new(sample_rate: u32, frequency_hz: f32, duration_ms: u32, amplitude: f32) -> Self {
        let amplitude = if amplitude.is_finite() {
            amplitude.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            sample_rate,
            frequency_hz,
            duration_ms,
            amplitude,
        }
    }

    /// Number of frames in the whole tone
    pub fn total_frames(&self) -> u64 {
        self.sample_rate as u64 * self.duration_ms as u64 / 1000
    }

    /// Sample at a frame index, scaled to the i16 range
    pub fn sample_at(&self, index: u64) -> i16 {
        if self.sample_rate == 0 {
            return 0;
        }
        // Reduce the index to one period's worth of phase to keep f32 precise.
        let phase = (self.frequency_hz as f64 * index as f64 / self.sample_rate as f64).fract();
        let value = self.amplitude * (TAU * phase as f32).sin();
        (value * i16::MAX as f32).round() as i16
    }
}

impl Default for AudioWaveform {
    fn default() -> Self {
        crate::config::ToneConfig::default().waveform()
    }
}

/// Resumable sample source for one waveform
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    waveform: AudioWaveform,
    index: u64,
    total: u64,
}

impl ToneGenerator {
    /// Create a generator positioned at the first frame
    pub fn new(waveform: AudioWaveform) -> Self {
        Self {
            waveform,
            index: 0,
            total: waveform.total_frames(),
        }
    }

    /// Frames not yet produced
    pub fn remaining(&self) -> u64 {
        self.total - self.index
    }

    /// Frames produced so far
    pub fn position(&self) -> u64 {
        self.index
    }

    /// Waveform being generated
    pub fn waveform(&self) -> &AudioWaveform {
        &self.waveform
    }
}

impl Iterator for ToneGenerator {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.index >= self.total {
            return None;
        }
        let sample = self.waveform.sample_at(self.index);
        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}

/// Result of starting a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The tone is now active
    Started,
    /// Another tone is active; nothing changed
    Busy,
}

/// Progress after a pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackProgress {
    /// Nothing was playing
    Idle,
    /// Frames remain
    Playing { remaining: u64 },
    /// The last frame was written and the sink closed
    Finished,
}

/// Drives tones into the exclusively owned audio sink
pub struct ToneSynthesizer {
    sink: Box<dyn AudioSink>,
    active: Option<ToneGenerator>,
    chunk_frames: usize,
    frames_played: u64,
}

impl ToneSynthesizer {
    /// Create a synthesizer; `chunk_frames == 0` means unbounded chunks
    pub fn new(sink: Box<dyn AudioSink>, chunk_frames: usize) -> Self {
        Self {
            sink,
            active: None,
            chunk_frames,
            frames_played: 0,
        }
    }

    /// Check if a tone is in progress
    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    /// Frames left in the active tone
    pub fn remaining(&self) -> Option<u64> {
        self.active.as_ref().map(ToneGenerator::remaining)
    }

    /// Total frames written since creation
    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    /// Frames written per [`pump`](Self::pump)
    pub fn chunk_frames(&self) -> usize {
        self.chunk_frames
    }

    /// Open the sink and make `waveform` the active tone
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be opened; the synthesizer stays idle.
    pub fn start(&mut self, waveform: AudioWaveform) -> Result<StartOutcome, AudioError> {
        if self.active.is_some() {
            return Ok(StartOutcome::Busy);
        }
        self.sink.open(waveform.sample_rate)?;
        log::debug!(
            "tone start: {} Hz for {} ms ({} frames)",
            waveform.frequency_hz,
            waveform.duration_ms,
            waveform.total_frames()
        );
        self.active = Some(ToneGenerator::new(waveform));
        Ok(StartOutcome::Started)
    }

    /// Write the next chunk of the active tone
    ///
    /// # Errors
    ///
    /// A sink write error closes the sink and clears the active tone.
    pub fn pump(&mut self) -> Result<PlaybackProgress, AudioError> {
        let budget = if self.chunk_frames == 0 {
            usize::MAX
        } else {
            self.chunk_frames
        };
        self.pump_frames(budget)
    }

    /// Play a tone to completion, blocking the caller
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Busy`] if another tone is active, or any sink error.
    pub fn play(&mut self, waveform: AudioWaveform) -> Result<(), AudioError> {
        if self.start(waveform)? == StartOutcome::Busy {
            return Err(AudioError::Busy);
        }
        loop {
            if let PlaybackProgress::Finished = self.pump_frames(usize::MAX)? {
                return Ok(());
            }
        }
    }

    /// Abort the active tone, if any, and close the sink
    pub fn stop(&mut self) -> bool {
        if self.active.take().is_some() {
            self.sink.close();
            log::debug!("tone stopped");
            true
        } else {
            false
        }
    }

    fn pump_frames(&mut self, budget: usize) -> Result<PlaybackProgress, AudioError> {
        let generator = match self.active.as_mut() {
            Some(generator) => generator,
            None => return Ok(PlaybackProgress::Idle),
        };

        let mut written = 0;
        while written < budget {
            let sample = match generator.next() {
                Some(sample) => sample,
                None => break,
            };
            if let Err(e) = self.sink.write_frame(sample, sample) {
                self.active = None;
                self.sink.close();
                return Err(e);
            }
            written += 1;
            self.frames_played += 1;
        }

        let remaining = generator.remaining();
        if remaining == 0 {
            self.active = None;
            self.sink.close();
            log::debug!("tone finished");
            Ok(PlaybackProgress::Finished)
        } else {
            Ok(PlaybackProgress::Playing { remaining })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingSink;

    fn waveform() -> AudioWaveform {
        AudioWaveform::new(8_000, 1_000.0, 10, 1.0)
    }

    #[test]
    fn test_total_frames() {
        assert_eq!(waveform().total_frames(), 80);
        assert_eq!(AudioWaveform::default().total_frames(), 3_200);
    }

    #[test]
    fn test_samples_follow_sine() {
        let w = waveform();
        // 1 kHz at 8 kHz: eight samples per period
        assert_eq!(w.sample_at(0), 0);
        assert_eq!(w.sample_at(2), i16::MAX);
        assert_eq!(w.sample_at(6), -i16::MAX);
        assert!(w.sample_at(4).abs() <= 1);
    }

    #[test]
    fn test_amplitude_scales_and_clamps() {
        let half = AudioWaveform::new(8_000, 1_000.0, 10, 0.5);
        assert_eq!(half.sample_at(2), (0.5 * i16::MAX as f32).round() as i16);
        assert_eq!(AudioWaveform::new(8_000, 1_000.0, 10, 3.0).amplitude, 1.0);
        assert_eq!(AudioWaveform::new(8_000, 1_000.0, 10, f32::NAN).amplitude, 0.0);
    }

    #[test]
    fn test_generator_is_exhausted() {
        let generator = ToneGenerator::new(waveform());
        assert_eq!(generator.remaining(), 80);
        assert_eq!(generator.count(), 80);
    }

    #[test]
    fn test_play_blocking_writes_all_frames() {
        let sink = RecordingSink::new();
        let mut synth = ToneSynthesizer::new(Box::new(sink.clone()), 16);
        synth.play(waveform()).unwrap();

        let log = sink.log();
        assert_eq!(log.opens, 1);
        assert_eq!(log.closes, 1);
        assert_eq!(log.sample_rate, Some(8_000));
        assert_eq!(log.frames.len(), 80);
        assert!(log.frames.iter().all(|(l, r)| l == r));
        assert!(!synth.is_playing());
    }

    #[test]
    fn test_chunked_playback() {
        let sink = RecordingSink::new();
        let mut synth = ToneSynthesizer::new(Box::new(sink.clone()), 32);
        assert_eq!(synth.start(waveform()).unwrap(), StartOutcome::Started);
        assert!(sink.log().is_open);

        assert_eq!(synth.pump().unwrap(), PlaybackProgress::Playing { remaining: 48 });
        assert_eq!(synth.pump().unwrap(), PlaybackProgress::Playing { remaining: 16 });
        assert_eq!(synth.pump().unwrap(), PlaybackProgress::Finished);
        assert_eq!(synth.pump().unwrap(), PlaybackProgress::Idle);

        assert_eq!(sink.frames_written(), 80);
        assert!(!sink.log().is_open);
        assert_eq!(synth.frames_played(), 80);
    }

    #[test]
    fn test_second_start_is_busy() {
        let sink = RecordingSink::new();
        let mut synth = ToneSynthesizer::new(Box::new(sink.clone()), 32);
        synth.start(waveform()).unwrap();
        assert_eq!(synth.start(waveform()).unwrap(), StartOutcome::Busy);
        assert_eq!(synth.play(waveform()), Err(AudioError::Busy));
        assert_eq!(sink.log().opens, 1);
    }

    #[test]
    fn test_stop_closes_sink() {
        let sink = RecordingSink::new();
        let mut synth = ToneSynthesizer::new(Box::new(sink.clone()), 32);
        synth.start(waveform()).unwrap();
        synth.pump().unwrap();
        assert!(synth.stop());
        assert!(!synth.is_playing());
        assert!(!sink.log().is_open);
        assert!(!synth.stop());
    }

    #[test]
    fn test_write_failure_clears_playback() {
        let sink = RecordingSink::failing_after(10);
        let mut synth = ToneSynthesizer::new(Box::new(sink.clone()), 0);
        synth.start(waveform()).unwrap();
        assert!(matches!(synth.pump(), Err(AudioError::WriteFailed { .. })));
        assert!(!synth.is_playing());
        assert_eq!(sink.log().closes, 1);
    }

    #[test]
    fn test_open_failure_stays_idle() {
        let mut synth = ToneSynthesizer::new(Box::new(RecordingSink::failing_open()), 0);
        assert!(synth.start(waveform()).is_err());
        assert!(!synth.is_playing());
    }
}
