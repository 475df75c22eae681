// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Inbound alert handling
//!
//! The decision to sound a tone is the pure function [`decide`]; the
//! [`AlertDispatcher`] applies it to the synthesizer. While a tone is
//! active, further alerts are dropped, not queued.

use crate::error::AudioError;
use crate::protocol::AlertEvent;
use crate::tone::{AudioWaveform, StartOutcome, ToneSynthesizer};
use serde::{Deserialize, Serialize};

/// How an inbound payload is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Every arrival sounds the tone; the payload is ignored
    #[default]
    Unconditional,
    /// The first payload byte is an on/off command
    Command {
        /// Byte that sounds the tone
        activate: u8,
        /// Byte that silences it
        deactivate: u8,
    },
}

impl AlertPolicy {
    /// Command policy with ASCII `'1'` / `'0'` markers
    pub fn ascii_command() -> Self {
        AlertPolicy::Command {
            activate: b'1',
            deactivate: b'0',
        }
    }
}

/// What an inbound payload asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Sound the tone
    Play,
    /// Silence any active tone
    Suppress,
    /// Do nothing
    Ignore,
}

/// Apply a policy to a payload
pub fn decide(policy: AlertPolicy, payload: &[u8]) -> AlertDecision {
    match policy {
        AlertPolicy::Unconditional => AlertDecision::Play,
        AlertPolicy::Command {
            activate,
            deactivate,
        } => match payload.first() {
            Some(&b) if b == activate => AlertDecision::Play,
            Some(&b) if b == deactivate => AlertDecision::Suppress,
            _ => AlertDecision::Ignore,
        },
    }
}

/// Result of handling one alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// A tone started (or, in blocking mode, played to completion)
    Started,
    /// A tone was already active; this alert was dropped
    DroppedBusy,
    /// The payload asked for silence
    Suppressed,
    /// The payload was not a command
    Ignored,
}

/// Handler registered on the inbound alert resource
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    policy: AlertPolicy,
    waveform: AudioWaveform,
    blocking: bool,
}

impl AlertDispatcher {
    /// Create a dispatcher that starts tones and lets the scheduler pump them
    pub fn new(policy: AlertPolicy, waveform: AudioWaveform) -> Self {
        Self {
            policy,
            waveform,
            blocking: false,
        }
    }

    /// Play tones to completion inside [`handle`](Self::handle)
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// Active policy
    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    /// Waveform played on alert
    pub fn waveform(&self) -> &AudioWaveform {
        &self.waveform
    }

    /// Handle an inbound event
    ///
    /// # Errors
    ///
    /// Returns an error if the audio sink fails; the synthesizer is left idle.
    pub fn handle(
        &self,
        event: &AlertEvent,
        synth: &mut ToneSynthesizer,
    ) -> Result<AlertOutcome, AudioError> {
        match decide(self.policy, &event.payload) {
            AlertDecision::Play => {
                if self.blocking {
                    match synth.play(self.waveform) {
                        Ok(()) => Ok(AlertOutcome::Started),
                        Err(AudioError::Busy) => Ok(AlertOutcome::DroppedBusy),
                        Err(e) => Err(e),
                    }
                } else {
                    match synth.start(self.waveform)? {
                        StartOutcome::Started => Ok(AlertOutcome::Started),
                        StartOutcome::Busy => {
                            log::debug!("alert from {} dropped: tone active", event.source);
                            Ok(AlertOutcome::DroppedBusy)
                        }
                    }
                }
            }
            AlertDecision::Suppress => {
                synth.stop();
                Ok(AlertOutcome::Suppressed)
            }
            AlertDecision::Ignore => {
                log::debug!(
                    "alert from {} ignored: {} byte payload is not a command",
                    event.source,
                    event.payload.len()
                );
                Ok(AlertOutcome::Ignored)
            }
        }
    }
}
