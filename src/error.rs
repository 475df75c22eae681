// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for alertnode
//!
//! Failures never cross a component boundary as a panic: every operation
//! returns a plain value, a sentinel, or one of these errors.

use thiserror::Error;

/// Result type alias for alertnode operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Main error type for alertnode operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    /// Outbound transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Audio sink error
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource table error
    #[error("Routing error: {0}")]
    Routing(String),
}

/// Errors reported by the request/response transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Transport has been closed
    #[error("Transport closed")]
    Closed,

    /// Local send queue is full
    #[error("Send buffer full ({capacity} messages)")]
    BufferFull { capacity: usize },

    /// The stack refused or failed to emit the datagram
    #[error("Send to {path} failed: {reason}")]
    SendFailed { path: String, reason: String },
}

/// Errors reported by the audio sink
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Sink could not be opened
    #[error("Failed to open audio sink at {sample_rate} Hz: {reason}")]
    OpenFailed { sample_rate: u32, reason: String },

    /// A frame could not be written
    #[error("Failed to write frame {frame}: {reason}")]
    WriteFailed { frame: u64, reason: String },

    /// A tone is already playing
    #[error("Audio sink busy")]
    Busy,
}

/// Errors in the injected configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The configuration file could not be read
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    /// The configuration document is malformed
    #[error("Malformed configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
