// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Runtime counters for a node
//!
//! This module provides statistics about publish cycles, telemetry loss,
//! sensor failures and alert handling.

use crate::alert::AlertOutcome;
use crate::protocol::MetricKind;
use crate::router::DispatchOutcome;
use std::collections::HashMap;

/// Node statistics collector
#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    /// Completed publish cycles
    pub cycles: u64,
    /// Telemetry requests handed to the transport
    pub messages_sent: u64,
    /// Telemetry requests the transport refused
    pub send_failures: u64,
    /// Ultrasonic measurements without echo
    pub distance_timeouts: u64,
    /// Sent requests per metric
    pub sent_by_metric: HashMap<MetricKind, u64>,
    /// Alerts that started a tone
    pub alerts_started: u64,
    /// Alerts dropped because a tone was active
    pub alerts_dropped: u64,
    /// Alerts that silenced the tone
    pub alerts_suppressed: u64,
    /// Alerts whose payload was not a command
    pub alerts_ignored: u64,
    /// Inbound requests for unknown resources
    pub unrouted_requests: u64,
    /// Audio sink failures
    pub audio_failures: u64,
    /// Audio frames written to the sink
    pub frames_played: u64,
    /// Collector replies to sent requests
    pub replies_received: u64,
}

impl NodeMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a telemetry send attempt
    pub fn record_send(&mut self, kind: Option<MetricKind>, ok: bool) {
        if ok {
            self.messages_sent += 1;
            if let Some(kind) = kind {
                *self.sent_by_metric.entry(kind).or_insert(0) += 1;
            }
        } else {
            self.send_failures += 1;
        }
    }

    /// Record an inbound dispatch
    pub fn record_dispatch(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Alert(AlertOutcome::Started) => self.alerts_started += 1,
            DispatchOutcome::Alert(AlertOutcome::DroppedBusy) => self.alerts_dropped += 1,
            DispatchOutcome::Alert(AlertOutcome::Suppressed) => self.alerts_suppressed += 1,
            DispatchOutcome::Alert(AlertOutcome::Ignored) => self.alerts_ignored += 1,
            DispatchOutcome::Unrouted(_) => self.unrouted_requests += 1,
            DispatchOutcome::Failed(_) => self.audio_failures += 1,
        }
    }

    /// Fraction of telemetry sends that failed (0.0 - 1.0)
    pub fn loss_rate(&self) -> f64 {
        let total = self.messages_sent + self.send_failures;
        if total == 0 {
            return 0.0;
        }
        self.send_failures as f64 / total as f64
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Node Metrics ===\n\n");

        report.push_str(&format!("Publish cycles: {}\n", self.cycles));
        report.push_str(&format!("Messages sent: {}\n", self.messages_sent));
        report.push_str(&format!("Send failures: {}\n", self.send_failures));
        report.push_str(&format!("Replies received: {}\n", self.replies_received));
        report.push_str(&format!("Loss rate: {:.1}%\n", self.loss_rate() * 100.0));
        report.push_str(&format!("Distance timeouts: {}\n\n", self.distance_timeouts));

        report.push_str("Sent by metric:\n");
        for kind in MetricKind::ALL {
            let count = self.sent_by_metric.get(&kind).copied().unwrap_or(0);
            report.push_str(&format!("  {:<12} {}\n", kind.resource_path(), count));
        }

        report.push_str("\nAlerts:\n");
        report.push_str(&format!("  started     {}\n", self.alerts_started));
        report.push_str(&format!("  dropped     {}\n", self.alerts_dropped));
        report.push_str(&format!("  suppressed  {}\n", self.alerts_suppressed));
        report.push_str(&format!("  ignored     {}\n", self.alerts_ignored));
        report.push_str(&format!("  unrouted    {}\n", self.unrouted_requests));
        report.push_str(&format!("  audio fail  {}\n", self.audio_failures));
        report.push_str(&format!("Frames played: {}\n", self.frames_played));

        report
    }
}
