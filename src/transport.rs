// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Transport abstraction module
//!
//! The request/response protocol stack (framing, retransmission, message
//! IDs) lives outside the node core. This module defines the interface the
//! core calls into and in-memory implementations for testing.

use crate::error::TransportError;
use crate::protocol::{AlertEvent, MessageId, TelemetryMessage};
use std::collections::VecDeque;

/// Statistics about transport usage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportMetrics {
    /// Total payload bytes sent
    pub bytes_sent: u64,
    /// Total payload bytes received
    pub bytes_received: u64,
    /// Total requests sent
    pub messages_sent: u64,
    /// Total requests received
    pub messages_received: u64,
    /// Sends that failed locally
    pub send_failures: u64,
}

/// Trait for the request/response protocol stack
pub trait Transport {
    /// Issue a fire-and-forget PUT; returns the correlation id
    fn put(&mut self, message: TelemetryMessage) -> Result<MessageId, TransportError>;

    /// Service the stack once; yields at most one inbound request
    fn service(&mut self) -> Option<AlertEvent>;

    /// Next collector reply to an earlier `put`, if the stack reports them
    fn take_reply(&mut self) -> Option<MessageId> {
        None
    }

    /// Check if the transport is open
    fn is_available(&self) -> bool;

    /// Get transport metrics
    fn metrics(&self) -> TransportMetrics;

    /// Close the transport
    fn close(&mut self);
}

/// A simple in-memory transport for testing and local communication
#[derive(Debug)]
pub struct MemoryTransport {
    /// Outgoing requests (send buffer)
    tx_buffer: VecDeque<(MessageId, TelemetryMessage)>,
    /// Incoming requests (receive buffer)
    rx_buffer: VecDeque<AlertEvent>,
    /// Replies to sent requests
    replies: VecDeque<MessageId>,
    /// Maximum buffer size
    max_buffer_size: usize,
    /// Whether the transport is open
    is_open: bool,
    /// Next message id
    next_id: u16,
    /// Metrics
    metrics: TransportMetrics,
}

impl MemoryTransport {
    /// Create a new memory transport
    pub fn new() -> Self {
        Self::with_buffer_size(1000)
    }

    /// Create with custom buffer size
    pub fn with_buffer_size(max_size: usize) -> Self {
        Self {
            tx_buffer: VecDeque::with_capacity(max_size.min(1000)),
            rx_buffer: VecDeque::new(),
            replies: VecDeque::new(),
            max_buffer_size: max_size,
            is_open: true,
            next_id: 0,
            metrics: TransportMetrics::default(),
        }
    }

    /// Queue an inbound request (simulate receiving)
    pub fn push_incoming(&mut self, event: AlertEvent) {
        self.rx_buffer.push_back(event);
    }

    /// Queue a collector reply (simulate an acknowledgement)
    pub fn push_reply(&mut self, id: MessageId) {
        self.replies.push_back(id);
    }

    /// Pop the oldest outbound request (simulate transmission)
    pub fn pop_outgoing(&mut self) -> Option<(MessageId, TelemetryMessage)> {
        self.tx_buffer.pop_front()
    }

    /// Drain every outbound request
    pub fn drain_outgoing(&mut self) -> Vec<TelemetryMessage> {
        self.tx_buffer.drain(..).map(|(_, msg)| msg).collect()
    }

    /// Get number of pending outgoing requests
    pub fn pending_outgoing(&self) -> usize {
        self.tx_buffer.len()
    }

    /// Get number of pending incoming requests
    pub fn pending_incoming(&self) -> usize {
        self.rx_buffer.len()
    }

    fn next_message_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn put(&mut self, message: TelemetryMessage) -> Result<MessageId, TransportError> {
        if !self.is_open {
            self.metrics.send_failures += 1;
            return Err(TransportError::Closed);
        }

        if self.tx_buffer.len() >= self.max_buffer_size {
            self.metrics.send_failures += 1;
            return Err(TransportError::BufferFull {
                capacity: self.max_buffer_size,
            });
        }

        let id = self.next_message_id();
        self.metrics.bytes_sent += message.len() as u64;
        self.metrics.messages_sent += 1;
        self.tx_buffer.push_back((id, message));

        Ok(id)
    }

    fn service(&mut self) -> Option<AlertEvent> {
        if !self.is_open {
            return None;
        }

        let event = self.rx_buffer.pop_front()?;
        self.metrics.bytes_received += event.payload.len() as u64;
        self.metrics.messages_received += 1;
        Some(event)
    }

    fn take_reply(&mut self) -> Option<MessageId> {
        if !self.is_open {
            return None;
        }
        self.replies.pop_front()
    }

    fn is_available(&self) -> bool {
        self.is_open
    }

    fn metrics(&self) -> TransportMetrics {
        self.metrics.clone()
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}

/// Transport whose sends fail locally at a given rate
#[derive(Debug)]
pub struct LossyTransport {
    inner: MemoryTransport,
    loss_rate: f32,
    rng_state: u64,
}

impl LossyTransport {
    /// Create a new lossy transport with given failure rate (0.0-1.0)
    pub fn new(loss_rate: f32) -> Self {
        Self {
            inner: MemoryTransport::new(),
            loss_rate: loss_rate.clamp(0.0, 1.0),
            rng_state: 12345,
        }
    }

    /// The underlying memory transport
    pub fn inner_mut(&mut self) -> &mut MemoryTransport {
        &mut self.inner
    }

    /// Simple PRNG for deterministic testing
    fn next_random(&mut self) -> f32 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f32 / 32767.0
    }
}

impl Transport for LossyTransport {
    fn put(&mut self, message: TelemetryMessage) -> Result<MessageId, TransportError> {
        if self.next_random() < self.loss_rate || self.loss_rate >= 1.0 {
            self.inner.metrics.send_failures += 1;
            return Err(TransportError::SendFailed {
                path: message.resource_path,
                reason: "simulated datagram loss".to_string(),
            });
        }
        self.inner.put(message)
    }

    fn service(&mut self) -> Option<AlertEvent> {
        self.inner.service()
    }

    fn take_reply(&mut self) -> Option<MessageId> {
        self.inner.take_reply()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn metrics(&self) -> TransportMetrics {
        self.inner.metrics()
    }

    fn close(&mut self) {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(path: &str) -> TelemetryMessage {
        TelemetryMessage::new("10.42.0.1:4832".parse().unwrap(), path, b"{}".to_vec())
    }

    #[test]
    fn test_memory_transport_put_assigns_ids() {
        let mut transport = MemoryTransport::new();

        let id1 = transport.put(make_message("distance")).unwrap();
        let id2 = transport.put(make_message("motion")).unwrap();
        assert_eq!(id1, MessageId(0));
        assert_eq!(id2, MessageId(1));
        assert_eq!(transport.pending_outgoing(), 2);

        let (id, msg) = transport.pop_outgoing().unwrap();
        assert_eq!(id, id1);
        assert_eq!(msg.resource_path, "distance");
    }

    #[test]
    fn test_memory_transport_service_one_at_a_time() {
        let mut transport = MemoryTransport::new();
        let source = "10.42.0.183:4832".parse().unwrap();
        transport.push_incoming(AlertEvent::new(source, "alert", vec![1]));
        transport.push_incoming(AlertEvent::new(source, "alert", vec![2]));

        assert_eq!(transport.service().unwrap().payload, vec![1]);
        assert_eq!(transport.pending_incoming(), 1);
        assert_eq!(transport.service().unwrap().payload, vec![2]);
        assert!(transport.service().is_none());
        assert_eq!(transport.metrics().messages_received, 2);
    }

    #[test]
    fn test_memory_transport_replies() {
        let mut transport = MemoryTransport::new();
        let id = transport.put(make_message("distance")).unwrap();
        assert_eq!(transport.take_reply(), None);

        transport.push_reply(id);
        assert_eq!(transport.take_reply(), Some(MessageId(0)));
        assert_eq!(transport.take_reply(), None);

        transport.push_reply(id);
        transport.close();
        assert_eq!(transport.take_reply(), None);
    }

    #[test]
    fn test_memory_transport_buffer_full() {
        let mut transport = MemoryTransport::with_buffer_size(2);

        transport.put(make_message("a")).unwrap();
        transport.put(make_message("b")).unwrap();

        // Third request should fail
        let result = transport.put(make_message("c"));
        assert_eq!(result, Err(TransportError::BufferFull { capacity: 2 }));
        assert_eq!(transport.metrics().send_failures, 1);
    }

    #[test]
    fn test_memory_transport_closed() {
        let mut transport = MemoryTransport::new();
        transport.close();

        assert_eq!(transport.put(make_message("a")), Err(TransportError::Closed));
        assert!(!transport.is_available());
    }

    #[test]
    fn test_transport_metrics() {
        let mut transport = MemoryTransport::new();
        transport.put(make_message("distance")).unwrap();

        let metrics = transport.metrics();
        assert_eq!(metrics.bytes_sent, 2);
        assert_eq!(metrics.messages_sent, 1);
    }

    #[test]
    fn test_lossy_transport() {
        let mut transport = LossyTransport::new(0.5); // 50% loss rate

        let mut failed = 0;
        for _ in 0..100 {
            if transport.put(make_message("motion")).is_err() {
                failed += 1;
            }
        }

        // Should have lost some requests
        assert!(failed > 0);
        // But not all
        assert!(transport.inner_mut().pending_outgoing() > 0);
        assert_eq!(transport.metrics().send_failures, failed);
    }
}
