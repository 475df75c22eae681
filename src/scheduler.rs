// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Cooperative scheduler
//!
//! Everything runs on one thread, one step at a time. Each [`tick`](Scheduler::tick):
//!
//! ```text
//! service transport ─► route ≤1 inbound request ─► AlertDispatcher
//!        │
//!        ├─ tone active?  ─► pump one audio chunk, end tick
//!        │
//!        └─ idle          ─► sleep tick_interval ─► publish_all
//! ```
//!
//! A tone never blocks the transport: while it plays, every tick services
//! the transport and writes one bounded chunk. Publishing resumes once the
//! tone finishes. With `chunk_frames == 0` the dispatcher plays the whole
//! tone inside the dispatch instead.
//!
//! The tick after a tone ends always publishes. Inbound requests wait in the
//! transport for that one tick, so back-to-back alerts cannot hold telemetry
//! back for longer than one tone.

use crate::alert::AlertDispatcher;
use crate::config::NodeConfig;
use crate::device::Device;
use crate::envelope::EnvelopeAnalyzer;
use crate::error::{AudioError, Result};
use crate::hal::{Clock, ConnectionState, NetworkLink};
use crate::metrics::NodeMetrics;
use crate::probe::{DistanceProbe, MotionProbe, PresenceIndicator};
use crate::protocol::{AlertEvent, MetricKind};
use crate::publisher::{PublishReport, Sensors, TelemetryPublisher};
use crate::router::{DispatchOutcome, Resource, ResourceTable};
use crate::tone::{PlaybackProgress, ToneSynthesizer};
use crate::transport::Transport;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Inbound request handled this tick
    pub dispatch: Option<DispatchOutcome>,
    /// Audio chunk written this tick
    pub playback: Option<std::result::Result<PlaybackProgress, AudioError>>,
    /// Publish cycle run this tick
    pub publish: Option<PublishReport>,
}

/// The node's main loop
pub struct Scheduler<T: Transport> {
    config: NodeConfig,
    clock: Box<dyn Clock>,
    link: Box<dyn NetworkLink>,
    transport: T,
    sensors: Sensors,
    publisher: TelemetryPublisher,
    dispatcher: AlertDispatcher,
    synth: ToneSynthesizer,
    resources: ResourceTable,
    metrics: NodeMetrics,
    /// A tone ended; the next tick publishes before routing anything
    publish_due: bool,
}

impl<T: Transport> Scheduler<T> {
    /// Wire a device and transport into a scheduler
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: NodeConfig, device: Device, transport: T) -> Result<Self> {
        config.validate()?;

        let Device {
            clock,
            link,
            microphone,
            ranger,
            motion,
            indicator,
            audio,
        } = device;

        let sensors = Sensors {
            distance: DistanceProbe::new(ranger, config.distance.clone()),
            motion: MotionProbe::new(motion, &config.motion),
            microphone: EnvelopeAnalyzer::new(microphone, config.microphone.clone()),
            indicator: indicator.map(PresenceIndicator::new),
        };

        let mut resources = ResourceTable::new();
        resources.register(config.alert.resource_path.clone(), Resource::Alert)?;

        let mut dispatcher = AlertDispatcher::new(config.alert.policy, config.alert.tone.waveform());
        if config.alert.chunk_frames == 0 {
            dispatcher = dispatcher.blocking();
        }

        Ok(Self {
            publisher: TelemetryPublisher::new(&config),
            synth: ToneSynthesizer::new(audio, config.alert.chunk_frames),
            clock,
            link,
            transport,
            sensors,
            dispatcher,
            resources,
            metrics: NodeMetrics::new(),
            publish_due: false,
            config,
        })
    }

    /// Block until the network layer reports `Connected`
    ///
    /// Returns the number of polls it took. The core has no recovery path of
    /// its own; it relies on the network layer's retries.
    pub fn wait_for_network(&mut self) -> u32 {
        let mut polls = 0;
        let mut last: Option<ConnectionState> = None;
        loop {
            let state = self.link.state();
            polls += 1;
            if last != Some(state) {
                log::info!("network {:?}", state);
                last = Some(state);
            }
            if state.is_connected() {
                return polls;
            }
            self.clock.delay_ms(self.config.network_poll_ms);
        }
    }

    /// Wait for the network, then tick forever
    pub fn run(&mut self) -> ! {
        self.wait_for_network();
        log::info!(
            "{} publishing to {} every {} ms, alerts on /{}",
            self.config.device_id,
            self.config.collector,
            self.config.tick_interval_ms,
            self.config.alert.resource_path
        );
        loop {
            self.tick();
        }
    }

    /// Run one scheduler step
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        while let Some(id) = self.transport.take_reply() {
            log::trace!("collector acknowledged {}", id);
            self.metrics.replies_received += 1;
        }

        if !self.publish_due {
            if let Some(event) = self.transport.service() {
                let outcome = self.dispatch(event);
                self.metrics.record_dispatch(&outcome);
                report.dispatch = Some(outcome);
            }
        }

        if self.synth.is_playing() {
            let progress = self.synth.pump();
            if let Err(e) = &progress {
                log::warn!("alert tone aborted: {}", e);
                self.metrics.audio_failures += 1;
            }
            self.publish_due = !self.synth.is_playing();
            self.metrics.frames_played = self.synth.frames_played();
            report.playback = Some(progress);
            return report;
        }

        self.publish_due = false;
        self.metrics.frames_played = self.synth.frames_played();
        self.clock.delay_ms(self.config.tick_interval_ms);

        let publish = self
            .publisher
            .publish_all(&mut self.sensors, &*self.clock, &mut self.transport);
        self.record_publish(&publish);
        report.publish = Some(publish);
        report
    }

    /// Silence any tone and close the transport
    ///
    /// Later ticks keep sampling; their sends fail locally and are counted.
    pub fn shutdown(&mut self) {
        if self.synth.stop() {
            log::info!("alert tone cut short by shutdown");
        }
        self.transport.close();
        log::info!("{} transport closed", self.config.device_id);
    }

    fn dispatch(&mut self, event: AlertEvent) -> DispatchOutcome {
        match self.resources.resolve(&event.resource_path) {
            Some(Resource::Alert) => match self.dispatcher.handle(&event, &mut self.synth) {
                Ok(outcome) => {
                    log::info!("alert from {}: {:?}", event.source, outcome);
                    DispatchOutcome::Alert(outcome)
                }
                Err(e) => {
                    log::warn!("alert from {} failed: {}", event.source, e);
                    DispatchOutcome::Failed(e.into())
                }
            },
            None => {
                log::debug!(
                    "no resource at /{} (request from {})",
                    event.resource_path,
                    event.source
                );
                DispatchOutcome::Unrouted(event.resource_path)
            }
        }
    }

    fn record_publish(&mut self, report: &PublishReport) {
        self.metrics.cycles += 1;
        for outcome in &report.outcomes {
            self.metrics.record_send(outcome.kind, outcome.result.is_ok());
        }
        if report
            .reading(MetricKind::Distance)
            .map_or(false, |r| r.value.is_missing())
        {
            self.metrics.distance_timeouts += 1;
        }
    }

    /// Runtime counters
    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The tone synthesizer
    pub fn synth(&self) -> &ToneSynthesizer {
        &self.synth
    }

    /// Inbound resource table
    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }
}
