// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulated node demonstration
//!
//! This example runs a node against simulated peripherals: it publishes a
//! few telemetry cycles, receives alerts, plays the alert tone and prints
//! the node's metrics.
//!
//! Run with: `cargo run --example simulated_node`

use alertnode::sim::{RecordingSink, ScriptedAnalog, ScriptedRanger, SimClock, SimLink, SimPin};
use alertnode::{AlertEvent, Clock, Device, LossyTransport, NodeConfig, Scheduler, Transport};

fn main() {
    println!("=== Alertnode Simulated Node Demo ===\n");

    let clock = SimClock::new();
    let ranger = ScriptedRanger::new(Some(87.5));
    let pir = SimPin::new(false);
    let led = SimPin::new(true);
    let sink = RecordingSink::new();

    // Quiet room with a burst of noise every few reads
    let microphone = ScriptedAnalog::new(vec![505, 515, 498, 520, 380, 640, 510, 512]);

    let device = Device::new(
        clock.clone(),
        SimLink::connecting_after(3),
        microphone,
        ranger.clone(),
        pir.clone(),
        sink.clone(),
    )
    .with_indicator(led.clone());

    let config = NodeConfig::new("ESP_002", "10.42.0.1:4832".parse().unwrap());
    let mut node = match Scheduler::new(config, device, LossyTransport::new(0.1)) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return;
        }
    };

    let polls = node.wait_for_network();
    println!("Associated after {} polls\n", polls);

    let source = "10.42.0.183:4832".parse().unwrap();

    for cycle in 0..12 {
        // Someone walks past on cycle 3 and leaves on cycle 7
        if cycle == 3 {
            pir.set(true);
        }
        if cycle == 7 {
            pir.set(false);
        }
        // Echo lost once
        if cycle == 5 {
            ranger.push(None);
        }
        // Two alerts in a row: the second one lands while the tone plays
        if cycle == 8 {
            let inbound = node.transport_mut().inner_mut();
            inbound.push_incoming(AlertEvent::new(source, "alert", Vec::new()));
            inbound.push_incoming(AlertEvent::new(source, "alert", Vec::new()));
        }

        let report = node.tick();

        if let Some(dispatch) = &report.dispatch {
            println!("[t={:>6} ms] inbound: {:?}", clock.now_ms(), dispatch);
        }
        if let Some(publish) = &report.publish {
            for message in node.transport_mut().inner_mut().drain_outgoing() {
                println!(
                    "[t={:>6} ms] PUT /{:<10} {}",
                    clock.now_ms(),
                    message.resource_path,
                    message.payload_str().unwrap_or("<binary>")
                );
            }
            if publish.failed() > 0 {
                println!("[t={:>6} ms] {} request(s) lost", clock.now_ms(), publish.failed());
            }
            println!("             indicator {}", if led.level() { "on" } else { "off" });
        }
    }

    // Let any tone still in progress finish
    while node.synth().is_playing() {
        node.tick();
    }

    println!("\n{}", node.metrics().report());
    println!(
        "Audio sink: {} frame(s) at {:?} Hz, opened {} time(s)",
        sink.frames_written(),
        sink.log().sample_rate,
        sink.log().opens
    );
    println!("Transport: {:?}", node.transport().metrics());
}
