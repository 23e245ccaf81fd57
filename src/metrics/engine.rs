use std::collections::BTreeMap;

use crate::listener::classifier::top_applications;
use crate::listener::packet::Packet;
use crate::listener::Settings;
use crate::util::epoch_seconds;
use crate::util::stats::{mean, round2, sample_std_dev};

use super::record::{CongestionLevel, MetricsRecord, Stability};

const DNS_PROTOCOL: &str = "DNS";

/// Unrounded metrics for one snapshot. Classifications and the health score
/// are derived from these values, rounding only happens in [`MetricsRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QosSummary {
    pub latency: f64,     // ms, mean ack RTT
    pub jitter: f64,      // ms, sample std-dev of inter-frame deltas
    pub bandwidth: f64,   // Mbps over the snapshot's capture span
    pub packet_loss: f64, // %, retransmitted packets
    pub dns_delay: f64,   // ms, mean DNS response time
    pub avg_window: f64,  // mean advertised TCP window
}

impl QosSummary {
    pub fn from_packets(packets: &[Packet]) -> Self {
        QosSummary {
            latency: latency_ms(packets),
            jitter: jitter_ms(packets),
            bandwidth: bandwidth_mbps(packets),
            packet_loss: packet_loss_pct(packets),
            dns_delay: dns_delay_ms(packets),
            avg_window: avg_window(packets),
        }
    }

    pub fn stability(&self) -> Stability {
        Stability::classify(self.jitter, self.packet_loss)
    }

    pub fn congestion_level(&self) -> CongestionLevel {
        CongestionLevel::classify(self.avg_window, self.bandwidth)
    }

    /// Weighted 1..=100 composite of latency, jitter, loss, bandwidth and DNS delay.
    pub fn health_score(&self) -> u8 {
        let latency_score = (100.0 - self.latency / 2.0).max(0.0) * 0.30;
        let jitter_score = (100.0 - self.jitter * 2.0).max(0.0) * 0.20;
        let loss_score = (100.0 - self.packet_loss * 10.0).max(0.0) * 0.25;
        let bandwidth_score = (self.bandwidth * 10.0).min(100.0) * 0.15;
        let dns_score = (100.0 - self.dns_delay * 2.0).max(0.0) * 0.10;

        let score = (latency_score + jitter_score + loss_score + bandwidth_score + dns_score)
            .round_ties_even();
        // NaN inputs fall through to the lower bound
        if score >= 100.0 {
            100
        } else if score >= 1.0 {
            score as u8
        } else {
            1
        }
    }
}

pub fn latency_ms(packets: &[Packet]) -> f64 {
    let rtts: Vec<f64> = packets
        .iter()
        .filter(|p| p.ack_rtt > 0.0)
        .map(|p| p.ack_rtt * 1000.0)
        .collect();
    mean(&rtts)
}

pub fn jitter_ms(packets: &[Packet]) -> f64 {
    let deltas: Vec<f64> = packets
        .iter()
        .filter(|p| p.time_delta > 0.0)
        .map(|p| p.time_delta * 1000.0)
        .collect();
    sample_std_dev(&deltas)
}

pub fn bandwidth_mbps(packets: &[Packet]) -> f64 {
    if packets.is_empty() {
        return 0.0;
    }
    // f64 so oversized frame lengths cannot overflow the sum
    let total_bytes: f64 = packets.iter().map(|p| p.frame_len as f64).sum();
    let (min, max) = packets.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.timestamp), hi.max(p.timestamp))
    });
    let time_span = max - min;
    if time_span > 0.0 {
        (total_bytes * 8.0) / (time_span * 1_000_000.0)
    } else {
        0.0
    }
}

pub fn packet_loss_pct(packets: &[Packet]) -> f64 {
    if packets.is_empty() {
        return 0.0;
    }
    let retransmissions = packets.iter().filter(|p| p.retransmission).count();
    retransmissions as f64 / packets.len() as f64 * 100.0
}

pub fn dns_delay_ms(packets: &[Packet]) -> f64 {
    let delays: Vec<f64> = packets
        .iter()
        .filter(|p| p.protocol == DNS_PROTOCOL && p.dns_time > 0.0)
        .map(|p| p.dns_time * 1000.0)
        .collect();
    mean(&delays)
}

pub fn avg_window(packets: &[Packet]) -> f64 {
    let windows: Vec<f64> = packets
        .iter()
        .filter(|p| p.window_size > 0)
        .map(|p| p.window_size as f64)
        .collect();
    mean(&windows)
}

pub fn protocol_counts(packets: &[Packet]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for packet in packets {
        *counts.entry(packet.protocol.clone()).or_insert(0) += 1;
    }
    counts
}

/// Turns buffer snapshots into [`MetricsRecord`]s. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    top_applications: usize,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(Settings::TOP_APPLICATIONS)
    }
}

impl MetricsEngine {
    pub fn new(top_applications: usize) -> Self {
        MetricsEngine { top_applications }
    }

    /// Returns `None` for an empty snapshot.
    pub fn compute(&self, snapshot: &[Packet]) -> Option<MetricsRecord> {
        if snapshot.is_empty() {
            return None;
        }

        let summary = QosSummary::from_packets(snapshot);
        let top_apps = top_applications(snapshot, self.top_applications)
            .into_iter()
            .map(|app| app.application)
            .collect();

        Some(MetricsRecord {
            timestamp: epoch_seconds(),
            latency: round2(summary.latency),
            jitter: round2(summary.jitter),
            bandwidth: round2(summary.bandwidth),
            packet_loss: round2(summary.packet_loss),
            dns_delay: round2(summary.dns_delay),
            health_score: summary.health_score(),
            stability: summary.stability(),
            congestion_level: summary.congestion_level(),
            packet_count: snapshot.len(),
            protocol_counts: protocol_counts(snapshot),
            top_applications: top_apps,
        })
    }
}
