use std::time::{Duration, Instant};

use crate::config::Metrics;
use crate::listener::packet::Packet;
use crate::listener::Settings;
use crate::metrics::{MetricsEngine, MetricsRecord};
use crate::util::PacketBuffer;

/// Owns the packet window and decides when a new record is due.
///
/// Computation is polled on packet arrival: a record is produced by the first
/// packet that arrives at least `interval` after the previous record. Without
/// traffic no records are produced, even when the interval has long passed.
#[derive(Debug)]
pub struct Aggregator {
    buffer: PacketBuffer,
    engine: MetricsEngine,
    interval: Duration,
    packet_count: u64,
    last_computed: Instant,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(
            Settings::BUFFER_CAPACITY,
            Settings::METRICS_INTERVAL,
            MetricsEngine::default(),
            Instant::now(),
        )
    }
}

impl Aggregator {
    pub fn new(capacity: usize, interval: Duration, engine: MetricsEngine, start: Instant) -> Self {
        Aggregator {
            buffer: PacketBuffer::new(capacity),
            engine,
            interval,
            packet_count: 0,
            last_computed: start,
        }
    }

    pub fn from_config(config: &Metrics) -> Self {
        Self::new(
            config.buffer_capacity,
            config.interval,
            MetricsEngine::new(config.top_applications),
            Instant::now(),
        )
    }

    pub fn ingest(&mut self, packet: Packet) -> Option<MetricsRecord> {
        self.ingest_at(packet, Instant::now())
    }

    /// Buffer `packet` and, if the interval has elapsed at `now`, compute a record.
    pub fn ingest_at(&mut self, packet: Packet, now: Instant) -> Option<MetricsRecord> {
        self.buffer.append(packet);
        self.packet_count += 1;

        if now.saturating_duration_since(self.last_computed) < self.interval
            || self.buffer.is_empty()
        {
            return None;
        }

        let snapshot = self.buffer.snapshot();
        let record = self.engine.compute(&snapshot)?;
        self.last_computed = now;
        Some(record)
    }

    /// Packets ingested since start, including evicted ones.
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
