pub mod ring_buffer;
pub mod stats;

pub use ring_buffer::RingBuffer;

/// Most recent packets, oldest evicted first.
pub type PacketBuffer = RingBuffer<crate::listener::packet::Packet>;

/// Current wall clock time as fractional seconds since the epoch.
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
