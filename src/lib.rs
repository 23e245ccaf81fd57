pub mod config;
pub mod listener;
pub mod logging;
pub mod metrics;
pub mod scheduler;
pub mod sink;
pub mod util;

pub use config::AppConfig;
pub use listener::packet::Packet;
pub use listener::Settings;
pub use metrics::{MetricsEngine, MetricsRecord};
pub use scheduler::Aggregator;
pub use util::PacketBuffer;
