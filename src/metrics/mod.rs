pub mod engine;
pub mod record;

pub use engine::{MetricsEngine, QosSummary};
pub use record::{CongestionLevel, MetricsRecord, Stability};
