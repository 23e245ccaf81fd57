mod aggregator;
mod runner;

pub use aggregator::Aggregator;
pub use runner::{run, shutdown_signal, StopReason};
