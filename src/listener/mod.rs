use std::time::Duration;

pub struct Settings {}

impl Settings {
    /// Fields requested from the capture process, in column order.
    pub const CAPTURE_FIELDS: [&'static str; 14] = [
        "frame.time_epoch",
        "ip.src",
        "ip.dst",
        "_ws.col.protocol",
        "frame.len",
        "tcp.srcport",
        "tcp.dstport",
        "ip.ttl",
        "tcp.flags",
        "tcp.window_size_value",
        "tcp.analysis.ack_rtt",
        "tcp.analysis.retransmission",
        "frame.time_delta",
        "dns.time",
    ];
    pub const CAPTURE_SEPARATOR: char = ',';
    pub const BUFFER_CAPACITY: usize = 1000;
    pub const METRICS_INTERVAL: Duration = Duration::from_secs(5);
    pub const TOP_APPLICATIONS: usize = 3;
    // Grace period between terminating the capture process and killing it.
    pub const TERMINATE_GRACE: Duration = Duration::from_millis(500);
}

pub mod capture;
pub mod classifier;
pub mod packet;
pub mod parser;
