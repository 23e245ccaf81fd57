use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    Stable,
    Unstable,
    #[serde(rename = "Very Unstable")]
    VeryUnstable,
}

impl Stability {
    pub fn classify(jitter_ms: f64, packet_loss: f64) -> Self {
        if jitter_ms < 10.0 && packet_loss < 1.0 {
            Stability::Stable
        } else if jitter_ms < 30.0 && packet_loss < 5.0 {
            Stability::Unstable
        } else {
            Stability::VeryUnstable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::Stable => "Stable",
            Stability::Unstable => "Unstable",
            Stability::VeryUnstable => "Very Unstable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongestionLevel {
    Low,
    Moderate,
    High,
}

impl CongestionLevel {
    /// `avg_window` is the mean advertised TCP window, `bandwidth` in Mbps.
    pub fn classify(avg_window: f64, bandwidth: f64) -> Self {
        if avg_window > 8000.0 && bandwidth > 5.0 {
            CongestionLevel::Low
        } else if avg_window > 4000.0 || bandwidth > 2.0 {
            CongestionLevel::Moderate
        } else {
            CongestionLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "Low",
            CongestionLevel::Moderate => "Moderate",
            CongestionLevel::High => "High",
        }
    }
}

impl Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interval summary as persisted by the sinks.
///
/// Latency, jitter and DNS delay are in milliseconds, bandwidth in Mbps and
/// packet loss in percent, all rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub timestamp: f64,
    pub latency: f64,
    pub jitter: f64,
    pub bandwidth: f64,
    pub packet_loss: f64,
    pub dns_delay: f64,
    pub health_score: u8,
    pub stability: Stability,
    pub congestion_level: CongestionLevel,
    pub packet_count: usize,
    pub protocol_counts: BTreeMap<String, usize>,
    pub top_applications: Vec<String>,
}

impl MetricsRecord {
    /// Protocol histogram as a JSON object string.
    pub fn protocol_counts_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.protocol_counts)
    }

    /// Top applications as a JSON array string.
    pub fn top_applications_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.top_applications)
    }

    pub fn parse_protocol_counts(json: &str) -> serde_json::Result<BTreeMap<String, usize>> {
        serde_json::from_str(json)
    }

    pub fn parse_top_applications(json: &str) -> serde_json::Result<Vec<String>> {
        serde_json::from_str(json)
    }
}

impl Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Latency: {}ms | Jitter: {}ms | Health: {} | Loss: {}%",
            self.latency, self.jitter, self.health_score, self.packet_loss
        )
    }
}
