use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

use log::warn;
use serde::Serialize;
use thiserror::Error;

use super::field::{CaptureField, RecordLayout};
use crate::util::epoch_seconds;

/// Errors raised while converting a single column. These never leave the
/// builder, [`Packet::from_record`] replaces the packet with a fallback instead.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("invalid number {value:?} in {field}")]
    Float {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid integer {value:?} in {field}")]
    Int {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// One observed packet as reported by the capture process.
///
/// # Fields
///
/// * `timestamp` - Capture time, seconds since the epoch.
/// * `frame_len` - Frame length in bytes.
/// * `src_port`, `dst_port` - Transport ports, 0 when absent.
/// * `ack_rtt` - TCP round trip estimate in seconds, 0 when not applicable.
/// * `time_delta` - Time since the previous captured frame in seconds.
/// * `dns_time` - DNS resolution time in seconds, 0 when not applicable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Packet {
    pub timestamp: f64,
    pub src_ip: String,
    pub dst_ip: String,
    pub protocol: String,
    pub frame_len: u64,
    pub src_port: u32,
    pub dst_port: u32,
    pub ttl: i64,
    pub tcp_flags: String,
    pub window_size: u64,
    pub ack_rtt: f64,
    pub retransmission: bool,
    pub time_delta: f64,
    pub dns_time: f64,
}

impl Packet {
    /// Build a packet from a header and a row of raw values.
    /// Never fails: malformed rows are logged and replaced by [`Packet::fallback`].
    pub fn from_record<H: AsRef<str>, V: AsRef<str>>(header: &[H], row: &[V]) -> Packet {
        Self::from_layout(&RecordLayout::new(header), row)
    }

    pub fn from_layout<V: AsRef<str>>(layout: &RecordLayout, row: &[V]) -> Packet {
        match Self::try_from_layout(layout, row) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Error parsing packet: {}", e);
                Self::fallback()
            }
        }
    }

    /// Strict variant of [`Packet::from_layout`]. Values missing at the end of
    /// the row are treated as empty strings.
    pub fn try_from_layout<V: AsRef<str>>(
        layout: &RecordLayout,
        row: &[V],
    ) -> Result<Packet, FieldError> {
        let mut packet = Packet::default();

        for (i, column) in layout.columns().iter().enumerate() {
            let Some(field) = column else {
                continue;
            };
            let value = row.get(i).map(|v| v.as_ref()).unwrap_or("");

            match field {
                CaptureField::TimeEpoch => packet.timestamp = parse_float(*field, value)?,
                CaptureField::TimeDelta => packet.time_delta = parse_float(*field, value)?,
                CaptureField::AckRtt => packet.ack_rtt = parse_float(*field, value)?,
                CaptureField::DnsTime => packet.dns_time = parse_float(*field, value)?,
                CaptureField::FrameLen => packet.frame_len = parse_int(*field, value)?,
                CaptureField::SrcPort => packet.src_port = parse_int(*field, value)?,
                CaptureField::DstPort => packet.dst_port = parse_int(*field, value)?,
                CaptureField::Ttl => packet.ttl = parse_int(*field, value)?,
                CaptureField::WindowSize => packet.window_size = parse_int(*field, value)?,
                CaptureField::Retransmission => packet.retransmission = value == "1",
                CaptureField::SrcIp => packet.src_ip = value.to_string(),
                CaptureField::DstIp => packet.dst_ip = value.to_string(),
                CaptureField::Protocol => packet.protocol = value.to_string(),
                CaptureField::TcpFlags => packet.tcp_flags = value.to_string(),
            }
        }

        Ok(packet)
    }

    /// Low-information placeholder used when a row cannot be parsed.
    pub fn fallback() -> Packet {
        Packet {
            timestamp: epoch_seconds(),
            src_ip: String::from("unknown"),
            dst_ip: String::from("unknown"),
            protocol: String::from("Unknown"),
            frame_len: 64,
            src_port: 0,
            dst_port: 0,
            ttl: 64,
            tcp_flags: String::new(),
            window_size: 0,
            ack_rtt: 0.0,
            retransmission: false,
            time_delta: 0.0,
            dns_time: 0.0,
        }
    }
}

fn parse_float(field: CaptureField, value: &str) -> Result<f64, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    value.parse::<f64>().map_err(|source| FieldError::Float {
        field: field.name(),
        value: value.to_string(),
        source,
    })
}

fn parse_int<T>(field: CaptureField, value: &str) -> Result<T, FieldError>
where
    T: FromStr<Err = ParseIntError> + Default,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(T::default());
    }
    value.parse::<T>().map_err(|source| FieldError::Int {
        field: field.name(),
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::Settings;

    fn header() -> Vec<&'static str> {
        Settings::CAPTURE_FIELDS.to_vec()
    }

    #[test]
    fn test_full_row() {
        let row = [
            "1700000000.5",
            "10.0.0.1",
            "10.0.0.2",
            "TCP",
            "1514",
            "443",
            "51000",
            "57",
            "0x0018",
            "501",
            "0.025",
            "1",
            "0.0012",
            "",
        ];
        let packet = Packet::from_record(&header(), &row);

        assert_eq!(packet.timestamp, 1700000000.5);
        assert_eq!(packet.src_ip, "10.0.0.1");
        assert_eq!(packet.dst_ip, "10.0.0.2");
        assert_eq!(packet.protocol, "TCP");
        assert_eq!(packet.frame_len, 1514);
        assert_eq!(packet.src_port, 443);
        assert_eq!(packet.dst_port, 51000);
        assert_eq!(packet.ttl, 57);
        assert_eq!(packet.tcp_flags, "0x0018");
        assert_eq!(packet.window_size, 501);
        assert_eq!(packet.ack_rtt, 0.025);
        assert!(packet.retransmission);
        assert_eq!(packet.time_delta, 0.0012);
        assert_eq!(packet.dns_time, 0.0);
    }

    #[test]
    fn test_short_row_uses_defaults() {
        let row = ["1700000000.0", "192.168.1.10", "8.8.8.8", "DNS", "80"];
        let packet = Packet::from_record(&header(), &row);

        assert_eq!(packet.protocol, "DNS");
        assert_eq!(packet.frame_len, 80);
        assert_eq!(packet.src_port, 0);
        assert_eq!(packet.dst_port, 0);
        assert_eq!(packet.ttl, 0);
        assert_eq!(packet.tcp_flags, "");
        assert!(!packet.retransmission);
        assert_eq!(packet.ack_rtt, 0.0);
        assert_eq!(packet.dns_time, 0.0);
    }

    #[test]
    fn test_retransmission_requires_exact_one() {
        let layout = RecordLayout::new(&["tcp.analysis.retransmission"]);
        assert!(Packet::from_layout(&layout, &["1"]).retransmission);
        assert!(!Packet::from_layout(&layout, &["true"]).retransmission);
        assert!(!Packet::from_layout(&layout, &[" 1"]).retransmission);
        assert!(!Packet::from_layout(&layout, &[""]).retransmission);
    }

    #[test]
    fn test_malformed_row_falls_back() {
        let row = ["not-a-time", "10.0.0.1", "10.0.0.2", "TCP", "1514"];
        let before = epoch_seconds();
        let packet = Packet::from_record(&header(), &row);

        assert_eq!(packet.protocol, "Unknown");
        assert_eq!(packet.src_ip, "unknown");
        assert_eq!(packet.frame_len, 64);
        assert_eq!(packet.ttl, 64);
        assert_eq!(packet.window_size, 0);
        assert!(!packet.retransmission);
        assert!(packet.timestamp >= before);
    }

    #[test]
    fn test_strict_parse_reports_field() {
        let layout = RecordLayout::new(&["frame.len", "tcp.srcport"]);
        let err = Packet::try_from_layout(&layout, &["100", "-3"]).unwrap_err();
        match err {
            FieldError::Int { field, value, .. } => {
                assert_eq!(field, "tcp.srcport");
                assert_eq!(value, "-3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let layout = RecordLayout::new(&["eth.src", "frame.len"]);
        let packet = Packet::from_layout(&layout, &["garbage", "60"]);
        assert_eq!(packet.frame_len, 60);
    }
}
