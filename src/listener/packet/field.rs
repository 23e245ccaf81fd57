/// Columns understood by the packet builder, keyed by the capture tool's field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureField {
    TimeEpoch,
    SrcIp,
    DstIp,
    Protocol,
    FrameLen,
    SrcPort,
    DstPort,
    Ttl,
    TcpFlags,
    WindowSize,
    AckRtt,
    Retransmission,
    TimeDelta,
    DnsTime,
}

impl CaptureField {
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name.trim() {
            "frame.time_epoch" => CaptureField::TimeEpoch,
            "ip.src" => CaptureField::SrcIp,
            "ip.dst" => CaptureField::DstIp,
            // Older capture configs use the capitalised column name
            "_ws.col.protocol" | "_ws.col.Protocol" => CaptureField::Protocol,
            "frame.len" => CaptureField::FrameLen,
            "tcp.srcport" => CaptureField::SrcPort,
            "tcp.dstport" => CaptureField::DstPort,
            "ip.ttl" => CaptureField::Ttl,
            "tcp.flags" => CaptureField::TcpFlags,
            "tcp.window_size_value" => CaptureField::WindowSize,
            "tcp.analysis.ack_rtt" => CaptureField::AckRtt,
            "tcp.analysis.retransmission" => CaptureField::Retransmission,
            "frame.time_delta" => CaptureField::TimeDelta,
            "dns.time" => CaptureField::DnsTime,
            _ => return None,
        };
        Some(field)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaptureField::TimeEpoch => "frame.time_epoch",
            CaptureField::SrcIp => "ip.src",
            CaptureField::DstIp => "ip.dst",
            CaptureField::Protocol => "_ws.col.protocol",
            CaptureField::FrameLen => "frame.len",
            CaptureField::SrcPort => "tcp.srcport",
            CaptureField::DstPort => "tcp.dstport",
            CaptureField::Ttl => "ip.ttl",
            CaptureField::TcpFlags => "tcp.flags",
            CaptureField::WindowSize => "tcp.window_size_value",
            CaptureField::AckRtt => "tcp.analysis.ack_rtt",
            CaptureField::Retransmission => "tcp.analysis.retransmission",
            CaptureField::TimeDelta => "frame.time_delta",
            CaptureField::DnsTime => "dns.time",
        }
    }
}

/// A header line resolved once into per-column fields.
/// Columns with unrecognised names are kept as `None` and skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    columns: Vec<Option<CaptureField>>,
}

impl RecordLayout {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        RecordLayout {
            columns: header
                .iter()
                .map(|name| CaptureField::from_name(name.as_ref()))
                .collect(),
        }
    }

    pub fn columns(&self) -> &[Option<CaptureField>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for name in crate::listener::Settings::CAPTURE_FIELDS {
            let field = CaptureField::from_name(name).unwrap();
            assert_eq!(field.name(), name);
        }
    }

    #[test]
    fn test_layout_skips_unknown_columns() {
        let layout = RecordLayout::new(&["frame.len", "eth.src", " ip.ttl "]);
        assert_eq!(
            layout.columns(),
            &[Some(CaptureField::FrameLen), None, Some(CaptureField::Ttl)]
        );
        assert_eq!(layout.len(), 3);
    }
}
