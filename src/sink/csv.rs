use std::borrow::Cow;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use super::{MetricsSink, SyncWrite};
use crate::metrics::MetricsRecord;

pub const HEADER: [&str; 12] = [
    "timestamp",
    "latency",
    "jitter",
    "bandwidth",
    "packet_loss",
    "dns_delay",
    "health_score",
    "stability",
    "congestion_level",
    "packet_count",
    "protocol_counts",
    "top_applications",
];

/// Tabular sink, one header row then one row per record. The JSON columns
/// contain commas and quotes, so fields are quoted where needed.
pub struct CsvSink<W: SyncWrite> {
    writer: BufWriter<W>,
    rows: u64,
}

impl<W: SyncWrite> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut sink = CsvSink {
            writer: BufWriter::new(inner),
            rows: 0,
        };
        sink.write_row(&HEADER.map(Cow::Borrowed))
            .context("Failed to write CSV header")?;
        Ok(sink)
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV sink: {}", e.error()))
    }

    fn write_row(&mut self, fields: &[Cow<'_, str>]) -> Result<()> {
        let line = fields
            .iter()
            .map(|f| escape(f))
            .collect::<Vec<_>>()
            .join(",");
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.writer.get_mut().sync()?;
        Ok(())
    }
}

impl<W: SyncWrite> MetricsSink for CsvSink<W> {
    fn write(&mut self, record: &MetricsRecord) -> Result<()> {
        let fields = [
            Cow::Owned(record.timestamp.to_string()),
            Cow::Owned(record.latency.to_string()),
            Cow::Owned(record.jitter.to_string()),
            Cow::Owned(record.bandwidth.to_string()),
            Cow::Owned(record.packet_loss.to_string()),
            Cow::Owned(record.dns_delay.to_string()),
            Cow::Owned(record.health_score.to_string()),
            Cow::Borrowed(record.stability.as_str()),
            Cow::Borrowed(record.congestion_level.as_str()),
            Cow::Owned(record.packet_count.to_string()),
            Cow::Owned(record.protocol_counts_json()?),
            Cow::Owned(record.top_applications_json()?),
        ];
        self.write_row(&fields)
            .context("Failed to write metrics row")?;
        self.rows += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_mut().sync()?;
        Ok(())
    }
}

/// Quote a field if it contains the delimiter, a quote or a line break.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
