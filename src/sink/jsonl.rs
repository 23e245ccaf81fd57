use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use super::{MetricsSink, SyncWrite};
use crate::metrics::MetricsRecord;

/// One JSON object per line.
pub struct JsonLinesSink<W: SyncWrite> {
    writer: BufWriter<W>,
}

impl<W: SyncWrite> JsonLinesSink<W> {
    pub fn new(inner: W) -> Self {
        JsonLinesSink {
            writer: BufWriter::new(inner),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush JSON sink: {}", e.error()))
    }
}

impl<W: SyncWrite> MetricsSink for JsonLinesSink<W> {
    fn write(&mut self, record: &MetricsRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to serialize record")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.writer.get_mut().sync()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_mut().sync()?;
        Ok(())
    }
}
