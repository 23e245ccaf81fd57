use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::config::OutputFormat;
use crate::metrics::MetricsRecord;

pub mod csv;
pub mod jsonl;

pub use self::csv::CsvSink;
pub use self::jsonl::JsonLinesSink;

/// Destination for computed records. Every record must be flushed before
/// `write` returns.
pub trait MetricsSink {
    fn write(&mut self, record: &MetricsRecord) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// A writer that can push buffered data to stable storage.
pub trait SyncWrite: Write {
    fn sync(&mut self) -> io::Result<()>;
}

impl SyncWrite for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl SyncWrite for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Create the output file (truncating it) and wrap it in the configured sink.
pub fn open_sink(path: &Path, format: OutputFormat) -> Result<Box<dyn MetricsSink + Send>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    info!("Writing to: {}", path.display());

    let sink: Box<dyn MetricsSink + Send> = match format {
        OutputFormat::Csv => Box::new(CsvSink::new(file)?),
        OutputFormat::JsonLines => Box::new(JsonLinesSink::new(file)),
    };
    Ok(sink)
}
