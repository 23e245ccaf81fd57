use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::packet::{Packet, RecordLayout};
use super::Settings;

/// Turns the capture process's line output into packets.
///
/// The first non-empty line is taken as the header, every following
/// non-empty line is one packet. Parse failures never end the stream, see
/// [`Packet::from_layout`]. Bytes that are not valid UTF-8 are replaced
/// rather than rejected.
pub struct Parser<R> {
    reader: R,
    line: Vec<u8>,
    layout: Option<RecordLayout>,
    parsed: u64,
}

impl<R: AsyncBufRead + Unpin> Parser<R> {
    pub fn new(reader: R) -> Self {
        Parser {
            reader,
            line: Vec::new(),
            layout: None,
            parsed: 0,
        }
    }

    /// Next packet, or `None` once the source is exhausted.
    /// Cancel safe: the header and any partial line are kept across calls.
    pub async fn next_packet(&mut self) -> std::io::Result<Option<Packet>> {
        loop {
            let read = self.reader.read_until(b'\n', &mut self.line).await?;
            if read == 0 && self.line.is_empty() {
                return Ok(None);
            }
            let raw = std::mem::take(&mut self.line);
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(Settings::CAPTURE_SEPARATOR).collect();

            match &self.layout {
                Some(layout) => {
                    self.parsed += 1;
                    return Ok(Some(Packet::from_layout(layout, &fields)));
                }
                None => {
                    debug!("Capture header: {:?}", fields);
                    self.layout = Some(RecordLayout::new(&fields));
                }
            }
        }
    }

    pub fn layout(&self) -> Option<&RecordLayout> {
        self.layout.as_ref()
    }

    /// Number of data rows turned into packets so far.
    pub fn parsed(&self) -> u64 {
        self.parsed
    }
}
