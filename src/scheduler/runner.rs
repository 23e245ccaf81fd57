use std::future::Future;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::io::AsyncBufRead;

use super::aggregator::Aggregator;
use crate::listener::parser::Parser;
use crate::sink::MetricsSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The capture source closed its output.
    SourceEnded,
    /// The shutdown future resolved.
    Interrupted,
}

/// Resolves on Ctrl-C. If the handler cannot be installed this never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Drive packets from `parser` through `aggregator` into `sink` until the
/// source ends, fails, or `shutdown` resolves.
///
/// Sink failures are logged and the interval's record is dropped, they never
/// stop ingestion. Writes happen outside the `select!`, so a shutdown cannot
/// interrupt a record half way through.
pub async fn run<R, S, F>(
    parser: &mut Parser<R>,
    aggregator: &mut Aggregator,
    sink: &mut S,
    shutdown: F,
) -> Result<StopReason>
where
    R: AsyncBufRead + Unpin,
    S: MetricsSink + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let packet = tokio::select! {
            _ = &mut shutdown => {
                info!("Capture interrupted by user. Shutting down...");
                return Ok(StopReason::Interrupted);
            }
            next = parser.next_packet() => {
                match next.context("Failed to read capture output")? {
                    Some(packet) => packet,
                    None => {
                        info!("Capture source closed after {} records", parser.parsed());
                        return Ok(StopReason::SourceEnded);
                    }
                }
            }
        };

        let Some(record) = aggregator.ingest(packet) else {
            continue;
        };

        match sink.write(&record) {
            Ok(()) => info!("Packets: {} | {}", aggregator.packet_count(), record),
            Err(e) => error!("Failed to write metrics, dropping this interval: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::metrics::{MetricsEngine, MetricsRecord};

    #[derive(Default)]
    struct MemorySink {
        records: Vec<MetricsRecord>,
        fail: bool,
        attempts: usize,
    }

    impl MetricsSink for MemorySink {
        fn write(&mut self, record: &MetricsRecord) -> Result<()> {
            self.attempts += 1;
            if self.fail {
                anyhow::bail!("disk full");
            }
            self.records.push(record.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    const CAPTURE: &str = "\
frame.time_epoch,ip.src,ip.dst,_ws.col.protocol,frame.len,tcp.srcport,tcp.dstport,ip.ttl,tcp.flags,tcp.window_size_value,tcp.analysis.ack_rtt,tcp.analysis.retransmission,frame.time_delta,dns.time
1700000000.0,10.0.0.2,10.0.0.1,TCP,100,51000,443,64,0x0010,9000,0.020,,0.001,
1700000000.5,10.0.0.1,10.0.0.2,TCP,100,443,51000,64,0x0010,9000,0.040,1,0.003,
1700000001.0,10.0.0.2,1.1.1.1,DNS,100,,,64,,,,,0.002,0.030
";

    // Interval of zero makes every packet a tick
    fn eager_aggregator() -> Aggregator {
        Aggregator::new(1000, Duration::ZERO, MetricsEngine::default(), Instant::now())
    }

    #[tokio::test]
    async fn test_run_until_source_ends() {
        let mut parser = Parser::new(CAPTURE.as_bytes());
        let mut aggregator = eager_aggregator();
        let mut sink = MemorySink::default();

        let reason = run(&mut parser, &mut aggregator, &mut sink, std::future::pending())
            .await
            .unwrap();

        assert_eq!(reason, StopReason::SourceEnded);
        assert_eq!(aggregator.packet_count(), 3);
        assert_eq!(sink.records.len(), 3);

        let last = sink.records.last().unwrap();
        assert_eq!(last.packet_count, 3);
        assert_eq!(last.latency, 30.0);
        assert_eq!(last.jitter, 1.0);
        assert_eq!(last.packet_loss, 33.33);
        assert_eq!(last.dns_delay, 30.0);
        assert_eq!(last.protocol_counts.get("TCP"), Some(&2));
        assert_eq!(last.top_applications, vec!["HTTPS", "DNS"]);
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_ingestion() {
        let mut parser = Parser::new(CAPTURE.as_bytes());
        let mut aggregator = eager_aggregator();
        let mut sink = MemorySink {
            fail: true,
            ..Default::default()
        };

        let reason = run(&mut parser, &mut aggregator, &mut sink, std::future::pending())
            .await
            .unwrap();

        assert_eq!(reason, StopReason::SourceEnded);
        assert_eq!(sink.attempts, 3);
        assert!(sink.records.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_waiting_source() {
        // A source that never produces a line
        let (_writer, reader) = tokio::io::duplex(64);
        let mut parser = Parser::new(tokio::io::BufReader::new(reader));
        let mut aggregator = Aggregator::default();
        let mut sink = MemorySink::default();

        let reason = run(&mut parser, &mut aggregator, &mut sink, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        })
        .await
        .unwrap();

        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(aggregator.packet_count(), 0);
        assert_eq!(sink.attempts, 0);
    }

    #[tokio::test]
    async fn test_default_interval_waits_for_time() {
        let mut parser = Parser::new(CAPTURE.as_bytes());
        let mut aggregator = Aggregator::default();
        let mut sink = MemorySink::default();

        run(&mut parser, &mut aggregator, &mut sink, std::future::pending())
            .await
            .unwrap();

        assert_eq!(aggregator.packet_count(), 3);
        assert!(sink.records.is_empty());
    }
}
