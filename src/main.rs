use anyhow::{Context, Result};
use clap::Parser as _;
use log::{error, info};
use network_qos::config::{load_config, CliArgs};
use network_qos::listener::{capture::CaptureProcess, parser::Parser};
use network_qos::logging::logger;
use network_qos::scheduler::{self, shutdown_signal, Aggregator, StopReason};
use network_qos::sink::open_sink;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let config = load_config(&cli_args)?;
    logger::setup_logging(&config.log_level)?;

    let output_path = config.output_path()?;
    let mut sink = open_sink(&output_path, config.output.format)?;
    let mut aggregator = Aggregator::from_config(&config.metrics);

    let result = match &cli_args.input {
        Some(path) => {
            info!("Replaying capture from: {}", path.display());
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open capture file {}", path.display()))?;
            let mut parser = Parser::new(BufReader::new(file));
            scheduler::run(&mut parser, &mut aggregator, sink.as_mut(), shutdown_signal()).await
        }
        None => {
            let (capture, mut parser) = CaptureProcess::spawn(&config.capture)?;
            info!("Press CTRL+C to stop capture");
            let result =
                scheduler::run(&mut parser, &mut aggregator, sink.as_mut(), shutdown_signal())
                    .await;
            let interrupted = matches!(result, Ok(StopReason::Interrupted));
            if let Err(e) = capture.shutdown(interrupted).await {
                error!("Error terminating capture process: {:#}", e);
            }
            result
        }
    };

    info!("Cleaning up...");
    match sink.close() {
        Ok(()) => info!(
            "Output closed. Total packets captured: {}",
            aggregator.packet_count()
        ),
        Err(e) => error!("Error closing output: {:#}", e),
    }

    let reason = result?;
    info!("Stopped: {:?}", reason);
    Ok(())
}
