use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::listener::Settings;

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub capture: Capture,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub output: Output,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Deserialize, Debug)]
pub struct Capture {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct Metrics {
    #[serde(default = "default_interval", deserialize_with = "duration_deserialize")]
    pub interval: Duration,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default = "default_top_applications")]
    pub top_applications: usize,
}

#[derive(Deserialize, Debug)]
pub struct Output {
    pub path: Option<PathBuf>,
    #[serde(default, deserialize_with = "format_deserialize")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    JsonLines,
}

fn default_command() -> String {
    String::from("tshark")
}
fn default_interface() -> String {
    String::from("Wi-Fi")
}
fn default_fields() -> Vec<String> {
    Settings::CAPTURE_FIELDS.iter().map(|f| f.to_string()).collect()
}
fn default_interval() -> Duration {
    Settings::METRICS_INTERVAL
}
fn default_buffer_capacity() -> usize {
    Settings::BUFFER_CAPACITY
}
fn default_top_applications() -> usize {
    Settings::TOP_APPLICATIONS
}
fn default_log_level() -> String {
    String::from("info")
}

fn duration_deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = u32::deserialize(deserializer)?;
    Ok(Duration::from_secs(s as u64))
}

fn format_deserialize<'de, D>(deserializer: D) -> Result<OutputFormat, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "jsonl" | "json" => Ok(OutputFormat::JsonLines),
        _ => Err(serde::de::Error::custom("Invalid output format")),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            capture: Capture::default(),
            metrics: Metrics::default(),
            output: Output::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for Capture {
    fn default() -> Self {
        Capture {
            command: default_command(),
            interface: default_interface(),
            fields: default_fields(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics {
            interval: default_interval(),
            buffer_capacity: default_buffer_capacity(),
            top_applications: default_top_applications(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            path: None,
            format: OutputFormat::default(),
        }
    }
}

impl AppConfig {
    /// Output path, falling back to a timestamped file in the working directory.
    /// Relative paths are resolved against the working directory.
    pub fn output_path(&self) -> Result<PathBuf> {
        let path = match &self.output.path {
            Some(path) => path.clone(),
            None => {
                let ext = match self.output.format {
                    OutputFormat::Csv => "csv",
                    OutputFormat::JsonLines => "jsonl",
                };
                let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("network_metrics_{}.{}", stamp, ext))
            }
        };

        if path.is_absolute() {
            return Ok(path);
        }
        let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
        Ok(cwd.join(path))
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Network interface to capture packets from
    pub interface: Option<String>,

    /// File to write the metrics to
    pub output: Option<PathBuf>,

    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Replay a recorded capture CSV instead of starting the capture process
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn load_config(cli_args: &CliArgs) -> Result<AppConfig> {
    let mut config = if Path::new(&cli_args.config).exists() {
        let contents = fs::read_to_string(&cli_args.config)
            .with_context(|| format!("Failed to read config file {}", cli_args.config))?;
        parse_config(&contents)
            .with_context(|| format!("Failed to parse config file {}", cli_args.config))?
    } else {
        AppConfig::default()
    };

    if let Some(iface) = &cli_args.interface {
        config.capture.interface = iface.clone();
    }

    if let Some(output) = &cli_args.output {
        config.output.path = Some(output.clone());
    }

    if cli_args.verbose {
        config.log_level = String::from("debug");
    }

    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    if config.metrics.buffer_capacity == 0 {
        anyhow::bail!("metrics.buffer_capacity must be greater than zero");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.capture.command, "tshark");
        assert_eq!(config.capture.interface, "Wi-Fi");
        assert_eq!(config.capture.fields.len(), 14);
        assert_eq!(config.metrics.interval, Duration::from_secs(5));
        assert_eq!(config.metrics.buffer_capacity, 1000);
        assert_eq!(config.metrics.top_applications, 3);
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = parse_config(
            r#"
            log_level = "warn"

            [metrics]
            interval = 10

            [output]
            path = "/tmp/out.jsonl"
            format = "jsonl"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.metrics.interval, Duration::from_secs(10));
        assert_eq!(config.metrics.buffer_capacity, 1000);
        assert_eq!(config.capture.interface, "Wi-Fi");
        assert_eq!(config.output.format, OutputFormat::JsonLines);
        assert_eq!(config.output_path().unwrap(), PathBuf::from("/tmp/out.jsonl"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[output]\nformat = \"xml\"").is_err());
        assert!(parse_config("[metrics]\nbuffer_capacity = 0").is_err());
    }

    #[test]
    fn test_default_output_path_is_absolute() {
        let config = AppConfig::default();
        let path = config.output_path().unwrap();
        assert!(path.is_absolute());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("network_metrics_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::parse_from([
            "network_qos",
            "eth0",
            "out.csv",
            "--config",
            "does-not-exist.toml",
            "--verbose",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.capture.interface, "eth0");
        assert_eq!(config.output.path, Some(PathBuf::from("out.csv")));
        assert_eq!(config.log_level, "debug");
    }
}
