use std::str::FromStr;

use anyhow::{anyhow, Result};
use log::LevelFilter;

pub fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level.trim()).map_err(|_| anyhow!("Invalid log level: {}", level))
}

/// Install the global logger: timestamped lines on stderr, so stdout stays
/// free for piping.
pub fn setup_logging(level: &str) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(parse_level(level)?)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level(" off ").unwrap(), LevelFilter::Off);
        assert!(parse_level("loud").is_err());
    }
}
