//! Subscriber setup. Library crates only emit `tracing` events; installing a
//! subscriber is left to the application through [`init`].

use tracing::Level;

use crate::config::LogConfig;
use crate::error::{ClientError, ClientResult};

pub fn parse_level(level: &str) -> ClientResult<Level> {
    level
        .parse()
        .map_err(|_| ClientError::Config(format!("unknown log level '{level}'")))
}

/// Install a global `fmt` subscriber at the configured level.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &LogConfig) -> ClientResult<()> {
    let level = parse_level(&config.level)?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| ClientError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels() {
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("WARN").unwrap(), Level::WARN);
        assert!(matches!(parse_level("loud"), Err(ClientError::Config(_))));
    }

    #[test]
    fn init_rejects_bad_level_before_installing() {
        let config = LogConfig {
            level: "verbose".into(),
        };
        assert!(matches!(init(&config), Err(ClientError::Config(_))));
    }
}
