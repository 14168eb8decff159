use crate::config::LoggingConfig;
use crate::error::AnalysisError;
use std::str::FromStr;
use tracing::Level;

/// Installs the global fmt subscriber at the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), AnalysisError> {
    let level = parse_level(&config.level)?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .map_err(|e| AnalysisError::Logging(e.to_string()))
}

fn parse_level(level: &str) -> Result<Level, AnalysisError> {
    Level::from_str(level.trim())
        .map_err(|_| AnalysisError::Logging(format!("Unknown log level '{}'", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_level(" debug ").unwrap(), Level::DEBUG);
        assert!(matches!(parse_level("loud"), Err(AnalysisError::Logging(_))));
    }
}
