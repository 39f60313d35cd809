use std::env;
use chrono::{Local, NaiveDate};
use log::info;
use thiserror::Error;
use crate::config::{load_config, Config, LoadConfigurationError};
use crate::logging::{setup_logger, LoggerError};
use crate::manager_nordpool::NordPool;
use crate::manager_nordpool::errors::NordPoolError;

pub struct Mgr {
    pub nordpool: NordPool,
}

/// Command line arguments
pub struct Args {
    pub config_path: String,
    pub today: Option<NaiveDate>,
}

/// Initializes and returns configuration, a Mgr struct holding initialized managers and the
/// date to treat as today
///
pub fn init() -> Result<(Config, Mgr, NaiveDate), InitializationError> {
    let args = parse_args(env::args().skip(1))?;

    // Load configuration
    let config = load_config(&args.config_path)?;

    // Setup logging
    let _ = setup_logger(&config.general.log_path, config.general.log_level, config.general.log_to_stdout)?;

    // Print version
    info!("starting spot windows version: {}", env!("CARGO_PKG_VERSION"));

    // Instantiate structs
    let nordpool = NordPool::new(&config.source)?;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    Ok((config, Mgr { nordpool }, today))
}

/// Parses command line arguments given as --config=<path> and optionally --today=<YYYY-MM-DD>
///
/// # Arguments
///
/// * 'args' - arguments excluding the program name
fn parse_args(args: impl Iterator<Item = String>) -> Result<Args, InitializationError> {
    let mut config_path: Option<String> = None;
    let mut today: Option<NaiveDate> = None;

    for arg in args {
        if let Some(path) = arg.strip_prefix("--config=") {
            config_path = Some(path.to_string());
        } else if let Some(date) = arg.strip_prefix("--today=") {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| InitializationError::ArgumentError(format!("--today: {}", e)))?;
            today = Some(date);
        } else {
            return Err(InitializationError::ArgumentError(format!("unknown argument: {}", arg)));
        }
    }

    Ok(Args {
        config_path: config_path.ok_or(InitializationError::ArgumentError("--config=<path> must be given".into()))?,
        today,
    })
}

/// Error depicting errors that occur while initializing
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ArgumentError: {0}")]
    ArgumentError(String),
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] LoadConfigurationError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("NordPoolSetupError: {0}")]
    NordPoolSetupError(#[from] NordPoolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: &[&str]) -> impl Iterator<Item = String> {
        a.iter().map(|s| s.to_string()).collect::<Vec<String>>().into_iter()
    }

    #[test]
    fn config_and_today() {
        let parsed = parse_args(args(&["--config=/etc/spot.toml", "--today=2025-10-22"])).unwrap();
        assert_eq!(parsed.config_path, "/etc/spot.toml");
        assert_eq!(parsed.today, NaiveDate::from_ymd_opt(2025, 10, 22));
    }

    #[test]
    fn config_is_required() {
        assert!(matches!(parse_args(args(&["--today=2025-10-22"])), Err(InitializationError::ArgumentError(_))));
    }

    #[test]
    fn bad_arguments() {
        assert!(parse_args(args(&["--config=a", "--today=22/10/2025"])).is_err());
        assert!(parse_args(args(&["--config=a", "--verbose"])).is_err());
    }
}
