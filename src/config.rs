use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use crate::estimator::DEFAULT_HISTORICAL_AVG;
use crate::statistics::PriceBands;

#[derive(Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Deserialize)]
pub struct AnalysisParameters {
    #[serde(default = "default_window_sizes")]
    pub window_sizes: Vec<u32>,
    #[serde(default = "default_historical_avg")]
    pub historical_avg: f64,
}

#[derive(Deserialize)]
pub struct PlannerParameters {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_power_kw")]
    pub power_kw: f64,
    // Today's average price is used when not given
    pub reference_avg: Option<f64>,
}

#[derive(Deserialize)]
pub struct Files {
    pub report_dir: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Config {
    pub source: Source,
    pub analysis: AnalysisParameters,
    pub planner: PlannerParameters,
    #[serde(default)]
    pub price_bands: PriceBands,
    pub files: Files,
    pub general: General,
}

fn default_timeout_secs() -> u64 { 30 }
fn default_user_agent() -> String { "Mozilla/5.0".to_string() }
fn default_window_sizes() -> Vec<u32> { vec![3, 6] }
fn default_historical_avg() -> f64 { DEFAULT_HISTORICAL_AVG }
fn default_threshold() -> f64 { 0.15 }
fn default_power_kw() -> f64 { 10.0 }

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, LoadConfigurationError> {
    let toml = fs::read_to_string(config_path)?;
    parse_config(&toml)
}

/// Parses configuration from a toml string
///
/// # Arguments
///
/// * 'toml' - configuration as toml
fn parse_config(toml: &str) -> Result<Config, LoadConfigurationError> {
    let config: Config = toml::from_str(toml)?;

    if config.analysis.window_sizes.is_empty() {
        return Err(LoadConfigurationError::ParameterError("analysis.window_sizes must not be empty".into()));
    }

    Ok(config)
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
pub enum LoadConfigurationError {
    #[error("FileError: {0}")]
    FileError(#[from] std::io::Error),
    #[error("ConfigParseError: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("ParameterError: {0}")]
    ParameterError(String),
}
