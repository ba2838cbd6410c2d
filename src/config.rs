//! Configuration management for EduERP
//!
//! Handles environment variables and application settings.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::logging::LogFormat;
use crate::services::scan_simulator::SimulatorConfig;

/// Longest allowed attendance countdown, in seconds
const MAX_SESSION_DURATION: u32 = 3600;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// Log output format: compact or json
    pub log_format: String,

    /// Directory holding the store file
    pub data_dir: PathBuf,

    /// Store file name, relative to `data_dir` unless absolute
    pub store_file: PathBuf,

    /// CORS origins (empty means allow all)
    pub cors_origins: Vec<String>,

    /// Attendance countdown length in seconds
    pub session_duration: u32,

    /// Lowest simulated present count
    pub present_min: u32,

    /// Highest simulated present count
    pub present_max: u32,

    /// Largest number of mock scans per tick
    pub max_scans_per_tick: u32,

    /// Share of the roster reached by a broadcast session
    pub broadcast_reach_percent: u8,

    /// Fixed seed for the simulator
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let simulator = SimulatorConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            data_dir: PathBuf::from("./data"),
            store_file: PathBuf::from("eduerp.json"),
            cors_origins: vec![],
            session_duration: simulator.duration_seconds,
            present_min: simulator.present_min,
            present_max: simulator.present_max,
            max_scans_per_tick: simulator.max_scans_per_tick,
            broadcast_reach_percent: simulator.broadcast_reach_percent,
            rng_seed: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &str,
    error: impl FnOnce(String) -> ConfigError,
) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| error(raw)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("EDUERP_HOST") {
            config.host = host;
        }

        if let Some(port) = parse_var("EDUERP_PORT", ConfigError::InvalidPort)? {
            config.port = port;
        }

        if let Ok(environment) = env::var("EDUERP_ENVIRONMENT") {
            config.environment = environment;
        }

        // Logging
        if let Ok(log_level) = env::var("EDUERP_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(log_format) = env::var("EDUERP_LOG_FORMAT") {
            config.log_format = log_format;
        }

        // Storage
        if let Ok(data_dir) = env::var("EDUERP_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(store_file) = env::var("EDUERP_STORE_FILE") {
            config.store_file = PathBuf::from(store_file);
        }

        // CORS origins
        if let Ok(cors_origins) = env::var("EDUERP_CORS_ORIGINS") {
            config.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Attendance simulation
        if let Some(duration) = parse_var("EDUERP_SESSION_DURATION", ConfigError::InvalidSessionDuration)? {
            config.session_duration = duration;
        }

        if let Some(min) = parse_var("EDUERP_PRESENT_MIN", ConfigError::InvalidNumber)? {
            config.present_min = min;
        }

        if let Some(max) = parse_var("EDUERP_PRESENT_MAX", ConfigError::InvalidNumber)? {
            config.present_max = max;
        }

        if let Some(max_scans) = parse_var("EDUERP_MAX_SCANS_PER_TICK", ConfigError::InvalidNumber)? {
            config.max_scans_per_tick = max_scans;
        }

        if let Some(reach) = parse_var("EDUERP_BROADCAST_REACH_PERCENT", ConfigError::InvalidPercentage)? {
            config.broadcast_reach_percent = reach;
        }

        if let Some(seed) = parse_var("EDUERP_RNG_SEED", ConfigError::InvalidNumber)? {
            config.rng_seed = Some(seed);
        }

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        if self.store_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStoreFile);
        }

        if self.session_duration == 0 || self.session_duration > MAX_SESSION_DURATION {
            return Err(ConfigError::InvalidSessionDuration(self.session_duration.to_string()));
        }

        if self.present_min > self.present_max {
            return Err(ConfigError::InvalidPresentBand {
                min: self.present_min,
                max: self.present_max,
            });
        }

        if self.broadcast_reach_percent > 100 {
            return Err(ConfigError::InvalidPercentage(self.broadcast_reach_percent.to_string()));
        }

        if !matches!(self.log_format.as_str(), "compact" | "json") {
            return Err(ConfigError::InvalidLogFormat(self.log_format.clone()));
        }

        Ok(())
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn log_format(&self) -> LogFormat {
        if self.log_format == "json" {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }

    /// Full path of the store file
    pub fn store_path(&self) -> PathBuf {
        if self.store_file.is_absolute() {
            self.store_file.clone()
        } else {
            self.data_dir.join(&self.store_file)
        }
    }

    /// Create data directory if it doesn't exist
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| ConfigError::DataDirCreationFailed(e.to_string()))?;
        Ok(())
    }

    /// Settings for the attendance simulator
    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            duration_seconds: self.session_duration,
            present_min: self.present_min,
            present_max: self.present_max,
            max_scans_per_tick: self.max_scans_per_tick,
            broadcast_reach_percent: self.broadcast_reach_percent,
            seed: self.rng_seed,
        }
    }

    /// Log configuration
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  Environment: {}", self.environment);
        info!("  Bind address: {}", self.bind_address());
        info!("  Store file: {:?}", self.store_path());
        info!("  Log level: {} ({})", self.log_level, self.log_format);
        info!("  CORS origins: {:?}", self.cors_origins);
        info!("  Session duration: {}s", self.session_duration);
        info!("  Present band: {}..={}", self.present_min, self.present_max);
        info!("  Max scans per tick: {}", self.max_scans_per_tick);
        info!("  Broadcast reach: {}%", self.broadcast_reach_percent);
        if let Some(seed) = self.rng_seed {
            info!("  Simulator seed: {}", seed);
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid session duration: {0} (must be 1-3600 seconds)")]
    InvalidSessionDuration(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid percentage: {0}")]
    InvalidPercentage(String),

    #[error("Present band {min}..={max} is empty")]
    InvalidPresentBand { min: u32, max: u32 },

    #[error("Invalid log format: {0} (expected compact or json)")]
    InvalidLogFormat(String),

    #[error("Empty data directory")]
    EmptyDataDir,

    #[error("Empty store file name")]
    EmptyStoreFile,

    #[error("Data directory creation failed: {0}")]
    DataDirCreationFailed(String),
}
