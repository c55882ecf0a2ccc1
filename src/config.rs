//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{KlimaLoggError, Result};

/// Baud rates the USB receiver bridge is known to run at
pub const SUPPORTED_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 230400];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub receiver: ReceiverConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where raw frames come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameSourceKind {
    /// Live hex lines from a serial bridge
    Serial,
    /// Replay of a capture file
    File,
}

/// Frame receiver configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_source")]
    pub source: FrameSourceKind,

    /// Serial device or capture file; empty means auto-detect for serial
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_discard_short_frames")]
    pub discard_short_frames: bool,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

// Default value functions
fn default_source() -> FrameSourceKind { FrameSourceKind::Serial }
fn default_baud_rate() -> u32 { 115200 }
fn default_discard_short_frames() -> bool { true }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

fn invalid(message: impl std::fmt::Display) -> KlimaLoggError {
    KlimaLoggError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use klimalogg_receiver::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.receiver.source == FrameSourceKind::File && self.receiver.path.is_empty() {
            return Err(invalid("receiver path is required when source = \"file\""));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.receiver.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {}",
                SUPPORTED_BAUD_RATES.map(|b| b.to_string()).join(", ")
            )));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            receiver: ReceiverConfig {
                source: default_source(),
                path: String::new(),
                baud_rate: default_baud_rate(),
                discard_short_frames: default_discard_short_frames(),
            },
            telemetry: TelemetryConfig {
                enabled: default_telemetry_enabled(),
                log_dir: default_log_dir(),
                max_records_per_file: default_max_records_per_file(),
                max_files_to_keep: default_max_files_to_keep(),
                format: default_log_format(),
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[receiver]
path = "/dev/ttyUSB0"

[telemetry]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.receiver.source, FrameSourceKind::Serial);
        assert_eq!(config.receiver.path, "/dev/ttyUSB0");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/klimalogg.toml");
        assert!(matches!(result, Err(KlimaLoggError::Io(_))));
    }

    #[test]
    fn test_parse_file_source() {
        let config = Config::parse(
            r#"
[receiver]
source = "file"
path = "captures/day1.hex"
discard_short_frames = false

[telemetry]
enabled = false

[logging]
level = "debug"
dir = "./diag"
"#,
        )
        .unwrap();

        assert_eq!(config.receiver.source, FrameSourceKind::File);
        assert!(!config.receiver.discard_short_frames);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.logging.dir.as_deref(), Some("./diag"));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result = Config::parse("[receiver]\nsource = \"radio\"\n[telemetry]\n");
        assert!(matches!(result, Err(KlimaLoggError::Config(_))));
    }

    #[test]
    fn test_file_source_requires_path() {
        let mut config = create_valid_config();
        config.receiver.source = FrameSourceKind::File;
        assert!(config.validate().is_err());

        config.receiver.path = "capture.hex".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = create_valid_config();
        config.receiver.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &SUPPORTED_BAUD_RATES {
            let mut config = create_valid_config();
            config.receiver.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = create_valid_config();
        config.telemetry.format = "csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_logging_level() {
        let mut config = create_valid_config();
        config.logging.level = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_source(), FrameSourceKind::Serial);
        assert_eq!(default_baud_rate(), 115200);
        assert!(default_discard_short_frames());
        assert!(default_telemetry_enabled());
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_format(), "jsonl");
        assert_eq!(default_log_level(), "info");
    }
}
