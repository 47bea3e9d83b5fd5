//! Configuration system for the Latte shader recompiler

use crate::error::{LatteError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub shader: ShaderConfig,
    pub logging: LoggingConfig,
}

/// Shader translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Annotate generated source with CF and ALU group markers
    pub emit_comments: bool,
    /// Log every generated shader at debug level
    pub log_source: bool,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub log_to_file: bool,
    pub log_path: PathBuf,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            emit_comments: true,
            log_source: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            log_to_file: false,
            log_path: PathBuf::from("latte-shader.log"),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml_str(&content)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LatteError::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| LatteError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("latte-shader")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.shader.emit_comments);
        assert!(!config.shader.log_source);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.logging.log_to_file);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.shader.emit_comments = false;
        config.logging.level = LogLevel::Trace;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml_str(&toml_str).unwrap();
        assert!(!parsed.shader.emit_comments);
        assert_eq!(parsed.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::from_toml_str("[shader]\nlog_source = true\n").unwrap();
        assert!(parsed.shader.log_source);
        assert!(parsed.shader.emit_comments);
        assert_eq!(parsed.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::from_toml_str("[shader]\nemit_comments = 3\n").unwrap_err();
        assert!(matches!(err, LatteError::Config(_)));
    }
}
