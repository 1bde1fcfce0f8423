//! Configuration module for the ojlive CLI.
//!
//! Handles loading configuration from a TOML file and CLI overrides, then
//! validating it into the runtime settings of the core crate.

pub mod file;

use crate::config::file::FileConfig;
use ojlive_core::processors::{ChannelConfig, PollerConfig};
use ojlive_core::session::TransportKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Config file read when `--config` is not given.  May be absent.
pub const DEFAULT_CONFIG_PATH: &str = "./ojlive.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Judge backend settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: Url,
}

/// Event channel settings.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionChannelConfig {
    pub transport: TransportKind,
    pub channel: ChannelConfig,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub channel: SubmissionChannelConfig,
    pub leaderboard: PollerConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    base_url_override: Option<Url>,
}

impl ConfigLoader {
    /// Create a new config loader.
    ///
    /// `config_path` is the path given on the command line, if any.
    pub fn new(config_path: Option<&Path>, base_url_override: Option<Url>) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            base_url_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file (a missing default file means "all defaults")
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = self.read_file()?;
        self.build(file_config)
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        let (path, explicit) = match &self.config_path {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "Read configuration file");
                Ok(toml::from_str(&content)?)
            }
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(FileConfig::default())
            }
            Err(source) => Err(ConfigError::IoError { path, source }),
        }
    }

    fn build(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let base_url = match &self.base_url_override {
            Some(url) => url.clone(),
            None => Url::parse(&file_config.server.base_url).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "server.base_url {:?} is not a valid URL: {e}",
                    file_config.server.base_url
                ))
            })?,
        };
        validate(&file_config, &base_url)?;

        Ok(LoadedConfig {
            server: ServerConfig { base_url },
            channel: SubmissionChannelConfig {
                transport: file_config.channel.transport,
                channel: ChannelConfig {
                    timeout: Duration::from_secs(file_config.channel.timeout_secs),
                },
            },
            leaderboard: PollerConfig {
                interval: Duration::from_secs(file_config.leaderboard.interval_secs),
                order: file_config.leaderboard.order,
            },
        })
    }
}

fn validate(config: &FileConfig, base_url: &Url) -> Result<(), ConfigError> {
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "base url must be http or https, got {base_url}"
        )));
    }
    if config.channel.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "channel.timeout_secs must be greater than zero".to_owned(),
        ));
    }
    if config.leaderboard.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "leaderboard.interval_secs must be greater than zero".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ojlive_core::processors::RankingOrder;

    fn build(toml_str: &str, base_url_override: Option<&str>) -> Result<LoadedConfig, ConfigError> {
        let loader = ConfigLoader::new(None, base_url_override.map(|u| Url::parse(u).unwrap()));
        loader.build(toml::from_str(toml_str).unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = build("", None).unwrap();
        assert_eq!(config.server.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.channel.transport, TransportKind::Sse);
        assert_eq!(config.channel.channel.timeout, Duration::from_secs(300));
        assert_eq!(config.leaderboard.interval, Duration::from_secs(900));
        assert_eq!(config.leaderboard.order, RankingOrder::Server);
    }

    #[test]
    fn test_cli_override_wins() {
        let config = build(
            "[server]\nbase_url = \"http://file.example\"\n",
            Some("https://cli.example"),
        )
        .unwrap();
        assert_eq!(config.server.base_url.host_str(), Some("cli.example"));
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        assert!(matches!(
            build("[channel]\ntimeout_secs = 0\n", None),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            build("[leaderboard]\ninterval_secs = 0\n", None),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_base_url_must_be_http() {
        assert!(matches!(
            build("[server]\nbase_url = \"ftp://oj.example\"\n", None),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            build("[server]\nbase_url = \"not a url\"\n", None),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let loader = ConfigLoader::new(Some(Path::new("/nonexistent/ojlive.toml")), None);
        assert!(matches!(loader.load(), Err(ConfigError::IoError { .. })));
    }
}
