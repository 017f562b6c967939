use relay::config::{Config as RelayConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            sentry_dsn: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Reads the config file if one is given, applies the port override and
    /// validates the result.
    pub fn load(path: Option<&Path>, port: Option<u16>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = port {
            config.relay.listener.port = port;
        }

        config.relay.validate()?;
        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                level: debug
                sentry_dsn: https://key@sentry.example.com/1
            relay:
                listener:
                    host: 127.0.0.1
                    port: 9000
                admin_listener:
                    host: 127.0.0.1
                    port: 9001
                assets_dir: /srv/beacon
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::load(Some(tmp.path()), None).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_host, "127.0.0.1");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(config.common.logging.level, "debug");
        assert_eq!(
            config.common.logging.sentry_dsn.as_deref(),
            Some("https://key@sentry.example.com/1")
        );
        assert_eq!(config.relay.listener.port, 9000);
        assert_eq!(config.relay.admin_listener.expect("admin").port, 9001);
        assert_eq!(config.relay.assets_dir, Path::new("/srv/beacon"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let tmp = write_tmp_file("{}");
        let config = Config::load(Some(tmp.path()), None).expect("load config");

        assert_eq!(config, Config::default());
        assert_eq!(config.common.metrics, None);
        assert_eq!(config.common.logging.level, "info");
        assert_eq!(config.relay.listener.port, relay::config::DEFAULT_PORT);
    }

    #[test]
    fn no_file_uses_defaults() {
        let config = Config::load(None, None).expect("load config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn port_override() {
        let yaml = r#"
            relay:
                listener:
                    host: 0.0.0.0
                    port: 9000
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::load(Some(tmp.path()), Some(3000)).expect("load config");
        assert_eq!(config.relay.listener.port, 3000);

        let config = Config::load(None, Some(4000)).expect("load config");
        assert_eq!(config.relay.listener.port, 4000);
    }

    #[test]
    fn invalid_configs() {
        assert!(matches!(
            Config::load(Some(Path::new("/nonexistent/beacon.yaml")), None),
            Err(ConfigError::LoadError(_))
        ));

        let tmp = write_tmp_file("relay:\n    listener: [1, 2]\n");
        assert!(matches!(
            Config::load(Some(tmp.path()), None),
            Err(ConfigError::ParseError(_))
        ));

        let tmp = write_tmp_file("relay:\n    collector:\n        url: ftp://collector.internal/\n");
        assert!(matches!(
            Config::load(Some(tmp.path()), None),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            Config::load(None, Some(0)),
            Err(ConfigError::Invalid(ValidationError::InvalidPort))
        ));
    }
}
