use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_COLLECTOR_URL: &str = "http://www.google-analytics.com/collect";
pub const DEFAULT_PROJECT_URL: &str = "https://github.com/tprasadtp/ga-beacon";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Admin listener conflicts with the main listener on {0}")]
    ListenerConflict(String),

    #[error("Collector URL must use http or https, got {0}")]
    InvalidCollectorScheme(String),
}

/// Relay configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener serving beacon requests
    #[serde(default)]
    pub listener: Listener,
    /// Optional listener for health and readiness checks
    #[serde(default)]
    pub admin_listener: Option<Listener>,
    /// Where pageview hits are delivered
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Directory holding `static/` and `templates/`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Redirect target for requests without an account
    #[serde(default = "default_project_url")]
    pub project_url: Url,
    /// How long to wait for in-flight deliveries on shutdown
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: None,
            collector: CollectorConfig::default(),
            assets_dir: default_assets_dir(),
            project_url: default_project_url(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Config {
    /// Validates the relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if let Some(admin) = &self.admin_listener {
            admin.validate()?;
            if admin == &self.listener {
                return Err(ValidationError::ListenerConflict(format!(
                    "{}:{}",
                    admin.host, admin.port
                )));
            }
        }

        match self.collector.url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::InvalidCollectorScheme(other.to_string())),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
        }
    }
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CollectorConfig {
    pub url: Url,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            url: parse_static_url(DEFAULT_COLLECTOR_URL),
        }
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_project_url() -> Url {
    parse_static_url(DEFAULT_PROJECT_URL)
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn parse_static_url(raw: &'static str) -> Url {
    Url::parse(raw).expect("built-in URL constants are valid")
}
