//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `lightsrv.toml` in the working directory, or the file named by
//! `LIGHTSRV_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use lightsrv_domain::config::{ChannelMap, ControllerConfig};
use lightsrv_domain::schedule::Schedule;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "lightsrv.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Pin layout and backend selection.
    pub gpio: GpioConfig,
    /// Display names substituted into the index page.
    pub names: NamesConfig,
    /// Time-of-day automation.
    pub automation: AutomationConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Directory holding `index.html`.
    pub docroot: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Which peripheral backend drives the pins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The BCM2835 peripheral through `rppal`.
    #[default]
    Rppal,
    /// In-memory simulation.
    Virtual,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rppal" => Ok(Self::Rppal),
            "virtual" => Ok(Self::Virtual),
            other => Err(ConfigError::Validation(format!(
                "unknown gpio backend {other:?}, expected \"rppal\" or \"virtual\""
            ))),
        }
    }
}

/// GPIO pin layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub backend: BackendKind,
    /// BCM pin ids of the digital channels, in channel order.
    pub switches: Vec<u8>,
    /// BCM pin ids of the PWM channels, in channel order.
    pub pwms: Vec<u8>,
    /// Relay board is active-low.
    pub inverted: bool,
}

/// Channel display names. Missing lists default to `"Switch <pin>"` and
/// `"PWM <pin>"`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    pub switches: Option<Vec<String>>,
    pub pwms: Option<Vec<String>>,
}

/// Automation settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Whether this deployment has automation wiring.
    pub enabled: bool,
    /// Seconds between ticks, aligned to local midnight.
    pub interval_secs: u32,
    /// Run one tick at startup instead of waiting for the first boundary.
    pub start_immediately: bool,
    pub channels: ChannelMap,
    pub schedule: Schedule,
}

impl Config {
    /// Load configuration from `LIGHTSRV_CONFIG` or `lightsrv.toml` (if
    /// present) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("LIGHTSRV_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("LIGHTSRV_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("LIGHTSRV_PORT") {
            self.server.port = parse_port("LIGHTSRV_PORT", &val)?;
        }
        if let Some(val) = var("LIGHTSRV_BIND") {
            let (host, port) = val.rsplit_once(':').ok_or_else(|| {
                ConfigError::Validation(format!("LIGHTSRV_BIND {val:?} is not host:port"))
            })?;
            self.server.port = parse_port("LIGHTSRV_BIND", port)?;
            self.server.host = host.to_string();
        }
        if let Some(val) = var("LIGHTSRV_DOCROOT") {
            self.server.docroot = PathBuf::from(val);
        }
        if let Some(val) = var("LIGHTSRV_BACKEND") {
            self.gpio.backend = val.parse()?;
        }
        if let Some(val) = var("LIGHTSRV_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    /// Build the tracing filter from `logging.filter`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.logging.filter).map_err(|err| {
            ConfigError::Validation(format!("log filter {:?}: {err}", self.logging.filter))
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.automation.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "automation interval must be non-zero".to_string(),
            ));
        }
        self.env_filter()?;
        check_names("switch", self.names.switches.as_deref(), &self.gpio.switches)?;
        check_names("pwm", self.names.pwms.as_deref(), &self.gpio.pwms)?;
        self.controller_config()?;
        if self.automation.enabled {
            self.automation
                .channels
                .validate(self.gpio.switches.len(), self.gpio.pwms.len())
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
        }
        Ok(())
    }

    /// Build the validated controller configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when a pin is listed twice.
    pub fn controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        ControllerConfig::builder()
            .switch_pins(self.gpio.switches.iter().copied())
            .pwm_pins(self.gpio.pwms.iter().copied())
            .inverted(self.gpio.inverted)
            .automation(self.automation.enabled)
            .build()
            .map_err(|err| ConfigError::Validation(format!("{err}: {}", source_message(&err))))
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn switch_names(&self) -> Vec<String> {
        names_or_default(self.names.switches.as_deref(), &self.gpio.switches, "Switch")
    }

    #[must_use]
    pub fn pwm_names(&self) -> Vec<String> {
        names_or_default(self.names.pwms.as_deref(), &self.gpio.pwms, "PWM")
    }
}

fn parse_port(key: &str, val: &str) -> Result<u16, ConfigError> {
    val.parse()
        .map_err(|err| ConfigError::Validation(format!("{key} port {val:?}: {err}")))
}

fn source_message(err: &dyn std::error::Error) -> String {
    err.source().map_or_else(String::new, ToString::to_string)
}

fn check_names(kind: &str, names: Option<&[String]>, pins: &[u8]) -> Result<(), ConfigError> {
    match names {
        Some(names) if names.len() != pins.len() => Err(ConfigError::Validation(format!(
            "{} {kind} names given for {} {kind} pins",
            names.len(),
            pins.len()
        ))),
        _ => Ok(()),
    }
}

fn names_or_default(names: Option<&[String]>, pins: &[u8], prefix: &str) -> Vec<String> {
    match names {
        Some(names) => names.to_vec(),
        None => pins.iter().map(|pin| format!("{prefix} {pin}")).collect(),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            docroot: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lightsrv=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 60,
            start_immediately: true,
            channels: ChannelMap::default(),
            schedule: Schedule::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
