//! Configuration management for winrm-shell.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file (JSON)
//! 3. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WinrmError;
use crate::protocol::{Parameters, DEFAULT_ENVELOPE_SIZE, INPUT_OVERHEAD};

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote endpoint.
    pub endpoint: EndpointSection,
    /// Protocol parameters.
    pub protocol: ProtocolSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Endpoint configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSection {
    /// Host name or address of the remote machine.
    pub host: String,
    /// Port; defaults to 5985, or 5986 with HTTPS.
    pub port: Option<u16>,
    /// Use HTTPS.
    pub https: bool,
    /// Skip certificate verification (HTTPS only).
    pub insecure: bool,
    /// URL path of the WS-Management service.
    pub path: String,
}

impl Default for EndpointSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            https: false,
            insecure: false,
            path: "/wsman".to_string(),
        }
    }
}

impl EndpointSection {
    /// The port in effect.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.https { 5986 } else { 5985 })
    }
}

/// Protocol configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSection {
    /// Maximum envelope size in bytes.
    pub envelope_size: usize,
    /// Server-side operation timeout in seconds.
    pub operation_timeout_secs: u64,
    /// Locale sent with each request.
    pub locale: String,
    /// Console codepage of opened shells.
    pub codepage: u32,
}

impl Default for ProtocolSection {
    fn default() -> Self {
        Self {
            envelope_size: DEFAULT_ENVELOPE_SIZE,
            operation_timeout_secs: 60,
            locale: "en-US".to_string(),
            codepage: 65001,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level or filter directive (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("WINRM_HOST") {
            self.endpoint.host = host;
        }

        if let Some(port) = lookup("WINRM_PORT").and_then(|p| p.parse().ok()) {
            self.endpoint.port = Some(port);
        }

        if let Some(https) = lookup("WINRM_HTTPS") {
            self.endpoint.https = matches!(https.as_str(), "1" | "true" | "yes");
        }

        if let Some(size) = lookup("WINRM_ENVELOPE_SIZE").and_then(|s| s.parse().ok()) {
            self.protocol.envelope_size = size;
        }

        if let Some(secs) = lookup("WINRM_OPERATION_TIMEOUT").and_then(|s| s.parse().ok()) {
            self.protocol.operation_timeout_secs = secs;
        }

        if let Some(level) = lookup("WINRM_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: env vars > config file > defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();

        Ok(config)
    }

    /// URL of the WS-Management endpoint.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.endpoint.https { "https" } else { "http" };
        format!(
            "{}://{}:{}{}",
            scheme,
            self.endpoint.host,
            self.endpoint.effective_port(),
            self.endpoint.path
        )
    }

    /// Convert to protocol parameters for a [`Client`](crate::Client).
    pub fn to_parameters(&self) -> Result<Parameters, ConfigError> {
        if self.protocol.envelope_size <= INPUT_OVERHEAD {
            return Err(ConfigError::InvalidEnvelopeSize(
                self.protocol.envelope_size,
            ));
        }
        if self.protocol.operation_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Parameters {
            envelope_size: self.protocol.envelope_size,
            operation_timeout: Duration::from_secs(self.protocol.operation_timeout_secs),
            locale: self.protocol.locale.clone(),
            codepage: self.protocol.codepage,
        })
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Envelope size leaves no room for input.
    InvalidEnvelopeSize(usize),
    /// Operation timeout of zero.
    InvalidTimeout,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidEnvelopeSize(size) => write!(
                f,
                "envelope size {} must exceed {} bytes",
                size, INPUT_OVERHEAD
            ),
            Self::InvalidTimeout => write!(f, "operation timeout must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for WinrmError {
    fn from(err: ConfigError) -> Self {
        WinrmError::Config(err.to_string())
    }
}
