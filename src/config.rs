//! upilink runtime configuration handling

use crate::bank::DEFAULT_BASE_URL;
use crate::error::{Error, Result};
use crate::qr::{DEFAULT_MIN_SIZE, QrEncoder};
use crate::upi::{Currency, DEFAULT_CURRENCY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpiLinkConfig {
    /// Backend connection
    pub api: ApiOptions,
    /// Payment link defaults
    pub payments: PaymentOptions,
    /// QR rendering
    pub qr: QrOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl UpiLinkConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No upilink.toml / upilink.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["upilink.toml", "upilink.yaml", "upilink.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("upilink");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.api.apply_env_overrides();
        self.payments.apply_env_overrides();
        self.qr.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Validated currency for generated links
    pub fn currency(&self) -> Result<Currency> {
        Currency::new(&self.payments.currency)
            .map_err(|e| Error::Config(format!("payments.currency: {e}")))
    }

    /// Encoder configured with the requested error correction and size
    pub fn encoder(&self) -> Result<QrEncoder> {
        let level = QrEncoder::parse_ecc_level(&self.qr.error_correction)?;
        Ok(QrEncoder::with_ecc_level(level).min_size(self.qr.min_size))
    }
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    /// Root URL of the REST API
    pub base_url: String,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ApiOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("UPILINK_API_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }
}

/// Defaults applied to every generated payment link
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentOptions {
    /// Three-letter currency code carried in `cu`
    pub currency: String,
    /// Payee name to place in `pn` when the form leaves it blank
    pub payee_name: Option<String>,
    /// Directory exported PNGs and statements are written to
    pub export_dir: PathBuf,
}

impl Default for PaymentOptions {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            payee_name: None,
            export_dir: PathBuf::from("."),
        }
    }
}

impl PaymentOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(currency) = env::var("UPILINK_CURRENCY") {
            self.currency = currency;
        }
        if let Ok(name) = env::var("UPILINK_PAYEE_NAME") {
            self.payee_name = (!name.trim().is_empty()).then_some(name);
        }
        if let Ok(dir) = env::var("UPILINK_EXPORT_DIR") {
            self.export_dir = PathBuf::from(dir);
        }
    }
}

/// QR rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Error correction level: L, M, Q or H
    pub error_correction: String,
    /// Minimum image edge in pixels
    pub min_size: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            error_correction: "H".to_string(),
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

impl QrOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("UPILINK_QR_ECC") {
            self.error_correction = level;
        }
        if let Ok(size) = env::var("UPILINK_QR_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.min_size = parsed;
            }
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `UPILINK_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("UPILINK_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("UPILINK_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("UPILINK_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("UPILINK_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_toml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upilink.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "http://bank.test:8080/api"

[payments]
currency = "usd"
payee_name = "Corner Shop"

[qr]
error_correction = "m"
min_size = 300
"#,
        )
        .unwrap();

        let config = UpiLinkConfig::from_file(&path).unwrap();
        assert_eq!(config.api.base_url, "http://bank.test:8080/api");
        assert_eq!(config.currency().unwrap().as_str(), "USD");
        assert_eq!(config.payments.payee_name.as_deref(), Some("Corner Shop"));
        assert_eq!(config.qr.min_size, 300);
        assert!(config.encoder().is_ok());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn reads_yaml_and_rejects_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upilink.yaml");
        fs::write(&path, "qr:\n  error_correction: Z\n").unwrap();

        let config = UpiLinkConfig::from_file(&path).unwrap();
        assert!(matches!(config.encoder(), Err(Error::Config(_))));

        let other = dir.path().join("upilink.ini");
        fs::write(&other, "").unwrap();
        assert!(matches!(
            UpiLinkConfig::from_file(&other),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = UpiLinkConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:4567/api");
        assert_eq!(config.currency().unwrap().as_str(), "INR");
        assert_eq!(config.qr.error_correction, "H");
    }
}
