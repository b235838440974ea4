use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BridgeError, Result};

/// RFC 1123 date format, rendered in UTC (`Mon, 02 Jan 2006 15:04:05 GMT`)
pub const RFC1123: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "BEAMDROP_CONFIG";

/// Configuration for the BeamDrop host process.
///
/// Every section has defaults, so a missing file or a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamdropConfig {
    pub app: AppConfig,
    pub window: WindowConfig,
    pub server: ServerConfig,
    pub ticker: TickerConfig,
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "BeamDrop".to_string(),
            description: "Self-hosted file sharing over the local network".to_string(),
        }
    }
}

/// Options for the main window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Root URL the window loads, relative to the asset server
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Background colour as `[r, g, b]`
    pub background: [u8; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "BeamDrop".to_string(),
            url: "/".to_string(),
            width: 1024,
            height: 768,
            background: [27, 38, 54],
        }
    }
}

/// Local web host serving assets and the page API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Serve the UI from this directory instead of the embedded bundle
    pub assets_dir: Option<PathBuf>,
    /// Launch the system browser at the window URL once bound
    pub open_browser: bool,
    /// Allow any origin (development only)
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 34115)),
            assets_dir: None,
            open_browser: false,
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Event the formatted time is emitted on
    pub event: String,
    /// chrono strftime format, applied to UTC time
    pub format: String,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
            event: crate::events::TIME_EVENT.to_string(),
            format: RFC1123.to_string(),
        }
    }
}

impl TickerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// End the process when the last window closes
    pub quit_on_last_window_closed: bool,
    /// How long the window count must stay at zero before quitting
    pub close_grace_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            quit_on_last_window_closed: true,
            close_grace_ms: 2000,
        }
    }
}

impl LifecycleConfig {
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Whether `format` parses as a chrono strftime string.
pub(crate) fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// A bare level (`info`, `off`, ...) or a target directive list (`beamdrop_core=debug`).
fn is_valid_level(level: &str) -> bool {
    level.contains('=') || level.eq_ignore_ascii_case("off") || level.parse::<tracing::Level>().is_ok()
}

impl BeamdropConfig {
    /// Config file path: `$BEAMDROP_CONFIG`, else `~/.beamdrop/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".beamdrop/config.toml")
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate a specific file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BridgeError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            BridgeError::config(format!("invalid TOML in {}: {}", path.display(), e))
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.interval_ms == 0 {
            return Err(BridgeError::config("ticker.interval_ms must be greater than zero"));
        }
        if self.ticker.event.is_empty() {
            return Err(BridgeError::config("ticker.event must not be empty"));
        }
        if !is_valid_format(&self.ticker.format) {
            return Err(BridgeError::config(format!(
                "ticker.format '{}' is not a valid strftime format",
                self.ticker.format
            )));
        }
        if !self.window.url.starts_with('/') {
            return Err(BridgeError::config(format!(
                "window.url '{}' must start with '/'",
                self.window.url
            )));
        }
        if !is_valid_level(&self.logging.level) {
            return Err(BridgeError::config(format!(
                "logging.level '{}' is not a known level",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BridgeError::config(format!("failed to serialize config: {}", e)))
    }
}
