use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerts::ALERT_THROTTLE_MINUTES;
use crate::alerts::channels::telegram::DEFAULT_API_BASE;
use crate::database::models::{DEFAULT_GRACE_PERIOD_MINUTES, DEFAULT_HTTP_INTERVAL_MINUTES};
use crate::scheduler::queue::{DEFAULT_BACKOFF, DEFAULT_FAILED_JOBS_KEPT, DEFAULT_JOB_ATTEMPTS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("Failed to write config {}: {source}", path.display())]
    WriteFailed { path: path::PathBuf, source: io::Error },
    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("Could not determine a config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
    #[error("Invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub database: DatabaseSettings,
    pub engine: Engine,
    pub queue: Queue,
    pub telegram: Telegram,
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: path::PathBuf,
    pub max_connections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub default_http_interval_minutes: u32,
    pub default_grace_period_minutes: u32,
    pub alert_throttle_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Queue {
    pub attempts: u32,
    pub backoff_seconds: u64,
    pub max_concurrent_jobs: usize,
    pub failed_jobs_kept: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Telegram {
    /// Default bot token; channels may carry their own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "127.0.0.1".into(), port: 8080 }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { path: "pulse.db".into(), max_connections: 8 }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            default_http_interval_minutes: DEFAULT_HTTP_INTERVAL_MINUTES,
            default_grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
            alert_throttle_minutes: ALERT_THROTTLE_MINUTES as u32,
        }
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_JOB_ATTEMPTS,
            backoff_seconds: DEFAULT_BACKOFF.as_secs(),
            max_concurrent_jobs: 16,
            failed_jobs_kept: DEFAULT_FAILED_JOBS_KEPT,
        }
    }
}

impl Default for Telegram {
    fn default() -> Self {
        Self { bot_token: None, api_base: DEFAULT_API_BASE.into() }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pulse/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::var_os("HOME") {
        path::PathBuf::from(home_dir).join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("pulse/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path.display())?;
        write_1(f, "Max Connections", &self.database.max_connections)?;

        write_title_1(f, "Engine")?;
        write_1(f, "Default HTTP Interval (min)", &self.engine.default_http_interval_minutes)?;
        write_1(f, "Default Grace Period (min)", &self.engine.default_grace_period_minutes)?;
        write_1(f, "Alert Throttle (min)", &self.engine.alert_throttle_minutes)?;

        write_title_1(f, "Queue")?;
        write_1(f, "Attempts", &self.queue.attempts)?;
        write_1(f, "Backoff (s)", &self.queue.backoff_seconds)?;
        write_1(f, "Max Concurrent Jobs", &self.queue.max_concurrent_jobs)?;
        write_1(f, "Failed Jobs Kept", &self.queue.failed_jobs_kept)?;

        write_title_1(f, "Telegram")?;
        let token = if self.telegram.bot_token.is_some() { "configured" } else { "not configured" };
        write_1(f, "Bot Token", &token)?;
        write_1(f, "API Base", &self.telegram.api_base)?;

        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/pulse/config.toml
    ///  or the specified path, with the name config.toml if one does not exist.
    /// Environment overrides are applied on top.
    ///
    /// ```no_run
    /// let cfg = pulse_service::config::Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), pulse_service::config::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let mut config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `PULSE_*` and `TELEGRAM_BOT_TOKEN` overrides from a lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("PULSE_DATABASE_PATH") {
            self.database.path = path.into();
        }
        if let Some(bind) = lookup("PULSE_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("PULSE_PORT") {
            self.server.port =
                port.parse().map_err(|_| ConfigError::InvalidOverride { key: "PULSE_PORT", value: port })?;
        }
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = Some(token);
        }
        Ok(())
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })?;
        }

        fs::write(path, config_str).map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }
}
