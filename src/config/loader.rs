//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "MAESTRO";

/// Config file name
const CONFIG_FILE_NAME: &str = "maestro.toml";

/// Per-user config directory name
const APP_DIR_NAME: &str = "maestro-meter";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "MAESTRO_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `MAESTRO_CONFIG` environment variable (explicit path)
    /// 2. `./maestro.toml` (current directory)
    /// 3. `~/.config/maestro-meter/maestro.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\maestro-meter\maestro.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables override file values. The result is not
    /// validated here: callers layer their own overrides on top and then call
    /// [`Config::validate`].
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path, unvalidated like
    /// [`ConfigLoader::load`].
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read `MAESTRO_<suffix>` and parse it, reporting the variable on failure.
fn env_parsed<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}"))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `MAESTRO_<SECTION>_<KEY>`
/// For example:
/// - `MAESTRO_CONNECTION_KIND=net`
/// - `MAESTRO_CONNECTION_SERIAL_PORT=/dev/ttyACM0`
/// - `MAESTRO_LOGGING_LEVEL=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    let conn = &mut config.connection;

    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_CONNECTION_KIND")) {
        conn.kind = val.parse()?;
    }
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_CONNECTION_SERIAL_PORT")) {
        conn.serial_port = val;
    }
    if let Some(baud) = env_parsed("CONNECTION_BAUD_RATE", "baud rate")? {
        conn.baud_rate = baud;
    }
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_CONNECTION_HOST")) {
        conn.host = val;
    }
    if let Some(port) = env_parsed("CONNECTION_PORT", "port number")? {
        conn.port = port;
    }
    if let Some(ms) = env_parsed("CONNECTION_READ_TIMEOUT_MS", "timeout")? {
        conn.read_timeout_ms = ms;
    }

    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_LOGGING_LEVEL")) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_LOGGING_FORMAT")) {
        config.logging.format = val.parse()?;
    }

    Ok(())
}
