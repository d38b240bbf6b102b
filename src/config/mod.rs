//! Configuration for the Maestro adapter.
//!
//! TOML file with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `MAESTRO_CONFIG` environment variable (explicit path)
//! 2. `./maestro.toml` (current directory)
//! 3. `~/.config/maestro-meter/maestro.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\maestro-meter\maestro.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `MAESTRO_<SECTION>_<KEY>`, e.g.
//! `MAESTRO_CONNECTION_KIND=net` or `MAESTRO_CONNECTION_HOST=10.0.0.12`.
//!
//! # Example
//!
//! ```toml
//! [connection]
//! kind = "serial"
//! serial_port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! read_timeout_ms = 500
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, ConnectionConfig, ConnectionKind, LogFormat, LoggingConfig};
