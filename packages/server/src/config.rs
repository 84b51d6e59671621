//! Server configuration read from the environment at start-up.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crime_dashboard_database::DEFAULT_DB_PATH;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 4500;

/// Default per-file upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings for [`crate::run_server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Directory holding uploaded evidence, served at `/uploads`.
    pub upload_dir: PathBuf,
    /// TOML officer/hotspot fixture. `None` uses the built-in demo data.
    pub directory_path: Option<PathBuf>,
    pub session_ttl: chrono::Duration,
    pub max_upload_bytes: usize,
    /// Delay between the cosmetic progress steps of a streamed allocation.
    pub progress_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            upload_dir: PathBuf::from("uploads"),
            directory_path: None,
            session_ttl: chrono::Duration::hours(12),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            progress_delay: Duration::from_millis(250),
        }
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable {name}={raw:?}");
            default
        }),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `DATABASE_PATH`, `UPLOAD_DIR`,
    /// `DIRECTORY_PATH`, `SESSION_TTL_HOURS`, `MAX_UPLOAD_BYTES`, and
    /// `PATROL_PROGRESS_DELAY_MS`, falling back to the defaults for anything
    /// unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: env_parse("PORT", defaults.port),
            database_path: std::env::var("DATABASE_PATH")
                .map_or(defaults.database_path, PathBuf::from),
            upload_dir: std::env::var("UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            directory_path: std::env::var("DIRECTORY_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            session_ttl: chrono::Duration::hours(env_parse("SESSION_TTL_HOURS", 12)),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            progress_delay: Duration::from_millis(env_parse("PATROL_PROGRESS_DELAY_MS", 250)),
        }
    }
}
