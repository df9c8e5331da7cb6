//! Server configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::tutor::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TTL};

pub const DEFAULT_CASES_CSV: &str = "matched_gi_ct_fluoro.csv";
pub const DEFAULT_IMAGE_DIR: &str = "fluoro_CT images/Gastrointestinal";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub cases_csv: PathBuf,
    pub image_dir: PathBuf,
    pub port: u16,
    pub session_idle_ttl: Duration,
    pub max_sessions: usize,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// - `CASES_CSV`: case table path
    /// - `IMAGE_DIR`: directory holding fluoroscopy and CT images
    /// - `PORT`: listen port, default 3000
    /// - `SESSION_IDLE_TTL_SECS`: tutor session idle expiry, default 3600
    /// - `MAX_SESSIONS`: live tutor session cap, default 1000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Blank values count as unset;
    /// unparseable session limits fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `PORT` is not a valid port number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let session_idle_ttl = get("SESSION_IDLE_TTL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_SESSION_IDLE_TTL, Duration::from_secs);
        let max_sessions = get("MAX_SESSIONS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_SESSIONS);

        Ok(Self {
            cases_csv: get("CASES_CSV").map_or_else(|| PathBuf::from(DEFAULT_CASES_CSV), PathBuf::from),
            image_dir: get("IMAGE_DIR").map_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR), PathBuf::from),
            port,
            session_idle_ttl,
            max_sessions,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
