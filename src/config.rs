//! Process configuration, loaded once from the environment at startup.
//!
//! All values are process-lifetime constants; no network-facing
//! configuration endpoint exists. Nothing here persists across restarts.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default payload ceiling in megabytes (typical chat attachment cap).
const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

/// Default root for per-request workspaces.
const DEFAULT_WORK_DIR: &str = "./downloads";

/// Default per-identity admissions per minute.
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 5;

/// Default deadline for one retrieval attempt.
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 180;

/// Default deadline for audio extraction.
const DEFAULT_TRANSCODE_TIMEOUT_SECS: u64 = 60;

/// Default bound on concurrent orchestrations.
const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Parse failure description.
        reason: String,
    },
}

/// Environment-sourced process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hard payload ceiling in bytes (`MAX_FILE_SIZE_MB`).
    pub max_payload_bytes: u64,
    /// Root directory for per-request workspaces (`MEDIA_WORK_DIR`).
    pub work_root: PathBuf,
    /// Per-identity admissions per rolling minute (`RATE_LIMIT_PER_MINUTE`);
    /// zero disables limiting.
    pub per_minute_limit: u32,
    /// Deadline per strategy attempt (`ATTEMPT_TIMEOUT_SECS`).
    pub attempt_timeout: Duration,
    /// Deadline for audio extraction (`TRANSCODE_TIMEOUT_SECS`).
    pub transcode_timeout: Duration,
    /// Bound on concurrent orchestrations (`MAX_CONCURRENT_DOWNLOADS`).
    pub max_concurrent_downloads: usize,
    /// Retrieval tool binary (`YTDLP_BIN`).
    pub ytdlp_bin: PathBuf,
    /// Transcoding tool binary (`FFMPEG_BIN`).
    pub ffmpeg_bin: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            work_root: PathBuf::from(DEFAULT_WORK_DIR),
            per_minute_limit: DEFAULT_RATE_LIMIT_PER_MINUTE,
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            transcode_timeout: Duration::from_secs(DEFAULT_TRANSCODE_TIMEOUT_SECS),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            ytdlp_bin: PathBuf::from("yt-dlp"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults
    /// for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a set variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_payload_bytes: env_u64("MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB)?
                * 1024
                * 1024,
            work_root: env_path("MEDIA_WORK_DIR", defaults.work_root),
            per_minute_limit: env_u32(
                "RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )?,
            attempt_timeout: Duration::from_secs(env_u64(
                "ATTEMPT_TIMEOUT_SECS",
                DEFAULT_ATTEMPT_TIMEOUT_SECS,
            )?),
            transcode_timeout: Duration::from_secs(env_u64(
                "TRANSCODE_TIMEOUT_SECS",
                DEFAULT_TRANSCODE_TIMEOUT_SECS,
            )?),
            max_concurrent_downloads: env_usize(
                "MAX_CONCURRENT_DOWNLOADS",
                DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            )?,
            ytdlp_bin: env_path("YTDLP_BIN", defaults.ytdlp_bin),
            ffmpeg_bin: env_path("FFMPEG_BIN", defaults.ffmpeg_bin),
        })
    }
}

fn env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|error| ConfigError::Invalid {
            key,
            value,
            reason: format!("{error}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|error| ConfigError::Invalid {
            key,
            value,
            reason: format!("{error}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|error| ConfigError::Invalid {
            key,
            value,
            reason: format!("{error}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_path(key: &'static str, default: PathBuf) -> PathBuf {
    std::env::var_os(key).map_or(default, PathBuf::from)
}
