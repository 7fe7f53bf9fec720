//! Server configuration
//!
//! All settings come from environment variables with sensible defaults:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `WORK_DIR` | `./data` | Working directory for persistent state |
//! | `DB_FILE` | `dispatch.redb` | Database file name inside `WORK_DIR` |
//! | `EVENT_CHANNEL_CAPACITY` | `1024` | Lifecycle event channel capacity |
//! | `SUBSCRIBER_BUFFER` | `256` | Per-subscriber notice queue length |
//! | `LOG_LEVEL` | `info` | Log verbosity (trace/debug/info/warn/error) |
//! | `LOG_DIR` | unset | When set, also write daily-rolling log files |

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub db_file: String,
    pub event_channel_capacity: usize,
    pub subscriber_buffer: usize,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./data"),
            db_file: "dispatch.redb".to_string(),
            event_channel_capacity: 1024,
            subscriber_buffer: 256,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            db_file: env::var("DB_FILE").unwrap_or(defaults.db_file),
            event_channel_capacity: env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_channel_capacity),
            subscriber_buffer: env::var("SUBSCRIBER_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.subscriber_buffer),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: env::var("LOG_DIR").ok(),
        }
    }

    /// Full path to the database file
    pub fn db_path(&self) -> PathBuf {
        self.work_dir.join(&self.db_file)
    }
}
