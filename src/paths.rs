//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate locations.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/eagleeye/` | `~/.config/eagleeye/` |
//! | Data (logs) | `~/Library/Application Support/eagleeye/` | `~/.local/share/eagleeye/` |
//!
//! Overrides:
//! - `EAGLEEYE_CONFIG_DIR`: overrides [`config_dir`]
//! - `EAGLEEYE_DATA_DIR`: overrides [`data_dir`]

use std::path::PathBuf;

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("EAGLEEYE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("eagleeye"))
        .unwrap_or_else(|| PathBuf::from("/tmp/eagleeye-config"))
}

/// Application data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("EAGLEEYE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("eagleeye"))
        .unwrap_or_else(|| PathBuf::from("/tmp/eagleeye-data"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}
