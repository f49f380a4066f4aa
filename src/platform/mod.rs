// AstroLab platform abstraction
// Resolves where settings and the on-device database live on each OS.
//
// Uses `cfg(target_os)` to pick the platform implementation at compile time.
// Each implementation reads the environment through a lookup function so the
// path rules can be tested without mutating process-wide variables.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as os;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as os;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use windows as os;

/// Overrides the data directory (database location) when set.
pub const DATA_DIR_ENV: &str = "ASTROLAB_DATA_DIR";

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    os::config_dir(&env_lookup)
}

/// Directory holding the SQLite database. `ASTROLAB_DATA_DIR` wins when set.
pub fn get_data_dir() -> PathBuf {
    match env_lookup(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => os::data_dir(&env_lookup),
    }
}

/// Default database file path.
pub fn default_database_path() -> PathBuf {
    get_data_dir().join("astrolab.db")
}
