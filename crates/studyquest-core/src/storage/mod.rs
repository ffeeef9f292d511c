mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, Stats};

use std::path::PathBuf;

/// Returns `~/.config/studyquest[-dev]/` based on STUDYQUEST_ENV.
///
/// Set STUDYQUEST_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYQUEST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyquest-dev")
    } else {
        base_dir.join("studyquest")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
