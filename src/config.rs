//! Startup configuration: where the database and log file live.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "LIBRARY_DATA_DIR";
/// Environment variable holding the `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "LIBRARY_LOG";
/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-manager";
/// SQLite file holding books, members and issue records.
const DB_FILE_NAME: &str = "library.sqlite";
/// Log file written next to the database; stdout belongs to the terminal UI.
const LOG_FILE_NAME: &str = "library.log";

#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory from `LIBRARY_DATA_DIR`, falling back to a
    /// dot-folder in the user's home.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_data_dir(dir));
        }
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::with_data_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_data_dir() {
        let config = Config::with_data_dir("/tmp/lib");
        assert_eq!(config.db_path(), Path::new("/tmp/lib/library.sqlite"));
        assert_eq!(config.log_path(), Path::new("/tmp/lib/library.log"));
    }
}
