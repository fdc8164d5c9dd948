//! File system paths for the client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name created under the user's home directory.
const BASE_DIR_NAME: &str = ".tally";
/// Key-value store filename under the base directory.
const STORE_FILE_NAME: &str = "store.json";

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.tally)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.tally`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.tally).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.tally/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the persistent key-value store path (~/.tally/store.json).
    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join(STORE_FILE_NAME)
    }

    /// Get the logs directory (~/.tally/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.tally/logs/tally.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("tally.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-tally");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.store_file(), base.join("store.json"));
        assert_eq!(paths.logs_dir(), base.join("logs"));
        assert_eq!(paths.log_file(), base.join("logs/tally.jsonl"));
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested").join("tally"));

        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
    }
}
