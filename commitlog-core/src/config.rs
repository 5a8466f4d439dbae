use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_PATH: &str = "data-store/behaviors/commits.jsonl";
pub const DEFAULT_MAX_COMMITS_PER_RUN: usize = 100;

/// Settings shared by the store and the tracker. Passed explicitly to
/// constructors; nothing reads it from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Record log file. Relative paths resolve against the working directory.
    pub log_path: PathBuf,
    /// Upper bound on commits extracted by one tracking run.
    pub max_commits_per_run: usize,
    /// fsync the log after every append.
    pub sync_writes: bool,
    pub git_binary: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            max_commits_per_run: DEFAULT_MAX_COMMITS_PER_RUN,
            sync_writes: true,
            git_binary: "git".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Reads a TOML file. Keys that are absent keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid TOML in {}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    pub fn with_log_path(mut self, log_path: PathBuf) -> Self {
        self.log_path = log_path;
        self
    }

    fn check(&self) -> Result<()> {
        if self.log_path.as_os_str().is_empty() {
            return Err(Error::Config("log_path must not be empty".to_string()));
        }
        if self.max_commits_per_run == 0 {
            return Err(Error::Config(
                "max_commits_per_run must be at least 1".to_string(),
            ));
        }
        if self.git_binary.trim().is_empty() {
            return Err(Error::Config("git_binary must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(config.max_commits_per_run, 100);
        assert!(config.sync_writes);
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("commitlog.toml");
        std::fs::write(
            &path,
            "log_path = \"/var/lib/commitlog/commits.jsonl\"\nmax_commits_per_run = 5\n",
        )
        .unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(
            config.log_path,
            PathBuf::from("/var/lib/commitlog/commits.jsonl")
        );
        assert_eq!(config.max_commits_per_run, 5);
        assert_eq!(config.git_binary, "git");
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("commitlog.toml");

        std::fs::write(&path, "max_commits_per_run = 0\n").unwrap();
        assert!(matches!(TrackerConfig::load(&path), Err(Error::Config(_))));

        std::fs::write(&path, "max_commits_per_run = \"many\"\n").unwrap();
        assert!(matches!(TrackerConfig::load(&path), Err(Error::Config(_))));

        assert!(matches!(
            TrackerConfig::load(temp_dir.path().join("missing.toml")),
            Err(Error::Config(_))
        ));
    }
}
