use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analytics::DEFAULT_RECENT_LIMIT;

pub(crate) const DEFAULT_LOG_FILTER: &str = "warn";
pub(crate) const DEFAULT_USER: &str = "default";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    /// `None` means the platform data directory.
    pub(crate) db_path: Option<PathBuf>,
    pub(crate) log_filter: String,
    pub(crate) user: String,
    pub(crate) recent_limit: usize,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Build a config from `lookup`, which maps a variable name to its value.
    /// Blank values count as unset.
    pub(crate) fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let recent_limit = match get("SPENDSMART_RECENT_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid SPENDSMART_RECENT_LIMIT: {raw}"))?,
            None => DEFAULT_RECENT_LIMIT,
        };

        Ok(Self {
            db_path: get("SPENDSMART_DB").map(PathBuf::from),
            log_filter: get("SPENDSMART_LOG")
                .or_else(|| get("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            user: get("SPENDSMART_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            recent_limit,
        })
    }

    /// The database file to open, creating the default data directory when
    /// no explicit path is configured.
    pub(crate) fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let proj_dirs = directories::ProjectDirs::from("com", "spendsmart", "SpendSmart")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(data_dir.join("spendsmart.db"))
    }
}
