//! Client configuration.

use std::path::PathBuf;

/// Base URL used when `REWRITEFLOW_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Where the API lives and where the session token is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Token file; `None` uses `FileTokenStore::default_path()`.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_path: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            storage_path: None,
        }
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Read configuration from the environment.
    ///
    /// - `REWRITEFLOW_BASE_URL`: API base URL (default `http://localhost`)
    /// - `REWRITEFLOW_STORAGE`: token file path (default: platform data dir)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("REWRITEFLOW_BASE_URL")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let storage_path = lookup("REWRITEFLOW_STORAGE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Self {
            base_url,
            storage_path,
        }
    }
}
