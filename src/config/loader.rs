//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::download::{BatchOptions, ExifTool, MetadataEmbedder, NoopEmbedder, DEFAULT_WORKERS};
use crate::error::{Error, Result};
use crate::fs::{default_database_path, default_download_dir};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Download options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root directory for downloads. Defaults to the user's Pictures folder.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Proxy URL (http, https or socks5).
    #[serde(default)]
    pub proxy: Option<String>,

    /// Number of concurrent download workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Whether to write metadata tags into downloaded media.
    #[serde(default = "default_true")]
    pub embed_metadata: bool,

    /// Path or name of the exiftool binary.
    #[serde(default = "default_exiftool_path")]
    pub exiftool_path: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: None,
            proxy: None,
            workers: default_workers(),
            timeout_seconds: default_timeout_seconds(),
            embed_metadata: true,
            exiftool_path: default_exiftool_path(),
        }
    }
}

/// Account store options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_exiftool_path() -> String {
    "exiftool".to_string()
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.download
            .directory
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(default_download_dir)
    }

    /// Get the effective account database path.
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.download.workers,
            timeout: Duration::from_secs(self.download.timeout_seconds),
            proxy: self.download.proxy.clone(),
        }
    }

    /// Metadata hook selected by `embed_metadata`.
    pub fn embedder(&self) -> Arc<dyn MetadataEmbedder> {
        if self.download.embed_metadata {
            Arc::new(ExifTool::new(&self.download.exiftool_path))
        } else {
            Arc::new(NoopEmbedder)
        }
    }
}
