//! Configuration module for xmedia-dl.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, DownloadConfig, StoreConfig};
pub use validation::{parse_handle, validate_config, validate_proxy, MAX_WORKERS};
