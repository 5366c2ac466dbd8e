//! Filesystem module.
//!
//! Provides:
//! - The naming policy (timestamp token, extension, final filename)
//! - Path and directory management

pub mod naming;
pub mod paths;

pub use naming::{
    build_filename, extract_original_filename, format_timestamp, resolve_extension,
    sanitize_path_component, TIMESTAMP_SENTINEL,
};
pub use paths::{backup_dir, default_database_path, default_download_dir, destination_dir, ensure_dir};
