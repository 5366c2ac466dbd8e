//! xmedia-dl - concurrent batch media downloader
//!
//! This library downloads batches of remote media into a per-account folder
//! layout and keeps a resumable record of fetched accounts.
//!
//! # Features
//!
//! - Deterministic file naming with per-post sequence numbers
//! - Bounded worker pool with cancellation and progress events
//! - Skip-if-present re-runs without network traffic
//! - Optional metadata embedding through exiftool
//! - SQLite account store with versioned migrations
//! - Legacy payload conversion and JSON/TXT backups
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use xmedia_dl::{load_work_items, Config, Downloader, NoopSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let input = load_work_items(Path::new("items.json"))?;
//!
//!     let report = Downloader::new(config.batch_options())
//!         .download(
//!             input.items,
//!             &config.download_directory(),
//!             &input.owner,
//!             Arc::new(NoopSink),
//!             CancellationToken::new(),
//!         )
//!         .await?;
//!     println!("{}", report.message());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod http;
pub mod media;
pub mod output;
pub mod store;

/// Application name used for folders and backup files.
pub const APP_NAME: &str = "xmedia-dl";

// Re-exports for convenience
pub use config::Config;
pub use download::{
    BatchOptions, BatchReport, DownloadResponse, DownloadTask, Downloader, EventSink, NoopSink,
    Outcome, ProgressEvent, StatusEvent,
};
pub use error::{Error, Result};
pub use media::{load_work_items, ContentType, WorkItem};
pub use store::{AccountStore, SaveAccount};
