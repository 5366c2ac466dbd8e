//! Download engine.
//!
//! This module provides:
//! - Task planning (destination paths and sequence numbers)
//! - Streaming fetches with part files
//! - The bounded worker pool and its events
//! - Post-download metadata embedding

pub mod events;
pub mod fetch;
pub mod metadata;
pub mod plan;
pub mod pool;
pub mod state;

pub use events::{
    EventSink, NoopSink, Outcome, ProgressEvent, RecordingSink, SinkEvent, StatusEvent,
};
pub use fetch::fetch_to_file;
pub use metadata::{ExifTool, MediaMetadata, MetadataEmbedder, NoopEmbedder};
pub use plan::{plan_tasks, DownloadTask};
pub use pool::{BatchOptions, Downloader, DEFAULT_WORKERS};
pub use state::{BatchCounters, BatchReport, DownloadResponse};
