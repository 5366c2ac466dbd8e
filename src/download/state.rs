//! Batch counters and the final batch report.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::download::events::Outcome;
use crate::error::Error;

/// Counters shared by all workers of one batch.
#[derive(Debug, Default)]
pub struct BatchCounters {
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    completed: AtomicUsize,
}

impl BatchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome without marking the task complete.
    pub fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Success => &self.downloaded,
            Outcome::Skipped => &self.skipped,
            Outcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one task complete and return the new completed count.
    pub fn complete(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> BatchReport {
        BatchReport {
            downloaded: self.downloaded.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            error: None,
        }
    }
}

/// Result of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Set when the batch was interrupted or could not finish every task.
    pub error: Option<Error>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(Error::Cancelled))
    }

    pub fn message(&self) -> String {
        format!(
            "Downloaded {} files, {} skipped, {} failed",
            self.downloaded, self.skipped, self.failed
        )
    }

    pub fn to_response(&self) -> DownloadResponse {
        DownloadResponse {
            success: self.error.is_none(),
            downloaded: self.downloaded,
            skipped: self.skipped,
            failed: self.failed,
            message: match &self.error {
                Some(e) => format!("{} ({})", self.message(), e),
                None => self.message(),
            },
        }
    }
}

/// Serializable summary handed back to front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub message: String,
}

impl DownloadResponse {
    /// Response for a batch that never started.
    pub fn rejected(error: &Error) -> Self {
        Self {
            success: false,
            downloaded: 0,
            skipped: 0,
            failed: 0,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let counters = BatchCounters::new();
        counters.record(Outcome::Success);
        counters.record(Outcome::Success);
        counters.record(Outcome::Failed);
        counters.record(Outcome::Skipped);
        assert_eq!(counters.complete(), 1);
        assert_eq!(counters.complete(), 2);

        let report = counters.snapshot();
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total(), 4);
        assert_eq!(counters.completed(), 2);
    }

    #[test]
    fn test_response_message() {
        let report = BatchReport {
            downloaded: 3,
            skipped: 1,
            failed: 2,
            error: None,
        };
        let response = report.to_response();
        assert!(response.success);
        assert_eq!(response.message, "Downloaded 3 files, 1 skipped, 2 failed");
    }

    #[test]
    fn test_cancelled_response() {
        let report = BatchReport {
            downloaded: 1,
            skipped: 0,
            failed: 4,
            error: Some(Error::Cancelled),
        };
        assert!(report.is_cancelled());
        let response = report.to_response();
        assert!(!response.success);
        assert!(response.message.starts_with("Downloaded 1 files, 0 skipped, 4 failed"));
    }
}
