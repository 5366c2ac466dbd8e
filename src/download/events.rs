//! Per-task status and batch progress events.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Final classification of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
    Skipped,
}

/// Emitted once per task as soon as its outcome is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub tweet_id: i64,
    /// Position of the item in the caller's input list.
    pub index: usize,
    pub status: Outcome,
}

/// Emitted after every finished task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub percent: usize,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize) -> Self {
        let percent = if total == 0 { 0 } else { current * 100 / total };
        Self {
            current,
            total,
            percent,
        }
    }
}

/// Receiver of scheduler events.
///
/// Called from worker tasks concurrently; events of different tasks may
/// arrive in any order, but a task's status always precedes its progress.
pub trait EventSink: Send + Sync {
    fn status(&self, _event: StatusEvent) {}

    fn progress(&self, _event: ProgressEvent) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {}

/// One entry of a [`RecordingSink`] log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Status(StatusEvent),
    Progress(ProgressEvent),
}

/// Keeps every event in memory, in arrival order.
///
/// Status and progress share one log so their relative order survives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far, interleaved as delivered.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn statuses(&self) -> Vec<StatusEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Status(status) => Some(status),
                SinkEvent::Progress(_) => None,
            })
            .collect()
    }

    pub fn progress_events(&self) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Progress(progress) => Some(progress),
                SinkEvent::Status(_) => None,
            })
            .collect()
    }

    /// Number of status events with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.statuses().iter().filter(|e| e.status == outcome).count()
    }

    fn push(&self, event: SinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl EventSink for RecordingSink {
    fn status(&self, event: StatusEvent) {
        self.push(SinkEvent::Status(event));
    }

    fn progress(&self, event: ProgressEvent) {
        self.push(SinkEvent::Progress(event));
    }
}
