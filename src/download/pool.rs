//! Bounded worker pool that executes planned tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::download::events::{EventSink, Outcome, ProgressEvent, StatusEvent};
use crate::download::fetch::fetch_to_file;
use crate::download::metadata::{MediaMetadata, MetadataEmbedder, NoopEmbedder};
use crate::download::plan::{plan_tasks, DownloadTask};
use crate::download::state::{BatchCounters, BatchReport};
use crate::error::{Error, Result};
use crate::http::{shared_client, REQUEST_TIMEOUT};
use crate::media::WorkItem;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Tunables for one batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    pub timeout: Duration,
    /// Explicit proxy; environment variables apply when `None`.
    pub proxy: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout: REQUEST_TIMEOUT,
            proxy: None,
        }
    }
}

/// Runs download batches.
pub struct Downloader {
    options: BatchOptions,
    embedder: Arc<dyn MetadataEmbedder>,
}

impl Downloader {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            embedder: Arc::new(NoopEmbedder),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn MetadataEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Plan `items` under `root` and run them.
    ///
    /// Errors only when the batch cannot start. Per-item failures and
    /// cancellation are reported through the returned [`BatchReport`].
    pub async fn download(
        &self,
        items: Vec<WorkItem>,
        root: &Path,
        batch_owner: &str,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> Result<BatchReport> {
        if items.is_empty() {
            return Err(Error::InvalidInput("no items to download".into()));
        }

        let total = items.len();
        let tasks = plan_tasks(items, root, batch_owner)?;
        Ok(self.run(tasks, total, sink, cancel).await)
    }

    /// Execute `tasks` with at most `workers` in flight.
    ///
    /// Every task ends up counted exactly once. Tasks that never ran because
    /// of cancellation are counted as failed and the report carries
    /// [`Error::Cancelled`].
    pub async fn run(
        &self,
        tasks: Vec<DownloadTask>,
        total: usize,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> BatchReport {
        let counters = Arc::new(BatchCounters::new());
        if tasks.is_empty() {
            return counters.snapshot();
        }

        let client = match shared_client(self.options.proxy.as_deref(), self.options.timeout) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Cannot start batch: {}", e);
                return BatchReport {
                    failed: total,
                    error: Some(e),
                    ..Default::default()
                };
            }
        };

        let workers = self.options.workers.max(1).min(tasks.len());
        tracing::info!("Starting {} download(s) with {} worker(s)", tasks.len(), workers);

        let (tx, rx) = mpsc::channel(tasks.len());
        let queue = Arc::new(Mutex::new(rx));
        let ctx = Arc::new(WorkerContext {
            client,
            embedder: Arc::clone(&self.embedder),
            sink,
            counters: Arc::clone(&counters),
            cancel: cancel.clone(),
            total,
        });

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            pool.spawn(work(Arc::clone(&ctx), Arc::clone(&queue)));
        }

        for task in tasks {
            if cancel.is_cancelled() {
                tracing::debug!("Dispatch stopped by cancellation");
                break;
            }
            if tx.send(task).await.is_err() {
                break;
            }
        }
        drop(tx);

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Download worker aborted: {}", e);
            }
        }

        let mut report = counters.snapshot();
        let completed = counters.completed();
        if completed < total {
            let missing = total - completed;
            report.failed += missing;
            report.error = Some(if cancel.is_cancelled() {
                Error::Cancelled
            } else {
                Error::Download(format!("{} task(s) did not finish", missing))
            });
        }

        tracing::info!("{}", report.message());
        report
    }
}

struct WorkerContext {
    client: Client,
    embedder: Arc<dyn MetadataEmbedder>,
    sink: Arc<dyn EventSink>,
    counters: Arc<BatchCounters>,
    cancel: CancellationToken,
    total: usize,
}

async fn work(ctx: Arc<WorkerContext>, queue: Arc<Mutex<mpsc::Receiver<DownloadTask>>>) {
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let next = queue.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };
        if ctx.cancel.is_cancelled() {
            break;
        }

        let outcome = ctx.execute(&task).await;
        ctx.finish(&task, outcome);
    }
}

impl WorkerContext {
    async fn execute(&self, task: &DownloadTask) -> Outcome {
        let dest = match &task.destination {
            Ok(dest) => dest,
            Err(reason) => {
                tracing::warn!("Failed item {} (tweet {}): {}", task.index, task.item.tweet_id, reason);
                return Outcome::Failed;
            }
        };

        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            tracing::debug!("Skipping existing file: {}", dest.display());
            return Outcome::Skipped;
        }

        if task.item.is_text() {
            let body = task.item.content.as_deref().unwrap_or_default();
            return match tokio::fs::write(dest, body).await {
                Ok(()) => Outcome::Success,
                Err(e) => {
                    tracing::warn!("Failed to write {}: {}", dest.display(), e);
                    Outcome::Failed
                }
            };
        }

        match fetch_to_file(&self.client, &task.item.url, dest, &self.cancel).await {
            Ok(bytes) => {
                tracing::debug!("Downloaded {} ({} bytes)", dest.display(), bytes);
                let metadata = MediaMetadata::from_item(&task.item);
                if let Err(e) = self.embedder.embed(dest, &metadata).await {
                    tracing::warn!("Metadata not written for {}: {}", dest.display(), e);
                }
                Outcome::Success
            }
            Err(Error::Cancelled) => {
                tracing::debug!("Cancelled: {}", task.item.url);
                Outcome::Failed
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", task.item.url, e);
                Outcome::Failed
            }
        }
    }

    fn finish(&self, task: &DownloadTask, outcome: Outcome) {
        self.counters.record(outcome);
        self.sink.status(StatusEvent {
            tweet_id: task.item.tweet_id,
            index: task.index,
            status: outcome,
        });
        let completed = self.counters.complete();
        self.sink.progress(ProgressEvent::new(completed, self.total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::events::{RecordingSink, SinkEvent};
    use crate::media::ContentType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FailingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataEmbedder for FailingEmbedder {
        async fn embed(&self, _path: &Path, _metadata: &MediaMetadata) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Metadata("boom".into()))
        }
    }

    fn options() -> BatchOptions {
        BatchOptions {
            workers: 4,
            timeout: Duration::from_secs(10),
            proxy: None,
        }
    }

    fn photo(server: &MockServer, name: &str, tweet_id: i64) -> WorkItem {
        WorkItem::new(
            format!("{}/media/{}.jpg", server.uri(), name),
            tweet_id,
            ContentType::Photo,
        )
        .with_date("2024-01-02T03:04:05")
    }

    async fn mount_ok(server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_downloads_and_skips_existing() {
        let server = MockServer::start().await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();

        let existing = tmp.path().join("alice/images/alice_20240102_030405_2_01.jpg");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"old").unwrap();

        let items = vec![photo(&server, "a", 1), photo(&server, "b", 2), photo(&server, "c", 3)];
        let sink = Arc::new(RecordingSink::new());
        let report = Downloader::new(options())
            .download(items, tmp.path(), "alice", sink.clone(), CancellationToken::new())
            .await
            .unwrap();

        assert!(report.error.is_none());
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(std::fs::read(&existing).unwrap(), b"old");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);

        assert_eq!(sink.statuses().len(), 3);
        assert_eq!(sink.count(Outcome::Skipped), 1);
        let skipped = sink
            .statuses()
            .into_iter()
            .find(|e| e.status == Outcome::Skipped)
            .unwrap();
        assert_eq!(skipped.tweet_id, 2);
        assert_eq!(skipped.index, 1);

        let mut currents: Vec<usize> = sink.progress_events().iter().map(|p| p.current).collect();
        currents.sort_unstable();
        assert_eq!(currents, vec![1, 2, 3]);
        assert!(sink
            .progress_events()
            .iter()
            .any(|p| p.current == 3 && p.percent == 100));
    }

    #[tokio::test]
    async fn test_rerun_is_all_skipped_without_requests() {
        let server = MockServer::start().await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();
        let items = vec![photo(&server, "a", 1), photo(&server, "a2", 1)];
        let downloader = Downloader::new(options());

        let first = downloader
            .download(items.clone(), tmp.path(), "bob", Arc::new(RecordingSink::new()), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(first.downloaded, 2);

        let before = server.received_requests().await.unwrap().len();
        let second = downloader
            .download(items, tmp.path(), "bob", Arc::new(RecordingSink::new()), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(second.skipped, 2);
        assert_eq!(second.downloaded, 0);
        assert_eq!(server.received_requests().await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_http_error_counts_as_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();

        let items = vec![photo(&server, "gone", 1), photo(&server, "ok", 2)];
        let sink = Arc::new(RecordingSink::new());
        let report = Downloader::new(options())
            .download(items, tmp.path(), "carol", sink.clone(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.error.is_none());
        assert!(!tmp
            .path()
            .join("carol/images/carol_20240102_030405_1_01.jpg")
            .exists());
        assert_eq!(sink.count(Outcome::Failed), 1);
    }

    #[tokio::test]
    async fn test_text_items_are_written_locally() {
        let tmp = tempfile::tempdir().unwrap();
        let item = WorkItem::new("", 5, ContentType::Text).with_content("hello world");

        let report = Downloader::new(options())
            .download(vec![item], tmp.path(), "dave", Arc::new(RecordingSink::new()), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        let written = tmp.path().join("dave/texts/dave_00000000_000000_5_01.txt");
        assert_eq!(std::fs::read_to_string(written).unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_embedder_failure_keeps_success() {
        let server = MockServer::start().await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();
        let embedder = Arc::new(FailingEmbedder {
            calls: AtomicUsize::new(0),
        });

        let report = Downloader::new(options())
            .with_embedder(embedder.clone())
            .download(
                vec![photo(&server, "a", 1)],
                tmp.path(),
                "erin",
                Arc::new(RecordingSink::new()),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let server = MockServer::start().await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let items = vec![photo(&server, "a", 1), photo(&server, "b", 2)];
        let report = Downloader::new(options())
            .download(items, tmp.path(), "fay", Arc::new(RecordingSink::new()), cancel)
            .await
            .unwrap();

        assert!(report.is_cancelled());
        assert_eq!(report.failed, 2);
        assert_eq!(report.total(), 2);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_accounts_for_every_task() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"slow".to_vec())
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let items = vec![photo(&server, "a", 1), photo(&server, "b", 2), photo(&server, "c", 3)];
        let sink = Arc::new(RecordingSink::new());
        let report = Downloader::new(BatchOptions {
            workers: 1,
            ..options()
        })
        .download(items, tmp.path(), "gus", sink.clone(), cancel)
        .await
        .unwrap();

        assert!(report.is_cancelled());
        assert_eq!(report.downloaded, 0);
        assert_eq!(report.total(), 3);
        assert!(sink.statuses().len() <= 1);

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("gus/images"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_owner_folder_fails_only_that_owner() {
        let server = MockServer::start().await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("alice"), b"not a folder").unwrap();

        let items = vec![
            photo(&server, "a", 1).with_owner("alice"),
            photo(&server, "b", 2).with_owner("bob"),
        ];
        let sink = Arc::new(RecordingSink::new());
        let report = Downloader::new(options())
            .download(items, tmp.path(), "", sink.clone(), CancellationToken::new())
            .await
            .unwrap();

        assert!(report.error.is_none());
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(sink.statuses().len(), 2);
        assert!(tmp
            .path()
            .join("bob/images/bob_20240102_030405_2_01.jpg")
            .exists());

        let alice = sink.statuses().into_iter().find(|e| e.index == 0).unwrap();
        assert_eq!(alice.status, Outcome::Failed);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_precedes_matching_progress() {
        let server = MockServer::start().await;
        mount_ok(&server).await;
        let tmp = tempfile::tempdir().unwrap();

        let items: Vec<WorkItem> = (1..=12)
            .map(|id| photo(&server, &format!("m{id}"), id))
            .collect();
        let sink = Arc::new(RecordingSink::new());
        Downloader::new(options())
            .download(items, tmp.path(), "hana", sink.clone(), CancellationToken::new())
            .await
            .unwrap();

        let events = sink.events();
        let mut statuses_seen = 0;
        let mut progress_seen = 0;
        for (i, event) in events.iter().enumerate() {
            match event {
                SinkEvent::Status(_) => {
                    statuses_seen += 1;
                    let rank = statuses_seen;
                    assert!(
                        events[i + 1..]
                            .iter()
                            .any(|e| matches!(e, SinkEvent::Progress(p) if p.current >= rank)),
                        "no progress reaching {rank} after status at {i}"
                    );
                }
                SinkEvent::Progress(_) => {
                    progress_seen += 1;
                    assert!(progress_seen <= statuses_seen, "progress before its status at {i}");
                }
            }
        }
        assert_eq!(statuses_seen, 12);
        assert_eq!(progress_seen, 12);
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Downloader::new(options())
            .download(Vec::new(), tmp.path(), "x", Arc::new(RecordingSink::new()), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
