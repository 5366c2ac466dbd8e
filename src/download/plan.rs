//! Task planning: work items to concrete download tasks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::{
    build_filename, destination_dir, ensure_dir, format_timestamp, resolve_extension,
    sanitize_path_component,
};
use crate::media::WorkItem;

/// One planned download. Never mutated after planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Position of the item in the input list.
    pub index: usize,
    /// Destination file, or why none could be prepared.
    ///
    /// Unprepared tasks still run through the pool and finish as failed.
    pub destination: std::result::Result<PathBuf, String>,
    pub item: WorkItem,
}

impl DownloadTask {
    pub fn path(&self) -> Option<&Path> {
        self.destination.as_deref().ok()
    }
}

/// Plan one task per item, in input order.
///
/// `batch_owner` applies to items without an owner of their own. Each
/// `(owner, tweet_id)` pair gets sequence numbers `1..k` in input order.
/// Destination directories are created as they are first seen.
///
/// Only a missing owner aborts planning. An unusable owner name or a
/// directory that cannot be created fails just the affected items.
pub fn plan_tasks(items: Vec<WorkItem>, root: &Path, batch_owner: &str) -> Result<Vec<DownloadTask>> {
    let mut sequences: HashMap<(String, i64), u32> = HashMap::new();
    let mut dirs: HashMap<PathBuf, std::result::Result<(), String>> = HashMap::new();
    let mut tasks = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let owner = item.effective_owner(batch_owner).trim();
        if owner.is_empty() {
            return Err(Error::InvalidInput(format!(
                "item {} (tweet {}) has no owner handle",
                index, item.tweet_id
            )));
        }

        let owner = match sanitize_path_component(owner) {
            Ok(owner) => owner,
            Err(e) => {
                tracing::warn!("Item {} (tweet {}) not planned: {}", index, item.tweet_id, e);
                tasks.push(DownloadTask {
                    index,
                    destination: Err(e.to_string()),
                    item,
                });
                continue;
            }
        };

        let dir = destination_dir(root, &owner, item.content_type);
        let prepared = dirs
            .entry(dir.clone())
            .or_insert_with(|| {
                ensure_dir(&dir).map_err(|e| {
                    tracing::warn!("Cannot create {}: {}", dir.display(), e);
                    format!("cannot create {}: {}", dir.display(), e)
                })
            })
            .clone();

        let sequence = sequences.entry((owner.clone(), item.tweet_id)).or_insert(0);
        *sequence += 1;

        let filename = build_filename(
            &owner,
            &format_timestamp(&item.date),
            item.tweet_id,
            *sequence,
            &resolve_extension(&item.url, item.content_type),
        );

        tasks.push(DownloadTask {
            index,
            destination: prepared.map(|()| dir.join(filename)),
            item,
        });
    }

    tracing::debug!("Planned {} download task(s) under {}", tasks.len(), root.display());
    Ok(tasks)
}
