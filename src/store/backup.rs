//! Export and import of stored accounts.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::{backup_dir, ensure_dir, sanitize_path_component};
use crate::store::accounts::{AccountStore, SaveAccount, DEFAULT_FILTER};
use crate::store::payload::{normalize_payload, payload_identity, resume_state};
use crate::APP_NAME;

impl AccountStore {
    /// Write an account's payload to `<dir>/<app>_backups/<handle>.json`.
    pub fn export_json(&self, id: i64, dir: &Path) -> Result<PathBuf> {
        let account = self.get_by_id(id)?;

        let name = if account.handle.is_empty() {
            &account.display_name
        } else {
            &account.handle
        };
        let filename = format!("{}.json", sanitize_path_component(name)?);

        let export_dir = backup_dir(dir);
        ensure_dir(&export_dir)?;
        let path = export_dir.join(filename);
        std::fs::write(&path, account.payload.as_bytes())?;

        tracing::info!("Exported account {} to {}", id, path.display());
        Ok(path)
    }

    /// Write the handles of `ids`, one per line, to the fixed TXT backup file.
    ///
    /// Unresolvable ids are skipped.
    pub fn export_txt(&self, ids: &[i64], dir: &Path) -> Result<PathBuf> {
        if ids.is_empty() {
            return Err(Error::InvalidInput("no accounts to export".into()));
        }

        let handles: Vec<String> = ids
            .iter()
            .filter_map(|&id| match self.get_by_id(id) {
                Ok(account) => Some(account.handle),
                Err(e) => {
                    tracing::debug!("Skipping account {} in TXT export: {}", id, e);
                    None
                }
            })
            .filter(|handle| !handle.is_empty())
            .collect();

        if handles.is_empty() {
            return Err(Error::InvalidInput("no valid usernames found".into()));
        }

        let export_dir = backup_dir(dir);
        ensure_dir(&export_dir)?;
        let path = export_dir.join(format!("{}_multiple.txt", APP_NAME));
        std::fs::write(&path, handles.join("\n"))?;

        tracing::info!("Exported {} handle(s) to {}", handles.len(), path.display());
        Ok(path)
    }

    /// Import a payload file (current or legacy shape) under the default filter.
    ///
    /// Returns the imported handle.
    pub fn import_json(&self, path: &Path) -> Result<String> {
        let raw = std::fs::read_to_string(path)?;
        let payload = normalize_payload(&raw)?;
        let identity = payload_identity(&payload)?;

        self.upsert(&SaveAccount {
            handle: identity.handle.clone(),
            display_name: identity.display_name,
            profile_image: identity.profile_image,
            total_media: identity.total_urls,
            payload,
            filter: DEFAULT_FILTER.to_string(),
            cursor: String::new(),
            completed: true,
        })?;

        Ok(identity.handle)
    }

    /// Save a fetched payload under `filter`, keeping its resume state.
    ///
    /// The cursor and completion flag are read from the raw payload before
    /// normalization. Returns the row id and the handle.
    pub fn save_payload(&self, raw: &str, filter: &str) -> Result<(i64, String)> {
        let (cursor, completed) = resume_state(raw)?;
        let payload = normalize_payload(raw)?;
        let identity = payload_identity(&payload)?;

        let id = self.upsert(&SaveAccount {
            handle: identity.handle.clone(),
            display_name: identity.display_name,
            profile_image: identity.profile_image,
            total_media: identity.total_urls,
            payload,
            filter: filter.to_string(),
            cursor,
            completed,
        })?;

        Ok((id, identity.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"{"username":"alice","nick":"Alice","followers":3,"media_list":[
        {"tweet_id":"1","url":"https://pbs.twimg.com/media/A.jpg","date":"2024-01-01T00:00:00","type":"photo"},
        {"tweet_id":"2","url":"https://pbs.twimg.com/media/B.jpg","date":"2024-01-02T00:00:00","type":"photo"},
        {"tweet_id":"3","url":"https://video.twimg.com/C.mp4","date":"2024-01-03T00:00:00","type":"video"}
    ]}"#;

    #[test]
    fn test_import_legacy_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("alice.json");
        std::fs::write(&file, LEGACY).unwrap();

        let store = AccountStore::open_in_memory().unwrap();
        assert_eq!(store.import_json(&file).unwrap(), "alice");

        let summary = &store.list_all().unwrap()[0];
        assert_eq!(summary.handle, "alice");
        assert_eq!(summary.filter, "all");
        assert_eq!(summary.total_media, 3);
        assert_eq!(summary.followers_count, 3);

        let record = store.get_by_id(summary.id).unwrap();
        let value: serde_json::Value = serde_json::from_str(&record.payload).unwrap();
        assert_eq!(value["total_urls"], 3);
        assert_eq!(value["metadata"]["has_more"], false);
    }

    #[test]
    fn test_import_rejects_bad_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::open_in_memory().unwrap();

        let malformed = tmp.path().join("bad.json");
        std::fs::write(&malformed, "{oops").unwrap();
        assert!(matches!(store.import_json(&malformed), Err(Error::Format(_))));

        let no_info = tmp.path().join("noinfo.json");
        std::fs::write(&no_info, r#"{"timeline":[]}"#).unwrap();
        assert!(matches!(store.import_json(&no_info), Err(Error::Format(_))));

        let missing = tmp.path().join("missing.json");
        assert!(matches!(store.import_json(&missing), Err(Error::Io(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_export_json_writes_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::open_in_memory().unwrap();
        let payload = r#"{"account_info":{"name":"bob"},"timeline":[]}"#;
        let id = store.upsert(&SaveAccount::new("bob", payload)).unwrap();

        let path = store.export_json(id, tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("xmedia-dl_backups").join("bob.json"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), payload);
    }

    #[test]
    fn test_export_txt_skips_unknown_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::open_in_memory().unwrap();
        let a = store.upsert(&SaveAccount::new("alice", "{}")).unwrap();
        let b = store.upsert(&SaveAccount::new("bob", "{}")).unwrap();

        let path = store.export_txt(&[a, 999, b], tmp.path()).unwrap();
        assert!(path.ends_with("xmedia-dl_backups/xmedia-dl_multiple.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "alice\nbob");
    }

    #[test]
    fn test_save_payload_keeps_resume_state() {
        let store = AccountStore::open_in_memory().unwrap();
        let raw = r#"{"account_info":{"name":"dana","nick":"Dana"},"total_urls":2,"timeline":[],
            "metadata":{"has_more":true},"cursor":"DAABCgAB","completed":false}"#;

        let (id, handle) = store.save_payload(raw, "images").unwrap();
        assert_eq!(handle, "dana");

        let record = store.get_by_id(id).unwrap();
        assert_eq!(record.filter, "images");
        assert_eq!(record.cursor, "DAABCgAB");
        assert!(!record.completed);
        assert_eq!(record.total_media, 2);

        let (again, _) = store.save_payload(raw, "images").unwrap();
        assert_eq!(again, id);
        let (other, _) = store.save_payload(raw, "all").unwrap();
        assert_ne!(other, id);
    }

    #[test]
    fn test_export_txt_empty_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::open_in_memory().unwrap();
        assert!(store.export_txt(&[], tmp.path()).is_err());
        assert!(store.export_txt(&[5, 6], tmp.path()).is_err());
    }
}
