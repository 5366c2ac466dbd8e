//! Path and directory management.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};

use crate::error::Result;
use crate::media::ContentType;
use crate::APP_NAME;

/// Directory an item lands in: `root/<owner>/<type-subfolder>`.
pub fn destination_dir(root: &Path, owner: &str, content_type: ContentType) -> PathBuf {
    root.join(owner).join(content_type.folder_name())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Default output root when the caller gives none: the user's Pictures folder.
pub fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(Path::to_path_buf))
        .or_else(|| UserDirs::new().map(|dirs| dirs.home_dir().join("Pictures")))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Fixed per-user location of the account database.
pub fn default_database_path() -> PathBuf {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(format!(".{}", APP_NAME)).join("accounts.db")
}

/// Backup folder under a caller-chosen directory.
pub fn backup_dir(dir: &Path) -> PathBuf {
    dir.join(format!("{}_backups", APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_dir() {
        let root = PathBuf::from("/downloads");
        assert_eq!(
            destination_dir(&root, "alice", ContentType::Photo),
            PathBuf::from("/downloads/alice/images")
        );
        assert_eq!(
            destination_dir(&root, "alice", ContentType::AnimatedGif),
            PathBuf::from("/downloads/alice/gifs")
        );
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_backup_dir() {
        assert_eq!(
            backup_dir(Path::new("/tmp")),
            PathBuf::from("/tmp/xmedia-dl_backups")
        );
    }

    #[test]
    fn test_default_database_path_is_fixed() {
        let path = default_database_path();
        assert!(path.ends_with(".xmedia-dl/accounts.db"));
    }
}
