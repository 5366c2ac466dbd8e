//! Post-download metadata embedding.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::fs::extract_original_filename;
use crate::media::WorkItem;

/// Values written into a downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    pub permalink: String,
    pub source_url: String,
    pub description: Option<String>,
    pub original_filename: Option<String>,
}

impl MediaMetadata {
    pub fn from_item(item: &WorkItem) -> Self {
        Self {
            permalink: item.permalink(),
            source_url: item.url.clone(),
            description: item
                .content
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            original_filename: item
                .original_filename
                .clone()
                .or_else(|| extract_original_filename(&item.url)),
        }
    }
}

/// Hook run after a media file is in place.
///
/// Failures are reported but never change the task's outcome.
#[async_trait]
pub trait MetadataEmbedder: Send + Sync {
    async fn embed(&self, path: &Path, metadata: &MediaMetadata) -> Result<()>;
}

/// Leaves files untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmbedder;

#[async_trait]
impl MetadataEmbedder for NoopEmbedder {
    async fn embed(&self, _path: &Path, _metadata: &MediaMetadata) -> Result<()> {
        Ok(())
    }
}

/// Writes tags with an external `exiftool` binary.
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn tag_args(path: &Path, metadata: &MediaMetadata) -> Vec<String> {
        let mut args = vec![
            "-overwrite_original".to_string(),
            "-q".to_string(),
            format!("-XMP-dc:Source={}", metadata.permalink),
            format!("-Comment={}", metadata.source_url),
        ];
        if let Some(description) = &metadata.description {
            args.push(format!("-Description={}", description));
        }
        if let Some(original) = &metadata.original_filename {
            args.push(format!("-XMP-dc:Identifier={}", original));
        }
        args.push(path.to_string_lossy().into_owned());
        args
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

#[async_trait]
impl MetadataEmbedder for ExifTool {
    async fn embed(&self, path: &Path, metadata: &MediaMetadata) -> Result<()> {
        let output = Command::new(&self.program)
            .args(Self::tag_args(path, metadata))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Metadata(format!("{} not found", self.program.display()))
                } else {
                    Error::Metadata(format!("Failed to run {}: {}", self.program.display(), e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Metadata(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
