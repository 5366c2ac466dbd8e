//! Streaming a single URL to disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Suffix of in-flight files.
pub const PART_SUFFIX: &str = ".part";

/// Temporary path used while `dest` is being written.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Download `url` into `dest` and return the number of bytes written.
///
/// Bytes go to `<dest>.part` first and are renamed into place only after the
/// whole body arrived, so `dest` never holds a partial file. Non-2xx
/// responses are errors. On any failure, including cancellation, the part
/// file is removed.
pub async fn fetch_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<u64> {
    let part = part_path(dest);

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        r = stream_to(client, url, &part) => r,
    };

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&part, dest).await?;
            Ok(bytes)
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("Could not remove {}: {}", part.display(), rm);
                }
            }
            Err(e)
        }
    }
}

async fn stream_to(client: &Client, url: &str, part: &Path) -> Result<u64> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let mut file = File::create(part).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{build_client, REQUEST_TIMEOUT};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/tmp/a/b_01.jpg")),
            PathBuf::from("/tmp/a/b_01.jpg.part")
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("a.jpg");
        let client = build_client(None, REQUEST_TIMEOUT).unwrap();

        let bytes = fetch_to_file(
            &client,
            &format!("{}/media/a.jpg", server.uri()),
            &dest,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpegdata");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_non_success_status_leaves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("missing.jpg");
        let client = build_client(None, REQUEST_TIMEOUT).unwrap();

        let err = fetch_to_file(&client, &server.uri(), &dest, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("never.jpg");
        let client = build_client(None, REQUEST_TIMEOUT).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetch_to_file(&client, "http://127.0.0.1:9/x", &dest, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(!dest.exists());
    }
}
