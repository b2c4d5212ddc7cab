// SPDX-License-Identifier: MPL-2.0
//! Streaming HTTP download of model weights.

use crate::config::defaults::{DOWNLOAD_USER_AGENT, MAX_DOWNLOAD_REDIRECTS};
use futures_util::StreamExt;
use std::io::Write;
use std::path::Path;

/// Errors that can occur while downloading a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    /// Connection, TLS or protocol failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The server sent no bytes.
    #[error("response body is empty")]
    EmptyBody,

    /// The body ended before the advertised length.
    #[error("response truncated: received {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },

    /// The local file could not be written.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Download progress: bytes received so far and the advertised total, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`, when the total is known.
    #[must_use]
    pub fn fraction(&self) -> Option<f32> {
        // Precision loss is fine for a progress display
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let fraction = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.downloaded as f64 / total as f64).min(1.0) as f32);
        fraction
    }
}

fn build_client() -> Result<reqwest::Client, DownloadError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_DOWNLOAD_REDIRECTS))
        .user_agent(DOWNLOAD_USER_AGENT)
        .build()
        .map_err(|e| DownloadError::Request(e.to_string()))
}

/// Streams `url` into the file at `destination`, replacing it.
///
/// Returns the number of bytes written. On any error the file at
/// `destination` is removed.
///
/// # Errors
///
/// Returns a [`DownloadError`] on network failure, a non-success status, an
/// empty body, a body shorter than its `Content-Length`, or a write error.
pub async fn download_file(
    url: &str,
    destination: &Path,
    progress_callback: impl FnMut(Progress) + Send,
) -> Result<u64, DownloadError> {
    let result = stream_to_file(url, destination, progress_callback).await;
    if result.is_err() {
        let _ = std::fs::remove_file(destination);
    }
    result
}

async fn stream_to_file(
    url: &str,
    destination: &Path,
    mut progress_callback: impl FnMut(Progress) + Send,
) -> Result<u64, DownloadError> {
    let client = build_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DownloadError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus(response.status().as_u16()));
    }

    let total = response.content_length();
    tracing::debug!(url, ?total, "download started");

    let mut file =
        std::fs::File::create(destination).map_err(|e| DownloadError::Io(e.to_string()))?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Request(e.to_string()))?;
        file.write_all(&chunk)
            .map_err(|e| DownloadError::Io(e.to_string()))?;
        downloaded += chunk.len() as u64;
        progress_callback(Progress { downloaded, total });
    }
    file.sync_all()
        .map_err(|e| DownloadError::Io(e.to_string()))?;

    if downloaded == 0 {
        return Err(DownloadError::EmptyBody);
    }
    if let Some(expected) = total {
        if downloaded < expected {
            return Err(DownloadError::Truncated {
                expected,
                received: downloaded,
            });
        }
    }
    Ok(downloaded)
}

#[cfg(test)]
pub(crate) mod test_server {
    //! Minimal one-shot HTTP responder for download tests.

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves `response` verbatim to the first connection and returns the URL.
    pub fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind listener");
        let addr = listener.local_addr().expect("listener has no address");
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(&response);
                let _ = stream.flush();
            }
        });
        format!("http://{addr}/model.onnx")
    }

    /// Builds a `200 OK` response advertising `content_length` bytes.
    pub fn ok_response(body: &[u8], content_length: usize) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n"
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    /// Builds a response with the given status line and no body.
    pub fn status_response(status: &str) -> Vec<u8> {
        format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{ok_response, serve_once, status_response};
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn downloads_body_and_reports_progress() {
        let body = vec![7u8; 2048];
        let url = serve_once(ok_response(&body, body.len()));
        let dir = tempdir().expect("failed to create temp dir");
        let destination = dir.path().join("model.onnx.part");

        let mut last = None;
        let bytes = download_file(&url, &destination, |p| last = Some(p))
            .await
            .expect("download should succeed");

        assert_eq!(bytes, 2048);
        assert_eq!(std::fs::read(&destination).expect("file written"), body);
        let last = last.expect("progress reported");
        assert_eq!(last.downloaded, 2048);
        assert_eq!(last.fraction(), Some(1.0));
    }

    #[tokio::test]
    async fn not_found_is_an_error_and_leaves_no_file() {
        let url = serve_once(status_response("404 Not Found"));
        let dir = tempdir().expect("failed to create temp dir");
        let destination = dir.path().join("model.onnx.part");

        let err = download_file(&url, &destination, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, DownloadError::HttpStatus(404));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let url = serve_once(ok_response(&[1u8; 100], 1000));
        let dir = tempdir().expect("failed to create temp dir");
        let destination = dir.path().join("model.onnx.part");

        let result = download_file(&url, &destination, |_| {}).await;
        assert!(result.is_err());
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let url = serve_once(ok_response(&[], 0));
        let dir = tempdir().expect("failed to create temp dir");
        let destination = dir.path().join("model.onnx.part");

        let err = download_file(&url, &destination, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, DownloadError::EmptyBody);
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn connection_refused_is_a_request_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr")
        };
        let dir = tempdir().expect("failed to create temp dir");
        let destination = dir.path().join("model.onnx.part");

        let err = download_file(&format!("http://{addr}/m"), &destination, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Request(_)));
    }

    #[test]
    fn fraction_is_none_without_total() {
        let progress = Progress {
            downloaded: 10,
            total: None,
        };
        assert_eq!(progress.fraction(), None);
    }
}
