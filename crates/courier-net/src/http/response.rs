//! HTTP response types.

use bytes::Bytes;
use courier_core::RawResponse;

use crate::error::Result;

/// An HTTP response from a request.
pub struct HttpResponse {
    inner: reqwest::Response,
}

impl HttpResponse {
    /// Create from a reqwest response.
    pub(crate) fn from_reqwest(response: reqwest::Response) -> Self {
        Self { inner: response }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &http::HeaderMap {
        self.inner.headers()
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.inner
            .headers()
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the Content-Length header value.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// Get the final URL after redirects.
    pub fn url(&self) -> &str {
        self.inner.url().as_str()
    }

    /// Get the response body as raw bytes.
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.inner.bytes().await?)
    }

    /// Decode the body into a raw payload.
    ///
    /// An empty (or all-whitespace) body decodes to `None`.
    pub async fn raw(self) -> Result<Option<RawResponse>> {
        let bytes = self.bytes().await?;
        decode_raw(&bytes)
    }

    /// Stream the body into `writer`, reporting progress after every chunk.
    ///
    /// Returns the number of bytes written.
    pub async fn download_to<W, F>(mut self, mut writer: W, mut on_progress: F) -> Result<u64>
    where
        W: std::io::Write,
        F: FnMut(TransferProgress),
    {
        let total_bytes = self.inner.content_length();
        let mut written = 0u64;

        while let Some(chunk) = self.inner.chunk().await? {
            writer.write_all(&chunk)?;
            written += chunk.len() as u64;
            on_progress(TransferProgress {
                bytes_transferred: written,
                total_bytes,
            });
        }

        writer.flush()?;
        Ok(written)
    }
}

/// Decode a body into a raw payload; empty bodies decode to `None`.
pub(crate) fn decode_raw(bytes: &[u8]) -> Result<Option<RawResponse>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(Some(RawResponse::try_from(value)?))
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status())
            .field("url", &self.url())
            .finish()
    }
}

/// Progress information for downloads/uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    /// Number of bytes transferred so far.
    pub bytes_transferred: u64,
    /// Total number of bytes, if known.
    pub total_bytes: Option<u64>,
}

impl TransferProgress {
    /// Get the progress as a fraction (0.0 to 1.0), if total is known.
    pub fn fraction(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                1.0
            } else {
                self.bytes_transferred as f64 / total as f64
            }
        })
    }

    /// Get the progress as a percentage (0 to 100), if total is known.
    pub fn percent(&self) -> Option<u8> {
        self.fraction().map(|f| (f * 100.0).min(100.0) as u8)
    }
}
