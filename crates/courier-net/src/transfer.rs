//! Signed multipart uploads and streamed downloads.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use courier_core::logging::targets;
use courier_core::{NormalizedError, RawResponse};

use crate::error::{ApiResult, NetworkError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, Parameters, TransferProgress, param_pairs};
use crate::manager::{ApiManager, Failure};

/// Name of the form field carrying the upload signature.
pub const SIGNATURE_FIELD: &str = "signature";

type ProgressFn = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// A file to send with [`ApiManager::upload_file`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    /// Form field the file is sent under.
    pub field_name: String,
    /// File name reported to the server and mixed into the signature.
    pub file_name: String,
    /// MIME type of the part, if known.
    pub mime_type: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

impl FileUpload {
    /// A file sent under `field_name`.
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            mime_type: None,
            bytes: bytes.into(),
        }
    }

    /// Set the MIME type of the part.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ApiManager {
    /// Upload a file as a signed multipart POST to `path`.
    ///
    /// The parameters (plus the login token) become text fields, followed by
    /// a [`SIGNATURE_FIELD`] computed over them and then the file part.
    /// `on_progress` runs as the client library consumes the file; after a
    /// session refresh the upload restarts from zero.
    pub async fn upload_file<F>(
        &self,
        path: &str,
        params: &Parameters,
        upload: FileUpload,
        on_progress: F,
    ) -> ApiResult<RawResponse>
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        tracing::debug!(
            target: targets::TRANSFER,
            path,
            file = %upload.file_name,
            size = upload.len(),
            "uploading file"
        );

        let on_progress: ProgressFn = Arc::new(on_progress);
        let upload = &upload;
        self.dispatch(|| {
            let on_progress = on_progress.clone();
            async move { self.send_upload(path, params, upload, on_progress).await }
        })
        .await
    }

    async fn send_upload(
        &self,
        path: &str,
        params: &Parameters,
        upload: &FileUpload,
        on_progress: ProgressFn,
    ) -> Result<RawResponse, Failure> {
        let params = self.params_with_session(params);
        let signature = self.create_signature(path, &params, &upload.file_name, &upload.field_name);

        let form = param_pairs(&params)
            .into_iter()
            .fold(MultipartForm::new(), |form, (key, value)| form.text(key, value))
            .text(SIGNATURE_FIELD, signature)
            .file_bytes(
                upload.field_name.clone(),
                upload.bytes.clone(),
                upload.file_name.clone(),
                upload.mime_type.as_deref(),
                move |progress| on_progress(progress),
            )
            .map_err(|err| self.transport_failure(&err, None, None))?;

        let request = HttpRequest::new(HttpMethod::Post, self.url_for(path));
        match request.send_multipart(self.http_client(), form).await {
            Ok(response) => self.process_response(response).await,
            Err(err) => Err(self.transport_failure(&err, None, None)),
        }
    }

    /// Stream the resource at `url` into `writer`.
    ///
    /// `url` may be absolute or relative to the base URL. No login token is
    /// sent. Returns the number of bytes written.
    pub async fn download_file<W, F>(&self, url: &str, writer: W, on_progress: F) -> ApiResult<u64>
    where
        W: Write,
        F: FnMut(TransferProgress),
    {
        let response = self.start_download(url).await?;
        self.finish_download(url, response, writer, on_progress).await
    }

    /// Download the resource at `url` into a file at `path`.
    ///
    /// The file is only created once the server has answered successfully,
    /// and is removed again if the body fails midway, so a failed download
    /// leaves nothing behind.
    pub async fn download_to_path<F>(
        &self,
        url: &str,
        path: impl AsRef<Path>,
        on_progress: F,
    ) -> ApiResult<u64>
    where
        F: FnMut(TransferProgress),
    {
        let path = path.as_ref();
        let response = self.start_download(url).await?;
        let file = tokio::fs::File::create(path)
            .await
            .map_err(|err| self.io_error(err))?
            .into_std()
            .await;
        let result = self
            .finish_download(url, response, BufWriter::new(file), on_progress)
            .await;
        discard_partial_file(path, result).await
    }

    async fn start_download(&self, url: &str) -> ApiResult<HttpResponse> {
        let url = self.url_for(url);
        tracing::debug!(target: targets::TRANSFER, url = %url, "starting download");

        let response = HttpRequest::new(HttpMethod::Get, url)
            .send(self.http_client())
            .await
            .map_err(|err| self.transport_failure(&err, None, None).error)?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(self.status_failure(response).await.error)
        }
    }

    async fn finish_download<W, F>(
        &self,
        url: &str,
        response: HttpResponse,
        writer: W,
        on_progress: F,
    ) -> ApiResult<u64>
    where
        W: Write,
        F: FnMut(TransferProgress),
    {
        let written = response
            .download_to(writer, on_progress)
            .await
            .map_err(|err| self.transport_failure(&err, None, None).error)?;

        tracing::debug!(target: targets::TRANSFER, url, bytes = written, "download finished");
        Ok(written)
    }

    fn io_error(&self, err: std::io::Error) -> NormalizedError {
        self.transport_failure(&NetworkError::from(err), None, None)
            .error
    }
}

/// Remove the file behind a failed download; successful results pass through.
async fn discard_partial_file(path: &Path, result: ApiResult<u64>) -> ApiResult<u64> {
    if result.is_err()
        && let Err(err) = tokio::fs::remove_file(path).await
    {
        tracing::warn!(
            target: targets::TRANSFER,
            path = %path.display(),
            error = %err,
            "could not remove partial download"
        );
    }
    result
}
