//! HTTP request types.

use std::str::FromStr;

use bytes::Bytes;
use courier_core::RawMap;
use courier_core::constants::{MULTIPART_MIME_TYPE, methods};
use courier_core::logging::targets;
use futures_util::stream;
use serde_json::Value;

use super::client::HttpClient;
use super::response::{HttpResponse, TransferProgress};
use crate::error::{NetworkError, Result};

/// Request parameters: a string-keyed mapping of JSON values.
pub type Parameters = RawMap;

/// HTTP request methods used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
}

impl HttpMethod {
    /// The method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => methods::GET,
            Self::Post => methods::POST,
            Self::Put => methods::PUT,
            Self::Delete => methods::DELETE,
        }
    }

    /// Whether parameters travel in the query string rather than the body.
    pub fn encodes_params_in_url(self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }

    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            methods::GET => Ok(Self::Get),
            methods::POST => Ok(Self::Post),
            methods::PUT => Ok(Self::Put),
            methods::DELETE => Ok(Self::Delete),
            other => Err(NetworkError::Request(format!("unsupported method '{other}'"))),
        }
    }
}

/// Render a parameter value the way it travels in URLs and form fields.
///
/// Strings are sent verbatim, `null` as an empty string, everything else in
/// compact JSON form.
pub fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flatten parameters into string pairs, preserving map order.
pub fn param_pairs(params: &Parameters) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), param_to_string(v)))
        .collect()
}

/// The body of an HTTP request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// URL-encoded form data.
    Form(Vec<(String, String)>),
    /// JSON body.
    Json(Value),
}

/// A built HTTP request ready to be sent.
///
/// Cloneable so a request can be replayed after the session is refreshed.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The absolute request URL.
    pub url: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
}

impl HttpRequest {
    /// A request with no parameters.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::None,
        }
    }

    /// A request carrying `params` in the query string (GET, DELETE) or as
    /// a URL-encoded form (POST, PUT).
    pub fn with_params(method: HttpMethod, url: impl Into<String>, params: &Parameters) -> Self {
        let mut request = Self::new(method, url);
        let pairs = param_pairs(params);
        if method.encodes_params_in_url() {
            request.query = pairs;
        } else if !pairs.is_empty() {
            request.body = RequestBody::Form(pairs);
        }
        request
    }

    /// A request with a JSON body.
    pub fn with_json(method: HttpMethod, url: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(method, url);
        request.body = RequestBody::Json(body);
        request
    }

    fn reqwest_builder(&self, client: &HttpClient) -> Result<reqwest::RequestBuilder> {
        let mut url = url::Url::parse(&self.url)?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(client.reqwest_client().request(self.method.to_reqwest(), url))
    }

    /// Send the request and wait for the response headers.
    pub async fn send(&self, client: &HttpClient) -> Result<HttpResponse> {
        tracing::debug!(target: targets::HTTP, method = %self.method, url = %self.url, "sending request");

        let mut builder = self.reqwest_builder(client)?;
        builder = match &self.body {
            RequestBody::None => builder,
            RequestBody::Form(pairs) => builder.form(pairs),
            RequestBody::Json(value) => builder.json(value),
        };

        let response = builder.send().await?;
        Ok(HttpResponse::from_reqwest(response))
    }

    /// Send the request with a multipart body instead of [`Self::body`].
    pub async fn send_multipart(
        &self,
        client: &HttpClient,
        form: MultipartForm,
    ) -> Result<HttpResponse> {
        tracing::debug!(
            target: targets::HTTP,
            method = %self.method,
            url = %self.url,
            mime = MULTIPART_MIME_TYPE,
            "sending multipart request"
        );

        let response = self
            .reqwest_builder(client)?
            .multipart(form.into_reqwest())
            .send()
            .await?;
        Ok(HttpResponse::from_reqwest(response))
    }
}

/// Size of the chunks a file part is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Multipart form data for file uploads.
pub struct MultipartForm {
    inner: reqwest::multipart::Form,
}

impl MultipartForm {
    /// Create a new empty multipart form.
    pub fn new() -> Self {
        Self {
            inner: reqwest::multipart::Form::new(),
        }
    }

    /// The boundary separating the parts.
    pub fn boundary(&self) -> &str {
        self.inner.boundary()
    }

    /// Add a text field to the form.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.text(name.into(), value.into());
        self
    }

    /// Add a file field from bytes.
    ///
    /// `on_progress` is called each time the client library pulls a chunk of
    /// the file into the request body.
    pub fn file_bytes<F>(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Bytes>,
        filename: impl Into<String>,
        mime_type: Option<&str>,
        mut on_progress: F,
    ) -> Result<Self>
    where
        F: FnMut(TransferProgress) + Send + Sync + 'static,
    {
        let bytes: Bytes = bytes.into();
        let total = bytes.len() as u64;

        let chunks: Vec<Bytes> = (0..bytes.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
            .collect();

        let mut sent = 0u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(TransferProgress {
                bytes_transferred: sent,
                total_bytes: Some(total),
            });
            Ok::<_, std::io::Error>(chunk)
        }));

        let mut part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(body),
            total,
        )
        .file_name(filename.into());

        if let Some(mime) = mime_type {
            part = part
                .mime_str(mime)
                .map_err(|e| NetworkError::InvalidHeader(format!("invalid mime type '{mime}': {e}")))?;
        }

        self.inner = self.inner.part(name.into(), part);
        Ok(self)
    }

    /// Convert to the internal reqwest form.
    pub(crate) fn into_reqwest(self) -> reqwest::multipart::Form {
        self.inner
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MultipartForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartForm")
            .field("boundary", &self.boundary())
            .finish()
    }
}
