//! The shared `reqwest` client and the settings it is built with.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{NetworkError, Result};

/// Settings applied to every request the API manager sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Total time allowed for one request, body included.
    pub timeout: Duration,
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Extra headers sent with every request, such as an app version.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("Courier/{} (Rust)", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }
}

/// Builder for [`HttpClient`].
///
/// Header names and values are only validated by [`build`](Self::build), so
/// the builder chains without intermediate `Result`s.
#[derive(Clone, Debug, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// A builder with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Send `name: value` with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Build the client.
    ///
    /// Fails with [`NetworkError::InvalidHeader`] when a configured header
    /// is not a valid HTTP header.
    pub fn build(self) -> Result<HttpClient> {
        let mut headers = http::HeaderMap::with_capacity(self.config.headers.len());
        for (name, value) in &self.config.headers {
            headers.insert(
                http::HeaderName::try_from(name.as_str())?,
                http::HeaderValue::try_from(value.as_str())?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| NetworkError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClient {
            inner: Arc::new(HttpClientInner {
                client,
                config: self.config,
            }),
        })
    }
}

struct HttpClientInner {
    client: reqwest::Client,
    config: HttpClientConfig,
}

/// Handle to the HTTP client library.
///
/// Clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

impl HttpClient {
    /// Create a builder.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// The settings this client was built with.
    pub fn config(&self) -> &HttpClientConfig {
        &self.inner.config
    }

    pub(crate) fn reqwest_client(&self) -> &reqwest::Client {
        &self.inner.client
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .finish()
    }
}
