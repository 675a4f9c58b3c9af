//! The API manager: request execution and response processing.
//!
//! # Example
//!
//! ```ignore
//! use courier_net::{ApiManager, HttpMethod, Parameters};
//! use courier_core::SerdeSchema;
//!
//! let api = ApiManager::builder("https://api.example.com/v1")
//!     .error_domain("com.example.api")
//!     .signing_secret("s3cret")
//!     .session_refresher(|| async { relogin().await.ok() })
//!     .build()?;
//!
//! api.set_login_token("abc123");
//!
//! // Raw payload
//! let raw = api.get("/games/live", &Parameters::new()).await?;
//!
//! // Typed entities, unwrapping the `data` envelope
//! let games: Vec<Game> = api
//!     .fetch_entities("/games/live", HttpMethod::Get, &Parameters::new(), &SerdeSchema::new())
//!     .await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use courier_core::constants::keys;
use courier_core::logging::targets;
use courier_core::{
    EntityMapper, EntitySchema, ErrorDomain, ErrorNormalizer, MappingMode, Notification,
    NormalizedError, RawResponse, ResponseKeys, codes, extract_api_error,
};
use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiResult, NetworkError, Result};
use crate::http::{HttpClient, HttpClientBuilder, HttpMethod, HttpRequest, HttpResponse, Parameters};
use crate::notification::NotificationCenter;
use crate::signature;

/// Re-establishes an expired session, yielding the new login token.
///
/// Returning `None` means the session could not be restored.
pub type SessionRefresher = Arc<dyn Fn() -> BoxFuture<'static, Option<String>> + Send + Sync>;

/// Configuration for the API manager.
///
/// Deserializable so it can live in an application settings file; every
/// field except `base_url` falls back to its default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL that request paths are appended to (no trailing slash).
    pub base_url: String,
    /// Domain assigned to every normalized error.
    pub error_domain: ErrorDomain,
    /// Field names used in API payloads.
    pub response_keys: ResponseKeys,
    /// Parameter name the login token is sent under.
    pub login_token_key: String,
    /// Path of the batch endpoint.
    pub batch_path: String,
    /// Secret mixed into upload signatures.
    pub signing_secret: Option<String>,
    /// How malformed entities are handled by [`ApiManager::fetch_entities`].
    pub mapping_mode: MappingMode,
    /// Status that signals maintenance mode.
    pub maintenance_status: u16,
    /// Status that signals an expired application version.
    pub version_expired_status: u16,
    /// Status that signals an expired session.
    pub session_expired_status: u16,
}

impl ApiConfig {
    /// Default configuration for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            error_domain: ErrorDomain::default(),
            response_keys: ResponseKeys::default(),
            login_token_key: keys::LOGIN_TOKEN.to_string(),
            batch_path: "/batch".to_string(),
            signing_secret: None,
            mapping_mode: MappingMode::Permissive,
            maintenance_status: 503,
            version_expired_status: 426,
            session_expired_status: 401,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Builder for creating an API manager.
pub struct ApiManagerBuilder {
    config: ApiConfig,
    http_client: Option<HttpClient>,
    http_client_builder: HttpClientBuilder,
    login_token: Option<String>,
    refresher: Option<SessionRefresher>,
    notifications: Option<NotificationCenter>,
}

impl ApiManagerBuilder {
    /// Create a new builder with the specified base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_config(ApiConfig::new(base_url))
    }

    /// Start from a complete configuration.
    pub fn from_config(config: ApiConfig) -> Self {
        Self {
            config,
            http_client: None,
            http_client_builder: HttpClientBuilder::default(),
            login_token: None,
            refresher: None,
            notifications: None,
        }
    }

    /// Use an existing HTTP client instead of creating a new one.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replace the settings used to build the HTTP client.
    ///
    /// Ignored when a client is supplied with [`Self::http_client`].
    pub fn http_client_builder(mut self, builder: HttpClientBuilder) -> Self {
        self.http_client_builder = builder;
        self
    }

    /// Set the per-request timeout. Timed out calls fail with
    /// [`codes::TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_client_builder = self.http_client_builder.timeout(timeout);
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http_client_builder = self.http_client_builder.user_agent(user_agent);
        self
    }

    /// Send `name: value` with every request, such as an app version.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_client_builder = self.http_client_builder.header(name, value);
        self
    }

    /// Set the error domain.
    pub fn error_domain(mut self, domain: impl Into<ErrorDomain>) -> Self {
        self.config.error_domain = domain.into();
        self
    }

    /// Set the field names used in API payloads.
    pub fn response_keys(mut self, keys: ResponseKeys) -> Self {
        self.config.response_keys = keys;
        self
    }

    /// Set the parameter name the login token is sent under.
    pub fn login_token_key(mut self, key: impl Into<String>) -> Self {
        self.config.login_token_key = key.into();
        self
    }

    /// Set the path of the batch endpoint.
    pub fn batch_path(mut self, path: impl Into<String>) -> Self {
        self.config.batch_path = path.into();
        self
    }

    /// Set the secret used to sign uploads.
    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.signing_secret = Some(secret.into());
        self
    }

    /// Set how malformed entities are handled.
    pub fn mapping_mode(mut self, mode: MappingMode) -> Self {
        self.config.mapping_mode = mode;
        self
    }

    /// Fail entity fetches on the first malformed entry.
    pub fn strict_mapping(self) -> Self {
        self.mapping_mode(MappingMode::Strict)
    }

    /// Set the status codes that trigger maintenance, version-expired and
    /// session-expired handling.
    pub fn status_codes(mut self, maintenance: u16, version_expired: u16, session_expired: u16) -> Self {
        self.config.maintenance_status = maintenance;
        self.config.version_expired_status = version_expired;
        self.config.session_expired_status = session_expired;
        self
    }

    /// Start with a login token.
    pub fn login_token(mut self, token: impl Into<String>) -> Self {
        self.login_token = Some(token.into());
        self
    }

    /// Set the callback used to restore an expired session.
    ///
    /// When a request fails with the session-expired status, the callback is
    /// awaited; a returned token replaces the current one and the request is
    /// sent once more.
    pub fn session_refresher<F, Fut>(mut self, refresher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        self.refresher = Some(Arc::new(move || {
            Box::pin(refresher()) as BoxFuture<'static, Option<String>>
        }));
        self
    }

    /// Share an existing notification center.
    pub fn notifications(mut self, center: NotificationCenter) -> Self {
        self.notifications = Some(center);
        self
    }

    /// Build the API manager.
    pub fn build(mut self) -> Result<ApiManager> {
        self.config.base_url = self.config.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&self.config.base_url)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => self.http_client_builder.build()?,
        };

        let normalizer =
            ErrorNormalizer::with_keys(self.config.error_domain.clone(), self.config.response_keys.clone());

        Ok(ApiManager {
            inner: Arc::new(ApiManagerInner {
                http_client,
                normalizer,
                mapper: EntityMapper::new(self.config.mapping_mode),
                config: self.config,
                login_token: RwLock::new(self.login_token),
                refresher: self.refresher,
                notifications: self.notifications.unwrap_or_default(),
            }),
        })
    }
}

struct ApiManagerInner {
    http_client: HttpClient,
    config: ApiConfig,
    normalizer: ErrorNormalizer,
    mapper: EntityMapper,
    login_token: RwLock<Option<String>>,
    refresher: Option<SessionRefresher>,
    notifications: NotificationCenter,
}

/// A failed attempt, before session handling decides whether to retry.
pub(crate) struct Failure {
    pub(crate) error: NormalizedError,
    pub(crate) status: Option<u16>,
}

/// The façade applications use to talk to the API.
///
/// Cheap to clone; clones share the HTTP client, the session and the
/// notification center.
#[derive(Clone)]
pub struct ApiManager {
    inner: Arc<ApiManagerInner>,
}

impl ApiManager {
    /// Create a new builder for configuring an API manager.
    pub fn builder(base_url: impl Into<String>) -> ApiManagerBuilder {
        ApiManagerBuilder::new(base_url)
    }

    /// The active configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// The error domain of every normalized error this manager returns.
    pub fn error_domain(&self) -> &ErrorDomain {
        self.inner.normalizer.domain()
    }

    /// The error normalizer in use.
    pub fn normalizer(&self) -> &ErrorNormalizer {
        &self.inner.normalizer
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &HttpClient {
        &self.inner.http_client
    }

    /// The notification center notifications are posted to.
    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    /// The current login token.
    pub fn login_token(&self) -> Option<String> {
        self.inner.login_token.read().clone()
    }

    /// Set the login token sent with every request.
    pub fn set_login_token(&self, token: impl Into<String>) {
        *self.inner.login_token.write() = Some(token.into());
    }

    /// Stop sending a login token.
    pub fn clear_login_token(&self) {
        *self.inner.login_token.write() = None;
    }

    /// Resolve a request path against the base URL.
    ///
    /// Absolute `http(s)://` URLs are returned unchanged.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.inner.config.base_url, path)
        } else {
            format!("{}/{}", self.inner.config.base_url, path)
        }
    }

    /// `params` plus the login token, when one is set.
    pub fn params_with_session(&self, params: &Parameters) -> Parameters {
        let mut params = params.clone();
        if let Some(token) = self.login_token() {
            params.insert(self.inner.config.login_token_key.clone(), Value::String(token));
        }
        params
    }

    /// Sign an upload with the configured secret.
    pub fn create_signature(
        &self,
        relative_path: &str,
        params: &Parameters,
        file_name: &str,
        file_field_name: &str,
    ) -> String {
        signature::create_signature(
            self.inner.config.signing_secret.as_deref().unwrap_or_default(),
            relative_path,
            params,
            file_name,
            file_field_name,
        )
    }

    /// Execute a request and return the decoded payload.
    ///
    /// GET and DELETE send `params` in the query string, POST and PUT as a
    /// URL-encoded form. Every failure, whether transport, HTTP status or
    /// an error declared in the body, is returned as a [`NormalizedError`].
    pub async fn execute(
        &self,
        path: &str,
        method: HttpMethod,
        params: &Parameters,
    ) -> ApiResult<RawResponse> {
        self.dispatch(|| {
            let request =
                HttpRequest::with_params(method, self.url_for(path), &self.params_with_session(params));
            async move { self.send(&request).await }
        })
        .await
    }

    /// Execute a GET request.
    pub async fn get(&self, path: &str, params: &Parameters) -> ApiResult<RawResponse> {
        self.execute(path, HttpMethod::Get, params).await
    }

    /// Execute a POST request.
    pub async fn post(&self, path: &str, params: &Parameters) -> ApiResult<RawResponse> {
        self.execute(path, HttpMethod::Post, params).await
    }

    /// Execute a PUT request.
    pub async fn put(&self, path: &str, params: &Parameters) -> ApiResult<RawResponse> {
        self.execute(path, HttpMethod::Put, params).await
    }

    /// Execute a DELETE request.
    pub async fn delete(&self, path: &str, params: &Parameters) -> ApiResult<RawResponse> {
        self.execute(path, HttpMethod::Delete, params).await
    }

    /// Execute a request and map its payload to entities.
    ///
    /// A `data` envelope is unwrapped first; an envelope holding `null` or
    /// any other non-container value yields no entities. In permissive mode
    /// malformed entries are dropped; in strict mode the first one fails the
    /// call with [`codes::MALFORMED_ENTITY`].
    pub async fn fetch_entities<S: EntitySchema>(
        &self,
        path: &str,
        method: HttpMethod,
        params: &Parameters,
        schema: &S,
    ) -> ApiResult<Vec<S::Entity>> {
        let data_key = &self.inner.config.response_keys.data;
        let payload = self.execute(path, method, params).await?;

        if payload.get(data_key).is_some_and(|data| !data.is_object() && !data.is_array()) {
            tracing::debug!(target: targets::MANAGER, path, "no entities in data envelope");
            return Ok(Vec::new());
        }
        let payload = payload.into_data(data_key);

        self.inner.mapper.map(&payload, schema).map_err(|err| {
            tracing::warn!(target: targets::MANAGER, path, error = %err, "malformed entity");
            self.inner.normalizer.error(codes::MALFORMED_ENTITY, err.to_string())
        })
    }

    /// Run attempts until one succeeds or session handling gives up.
    ///
    /// A session-expired failure triggers at most one refresh and one retry.
    pub(crate) async fn dispatch<F, Fut>(&self, attempt: F) -> ApiResult<RawResponse>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<RawResponse, Failure>>,
    {
        let failure = match attempt().await {
            Ok(payload) => return Ok(payload),
            Err(failure) => failure,
        };

        if failure.status != Some(self.inner.config.session_expired_status) {
            return Err(failure.error);
        }

        match self.refresh_session().await {
            Some(token) => {
                self.set_login_token(token);
                match attempt().await {
                    Ok(payload) => Ok(payload),
                    Err(retry) => {
                        if retry.status == Some(self.inner.config.session_expired_status) {
                            self.inner.notifications.post(Notification::ReloginFailed);
                        }
                        Err(retry.error)
                    }
                }
            }
            None => {
                self.inner.notifications.post(Notification::ReloginFailed);
                Err(failure.error)
            }
        }
    }

    async fn refresh_session(&self) -> Option<String> {
        let refresher = self.inner.refresher.as_ref()?;
        tracing::debug!(target: targets::MANAGER, "session expired, refreshing");
        refresher().await
    }

    /// Send one request and process its response.
    pub(crate) async fn send(&self, request: &HttpRequest) -> std::result::Result<RawResponse, Failure> {
        match request.send(&self.inner.http_client).await {
            Ok(response) => self.process_response(response).await,
            Err(err) => Err(self.transport_failure(&err, None, None)),
        }
    }

    /// Turn a response into a payload or a normalized failure.
    ///
    /// Statuses configured for maintenance and expired versions post their
    /// notification here.
    pub(crate) async fn process_response(
        &self,
        response: HttpResponse,
    ) -> std::result::Result<RawResponse, Failure> {
        if !response.is_success() {
            return Err(self.status_failure(response).await);
        }

        let status = response.status();
        let payload = match response.raw().await {
            Ok(payload) => payload.unwrap_or_else(RawResponse::empty),
            Err(err) => return Err(self.transport_failure(&err, None, Some(status))),
        };

        if let Some((code, message)) = extract_api_error(&payload, &self.inner.config.response_keys) {
            let error = NormalizedError::new(self.error_domain().clone(), code, message);
            tracing::warn!(target: targets::MANAGER, status, error = %error, "API error in successful response");
            return Err(Failure {
                error,
                status: Some(status),
            });
        }

        Ok(payload)
    }

    /// Normalize a response with a non-2xx status.
    ///
    /// The body is decoded on a best-effort basis so a server-declared error
    /// still wins over the status fallback.
    pub(crate) async fn status_failure(&self, response: HttpResponse) -> Failure {
        let status = response.status();
        self.post_status_notification(status);
        let payload = response.raw().await.ok().flatten();
        self.transport_failure(&NetworkError::http_status(status), payload.as_ref(), Some(status))
    }

    /// Normalize a transport-level failure.
    pub(crate) fn transport_failure(
        &self,
        err: &NetworkError,
        payload: Option<&RawResponse>,
        status: Option<u16>,
    ) -> Failure {
        let fallback = err.fallback(self.error_domain());
        let error = self.inner.normalizer.normalize(err, payload, fallback);
        tracing::warn!(
            target: targets::MANAGER,
            transport = %err,
            code = error.code(),
            message = error.message(),
            "request failed"
        );
        Failure { error, status }
    }

    fn post_status_notification(&self, status: u16) {
        let config = &self.inner.config;
        if status == config.maintenance_status {
            self.inner.notifications.post(Notification::Maintenance);
        } else if status == config.version_expired_status {
            self.inner.notifications.post(Notification::VersionExpired);
        }
    }
}

impl std::fmt::Debug for ApiManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiManager")
            .field("base_url", &self.inner.config.base_url)
            .field("error_domain", self.error_domain())
            .field("has_session", &self.inner.login_token.read().is_some())
            .field("has_refresher", &self.inner.refresher.is_some())
            .finish()
    }
}
