//! Batch requests: several API calls in one round trip.
//!
//! The batch endpoint receives the shared parameters plus a `requests`
//! array, and answers with one entry per request, in the same order:
//!
//! ```text
//! POST /batch
//! {"loginToken": "...", "requests": [
//!     {"method": "GET", "url": "/games/1", "body": null},
//!     {"method": "POST", "url": "/games/1/moves", "body": {"move": "e4"}}
//! ]}
//!
//! [{"body": {"data": {...}}}, {"error_code": 7, "error_message": "Illegal move"}]
//! ```

use courier_core::constants::keys;
use courier_core::logging::targets;
use courier_core::{NormalizedError, RawResponse, codes, extract_api_error, extract_map_error};
use serde_json::Value;

use crate::error::ApiResult;
use crate::http::{HttpMethod, HttpRequest, Parameters};
use crate::manager::ApiManager;

/// Key of the request list in the batch body.
const REQUESTS_KEY: &str = "requests";
/// Key of the method in each batched request.
const METHOD_KEY: &str = "method";

/// One request inside a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchRequest {
    /// HTTP method of the sub-request.
    pub method: HttpMethod,
    /// Path relative to the API base URL.
    pub url: String,
    /// Parameters of the sub-request.
    pub body: Option<Parameters>,
}

impl BatchRequest {
    /// A sub-request without parameters.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    /// Attach parameters.
    pub fn with_body(mut self, body: Parameters) -> Self {
        self.body = Some(body);
        self
    }

    /// The JSON form sent to the batch endpoint.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(METHOD_KEY.to_string(), Value::from(self.method.as_str()));
        map.insert(keys::URL.to_string(), Value::from(self.url.as_str()));
        map.insert(
            keys::BODY.to_string(),
            self.body.clone().map(Value::Object).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }
}

/// Outcome of one sub-request.
pub type BatchOutcome = Result<RawResponse, NormalizedError>;

impl ApiManager {
    /// Execute several requests in one call to the batch endpoint.
    ///
    /// `params` are sent once for the whole batch, alongside the login
    /// token. Outcomes are returned in request order; one failed
    /// sub-request does not fail the others.
    pub async fn execute_batch(
        &self,
        params: &Parameters,
        requests: &[BatchRequest],
    ) -> ApiResult<Vec<BatchOutcome>> {
        tracing::debug!(target: targets::BATCH, count = requests.len(), "executing batch");

        let payload = self
            .dispatch(|| {
                let mut body = self.params_with_session(params);
                body.insert(
                    REQUESTS_KEY.to_string(),
                    Value::Array(requests.iter().map(BatchRequest::to_value).collect()),
                );
                let request = HttpRequest::with_json(
                    HttpMethod::Post,
                    self.url_for(&self.config().batch_path),
                    Value::Object(body),
                );
                async move { self.send(&request).await }
            })
            .await?
            .into_data(&self.config().response_keys.data);

        let entries = match payload {
            RawResponse::Sequence(entries) if entries.len() == requests.len() => entries,
            other => {
                tracing::warn!(
                    target: targets::BATCH,
                    expected = requests.len(),
                    received = other.len(),
                    "batch response does not match request count"
                );
                return Err(self.normalizer().error(
                    codes::BATCH_MISMATCH,
                    format!(
                        "expected {} batch entries, received {}",
                        requests.len(),
                        other.len()
                    ),
                ));
            }
        };

        Ok(entries
            .into_iter()
            .map(|entry| self.batch_outcome(entry))
            .collect())
    }

    fn batch_outcome(&self, entry: Value) -> BatchOutcome {
        let response_keys = &self.config().response_keys;

        let Value::Object(mut map) = entry else {
            return Err(self
                .normalizer()
                .error(codes::BATCH_ENTRY, "batch entry is not a mapping"));
        };

        let declared_error = |code: i64, message: String| {
            NormalizedError::new(self.error_domain().clone(), code, message)
        };

        if let Some((code, message)) = extract_map_error(&map, response_keys) {
            return Err(declared_error(code, message));
        }

        let entry = match map.remove(keys::BODY) {
            Some(Value::Object(body)) => RawResponse::Map(body),
            Some(Value::Array(body)) => RawResponse::Sequence(body),
            Some(scalar) => {
                map.insert(keys::BODY.to_string(), scalar);
                RawResponse::Map(map)
            }
            None => RawResponse::Map(map),
        };

        match extract_api_error(&entry, response_keys) {
            Some((code, message)) => Err(declared_error(code, message)),
            None => Ok(entry),
        }
    }
}
