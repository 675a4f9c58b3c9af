//! Turning failed calls into [`NormalizedError`] values.

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::keys;
use crate::error::{ErrorDomain, NormalizedError};
use crate::logging::targets;
use crate::raw::{RawMap, RawResponse};

/// Names of the fields an API uses to declare an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseKeys {
    /// Envelope key around useful payloads.
    pub data: String,
    /// Numeric error code.
    pub error_code: String,
    /// Human-readable error message.
    pub error_message: String,
}

impl Default for ResponseKeys {
    fn default() -> Self {
        Self {
            data: keys::DATA.to_string(),
            error_code: keys::ERROR_CODE.to_string(),
            error_message: keys::ERROR_MESSAGE.to_string(),
        }
    }
}

/// Extract a server-declared `(code, message)` pair from a payload.
///
/// Both fields must be present. The code may be a JSON integer, a float with
/// no fractional part, or a string holding an integer; the message must be a
/// string. Sequences never carry an error.
pub fn extract_api_error(payload: &RawResponse, keys: &ResponseKeys) -> Option<(i64, String)> {
    extract_map_error(payload.as_map()?, keys)
}

/// [`extract_api_error`] for a bare mapping.
pub fn extract_map_error(map: &RawMap, keys: &ResponseKeys) -> Option<(i64, String)> {
    let code = parse_code(map.get(&keys.error_code)?)?;
    let message = map.get(&keys.error_message)?.as_str()?;
    Some((code, message.to_string()))
}

fn parse_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Builds one [`NormalizedError`] per failure under a fixed domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorNormalizer {
    domain: ErrorDomain,
    keys: ResponseKeys,
}

impl Default for ErrorNormalizer {
    fn default() -> Self {
        Self::new(ErrorDomain::default())
    }
}

impl ErrorNormalizer {
    /// A normalizer for `domain` using the default response keys.
    pub fn new(domain: ErrorDomain) -> Self {
        Self::with_keys(domain, ResponseKeys::default())
    }

    /// A normalizer with custom response keys.
    pub fn with_keys(domain: ErrorDomain, keys: ResponseKeys) -> Self {
        Self { domain, keys }
    }

    /// The domain assigned to server-declared errors.
    pub fn domain(&self) -> &ErrorDomain {
        &self.domain
    }

    /// The response keys in use.
    pub fn keys(&self) -> &ResponseKeys {
        &self.keys
    }

    /// A fallback error in this normalizer's domain.
    pub fn error(&self, code: i64, message: impl Into<String>) -> NormalizedError {
        NormalizedError::new(self.domain.clone(), code, message)
    }

    /// Normalize a failure.
    ///
    /// When `api_payload` declares both an error code and an error message,
    /// the result carries this normalizer's domain with that code and
    /// message, whatever the transport error says. Otherwise `fallback` is
    /// returned unchanged.
    pub fn normalize(
        &self,
        transport_error: &(dyn StdError + '_),
        api_payload: Option<&RawResponse>,
        fallback: NormalizedError,
    ) -> NormalizedError {
        match api_payload.and_then(|payload| extract_api_error(payload, &self.keys)) {
            Some((code, message)) => {
                tracing::debug!(
                    target: targets::NORMALIZE,
                    code,
                    transport = %transport_error,
                    "using server-declared error"
                );
                NormalizedError::new(self.domain.clone(), code, message)
            }
            None => {
                tracing::debug!(
                    target: targets::NORMALIZE,
                    transport = %transport_error,
                    fallback = %fallback,
                    "no structured error in payload"
                );
                fallback
            }
        }
    }
}
