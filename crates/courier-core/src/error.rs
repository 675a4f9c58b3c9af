//! Error types for entity mapping and the normalized API error.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::DEFAULT_ERROR_DOMAIN;

/// Well-known codes used when a failure carries no server-declared code.
///
/// Server codes are positive; these are all negative so the two ranges never
/// collide.
pub mod codes {
    /// Nothing more specific is known.
    pub const UNKNOWN: i64 = -1;
    /// The request was cancelled before completion.
    pub const CANCELLED: i64 = -999;
    /// The request timed out.
    pub const TIMEOUT: i64 = -1001;
    /// The server could not be reached.
    pub const CONNECTION: i64 = -1004;
    /// The response body could not be decoded.
    pub const DECODE: i64 = -1016;
    /// An entity could not be built in strict mapping mode.
    pub const MALFORMED_ENTITY: i64 = -2001;
    /// A batched sub-request failed without a server error payload.
    pub const BATCH_ENTRY: i64 = -2002;
    /// A batch response did not contain one entry per request.
    pub const BATCH_MISMATCH: i64 = -2003;
    /// Local I/O failed during a transfer.
    pub const IO: i64 = -3001;
}

/// Identifier of the namespace an error belongs to.
///
/// Cloning is cheap; the string is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ErrorDomain(Arc<str>);

impl ErrorDomain {
    /// Create a domain from any string.
    pub fn new(domain: impl AsRef<str>) -> Self {
        Self(Arc::from(domain.as_ref()))
    }

    /// The domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ErrorDomain {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_DOMAIN)
    }
}

impl fmt::Debug for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorDomain {
    fn from(domain: &str) -> Self {
        Self::new(domain)
    }
}

impl From<String> for ErrorDomain {
    fn from(domain: String) -> Self {
        Self(Arc::from(domain))
    }
}

impl Serialize for ErrorDomain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorDomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// The single error value surfaced for a failed API call.
///
/// Built once per failure and never mutated; the fields are only readable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("{domain} ({code}): {message}")]
pub struct NormalizedError {
    domain: ErrorDomain,
    code: i64,
    message: String,
}

impl NormalizedError {
    /// Create a normalized error.
    pub fn new(domain: ErrorDomain, code: i64, message: impl Into<String>) -> Self {
        Self {
            domain,
            code,
            message: message.into(),
        }
    }

    /// Create an error with [`codes::UNKNOWN`].
    pub fn unknown(domain: ErrorDomain, message: impl Into<String>) -> Self {
        Self::new(domain, codes::UNKNOWN, message)
    }

    /// The namespace this error belongs to.
    pub fn domain(&self) -> &ErrorDomain {
        &self.domain
    }

    /// The numeric code.
    pub fn code(&self) -> i64 {
        self.code
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A decoded body that is neither a mapping nor a sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a mapping or a sequence of mappings, found {found}")]
pub struct RawShapeError {
    /// JSON type name of the rejected value.
    pub found: &'static str,
}

/// Failure to construct one entity from one mapping.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A required field is absent or null.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A field is present but has the wrong type or an invalid value.
    #[error("invalid field '{field}': expected {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    /// A sequence entry is not a mapping.
    #[error("entry is not a mapping")]
    NotAMapping,

    /// Serde rejected the mapping.
    #[error("{0}")]
    Deserialize(String),

    /// Custom validation failure.
    #[error("{0}")]
    Invalid(String),
}

impl SchemaError {
    /// Create a missing-field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an invalid-field error.
    pub fn invalid_field(field: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected,
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialize(err.to_string())
    }
}

/// A strict mapping stopped at a malformed entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("entry {index} is malformed: {source}")]
pub struct MappingError {
    /// Position of the entry in the input.
    pub index: usize,
    /// Why the entry was rejected.
    #[source]
    pub source: SchemaError,
}
