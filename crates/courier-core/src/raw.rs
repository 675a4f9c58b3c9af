//! Decoded, untyped response payloads.

use serde_json::Value;

use crate::error::{RawShapeError, SchemaError};

/// A string-keyed mapping of dynamically-typed values.
pub type RawMap = serde_json::Map<String, Value>;

/// A decoded response body: a single mapping or an ordered sequence of them.
///
/// Sequence entries are expected to be mappings. An entry that is not is a
/// malformed entry for the mapper to deal with, not a reason to reject the
/// whole payload.
#[derive(Clone, Debug, PartialEq)]
pub enum RawResponse {
    /// A single mapping.
    Map(RawMap),
    /// An ordered sequence of entries.
    Sequence(Vec<Value>),
}

impl RawResponse {
    /// An empty mapping, used for bodiless successful responses.
    pub fn empty() -> Self {
        Self::Map(RawMap::new())
    }

    /// Number of entries: the length for a sequence, 1 for a mapping with
    /// at least one key and 0 for an empty one, so `len() == 0` exactly when
    /// [`is_empty`](Self::is_empty) holds.
    pub fn len(&self) -> usize {
        match self {
            Self::Map(map) => usize::from(!map.is_empty()),
            Self::Sequence(entries) => entries.len(),
        }
    }

    /// Whether there is nothing to map.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(map) => map.is_empty(),
            Self::Sequence(entries) => entries.is_empty(),
        }
    }

    /// Look up a key in a mapping payload.
    ///
    /// Always `None` for sequences.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key),
            Self::Sequence(_) => None,
        }
    }

    /// The mapping, if this payload is one.
    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            Self::Map(map) => Some(map),
            Self::Sequence(_) => None,
        }
    }

    /// Unwrap an envelope such as `{"data": [...]}`.
    ///
    /// Returns the inner payload when `key` holds a mapping or a sequence,
    /// and gives back `self` unchanged otherwise.
    pub fn into_data(self, key: &str) -> Self {
        match self {
            Self::Map(mut map) => match map.remove(key) {
                Some(Value::Object(inner)) => Self::Map(inner),
                Some(Value::Array(inner)) => Self::Sequence(inner),
                Some(other) => {
                    map.insert(key.to_string(), other);
                    Self::Map(map)
                }
                None => Self::Map(map),
            },
            sequence => sequence,
        }
    }

    /// Convert back into a JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Map(map) => Value::Object(map),
            Self::Sequence(entries) => Value::Array(entries),
        }
    }
}

impl TryFrom<Value> for RawResponse {
    type Error = RawShapeError;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self::Map(map)),
            Value::Array(entries) => Ok(Self::Sequence(entries)),
            other => Err(RawShapeError {
                found: type_name(&other),
            }),
        }
    }
}

impl From<RawMap> for RawResponse {
    fn from(map: RawMap) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<RawMap>> for RawResponse {
    fn from(maps: Vec<RawMap>) -> Self {
        Self::Sequence(maps.into_iter().map(Value::Object).collect())
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

/// Typed field accessors over a [`RawMap`] for hand-written constructors.
///
/// `null` counts as missing.
pub trait RawFields {
    /// A required string field.
    fn require_str(&self, field: &str) -> Result<&str, SchemaError>;
    /// A required integer field.
    fn require_i64(&self, field: &str) -> Result<i64, SchemaError>;
    /// A required boolean field.
    fn require_bool(&self, field: &str) -> Result<bool, SchemaError>;
    /// An optional string field. Present with the wrong type is an error.
    fn optional_str(&self, field: &str) -> Result<Option<&str>, SchemaError>;
    /// An optional integer field. Present with the wrong type is an error.
    fn optional_i64(&self, field: &str) -> Result<Option<i64>, SchemaError>;
}

impl RawFields for RawMap {
    fn require_str(&self, field: &str) -> Result<&str, SchemaError> {
        self.optional_str(field)?
            .ok_or_else(|| SchemaError::missing(field))
    }

    fn require_i64(&self, field: &str) -> Result<i64, SchemaError> {
        self.optional_i64(field)?
            .ok_or_else(|| SchemaError::missing(field))
    }

    fn require_bool(&self, field: &str) -> Result<bool, SchemaError> {
        match self.get(field) {
            None | Some(Value::Null) => Err(SchemaError::missing(field)),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| SchemaError::invalid_field(field, "a boolean")),
        }
    }

    fn optional_str(&self, field: &str) -> Result<Option<&str>, SchemaError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(SchemaError::invalid_field(field, "a string")),
        }
    }

    fn optional_i64(&self, field: &str) -> Result<Option<i64>, SchemaError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| SchemaError::invalid_field(field, "an integer")),
        }
    }
}
