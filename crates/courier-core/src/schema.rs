//! Entity schemas: how one typed entity is built from one mapping.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SchemaError;
use crate::raw::RawMap;

/// Describes how to construct one entity from one mapping.
///
/// Schemas are passed by reference to the mapper and are never retained.
pub trait EntitySchema {
    /// The entity type this schema produces.
    type Entity;

    /// Build an entity, or explain why the mapping is malformed.
    fn construct(&self, map: &RawMap) -> Result<Self::Entity, SchemaError>;
}

/// Types that know how to build themselves from a string-keyed mapping.
///
/// # Example
///
/// ```ignore
/// use courier_core::{FromRawMap, RawFields, RawMap, SchemaError};
///
/// struct Player { username: String, rating: i64 }
///
/// impl FromRawMap for Player {
///     fn from_raw_map(map: &RawMap) -> Result<Self, SchemaError> {
///         Ok(Self {
///             username: map.require_str("username")?.to_string(),
///             rating: map.require_i64("rating")?,
///         })
///     }
/// }
/// ```
pub trait FromRawMap: Sized {
    /// Build `Self` from `map`.
    fn from_raw_map(map: &RawMap) -> Result<Self, SchemaError>;
}

/// Schema for any [`FromRawMap`] type.
pub struct Schema<T>(PhantomData<fn() -> T>);

impl<T> Schema<T> {
    /// Create the schema.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Schema<T> {}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema<{}>", std::any::type_name::<T>())
    }
}

impl<T: FromRawMap> EntitySchema for Schema<T> {
    type Entity = T;

    fn construct(&self, map: &RawMap) -> Result<T, SchemaError> {
        T::from_raw_map(map)
    }
}

/// Schema for any `serde` deserializable type.
pub struct SerdeSchema<T>(PhantomData<fn() -> T>);

impl<T> SerdeSchema<T> {
    /// Create the schema.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeSchema<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SerdeSchema<T> {}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeSchema<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> EntitySchema for SerdeSchema<T> {
    type Entity = T;

    fn construct(&self, map: &RawMap) -> Result<T, SchemaError> {
        Ok(serde_json::from_value(Value::Object(map.clone()))?)
    }
}

/// Schema backed by a closure.
pub struct FnSchema<F, T> {
    f: F,
    _entity: PhantomData<fn() -> T>,
}

impl<F: Clone, T> Clone for FnSchema<F, T> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _entity: PhantomData,
        }
    }
}

impl<F, T> fmt::Debug for FnSchema<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSchema")
    }
}

impl<F, T> EntitySchema for FnSchema<F, T>
where
    F: Fn(&RawMap) -> Result<T, SchemaError>,
{
    type Entity = T;

    fn construct(&self, map: &RawMap) -> Result<T, SchemaError> {
        (self.f)(map)
    }
}

/// Build a schema from a closure.
pub fn schema_fn<F, T>(f: F) -> FnSchema<F, T>
where
    F: Fn(&RawMap) -> Result<T, SchemaError>,
{
    FnSchema {
        f,
        _entity: PhantomData,
    }
}

impl<S: EntitySchema + ?Sized> EntitySchema for &S {
    type Entity = S::Entity;

    fn construct(&self, map: &RawMap) -> Result<S::Entity, SchemaError> {
        (**self).construct(map)
    }
}
