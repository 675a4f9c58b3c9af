//! Mapping decoded payloads to typed entities.
//!
//! The default policy is permissive: a malformed entry is skipped and the
//! rest of the payload is still mapped. Callers that cannot tolerate silent
//! drops either switch to [`MappingMode::Strict`] or use
//! [`EntityMapper::map_with_report`] to see which entries were rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MappingError, SchemaError};
use crate::logging::targets;
use crate::raw::{RawMap, RawResponse};
use crate::schema::EntitySchema;

/// What to do with an entry that the schema rejects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// Skip the entry and keep going.
    #[default]
    Permissive,
    /// Fail the whole mapping at the first malformed entry.
    Strict,
}

/// Entities produced by a permissive mapping together with what was dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct MappingReport<T> {
    /// Successfully built entities, in input order.
    pub entities: Vec<T>,
    /// Index and reason for every skipped entry, in input order.
    pub skipped: Vec<(usize, SchemaError)>,
}

impl<T> MappingReport<T> {
    /// Whether every entry produced an entity.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Maps raw payloads to entities according to a [`MappingMode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityMapper {
    mode: MappingMode,
}

impl EntityMapper {
    /// A mapper with the given mode.
    pub const fn new(mode: MappingMode) -> Self {
        Self { mode }
    }

    /// A mapper that skips malformed entries.
    pub const fn permissive() -> Self {
        Self::new(MappingMode::Permissive)
    }

    /// A mapper that fails on the first malformed entry.
    pub const fn strict() -> Self {
        Self::new(MappingMode::Strict)
    }

    /// The configured mode.
    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    /// Map a mapping or a sequence of mappings.
    ///
    /// In permissive mode this never returns `Err`.
    pub fn map<S: EntitySchema>(
        &self,
        collection: &RawResponse,
        schema: &S,
    ) -> Result<Vec<S::Entity>, MappingError> {
        match collection {
            RawResponse::Map(map) => self.map_mapping(map, schema),
            RawResponse::Sequence(entries) => self.map_sequence(entries, schema),
        }
    }

    /// Map a single mapping to zero or one entity.
    pub fn map_mapping<S: EntitySchema>(
        &self,
        map: &RawMap,
        schema: &S,
    ) -> Result<Vec<S::Entity>, MappingError> {
        self.collect(std::iter::once(Ok(map)), schema)
    }

    /// Map each entry of a sequence, preserving order.
    pub fn map_sequence<S: EntitySchema>(
        &self,
        entries: &[Value],
        schema: &S,
    ) -> Result<Vec<S::Entity>, MappingError> {
        self.collect(entries.iter().map(as_mapping), schema)
    }

    /// Map permissively and report the skipped entries.
    ///
    /// The configured mode is ignored; nothing fails.
    pub fn map_with_report<S: EntitySchema>(
        &self,
        collection: &RawResponse,
        schema: &S,
    ) -> MappingReport<S::Entity> {
        let mut report = MappingReport {
            entities: Vec::with_capacity(collection.len()),
            skipped: Vec::new(),
        };

        for (index, entry) in entries(collection).enumerate() {
            match entry.and_then(|map| schema.construct(map)) {
                Ok(entity) => report.entities.push(entity),
                Err(source) => report.skipped.push((index, source)),
            }
        }

        report
    }

    fn collect<'a, S, I>(&self, entries: I, schema: &S) -> Result<Vec<S::Entity>, MappingError>
    where
        S: EntitySchema,
        I: Iterator<Item = Result<&'a RawMap, SchemaError>>,
    {
        let mut entities = Vec::with_capacity(entries.size_hint().0);

        for (index, entry) in entries.enumerate() {
            match entry.and_then(|map| schema.construct(map)) {
                Ok(entity) => entities.push(entity),
                Err(source) => match self.mode {
                    MappingMode::Permissive => {
                        tracing::debug!(
                            target: targets::MAPPER,
                            index,
                            error = %source,
                            "skipping malformed entry"
                        );
                    }
                    MappingMode::Strict => return Err(MappingError { index, source }),
                },
            }
        }

        Ok(entities)
    }
}

/// Map a payload permissively.
///
/// Produces at most one entity per entry, in input order. Malformed entries
/// are skipped; the call itself never fails.
pub fn map_entities<S: EntitySchema>(collection: &RawResponse, schema: &S) -> Vec<S::Entity> {
    EntityMapper::permissive()
        .map(collection, schema)
        .unwrap_or_default()
}

fn as_mapping(value: &Value) -> Result<&RawMap, SchemaError> {
    value.as_object().ok_or(SchemaError::NotAMapping)
}

fn entries(
    collection: &RawResponse,
) -> Box<dyn Iterator<Item = Result<&RawMap, SchemaError>> + '_> {
    match collection {
        RawResponse::Map(map) => Box::new(std::iter::once(Ok(map))),
        RawResponse::Sequence(values) => Box::new(values.iter().map(as_mapping)),
    }
}
