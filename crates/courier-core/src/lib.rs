//! Response mapping and error normalization for Courier.
//!
//! This crate holds the pure half of the Courier API layer. It never performs
//! I/O; it transforms payloads that the HTTP client has already decoded:
//!
//! - **Entity mapping**: turn a decoded body (a mapping or a sequence of
//!   mappings) into typed entities through an [`EntitySchema`]
//! - **Error normalization**: turn a failed call into a single
//!   [`NormalizedError`] carrying a domain, a numeric code and a message
//! - **Constants**: HTTP method names, well-known response keys and
//!   notification names shared with the networking crate
//!
//! # Entity Mapping
//!
//! ```ignore
//! use courier_core::{map_entities, RawResponse, SerdeSchema};
//!
//! #[derive(serde::Deserialize)]
//! struct Game { id: u64, white: String, black: String }
//!
//! let raw = RawResponse::try_from(serde_json::json!([
//!     {"id": 1, "white": "anna", "black": "bob"},
//!     {"id": "broken"},
//! ]))?;
//!
//! // Malformed entries are skipped
//! let games: Vec<Game> = map_entities(&raw, &SerdeSchema::<Game>::new());
//! assert_eq!(games.len(), 1);
//! ```
//!
//! # Error Normalization
//!
//! ```ignore
//! use courier_core::{ErrorDomain, ErrorNormalizer, NormalizedError};
//!
//! let normalizer = ErrorNormalizer::new(ErrorDomain::default());
//! let fallback = NormalizedError::new(normalizer.domain().clone(), -1, "Request failed");
//! let error = normalizer.normalize(&transport_error, Some(&payload), fallback);
//! println!("{error}");
//! ```

pub mod constants;
mod error;
pub mod logging;
mod mapper;
mod normalize;
mod raw;
mod schema;

pub use constants::Notification;
pub use error::{ErrorDomain, MappingError, NormalizedError, RawShapeError, SchemaError, codes};
pub use mapper::{EntityMapper, MappingMode, MappingReport, map_entities};
pub use normalize::{ErrorNormalizer, ResponseKeys, extract_api_error, extract_map_error};
pub use raw::{RawFields, RawMap, RawResponse};
pub use schema::{EntitySchema, FnSchema, FromRawMap, Schema, SerdeSchema, schema_fn};

/// A specialized Result type for schema construction.
pub type Result<T> = std::result::Result<T, SchemaError>;
