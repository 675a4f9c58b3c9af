//! Signatures for multipart uploads.
//!
//! The server recomputes the digest from the same canonical string and the
//! shared secret, so the layout below is part of the wire contract:
//!
//! ```text
//! <secret>\n<path>\n<k1>=<v1>&<k2>=<v2>\n<file field>=<file name>
//! ```
//!
//! The path always has a leading slash and parameters are sorted by key.

use sha2::{Digest, Sha256};

use crate::http::{Parameters, param_to_string};

/// Build the canonical string that gets hashed.
pub fn canonical_string(
    secret: &str,
    relative_path: &str,
    params: &Parameters,
    file_name: &str,
    file_field_name: &str,
) -> String {
    let path = if relative_path.starts_with('/') {
        relative_path.to_string()
    } else {
        format!("/{relative_path}")
    };

    let mut pairs: Vec<(&str, String)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), param_to_string(v)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{secret}\n{path}\n{query}\n{file_field_name}={file_name}")
}

/// Sign an upload: lowercase hex SHA-256 of the canonical string.
pub fn create_signature(
    secret: &str,
    relative_path: &str,
    params: &Parameters,
    file_name: &str,
    file_field_name: &str,
) -> String {
    let canonical = canonical_string(secret, relative_path, params, file_name, file_field_name);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
