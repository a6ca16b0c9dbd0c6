//! Shared error taxonomy.
//!
//! Most errors live with the crate that raises them; what lives here is
//! the artifact schema error, because every crate that loads or saves
//! per-file artifacts reports malformed input the same way: the file is
//! fatal, the project is not.

use thiserror::Error;

/// A per-file artifact violated its schema.
///
/// Raising this marks the file as failed; the round controller excludes
/// failed files from later rounds and the project continues without
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {artifact} artifact for file '{file}': {detail}")]
pub struct SchemaError {
    /// Artifact kind, e.g. "predicate dictionary" or "spos".
    pub artifact: String,
    /// File the artifact belongs to.
    pub file: String,
    pub detail: String,
}

impl SchemaError {
    pub fn new(
        artifact: impl Into<String>,
        file: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        SchemaError {
            artifact: artifact.into(),
            file: file.into(),
            detail: detail.into(),
        }
    }
}
