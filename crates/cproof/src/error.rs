use std::path::PathBuf;

use cproof_core::rounds::RoundTransitionError;
use cproof_core::SchemaError;
use cproof_dictionary::DictionaryError;
use cproof_proof::ProofError;
use cproof_xref::XrefError;
use thiserror::Error;

/// Top-level error of the integration engine.
///
/// Per-file failures (analyzer timeouts, malformed artifacts) do not
/// surface here; they mark the file failed and the project continues.
/// What does surface is corruption of the project state itself.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Xref(#[from] XrefError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Round(#[from] RoundTransitionError),

    #[error("failed to build analysis worker pool: {0}")]
    Pool(String),

    #[error("artifact io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
