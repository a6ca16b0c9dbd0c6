//! JSON artifact store.
//!
//! Everything the engine persists lives under one results directory:
//! per-file state at `<name>.cproof.json`, the cross-reference table at
//! `xref.json`. Contracts and summaries are inputs, loaded from
//! wherever the configuration points; a missing contracts or summaries
//! file just means there are none.
//!
//! Per-file artifacts are derived state. `reset` deletes them so an
//! analysis can restart from parsed sources; it never touches anything
//! it did not write.

use std::fs;
use std::path::{Path, PathBuf};

use cproof_core::SchemaError;
use cproof_proof::{FunctionContract, LibrarySummary, SummaryIndex};
use cproof_xref::XrefTable;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::ProjectError;
use crate::project::CFile;

const FILE_SUFFIX: &str = ".cproof.json";
const XREF_NAME: &str = "xref.json";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", name, FILE_SUFFIX))
    }

    fn xref_path(&self) -> PathBuf {
        self.root.join(XREF_NAME)
    }

    fn write(&self, path: &Path, payload: &str) -> Result<(), ProjectError> {
        fs::create_dir_all(&self.root).map_err(|source| ProjectError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(path, payload).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read(&self, path: &Path) -> Result<String, ProjectError> {
        fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    // ==================== per-file state ====================

    pub fn save_file(&self, file: &CFile) -> Result<(), ProjectError> {
        let path = self.file_path(&file.name);
        let payload =
            serde_json::to_string_pretty(file).map_err(|e| schema("cfile", &file.name, e))?;
        self.write(&path, &payload)?;
        debug!(file = %file.name, path = %path.display(), "file state saved");
        Ok(())
    }

    pub fn load_file(&self, name: &str) -> Result<CFile, ProjectError> {
        let raw = self.read(&self.file_path(name))?;
        let file: CFile = serde_json::from_str(&raw).map_err(|e| schema("cfile", name, e))?;
        Ok(file)
    }

    // ==================== cross-reference table ====================

    pub fn save_xref(&self, xref: &XrefTable) -> Result<(), ProjectError> {
        let payload =
            serde_json::to_string_pretty(xref).map_err(|e| schema("xref", XREF_NAME, e))?;
        self.write(&self.xref_path(), &payload)
    }

    pub fn load_xref(&self) -> Result<XrefTable, ProjectError> {
        let raw = self.read(&self.xref_path())?;
        serde_json::from_str(&raw)
            .map_err(|e| schema("xref", XREF_NAME, e))
            .map_err(Into::into)
    }

    // ==================== contracts and summaries ====================

    /// Loads user contracts; `None` or a missing file yields no
    /// contracts.
    pub fn load_contracts(path: Option<&Path>) -> Result<Vec<FunctionContract>, ProjectError> {
        load_optional(path, "contracts")
    }

    /// Loads library summaries; `None` or a missing file yields an
    /// empty index.
    pub fn load_summaries(path: Option<&Path>) -> Result<SummaryIndex, ProjectError> {
        let summaries: Vec<LibrarySummary> = load_optional(path, "summaries")?;
        Ok(SummaryIndex::new(summaries))
    }

    // ==================== reset ====================

    /// Deletes the derived artifacts under the results directory.
    pub fn reset(&self) -> Result<(), ProjectError> {
        if !self.root.exists() {
            return Ok(());
        }
        let entries = fs::read_dir(&self.root).map_err(|source| ProjectError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut removed = 0u32;
        for entry in entries {
            let entry = entry.map_err(|source| ProjectError::Io {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == XREF_NAME || name.ends_with(FILE_SUFFIX) {
                fs::remove_file(&path).map_err(|source| ProjectError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed += 1;
            }
        }
        info!(root = %self.root.display(), removed, "derived artifacts reset");
        Ok(())
    }
}

fn load_optional<T: DeserializeOwned>(
    path: Option<&Path>,
    artifact: &str,
) -> Result<Vec<T>, ProjectError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    if !path.exists() {
        debug!(path = %path.display(), artifact, "no artifact file, nothing loaded");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values = serde_json::from_str(&raw)
        .map_err(|e| schema(artifact, &path.display().to_string(), e))?;
    Ok(values)
}

fn schema(artifact: &str, file: &str, e: serde_json::Error) -> SchemaError {
    SchemaError::new(artifact, file, e.to_string())
}
