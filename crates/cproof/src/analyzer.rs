//! Seam to the native per-file analyzer.
//!
//! One round of per-file analysis runs the analyzer binary once per
//! active file and collects its verdicts: statuses for obligations it
//! settled locally, candidate api assumptions for obligations it could
//! not, and guarantees it derived about the function's effects. The
//! trait keeps the round controller independent of the binary, so tests
//! drive rounds with scripted analyzers.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use cproof_core::{AnalysisConfig, PoId, VarId};
use cproof_dictionary::XPredicate;
use cproof_proof::{CandidateAssumption, PoStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

use crate::project::CFile;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("no analyzer binary configured")]
    NotConfigured,

    #[error("analyzer timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("analyzer exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("analyzer io: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed analyzer results: {0}")]
    Results(String),
}

/// Verdicts for one function from one analysis round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionAnalysis {
    pub vid: VarId,
    /// Obligations the analyzer settled locally.
    pub discharges: Vec<(PoId, PoStatus)>,
    /// Assumptions that would discharge open obligations if committed.
    pub candidates: Vec<CandidateAssumption>,
    /// Guarantees derived about the function's return value and
    /// effects.
    pub guarantees: Vec<XPredicate>,
}

/// Verdicts for one file from one analysis round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub functions: Vec<FunctionAnalysis>,
}

/// A per-file analysis backend.
///
/// `analyze` runs concurrently across files; implementations must not
/// share mutable state between calls.
pub trait FileAnalyzer: Send + Sync {
    fn analyze(&self, file: &CFile, round: u32) -> Result<FileAnalysis, AnalyzerError>;
}

/// Drives the external analyzer binary and reads its results file.
#[derive(Debug, Clone)]
pub struct NativeAnalyzer {
    config: AnalysisConfig,
    results_dir: PathBuf,
}

impl NativeAnalyzer {
    pub fn new(config: AnalysisConfig, results_dir: PathBuf) -> Self {
        NativeAnalyzer {
            config,
            results_dir,
        }
    }

    fn results_path(&self, file: &CFile) -> PathBuf {
        self.results_dir.join(format!("{}.analysis.json", file.name))
    }

    fn build_command(&self, analyzer: &PathBuf, file: &CFile, round: u32) -> Command {
        let mut cmd = Command::new(analyzer);
        cmd.arg("-command")
            .arg("generate_and_check")
            .arg("-round")
            .arg(round.to_string())
            .arg("-cfile")
            .arg(&file.name)
            .arg("-resultsdir")
            .arg(&self.results_dir);
        for domain in &self.config.domains {
            cmd.arg("-domain").arg(domain);
        }
        if self.config.wordsize > 0 {
            cmd.arg("-wordsize").arg(self.config.wordsize.to_string());
        }
        if self.config.verbose {
            cmd.arg("-verbose");
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

impl FileAnalyzer for NativeAnalyzer {
    fn analyze(&self, file: &CFile, round: u32) -> Result<FileAnalysis, AnalyzerError> {
        let analyzer = self
            .config
            .analyzer_path
            .as_ref()
            .ok_or(AnalyzerError::NotConfigured)?;

        debug!(file = %file.name, round, "running analyzer");
        let mut child = self.build_command(analyzer, file, round).spawn()?;

        let status = match child.wait_timeout(self.config.file_timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::Timeout {
                    seconds: self.config.file_timeout.as_secs(),
                });
            }
        };
        if !status.success() {
            let output = child.wait_with_output()?;
            return Err(AnalyzerError::Failed {
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let path = self.results_path(file);
        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str(&raw)
            .map_err(|e| AnalyzerError::Results(format!("{}: {}", path.display(), e)))
    }
}
