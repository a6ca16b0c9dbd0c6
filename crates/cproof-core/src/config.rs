//! Analysis configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Immutable configuration threaded through the whole analysis.
///
/// One value is built up front and shared by the round controller, the
/// propagation engine and the native-analyzer seam. Defaults are chosen
/// so a small project analyzes out of the box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum number of analyze/integrate rounds before the controller
    /// gives up and reports `RoundLimitReached`.
    pub max_rounds: u32,
    /// Upper bound on concurrently analyzed files. 0 means one worker
    /// per available core.
    pub parallelism: usize,
    /// Target word size in bits (32 or 64); 0 leaves it to the analyzer.
    pub wordsize: u32,
    /// Path to the native analyzer binary.
    pub analyzer_path: Option<PathBuf>,
    /// Directory holding user-provided function contracts.
    pub contract_path: Option<PathBuf>,
    /// Directory holding library function summaries.
    pub summary_path: Option<PathBuf>,
    /// Abstract domains the native analyzer should run.
    pub domains: Vec<String>,
    /// Wall-clock budget for analyzing a single file in one round.
    pub file_timeout: Duration,
    /// Verbose output from the native analyzer.
    pub verbose: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            max_rounds: 8,
            parallelism: 1,
            wordsize: 0,
            analyzer_path: None,
            contract_path: None,
            summary_path: None,
            domains: vec!["intervals".to_string(), "linear-equalities".to_string()],
            file_timeout: Duration::from_secs(600),
            verbose: false,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers;
        self
    }

    pub fn with_wordsize(mut self, bits: u32) -> Self {
        self.wordsize = bits;
        self
    }

    pub fn with_analyzer_path(mut self, path: PathBuf) -> Self {
        self.analyzer_path = Some(path);
        self
    }

    pub fn with_contract_path(mut self, path: PathBuf) -> Self {
        self.contract_path = Some(path);
        self
    }

    pub fn with_summary_path(mut self, path: PathBuf) -> Self {
        self.summary_path = Some(path);
        self
    }

    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = timeout;
        self
    }

    /// Effective worker count for the per-file analysis pool.
    pub fn effective_parallelism(&self) -> usize {
        if self.parallelism == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.parallelism
        }
    }
}
