//! Cross-compilation-unit proof obligation integration.
//!
//! A sound C memory-safety analysis proves, per statement, a set of
//! primary proof obligations. Obligations a function cannot discharge
//! locally become api assumptions on its callers; this crate owns the
//! machinery that moves those assumptions across file boundaries:
//!
//! - the project state tying per-file dictionaries, per-function
//!   obligation stores and the cross-reference table together;
//! - the propagation engine that promotes candidate assumptions and
//!   instantiates callee interfaces as supporting obligations in each
//!   caller;
//! - the round controller alternating parallel per-file analysis with
//!   single-threaded integration until stabilization or a round budget
//!   runs out;
//! - the seam to the native analyzer binary, plus a JSON artifact
//!   store.

pub mod analyzer;
pub mod artifacts;
pub mod error;
pub mod project;
pub mod propagate;
pub mod rounds;
pub mod semantics;
pub mod subst;

pub use analyzer::{AnalyzerError, FileAnalysis, FileAnalyzer, FunctionAnalysis, NativeAnalyzer};
pub use artifacts::ArtifactStore;
pub use error::ProjectError;
pub use project::{CFile, FunctionState, GlobalAssumptions, Project};
pub use rounds::RoundController;
pub use semantics::{CallSite, CallTarget, Formal, FunctionSemantics};

pub use cproof_core::{AnalysisConfig, AnalysisOutcome, RoundState, RoundStats};
pub use cproof_proof::{PoStatus, SpoSite};
