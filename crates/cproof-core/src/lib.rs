//! Core types shared across the cproof workspace.
//!
//! This crate carries the pieces every other crate needs: the analysis
//! configuration, the strongly-typed identifier newtypes used by the
//! interning stores and the cross-reference table, the round-state
//! machine of the integration controller, and the shared error taxonomy
//! for artifact schema failures.

pub mod config;
pub mod error;
pub mod ids;
pub mod rounds;

pub use config::AnalysisConfig;
pub use error::SchemaError;
pub use ids::{
    ApiAssumptionId, ContextId, ExpId, FileId, GlobalCompKey, GlobalVarId, IfPredId, PoId, PredId,
    TypeId, VarId,
};
pub use rounds::{AnalysisOutcome, RoundState, RoundStats};
