//! Proof obligation status.

use std::fmt;

use cproof_core::ApiAssumptionId;
use serde::{Deserialize, Serialize};

/// Discharge state of a proof obligation.
///
/// An obligation starts `Open` and moves to exactly one closed status;
/// closed statuses never revert. `SafeApi` carries the assumption the
/// discharge is conditional on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoStatus {
    Open,
    /// Discharged by the statement itself, independent of any context.
    SafeStatement,
    /// Discharged by function-local invariants.
    SafeLocal,
    /// Discharged conditionally on an api assumption.
    SafeApi { assumption: ApiAssumptionId },
    /// Shown unsafe; the reason is a human-readable explanation.
    Violation { reason: String },
}

impl PoStatus {
    /// One-glyph indicator used in obligation listings.
    pub fn indicator(&self) -> &'static str {
        match self {
            PoStatus::Open => "<?>",
            PoStatus::SafeStatement => "<S>",
            PoStatus::SafeLocal => "<L>",
            PoStatus::SafeApi { .. } => "<A>",
            PoStatus::Violation { .. } => "<*>",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PoStatus::Open)
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            PoStatus::SafeStatement | PoStatus::SafeLocal | PoStatus::SafeApi { .. }
        )
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, PoStatus::Violation { .. })
    }
}

impl fmt::Display for PoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoStatus::Open => write!(f, "open"),
            PoStatus::SafeStatement => write!(f, "safe (statement)"),
            PoStatus::SafeLocal => write!(f, "safe (local)"),
            PoStatus::SafeApi { assumption } => write!(f, "safe (api:{})", assumption),
            PoStatus::Violation { reason } => write!(f, "violation: {}", reason),
        }
    }
}
