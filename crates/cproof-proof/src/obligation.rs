//! The proof obligation record.

use cproof_core::{ApiAssumptionId, ContextId, PoId, PredId};
use serde::{Deserialize, Serialize};

use crate::status::PoStatus;

/// Which boundary a supporting obligation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpoSite {
    /// Instantiated from a callee assumption at a call site.
    Callsite,
    /// Instantiated from a callee guarantee just after a call.
    Returnsite,
    /// Datastructure or other non-boundary supporting condition.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoKind {
    /// Generated from the statements of the function at parse time.
    Primary,
    /// Added by the integration engine during a round.
    Supporting(SpoSite),
}

/// One proof obligation: a predicate that must hold at a context.
///
/// The predicate and context ids refer to the dictionary of the file
/// the owning function lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofObligation {
    pub id: PoId,
    pub predicate: PredId,
    pub context: ContextId,
    pub kind: PoKind,
    pub status: PoStatus,
    /// Api assumptions this obligation's discharge depends on.
    pub dependencies: Vec<ApiAssumptionId>,
    /// Explanation attached when something kept the obligation open,
    /// e.g. a substitution type mismatch.
    pub diagnostic: Option<String>,
}

impl ProofObligation {
    pub fn new(id: PoId, predicate: PredId, context: ContextId, kind: PoKind) -> Self {
        ProofObligation {
            id,
            predicate,
            context,
            kind,
            status: PoStatus::Open,
            dependencies: Vec::new(),
            diagnostic: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.kind, PoKind::Primary)
    }

    pub fn indicator(&self) -> &'static str {
        self.status.indicator()
    }
}
