//! Function semantics as the integration engine sees them.
//!
//! The frontend records, per function, its formals and every call site
//! with resolved targets and actual argument expressions. This record
//! is write-once: it is produced at parse time and never changes across
//! rounds, so call sites discovered in round 1 are the call sites of
//! every later round.

use cproof_core::{ContextId, ExpId, VarId};
use serde::{Deserialize, Serialize};

/// A formal parameter. `index` is 1-based, matching the `arg-val(i)`
/// terms of interface predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formal {
    pub index: u32,
    pub vid: VarId,
    pub name: String,
}

/// Who a call site calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallTarget {
    /// Call through a named function; the vid is file-local.
    Direct(VarId),
    /// Call through a function pointer, with the resolved candidate
    /// list recorded at parse time.
    Indirect { exp: ExpId, candidates: Vec<VarId> },
    /// Call to a function declared in a library header.
    Library { header: String, name: String },
}

/// One call site in a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub target: CallTarget,
    /// Actual argument expressions, in parameter order.
    pub args: Vec<ExpId>,
    /// Expression receiving the return value, when it is used.
    pub lhs: Option<ExpId>,
    /// Context of the call itself; callee assumptions instantiate here.
    pub call_context: ContextId,
    /// Context just after the call; callee guarantees instantiate here.
    pub return_context: ContextId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSemantics {
    pub name: String,
    pub vid: VarId,
    pub formals: Vec<Formal>,
    pub callsites: Vec<CallSite>,
}

impl FunctionSemantics {
    pub fn new(name: impl Into<String>, vid: VarId) -> Self {
        FunctionSemantics {
            name: name.into(),
            vid,
            formals: Vec::new(),
            callsites: Vec::new(),
        }
    }

    pub fn formal_by_index(&self, index: u32) -> Option<&Formal> {
        self.formals.iter().find(|f| f.index == index)
    }
}
