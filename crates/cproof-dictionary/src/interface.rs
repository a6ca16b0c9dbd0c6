//! Interface predicates: the vocabulary of api assumptions, guarantees,
//! user contracts and library summaries.
//!
//! Interface predicates are stated over symbolic terms (parameter
//! values, the return value, linked globals, constants) instead of
//! file-local expressions, so the same predicate can be instantiated in
//! any caller's dictionary by substituting actuals for formals.

use std::fmt;

use cproof_core::GlobalVarId;
use serde::{Deserialize, Serialize};

use crate::exprs::BinOp;

/// Symbolic term of an interface predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum STerm {
    /// Value of the i-th parameter, 1-based.
    ArgValue(u32),
    /// Value returned by the function.
    ReturnValue,
    NumConstant(i64),
    /// Value of a linked global variable.
    GlobalValue(GlobalVarId),
    ArithmeticExpr {
        op: BinOp,
        lhs: Box<STerm>,
        rhs: Box<STerm>,
    },
}

impl STerm {
    pub fn mentions_return(&self) -> bool {
        match self {
            STerm::ReturnValue => true,
            STerm::ArithmeticExpr { lhs, rhs, .. } => {
                lhs.mentions_return() || rhs.mentions_return()
            }
            _ => false,
        }
    }

    /// Largest parameter index referenced, 0 when none.
    pub fn max_arg_index(&self) -> u32 {
        match self {
            STerm::ArgValue(i) => *i,
            STerm::ArithmeticExpr { lhs, rhs, .. } => lhs.max_arg_index().max(rhs.max_arg_index()),
            _ => 0,
        }
    }
}

impl fmt::Display for STerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            STerm::ArgValue(i) => write!(f, "arg-val({})", i),
            STerm::ReturnValue => write!(f, "return-value"),
            STerm::NumConstant(n) => write!(f, "{}", n),
            STerm::GlobalValue(gvid) => write!(f, "global({})", gvid),
            STerm::ArithmeticExpr { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

/// An interface predicate. The same shape serves as an assumption a
/// function requires of its callers and as a guarantee it offers them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XPredicate {
    NotNull(STerm),
    Null(STerm),
    NotZero(STerm),
    NonNegative(STerm),
    ValidMem(STerm),
    GlobalAddress(STerm),
    HeapAddress(STerm),
    AllocationBase(STerm),
    NullTerminated(STerm),
    InitializedRange { buffer: STerm, length: STerm },
    Buffer { ptr: STerm, size: STerm },
    /// `ptr` points to a freshly allocated region of `size` bytes.
    NewMemory { ptr: STerm, size: STerm },
    RelationalExpr { op: BinOp, lhs: STerm, rhs: STerm },
    PreservedValue(STerm),
    PreservedAllMemory,
    /// At least one disjunct holds (library summaries use this for
    /// may-fail allocation).
    Disjunction(Vec<XPredicate>),
}

/// The structural slot an interface predicate occupies: its kind plus
/// its principal term. Contract precedence is resolved per slot, so a
/// user contract's `not-null(arg-val(1))` overrides exactly the
/// analyzer's `not-null(arg-val(1))` and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XSlot {
    pub kind: String,
    pub target: Option<STerm>,
}

impl XPredicate {
    pub fn kind_name(&self) -> &'static str {
        match self {
            XPredicate::NotNull(_) => "not-null",
            XPredicate::Null(_) => "null",
            XPredicate::NotZero(_) => "not-zero",
            XPredicate::NonNegative(_) => "non-negative",
            XPredicate::ValidMem(_) => "valid-mem",
            XPredicate::GlobalAddress(_) => "global-address",
            XPredicate::HeapAddress(_) => "heap-address",
            XPredicate::AllocationBase(_) => "allocation-base",
            XPredicate::NullTerminated(_) => "null-terminated",
            XPredicate::InitializedRange { .. } => "initialized-range",
            XPredicate::Buffer { .. } => "buffer",
            XPredicate::NewMemory { .. } => "new-memory",
            XPredicate::RelationalExpr { .. } => "relational-expr",
            XPredicate::PreservedValue(_) => "preserved-value",
            XPredicate::PreservedAllMemory => "preserved-all-memory",
            XPredicate::Disjunction(_) => "or",
        }
    }

    /// Terms in traversal order (disjunctions flatten their disjuncts).
    pub fn terms(&self) -> Vec<&STerm> {
        match self {
            XPredicate::NotNull(t)
            | XPredicate::Null(t)
            | XPredicate::NotZero(t)
            | XPredicate::NonNegative(t)
            | XPredicate::ValidMem(t)
            | XPredicate::GlobalAddress(t)
            | XPredicate::HeapAddress(t)
            | XPredicate::AllocationBase(t)
            | XPredicate::NullTerminated(t)
            | XPredicate::PreservedValue(t) => vec![t],
            XPredicate::InitializedRange { buffer, length } => vec![buffer, length],
            XPredicate::Buffer { ptr, size } => vec![ptr, size],
            XPredicate::NewMemory { ptr, size } => vec![ptr, size],
            XPredicate::RelationalExpr { lhs, rhs, .. } => vec![lhs, rhs],
            XPredicate::PreservedAllMemory => Vec::new(),
            XPredicate::Disjunction(ds) => ds.iter().flat_map(|d| d.terms()).collect(),
        }
    }

    pub fn mentions_return(&self) -> bool {
        self.terms().iter().any(|t| t.mentions_return())
    }

    /// Largest parameter index referenced anywhere in the predicate.
    pub fn max_arg_index(&self) -> u32 {
        self.terms()
            .iter()
            .map(|t| t.max_arg_index())
            .max()
            .unwrap_or(0)
    }

    pub fn slot(&self) -> XSlot {
        XSlot {
            kind: self.kind_name().to_string(),
            target: self.terms().first().map(|t| (*t).clone()),
        }
    }
}

impl fmt::Display for XPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPredicate::InitializedRange { buffer, length } => {
                write!(f, "initialized-range({},{})", buffer, length)
            }
            XPredicate::Buffer { ptr, size } => write!(f, "buffer({},{})", ptr, size),
            XPredicate::NewMemory { ptr, size } => write!(f, "new-memory({},{})", ptr, size),
            XPredicate::RelationalExpr { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            XPredicate::PreservedAllMemory => write!(f, "preserved-all-memory"),
            XPredicate::Disjunction(ds) => {
                write!(f, "or(")?;
                for (i, d) in ds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", d)?;
                }
                write!(f, ")")
            }
            other => {
                let terms = other.terms();
                write!(f, "{}(", other.kind_name())?;
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
        }
    }
}
