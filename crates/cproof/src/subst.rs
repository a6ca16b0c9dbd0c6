//! Instantiating interface predicates in a caller's dictionary.
//!
//! An interface predicate speaks about `arg-val(i)`, `return-value` and
//! linked globals. At a concrete call site those terms have concrete
//! expressions; substitution replaces exactly the symbolic terms and
//! leaves everything else untouched.

use cproof_core::{ExpId, FileId, GlobalVarId};
use cproof_dictionary::{
    BinOp, CFileDictionary, Constant, CTyp, DictionaryError, Exp, FileDeclarations, IntKind,
    Predicate, STerm, TypeSig, XPredicate,
};
use cproof_xref::XrefTable;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstError {
    #[error("predicate references parameter {index} but the call provides {provided} arguments")]
    MissingArgument { index: u32, provided: usize },

    #[error("predicate references the return value but the call result is unused")]
    NoReturnValue,

    #[error("global {gvid} is not declared in this file")]
    UnresolvedGlobal { gvid: GlobalVarId },

    /// Disjunctive predicates have no single-obligation rendering.
    #[error("cannot instantiate a disjunctive predicate as one obligation")]
    Disjunctive,

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// The concrete expressions a call site binds interface terms to.
#[derive(Debug, Clone, Copy)]
pub struct CallBinding<'a> {
    pub args: &'a [ExpId],
    pub lhs: Option<ExpId>,
}

/// Substitution into one caller file's dictionary.
pub struct Instantiator<'a> {
    dictionary: &'a mut CFileDictionary,
    declarations: &'a FileDeclarations,
    file: FileId,
    xref: &'a XrefTable,
}

impl<'a> Instantiator<'a> {
    pub fn new(
        dictionary: &'a mut CFileDictionary,
        declarations: &'a FileDeclarations,
        file: FileId,
        xref: &'a XrefTable,
    ) -> Self {
        Instantiator {
            dictionary,
            declarations,
            file,
            xref,
        }
    }

    /// The caller-side expression a symbolic term stands for.
    pub fn term_to_exp(
        &mut self,
        term: &STerm,
        binding: &CallBinding<'_>,
    ) -> Result<ExpId, SubstError> {
        match term {
            STerm::ArgValue(i) => binding
                .args
                .get((*i as usize).wrapping_sub(1))
                .copied()
                .ok_or(SubstError::MissingArgument {
                    index: *i,
                    provided: binding.args.len(),
                }),
            STerm::ReturnValue => binding.lhs.ok_or(SubstError::NoReturnValue),
            STerm::NumConstant(n) => Ok(self.dictionary.intern_exp(Exp::Const(Constant::Int(*n)))),
            STerm::GlobalValue(gvid) => {
                let vid = self
                    .xref
                    .vid_in_file(*gvid, self.file)
                    .ok_or(SubstError::UnresolvedGlobal { gvid: *gvid })?;
                Ok(self.dictionary.intern_exp(Exp::Var(vid)))
            }
            STerm::ArithmeticExpr { op, lhs, rhs } => {
                let lhs = self.term_to_exp(lhs, binding)?;
                let rhs = self.term_to_exp(rhs, binding)?;
                let typ = self.dictionary.intern_typ(CTyp::Int(IntKind::Int));
                Ok(self.dictionary.intern_exp(Exp::Binary {
                    op: *op,
                    lhs,
                    rhs,
                    typ,
                }))
            }
        }
    }

    /// Renders an interface predicate as a proof-obligation predicate
    /// over the binding's expressions.
    pub fn instantiate(
        &mut self,
        predicate: &XPredicate,
        binding: &CallBinding<'_>,
    ) -> Result<Predicate, SubstError> {
        let p = match predicate {
            XPredicate::NotNull(t) => Predicate::NotNull(self.term_to_exp(t, binding)?),
            XPredicate::Null(t) => Predicate::Null(self.term_to_exp(t, binding)?),
            XPredicate::NotZero(t) => Predicate::NotZero(self.term_to_exp(t, binding)?),
            XPredicate::NonNegative(t) => Predicate::NonNegative(self.term_to_exp(t, binding)?),
            XPredicate::ValidMem(t) => Predicate::ValidMem(self.term_to_exp(t, binding)?),
            XPredicate::GlobalAddress(t) => {
                Predicate::GlobalAddress(self.term_to_exp(t, binding)?)
            }
            XPredicate::HeapAddress(t) => Predicate::HeapAddress(self.term_to_exp(t, binding)?),
            XPredicate::AllocationBase(t) => {
                Predicate::AllocationBase(self.term_to_exp(t, binding)?)
            }
            XPredicate::NullTerminated(t) => {
                Predicate::NullTerminated(self.term_to_exp(t, binding)?)
            }
            XPredicate::InitializedRange { buffer, length } => Predicate::InitializedRange {
                exp: self.term_to_exp(buffer, binding)?,
                len: self.term_to_exp(length, binding)?,
            },
            XPredicate::Buffer { ptr, size } => Predicate::Buffer {
                exp: self.term_to_exp(ptr, binding)?,
                size: self.term_to_exp(size, binding)?,
            },
            // the caller-visible content of a fresh allocation is a
            // valid buffer of the allocated size
            XPredicate::NewMemory { ptr, size } => Predicate::Buffer {
                exp: self.term_to_exp(ptr, binding)?,
                size: self.term_to_exp(size, binding)?,
            },
            XPredicate::RelationalExpr { op, lhs, rhs } => {
                let lhs = self.term_to_exp(lhs, binding)?;
                let rhs = self.term_to_exp(rhs, binding)?;
                let typ = self.dictionary.intern_typ(CTyp::Int(IntKind::Int));
                let exp = self.dictionary.intern_exp(Exp::Binary {
                    op: *op,
                    lhs,
                    rhs,
                    typ,
                });
                Predicate::ValueConstraint(exp)
            }
            XPredicate::PreservedValue(t) => {
                Predicate::PreservedValue(self.term_to_exp(t, binding)?)
            }
            XPredicate::PreservedAllMemory => Predicate::PreservedAllMemory,
            XPredicate::Disjunction(_) => return Err(SubstError::Disjunctive),
        };
        Ok(p)
    }

    /// Checks that each actual bound to a parameter term carries a type
    /// compatible with the callee's formal. Returns a diagnostic for
    /// the first mismatch.
    pub fn check_types(
        &self,
        predicate: &XPredicate,
        binding: &CallBinding<'_>,
        formal_sigs: &[TypeSig],
    ) -> Result<Option<String>, SubstError> {
        let mut indices = Vec::new();
        for term in predicate.terms() {
            collect_arg_indices(term, &mut indices);
        }
        indices.sort_unstable();
        indices.dedup();
        for index in indices {
            let formal = match formal_sigs.get((index as usize).wrapping_sub(1)) {
                Some(sig) => sig,
                None => continue,
            };
            let actual = match binding.args.get((index as usize).wrapping_sub(1)) {
                Some(exp) => self.dictionary.exp_signature(self.declarations, *exp)?,
                None => continue,
            };
            if !formal.compatible(&actual) && !int_widening_ok(formal, &actual) {
                return Ok(Some(format!(
                    "actual argument {} has type {}, formal expects {}",
                    index, actual, formal
                )));
            }
        }
        Ok(None)
    }
}

fn collect_arg_indices(term: &STerm, out: &mut Vec<u32>) {
    match term {
        STerm::ArgValue(i) => out.push(*i),
        STerm::ArithmeticExpr { lhs, rhs, .. } => {
            collect_arg_indices(lhs, out);
            collect_arg_indices(rhs, out);
        }
        _ => {}
    }
}

/// Integer literals and narrower integers pass where a wider integer of
/// the same signedness is expected.
fn int_widening_ok(formal: &TypeSig, actual: &TypeSig) -> bool {
    match (formal, actual) {
        (TypeSig::Int(f), TypeSig::Int(a)) => f.is_signed() == a.is_signed(),
        _ => false,
    }
}

/// Relational operator rendering used when building violation reasons.
pub fn relation_text(op: BinOp) -> &'static str {
    match op {
        BinOp::Lt => "is less than",
        BinOp::Gt => "is greater than",
        BinOp::Le => "is at most",
        BinOp::Ge => "is greater than or equal to",
        BinOp::Eq => "equals",
        BinOp::Ne => "differs from",
        _ => "relates to",
    }
}
