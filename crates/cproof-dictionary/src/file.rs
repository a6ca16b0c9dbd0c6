//! The dictionary of one compilation unit.

use cproof_core::{ContextId, ExpId, IfPredId, PredId, TypeId, VarId};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::declarations::FileDeclarations;
use crate::error::DictionaryError;
use crate::exprs::{Constant, Exp};
use crate::interface::XPredicate;
use crate::predicates::Predicate;
use crate::table::IndexedTable;
use crate::types::{CTyp, IntKind, TypeSig};

/// An observed assignment to a global variable, recorded so the linker
/// and later analysis rounds can reason about cross-file data flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalAssignment {
    pub lhs: VarId,
    pub rhs: ExpId,
}

/// All interning tables of one file, plus typed accessors.
///
/// Ids handed out by one file's dictionary are meaningless in any other
/// file; cross-file traffic re-interns values on the receiving side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFileDictionary {
    types: IndexedTable<CTyp>,
    exps: IndexedTable<Exp>,
    contexts: IndexedTable<Context>,
    predicates: IndexedTable<Predicate>,
    interface: IndexedTable<XPredicate>,
    assignments: IndexedTable<GlobalAssignment>,
}

impl CFileDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== interning ====================

    pub fn intern_typ(&mut self, typ: CTyp) -> TypeId {
        TypeId(self.types.intern(typ))
    }

    pub fn intern_exp(&mut self, exp: Exp) -> ExpId {
        ExpId(self.exps.intern(exp))
    }

    pub fn intern_context(&mut self, context: Context) -> ContextId {
        ContextId(self.contexts.intern(context))
    }

    pub fn intern_predicate(&mut self, predicate: Predicate) -> PredId {
        PredId(self.predicates.intern(predicate))
    }

    pub fn intern_xpredicate(&mut self, xpredicate: XPredicate) -> IfPredId {
        IfPredId(self.interface.intern(xpredicate))
    }

    pub fn record_assignment(&mut self, assignment: GlobalAssignment) -> u32 {
        self.assignments.intern(assignment)
    }

    // ==================== lookup ====================

    pub fn typ(&self, id: TypeId) -> Result<&CTyp, DictionaryError> {
        self.types.get(id.0).ok_or(DictionaryError::UnknownId {
            table: "type",
            id: id.0,
        })
    }

    pub fn exp(&self, id: ExpId) -> Result<&Exp, DictionaryError> {
        self.exps.get(id.0).ok_or(DictionaryError::UnknownId {
            table: "expression",
            id: id.0,
        })
    }

    pub fn context(&self, id: ContextId) -> Result<&Context, DictionaryError> {
        self.contexts.get(id.0).ok_or(DictionaryError::UnknownId {
            table: "context",
            id: id.0,
        })
    }

    pub fn predicate(&self, id: PredId) -> Result<&Predicate, DictionaryError> {
        self.predicates.get(id.0).ok_or(DictionaryError::UnknownId {
            table: "predicate",
            id: id.0,
        })
    }

    pub fn xpredicate(&self, id: IfPredId) -> Result<&XPredicate, DictionaryError> {
        self.interface.get(id.0).ok_or(DictionaryError::UnknownId {
            table: "interface predicate",
            id: id.0,
        })
    }

    pub fn assignments(&self) -> impl Iterator<Item = &GlobalAssignment> {
        self.assignments.iter().map(|(_, a)| a)
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    // ==================== signatures ====================

    /// Structural signature of an interned type.
    pub fn type_signature(&self, id: TypeId) -> Result<TypeSig, DictionaryError> {
        match self.typ(id)? {
            CTyp::Void => Ok(TypeSig::Void),
            CTyp::Int(k) => Ok(TypeSig::Int(*k)),
            CTyp::Float(k) => Ok(TypeSig::Float(*k)),
            CTyp::Ptr(t) => Ok(TypeSig::Ptr(Box::new(self.type_signature(*t)?))),
            CTyp::Array { elem, size } => Ok(TypeSig::Array(
                Box::new(self.type_signature(*elem)?),
                *size,
            )),
            CTyp::Fun {
                rtype,
                formals,
                varargs,
            } => {
                let rtype = Box::new(self.type_signature(*rtype)?);
                let formals = formals
                    .iter()
                    .map(|t| self.type_signature(*t))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeSig::Fun {
                    rtype,
                    formals,
                    varargs: *varargs,
                })
            }
            CTyp::Comp { name, .. } => Ok(TypeSig::Comp(name.clone())),
            CTyp::Named(name) => Ok(TypeSig::Named(name.clone())),
        }
    }

    /// Signature of an expression's value type, resolving variables
    /// through the file's declarations.
    pub fn exp_signature(
        &self,
        decls: &FileDeclarations,
        id: ExpId,
    ) -> Result<TypeSig, DictionaryError> {
        match self.exp(id)? {
            Exp::Const(Constant::Int(_)) => Ok(TypeSig::Int(IntKind::Int)),
            Exp::Const(Constant::Str(_)) => {
                Ok(TypeSig::Ptr(Box::new(TypeSig::Int(IntKind::Char))))
            }
            Exp::Var(vid) => self.type_signature(decls.varinfo(*vid)?.typ),
            Exp::AddrOf(vid) => {
                let inner = self.type_signature(decls.varinfo(*vid)?.typ)?;
                Ok(TypeSig::Ptr(Box::new(inner)))
            }
            Exp::StartOf(vid) => match self.type_signature(decls.varinfo(*vid)?.typ)? {
                TypeSig::Array(elem, _) => Ok(TypeSig::Ptr(elem)),
                other => Ok(TypeSig::Ptr(Box::new(other))),
            },
            Exp::Unary { typ, .. } => self.type_signature(*typ),
            Exp::Binary { typ, .. } => self.type_signature(*typ),
            Exp::SizeOf(_) => Ok(TypeSig::Int(IntKind::ULong)),
            Exp::Cast { typ, .. } => self.type_signature(*typ),
        }
    }

    // ==================== rewriting ====================

    /// Re-interns `id` with every occurrence of `from` (at any depth)
    /// replaced by `to`. Unchanged subtrees keep their ids.
    pub fn exp_replace(
        &mut self,
        id: ExpId,
        from: ExpId,
        to: ExpId,
    ) -> Result<ExpId, DictionaryError> {
        if id == from {
            return Ok(to);
        }
        let exp = self.exp(id)?.clone();
        let rebuilt = match exp {
            Exp::Unary { op, operand, typ } => Exp::Unary {
                op,
                operand: self.exp_replace(operand, from, to)?,
                typ,
            },
            Exp::Binary { op, lhs, rhs, typ } => Exp::Binary {
                op,
                lhs: self.exp_replace(lhs, from, to)?,
                rhs: self.exp_replace(rhs, from, to)?,
                typ,
            },
            Exp::Cast { typ, operand } => Exp::Cast {
                typ,
                operand: self.exp_replace(operand, from, to)?,
            },
            leaf => return Ok(self.intern_exp(leaf)),
        };
        Ok(self.intern_exp(rebuilt))
    }

    /// Whether `exp` contains `target` at any depth.
    pub fn exp_contains(&self, exp: ExpId, target: ExpId) -> Result<bool, DictionaryError> {
        if exp == target {
            return Ok(true);
        }
        for sub in self.exp(exp)?.subexps() {
            if self.exp_contains(sub, target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ==================== rendering ====================

    pub fn exp_to_string(
        &self,
        decls: &FileDeclarations,
        id: ExpId,
    ) -> Result<String, DictionaryError> {
        let s = match self.exp(id)? {
            Exp::Const(Constant::Int(n)) => n.to_string(),
            Exp::Const(Constant::Str(s)) => format!("{:?}", s),
            Exp::Var(vid) => decls.varinfo(*vid)?.name.clone(),
            Exp::AddrOf(vid) => format!("&{}", decls.varinfo(*vid)?.name),
            Exp::StartOf(vid) => decls.varinfo(*vid)?.name.clone(),
            Exp::Unary { op, operand, .. } => {
                format!("{}{}", op, self.exp_to_string(decls, *operand)?)
            }
            Exp::Binary { op, lhs, rhs, .. } => format!(
                "({} {} {})",
                self.exp_to_string(decls, *lhs)?,
                op,
                self.exp_to_string(decls, *rhs)?
            ),
            Exp::SizeOf(t) => format!("sizeof({})", self.type_signature(*t)?),
            Exp::Cast { typ, operand } => format!(
                "({}){}",
                self.type_signature(*typ)?,
                self.exp_to_string(decls, *operand)?
            ),
        };
        Ok(s)
    }

    pub fn predicate_to_string(
        &self,
        decls: &FileDeclarations,
        id: PredId,
    ) -> Result<String, DictionaryError> {
        let predicate = self.predicate(id)?;
        let operands = predicate
            .exp_operands()
            .into_iter()
            .map(|e| self.exp_to_string(decls, e))
            .collect::<Result<Vec<_>, _>>()?;
        if operands.is_empty() {
            Ok(predicate.kind_name().to_string())
        } else {
            Ok(format!("{}({})", predicate.kind_name(), operands.join(",")))
        }
    }
}
