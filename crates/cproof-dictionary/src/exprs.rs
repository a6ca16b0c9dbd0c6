//! Expressions as interned in one file's dictionary.

use std::fmt;

use cproof_core::{ExpId, TypeId, VarId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    BNot,
    LNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BinOp {
    PlusA,
    PlusPI,
    MinusA,
    MinusPI,
    Mult,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BAnd,
    BXor,
    BOr,
    LAnd,
    LOr,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::PlusA | BinOp::PlusPI => "+",
            BinOp::MinusA | BinOp::MinusPI => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BAnd => "&",
            BinOp::BXor => "^",
            BinOp::BOr => "|",
            BinOp::LAnd => "&&",
            BinOp::LOr => "||",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnOp::Neg => "-",
            UnOp::BNot => "~",
            UnOp::LNot => "!",
        };
        write!(f, "{}", s)
    }
}

/// An expression node. Subexpressions are referenced by id into the
/// same file's dictionary, so sharing is structural and automatic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exp {
    Const(Constant),
    /// Value of a variable (lval read).
    Var(VarId),
    /// Address of a variable.
    AddrOf(VarId),
    /// Address of the first element of an array variable.
    StartOf(VarId),
    Unary {
        op: UnOp,
        operand: ExpId,
        typ: TypeId,
    },
    Binary {
        op: BinOp,
        lhs: ExpId,
        rhs: ExpId,
        typ: TypeId,
    },
    SizeOf(TypeId),
    Cast {
        typ: TypeId,
        operand: ExpId,
    },
}

impl Exp {
    /// Direct subexpression ids of this node.
    pub fn subexps(&self) -> Vec<ExpId> {
        match self {
            Exp::Const(_) | Exp::Var(_) | Exp::AddrOf(_) | Exp::StartOf(_) | Exp::SizeOf(_) => {
                Vec::new()
            }
            Exp::Unary { operand, .. } => vec![*operand],
            Exp::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Exp::Cast { operand, .. } => vec![*operand],
        }
    }

    pub fn as_int_constant(&self) -> Option<i64> {
        match self {
            Exp::Const(Constant::Int(n)) => Some(*n),
            _ => None,
        }
    }
}
