//! C types and link-time type signatures.

use std::fmt;

use cproof_core::TypeId;
use serde::{Deserialize, Serialize};

/// Integer kinds of the analyzed C dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntKind {
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
}

impl IntKind {
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            IntKind::Char
                | IntKind::SChar
                | IntKind::Short
                | IntKind::Int
                | IntKind::Long
                | IntKind::LongLong
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

/// A C type as interned in one file's dictionary.
///
/// Component types are referenced by id into the same dictionary, so a
/// type value is small and hashable regardless of nesting depth.
/// Aggregates carry their file-local struct key together with the tag
/// name the linker matches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CTyp {
    Void,
    Int(IntKind),
    Float(FloatKind),
    Ptr(TypeId),
    Array {
        elem: TypeId,
        size: Option<u64>,
    },
    Fun {
        rtype: TypeId,
        formals: Vec<TypeId>,
        varargs: bool,
    },
    Comp {
        ckey: u32,
        name: String,
    },
    Named(String),
}

/// A self-contained structural signature of a type, independent of any
/// file's dictionary ids. Signatures are what the linker compares when
/// matching global declarations across files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSig {
    Void,
    Int(IntKind),
    Float(FloatKind),
    Ptr(Box<TypeSig>),
    Array(Box<TypeSig>, Option<u64>),
    Fun {
        rtype: Box<TypeSig>,
        formals: Vec<TypeSig>,
        varargs: bool,
    },
    Comp(String),
    Named(String),
}

impl TypeSig {
    /// Link-time compatibility. Structural equality, except that an
    /// array of unknown size matches any size and a function without
    /// declared formals (old-style prototype) matches any formal list.
    pub fn compatible(&self, other: &TypeSig) -> bool {
        match (self, other) {
            (TypeSig::Void, TypeSig::Void) => true,
            (TypeSig::Int(a), TypeSig::Int(b)) => a == b,
            (TypeSig::Float(a), TypeSig::Float(b)) => a == b,
            (TypeSig::Ptr(a), TypeSig::Ptr(b)) => a.compatible(b),
            (TypeSig::Array(a, sa), TypeSig::Array(b, sb)) => {
                a.compatible(b) && (sa.is_none() || sb.is_none() || sa == sb)
            }
            (
                TypeSig::Fun {
                    rtype: ra,
                    formals: fa,
                    varargs: va,
                },
                TypeSig::Fun {
                    rtype: rb,
                    formals: fb,
                    varargs: vb,
                },
            ) => {
                ra.compatible(rb)
                    && (fa.is_empty()
                        || fb.is_empty()
                        || (fa.len() == fb.len()
                            && fa.iter().zip(fb).all(|(x, y)| x.compatible(y))
                            && va == vb))
            }
            (TypeSig::Comp(a), TypeSig::Comp(b)) => a == b,
            (TypeSig::Named(a), TypeSig::Named(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, TypeSig::Fun { .. })
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Void => write!(f, "void"),
            TypeSig::Int(k) => write!(f, "{:?}", k),
            TypeSig::Float(k) => write!(f, "{:?}", k),
            TypeSig::Ptr(t) => write!(f, "{}*", t),
            TypeSig::Array(t, Some(n)) => write!(f, "{}[{}]", t, n),
            TypeSig::Array(t, None) => write!(f, "{}[]", t),
            TypeSig::Fun {
                rtype,
                formals,
                varargs,
            } => {
                write!(f, "{}(", rtype)?;
                for (i, t) in formals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", t)?;
                }
                if *varargs {
                    write!(f, ",...")?;
                }
                write!(f, ")")
            }
            TypeSig::Comp(name) => write!(f, "struct {}", name),
            TypeSig::Named(name) => write!(f, "{}", name),
        }
    }
}
