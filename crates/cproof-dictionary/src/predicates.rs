//! Proof-obligation predicates.
//!
//! One variant per checked memory-safety condition. Operands are ids
//! into the owning file's expression and type tables, so predicates are
//! small, hashable and structurally deduplicated like everything else
//! in the dictionary.

use cproof_core::{ExpId, TypeId};
use serde::{Deserialize, Serialize};

use crate::exprs::BinOp;
use crate::types::IntKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    NotNull(ExpId),
    Null(ExpId),
    ValidMem(ExpId),
    GlobalAddress(ExpId),
    HeapAddress(ExpId),
    DistinctRegion { exp: ExpId, region: u32 },
    ControlledResource { resource: String, size: ExpId },
    StackAddressEscape { lhs: Option<ExpId>, exp: ExpId },
    InScope(ExpId),
    AllocationBase(ExpId),
    NewMemory(ExpId),
    Buffer { exp: ExpId, size: ExpId },
    RevBuffer { exp: ExpId, size: ExpId },
    TypeAtOffset { typ: TypeId, exp: ExpId },
    LowerBound { typ: TypeId, exp: ExpId },
    UpperBound { typ: TypeId, exp: ExpId },
    IndexLowerBound { index: ExpId },
    IndexUpperBound { index: ExpId, bound: ExpId },
    Initialized(ExpId),
    InitializedRange { exp: ExpId, len: ExpId },
    Cast { from: TypeId, to: TypeId, exp: ExpId },
    FormatCast { from: TypeId, to: TypeId, exp: ExpId },
    PointerCast { from: TypeId, to: TypeId, exp: ExpId },
    SignedToUnsignedCastLb { from: IntKind, to: IntKind, exp: ExpId },
    SignedToUnsignedCastUb { from: IntKind, to: IntKind, exp: ExpId },
    UnsignedToSignedCast { from: IntKind, to: IntKind, exp: ExpId },
    UnsignedToUnsignedCast { from: IntKind, to: IntKind, exp: ExpId },
    SignedToSignedCastLb { from: IntKind, to: IntKind, exp: ExpId },
    SignedToSignedCastUb { from: IntKind, to: IntKind, exp: ExpId },
    NotZero(ExpId),
    NonNegative(ExpId),
    NullTerminated(ExpId),
    IntUnderflow { op: BinOp, lhs: ExpId, rhs: ExpId, kind: IntKind },
    IntOverflow { op: BinOp, lhs: ExpId, rhs: ExpId, kind: IntKind },
    UIntUnderflow { op: BinOp, lhs: ExpId, rhs: ExpId, kind: IntKind },
    UIntOverflow { op: BinOp, lhs: ExpId, rhs: ExpId, kind: IntKind },
    WidthOverflow { exp: ExpId, kind: IntKind },
    PtrLowerBound { typ: TypeId, op: BinOp, lhs: ExpId, rhs: ExpId },
    PtrUpperBound { typ: TypeId, op: BinOp, lhs: ExpId, rhs: ExpId },
    PtrUpperBoundDeref { typ: TypeId, op: BinOp, lhs: ExpId, rhs: ExpId },
    CommonBase { lhs: ExpId, rhs: ExpId },
    CommonBaseType { lhs: ExpId, rhs: ExpId },
    FormatString(ExpId),
    VarArgs { fmt: ExpId, args: Vec<ExpId> },
    NoOverlap { lhs: ExpId, rhs: ExpId },
    /// A boolean condition that must evaluate to true.
    ValueConstraint(ExpId),
    PreservedValue(ExpId),
    PreservedAllMemory,
}

impl Predicate {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Predicate::NotNull(_) => "not-null",
            Predicate::Null(_) => "null",
            Predicate::ValidMem(_) => "valid-mem",
            Predicate::GlobalAddress(_) => "global-address",
            Predicate::HeapAddress(_) => "heap-address",
            Predicate::DistinctRegion { .. } => "distinct-region",
            Predicate::ControlledResource { .. } => "controlled-resource",
            Predicate::StackAddressEscape { .. } => "stack-address-escape",
            Predicate::InScope(_) => "in-scope",
            Predicate::AllocationBase(_) => "allocation-base",
            Predicate::NewMemory(_) => "new-memory",
            Predicate::Buffer { .. } => "buffer",
            Predicate::RevBuffer { .. } => "rev-buffer",
            Predicate::TypeAtOffset { .. } => "type-at-offset",
            Predicate::LowerBound { .. } => "lower-bound",
            Predicate::UpperBound { .. } => "upper-bound",
            Predicate::IndexLowerBound { .. } => "index-lower-bound",
            Predicate::IndexUpperBound { .. } => "index-upper-bound",
            Predicate::Initialized(_) => "initialized",
            Predicate::InitializedRange { .. } => "initialized-range",
            Predicate::Cast { .. } => "cast",
            Predicate::FormatCast { .. } => "format-cast",
            Predicate::PointerCast { .. } => "pointer-cast",
            Predicate::SignedToUnsignedCastLb { .. } => "signed-to-unsigned-cast-lb",
            Predicate::SignedToUnsignedCastUb { .. } => "signed-to-unsigned-cast-ub",
            Predicate::UnsignedToSignedCast { .. } => "unsigned-to-signed-cast",
            Predicate::UnsignedToUnsignedCast { .. } => "unsigned-to-unsigned-cast",
            Predicate::SignedToSignedCastLb { .. } => "signed-to-signed-cast-lb",
            Predicate::SignedToSignedCastUb { .. } => "signed-to-signed-cast-ub",
            Predicate::NotZero(_) => "not-zero",
            Predicate::NonNegative(_) => "non-negative",
            Predicate::NullTerminated(_) => "null-terminated",
            Predicate::IntUnderflow { .. } => "int-underflow",
            Predicate::IntOverflow { .. } => "int-overflow",
            Predicate::UIntUnderflow { .. } => "uint-underflow",
            Predicate::UIntOverflow { .. } => "uint-overflow",
            Predicate::WidthOverflow { .. } => "width-overflow",
            Predicate::PtrLowerBound { .. } => "ptr-lower-bound",
            Predicate::PtrUpperBound { .. } => "ptr-upper-bound",
            Predicate::PtrUpperBoundDeref { .. } => "ptr-upper-bound-deref",
            Predicate::CommonBase { .. } => "common-base",
            Predicate::CommonBaseType { .. } => "common-base-type",
            Predicate::FormatString(_) => "format-string",
            Predicate::VarArgs { .. } => "var-args",
            Predicate::NoOverlap { .. } => "no-overlap",
            Predicate::ValueConstraint(_) => "value-constraint",
            Predicate::PreservedValue(_) => "preserved-value",
            Predicate::PreservedAllMemory => "preserved-all-memory",
        }
    }

    /// Rebuilds the predicate with every expression operand passed
    /// through `f`. Substitution and dependent-obligation rewriting are
    /// both built on this.
    pub fn map_exps(&self, f: &mut impl FnMut(ExpId) -> ExpId) -> Predicate {
        match self.clone() {
            Predicate::NotNull(e) => Predicate::NotNull(f(e)),
            Predicate::Null(e) => Predicate::Null(f(e)),
            Predicate::ValidMem(e) => Predicate::ValidMem(f(e)),
            Predicate::GlobalAddress(e) => Predicate::GlobalAddress(f(e)),
            Predicate::HeapAddress(e) => Predicate::HeapAddress(f(e)),
            Predicate::DistinctRegion { exp, region } => Predicate::DistinctRegion {
                exp: f(exp),
                region,
            },
            Predicate::ControlledResource { resource, size } => Predicate::ControlledResource {
                resource,
                size: f(size),
            },
            Predicate::StackAddressEscape { lhs, exp } => Predicate::StackAddressEscape {
                lhs: lhs.map(&mut *f),
                exp: f(exp),
            },
            Predicate::InScope(e) => Predicate::InScope(f(e)),
            Predicate::AllocationBase(e) => Predicate::AllocationBase(f(e)),
            Predicate::NewMemory(e) => Predicate::NewMemory(f(e)),
            Predicate::Buffer { exp, size } => Predicate::Buffer {
                exp: f(exp),
                size: f(size),
            },
            Predicate::RevBuffer { exp, size } => Predicate::RevBuffer {
                exp: f(exp),
                size: f(size),
            },
            Predicate::TypeAtOffset { typ, exp } => Predicate::TypeAtOffset { typ, exp: f(exp) },
            Predicate::LowerBound { typ, exp } => Predicate::LowerBound { typ, exp: f(exp) },
            Predicate::UpperBound { typ, exp } => Predicate::UpperBound { typ, exp: f(exp) },
            Predicate::IndexLowerBound { index } => Predicate::IndexLowerBound { index: f(index) },
            Predicate::IndexUpperBound { index, bound } => Predicate::IndexUpperBound {
                index: f(index),
                bound: f(bound),
            },
            Predicate::Initialized(e) => Predicate::Initialized(f(e)),
            Predicate::InitializedRange { exp, len } => Predicate::InitializedRange {
                exp: f(exp),
                len: f(len),
            },
            Predicate::Cast { from, to, exp } => Predicate::Cast {
                from,
                to,
                exp: f(exp),
            },
            Predicate::FormatCast { from, to, exp } => Predicate::FormatCast {
                from,
                to,
                exp: f(exp),
            },
            Predicate::PointerCast { from, to, exp } => Predicate::PointerCast {
                from,
                to,
                exp: f(exp),
            },
            Predicate::SignedToUnsignedCastLb { from, to, exp } => {
                Predicate::SignedToUnsignedCastLb {
                    from,
                    to,
                    exp: f(exp),
                }
            }
            Predicate::SignedToUnsignedCastUb { from, to, exp } => {
                Predicate::SignedToUnsignedCastUb {
                    from,
                    to,
                    exp: f(exp),
                }
            }
            Predicate::UnsignedToSignedCast { from, to, exp } => Predicate::UnsignedToSignedCast {
                from,
                to,
                exp: f(exp),
            },
            Predicate::UnsignedToUnsignedCast { from, to, exp } => {
                Predicate::UnsignedToUnsignedCast {
                    from,
                    to,
                    exp: f(exp),
                }
            }
            Predicate::SignedToSignedCastLb { from, to, exp } => Predicate::SignedToSignedCastLb {
                from,
                to,
                exp: f(exp),
            },
            Predicate::SignedToSignedCastUb { from, to, exp } => Predicate::SignedToSignedCastUb {
                from,
                to,
                exp: f(exp),
            },
            Predicate::NotZero(e) => Predicate::NotZero(f(e)),
            Predicate::NonNegative(e) => Predicate::NonNegative(f(e)),
            Predicate::NullTerminated(e) => Predicate::NullTerminated(f(e)),
            Predicate::IntUnderflow { op, lhs, rhs, kind } => Predicate::IntUnderflow {
                op,
                lhs: f(lhs),
                rhs: f(rhs),
                kind,
            },
            Predicate::IntOverflow { op, lhs, rhs, kind } => Predicate::IntOverflow {
                op,
                lhs: f(lhs),
                rhs: f(rhs),
                kind,
            },
            Predicate::UIntUnderflow { op, lhs, rhs, kind } => Predicate::UIntUnderflow {
                op,
                lhs: f(lhs),
                rhs: f(rhs),
                kind,
            },
            Predicate::UIntOverflow { op, lhs, rhs, kind } => Predicate::UIntOverflow {
                op,
                lhs: f(lhs),
                rhs: f(rhs),
                kind,
            },
            Predicate::WidthOverflow { exp, kind } => Predicate::WidthOverflow {
                exp: f(exp),
                kind,
            },
            Predicate::PtrLowerBound { typ, op, lhs, rhs } => Predicate::PtrLowerBound {
                typ,
                op,
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Predicate::PtrUpperBound { typ, op, lhs, rhs } => Predicate::PtrUpperBound {
                typ,
                op,
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Predicate::PtrUpperBoundDeref { typ, op, lhs, rhs } => Predicate::PtrUpperBoundDeref {
                typ,
                op,
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Predicate::CommonBase { lhs, rhs } => Predicate::CommonBase {
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Predicate::CommonBaseType { lhs, rhs } => Predicate::CommonBaseType {
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Predicate::FormatString(e) => Predicate::FormatString(f(e)),
            Predicate::VarArgs { fmt, args } => Predicate::VarArgs {
                fmt: f(fmt),
                args: args.into_iter().map(&mut *f).collect(),
            },
            Predicate::NoOverlap { lhs, rhs } => Predicate::NoOverlap {
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Predicate::ValueConstraint(e) => Predicate::ValueConstraint(f(e)),
            Predicate::PreservedValue(e) => Predicate::PreservedValue(f(e)),
            Predicate::PreservedAllMemory => Predicate::PreservedAllMemory,
        }
    }

    /// Expression operands in traversal order.
    pub fn exp_operands(&self) -> Vec<ExpId> {
        let mut out = Vec::new();
        self.map_exps(&mut |e| {
            out.push(e);
            e
        });
        out
    }

    /// True if any operand is exactly `exp` (no subexpression search;
    /// callers needing deep matching expand through the dictionary).
    pub fn mentions(&self, exp: ExpId) -> bool {
        self.exp_operands().contains(&exp)
    }
}
