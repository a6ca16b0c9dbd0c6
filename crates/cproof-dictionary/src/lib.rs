//! Per-file interning stores.
//!
//! Every compilation unit carries its own dictionary of structurally
//! deduplicated values: types, expressions, program contexts, proof
//! obligation predicates and interface predicates. Ids are file-local;
//! cross-file identity goes through the cross-reference table, never
//! through dictionary ids.

pub mod context;
pub mod declarations;
pub mod error;
pub mod exprs;
pub mod file;
pub mod interface;
pub mod predicates;
pub mod table;
pub mod types;

pub use context::{Context, SourceLoc};
pub use declarations::{CompDecl, FieldDecl, FileDeclarations, VarInfo};
pub use error::DictionaryError;
pub use exprs::{BinOp, Constant, Exp, UnOp};
pub use file::{CFileDictionary, GlobalAssignment};
pub use interface::{STerm, XPredicate, XSlot};
pub use predicates::Predicate;
pub use table::IndexedTable;
pub use types::{CTyp, FloatKind, IntKind, TypeSig};
