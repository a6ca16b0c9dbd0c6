//! Cross-file identity.
//!
//! Each compilation unit numbers its variables and struct definitions
//! locally. The linker matches global declarations across files by name
//! and type signature, assigns project-wide ids, and records the
//! mapping in an `XrefTable` that is read-only once built. Facts
//! discovered in one file travel to another only through these global
//! ids.

pub mod error;
pub mod linker;
pub mod table;

pub use error::XrefError;
pub use linker::{Linker, XrefAmbiguity};
pub use table::XrefTable;
