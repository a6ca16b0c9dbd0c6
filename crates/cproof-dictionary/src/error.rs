use thiserror::Error;

/// Errors raised by dictionary lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictionaryError {
    /// An id was presented that the table never issued.
    #[error("unknown {table} id {id}")]
    UnknownId { table: &'static str, id: u32 },

    /// A declaration record is missing for a referenced variable.
    #[error("no varinfo declared for vid {vid}")]
    UnknownVarinfo { vid: u32 },

    /// A declaration record is missing for a referenced struct key.
    #[error("no compinfo declared for ckey {ckey}")]
    UnknownCompinfo { ckey: u32 },

    /// A declaration was registered twice for the same local id.
    #[error("duplicate declaration for {entity} {id}")]
    DuplicateDeclaration { entity: &'static str, id: u32 },
}
