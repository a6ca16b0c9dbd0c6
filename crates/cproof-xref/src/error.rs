use cproof_core::{FileId, GlobalVarId, VarId};
use cproof_dictionary::DictionaryError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XrefError {
    /// A (file, vid) pair was registered a second time with a different
    /// global id. The table is write-once per key.
    #[error("file {file} vid {vid} already resolves to gvid {existing}, refusing gvid {conflicting}")]
    VarConflict {
        file: FileId,
        vid: VarId,
        existing: GlobalVarId,
        conflicting: GlobalVarId,
    },

    /// Same, for struct keys.
    #[error("file {file} ckey {ckey} already resolves to gckey {existing}, refusing gckey {conflicting}")]
    CompConflict {
        file: FileId,
        ckey: u32,
        existing: u32,
        conflicting: u32,
    },

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}
