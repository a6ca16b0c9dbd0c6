//! Per-file declaration records: variables and struct definitions.

use std::collections::BTreeMap;

use cproof_core::{TypeId, VarId};
use serde::{Deserialize, Serialize};

use crate::error::DictionaryError;

/// A declared variable (or function) of one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarInfo {
    pub vid: VarId,
    pub name: String,
    pub typ: TypeId,
    pub is_global: bool,
    pub is_function: bool,
    /// True where this file holds the defining occurrence rather than
    /// an extern declaration.
    pub is_definition: bool,
    /// Header the declaration came from, for library functions.
    pub header: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub typ: TypeId,
}

/// A struct/union definition with its file-local key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompDecl {
    pub ckey: u32,
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

/// All declarations of one compilation unit, keyed by their file-local
/// ids. Write-once per id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDeclarations {
    varinfos: BTreeMap<u32, VarInfo>,
    comps: BTreeMap<u32, CompDecl>,
}

impl FileDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_varinfo(&mut self, varinfo: VarInfo) -> Result<(), DictionaryError> {
        let vid = varinfo.vid.0;
        if self.varinfos.contains_key(&vid) {
            return Err(DictionaryError::DuplicateDeclaration {
                entity: "varinfo",
                id: vid,
            });
        }
        self.varinfos.insert(vid, varinfo);
        Ok(())
    }

    pub fn add_comp(&mut self, comp: CompDecl) -> Result<(), DictionaryError> {
        let ckey = comp.ckey;
        if self.comps.contains_key(&ckey) {
            return Err(DictionaryError::DuplicateDeclaration {
                entity: "compinfo",
                id: ckey,
            });
        }
        self.comps.insert(ckey, comp);
        Ok(())
    }

    pub fn varinfo(&self, vid: VarId) -> Result<&VarInfo, DictionaryError> {
        self.varinfos
            .get(&vid.0)
            .ok_or(DictionaryError::UnknownVarinfo { vid: vid.0 })
    }

    pub fn comp(&self, ckey: u32) -> Result<&CompDecl, DictionaryError> {
        self.comps
            .get(&ckey)
            .ok_or(DictionaryError::UnknownCompinfo { ckey })
    }

    /// Globals in vid order; the linker consumes these.
    pub fn global_varinfos(&self) -> impl Iterator<Item = &VarInfo> {
        self.varinfos.values().filter(|v| v.is_global)
    }

    pub fn comps(&self) -> impl Iterator<Item = &CompDecl> {
        self.comps.values()
    }

    pub fn varinfo_count(&self) -> usize {
        self.varinfos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vi(vid: u32, name: &str, global: bool) -> VarInfo {
        VarInfo {
            vid: VarId(vid),
            name: name.to_string(),
            typ: TypeId(1),
            is_global: global,
            is_function: false,
            is_definition: true,
            header: None,
        }
    }

    #[test]
    fn varinfos_are_write_once() {
        let mut decls = FileDeclarations::new();
        decls.add_varinfo(vi(1, "x", false)).unwrap();
        let err = decls.add_varinfo(vi(1, "y", false)).unwrap_err();
        assert!(matches!(
            err,
            DictionaryError::DuplicateDeclaration { entity: "varinfo", id: 1 }
        ));
        assert_eq!(decls.varinfo(VarId(1)).unwrap().name, "x");
    }

    #[test]
    fn global_iteration_skips_locals() {
        let mut decls = FileDeclarations::new();
        decls.add_varinfo(vi(1, "local", false)).unwrap();
        decls.add_varinfo(vi(2, "shared", true)).unwrap();
        decls.add_varinfo(vi(3, "exported", true)).unwrap();
        let names: Vec<&str> = decls.global_varinfos().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["shared", "exported"]);
    }

    #[test]
    fn missing_lookups_report_the_id() {
        let decls = FileDeclarations::new();
        assert!(matches!(
            decls.varinfo(VarId(9)),
            Err(DictionaryError::UnknownVarinfo { vid: 9 })
        ));
        assert!(matches!(
            decls.comp(4),
            Err(DictionaryError::UnknownCompinfo { ckey: 4 })
        ));
    }
}
