//! The global cross-reference table.

use std::collections::{BTreeMap, HashMap};

use cproof_core::{FileId, GlobalCompKey, GlobalVarId, VarId};
use serde::{Deserialize, Serialize};

use crate::error::XrefError;

/// Mapping between file-local ids and project-wide ids, write-once per
/// key. Built by the linker at project load, read-only thereafter.
///
/// Serialized as flat entry lists; the hash indexes are rebuilt on
/// load and duplicate entries are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "XrefTableRepr", into = "XrefTableRepr")]
pub struct XrefTable {
    vid2gvid: HashMap<(FileId, VarId), GlobalVarId>,
    gvid2vids: BTreeMap<GlobalVarId, BTreeMap<FileId, VarId>>,
    ckey2gckey: HashMap<(FileId, u32), GlobalCompKey>,
    /// File holding the defining occurrence of each global, where known.
    definitions: BTreeMap<GlobalVarId, FileId>,
}

impl XrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable cross-reference. Idempotent for the same
    /// gvid; a different gvid for a known key is a conflict.
    pub fn add_vid2gvid(
        &mut self,
        file: FileId,
        vid: VarId,
        gvid: GlobalVarId,
    ) -> Result<(), XrefError> {
        if let Some(&existing) = self.vid2gvid.get(&(file, vid)) {
            if existing != gvid {
                return Err(XrefError::VarConflict {
                    file,
                    vid,
                    existing,
                    conflicting: gvid,
                });
            }
            return Ok(());
        }
        self.vid2gvid.insert((file, vid), gvid);
        self.gvid2vids.entry(gvid).or_default().insert(file, vid);
        Ok(())
    }

    pub fn add_ckey2gckey(
        &mut self,
        file: FileId,
        ckey: u32,
        gckey: GlobalCompKey,
    ) -> Result<(), XrefError> {
        if let Some(&existing) = self.ckey2gckey.get(&(file, ckey)) {
            if existing != gckey {
                return Err(XrefError::CompConflict {
                    file,
                    ckey,
                    existing: existing.0,
                    conflicting: gckey.0,
                });
            }
            return Ok(());
        }
        self.ckey2gckey.insert((file, ckey), gckey);
        Ok(())
    }

    /// Records which file defines a global. The first definition wins;
    /// later ones are ignored.
    pub fn add_definition(&mut self, gvid: GlobalVarId, file: FileId) {
        self.definitions.entry(gvid).or_insert(file);
    }

    pub fn resolve(&self, file: FileId, vid: VarId) -> Option<GlobalVarId> {
        self.vid2gvid.get(&(file, vid)).copied()
    }

    pub fn resolve_ckey(&self, file: FileId, ckey: u32) -> Option<GlobalCompKey> {
        self.ckey2gckey.get(&(file, ckey)).copied()
    }

    /// The vid a global carries within `file`, if the file declares it.
    pub fn vid_in_file(&self, gvid: GlobalVarId, file: FileId) -> Option<VarId> {
        self.gvid2vids.get(&gvid)?.get(&file).copied()
    }

    /// Files declaring a global, in file order.
    pub fn files_of(&self, gvid: GlobalVarId) -> impl Iterator<Item = (FileId, VarId)> + '_ {
        self.gvid2vids
            .get(&gvid)
            .into_iter()
            .flat_map(|m| m.iter().map(|(f, v)| (*f, *v)))
    }

    pub fn defining_file(&self, gvid: GlobalVarId) -> Option<FileId> {
        self.definitions.get(&gvid).copied()
    }

    pub fn var_entry_count(&self) -> usize {
        self.vid2gvid.len()
    }
}

#[derive(Serialize, Deserialize)]
struct XrefTableRepr {
    variables: Vec<(FileId, VarId, GlobalVarId)>,
    comps: Vec<(FileId, u32, GlobalCompKey)>,
    definitions: Vec<(GlobalVarId, FileId)>,
}

impl From<XrefTable> for XrefTableRepr {
    fn from(table: XrefTable) -> Self {
        let mut variables: Vec<_> = table
            .vid2gvid
            .iter()
            .map(|(&(f, v), &g)| (f, v, g))
            .collect();
        variables.sort();
        let mut comps: Vec<_> = table
            .ckey2gckey
            .iter()
            .map(|(&(f, c), &g)| (f, c, g))
            .collect();
        comps.sort();
        let definitions = table.definitions.into_iter().collect();
        XrefTableRepr {
            variables,
            comps,
            definitions,
        }
    }
}

impl TryFrom<XrefTableRepr> for XrefTable {
    type Error = String;

    fn try_from(repr: XrefTableRepr) -> Result<Self, String> {
        let mut table = XrefTable::new();
        for (f, v, g) in repr.variables {
            table
                .add_vid2gvid(f, v, g)
                .map_err(|e| format!("invalid xref artifact: {}", e))?;
        }
        for (f, c, g) in repr.comps {
            table
                .add_ckey2gckey(f, c, g)
                .map_err(|e| format!("invalid xref artifact: {}", e))?;
        }
        for (g, f) in repr.definitions {
            table.add_definition(g, f);
        }
        Ok(table)
    }
}
