//! The linker: matching global declarations across files.

use std::collections::HashMap;

use cproof_core::{FileId, GlobalCompKey, GlobalVarId};
use cproof_dictionary::{CFileDictionary, FileDeclarations, TypeSig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::XrefError;
use crate::table::XrefTable;

/// Two files declare the same name with incompatible signatures. The
/// entities are kept distinct; the report surfaces the configuration
/// problem to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrefAmbiguity {
    pub name: String,
    pub file: FileId,
    pub existing: String,
    pub conflicting: String,
}

/// Builds the cross-reference table from per-file declarations.
///
/// Files are linked in the order presented; the first file to declare a
/// name fixes its canonical global id, later files match by name plus
/// compatible type signature. Linking the same inputs in the same order
/// always yields the same ids.
pub struct Linker {
    next_gvid: u32,
    next_gckey: u32,
    vars_by_name: HashMap<String, Vec<(GlobalVarId, TypeSig)>>,
    comps_by_name: HashMap<String, Vec<(GlobalCompKey, Vec<(String, TypeSig)>)>>,
    table: XrefTable,
    ambiguities: Vec<XrefAmbiguity>,
}

impl Linker {
    pub fn new() -> Self {
        Linker {
            next_gvid: 1,
            next_gckey: 1,
            vars_by_name: HashMap::new(),
            comps_by_name: HashMap::new(),
            table: XrefTable::new(),
            ambiguities: Vec::new(),
        }
    }

    /// Links one file's global declarations into the table.
    pub fn link_file(
        &mut self,
        file: FileId,
        dictionary: &CFileDictionary,
        declarations: &FileDeclarations,
    ) -> Result<(), XrefError> {
        self.link_comps(file, dictionary, declarations)?;
        self.link_vars(file, dictionary, declarations)?;
        Ok(())
    }

    fn link_comps(
        &mut self,
        file: FileId,
        dictionary: &CFileDictionary,
        declarations: &FileDeclarations,
    ) -> Result<(), XrefError> {
        for comp in declarations.comps() {
            let fields = comp
                .fields
                .iter()
                .map(|f| Ok((f.name.clone(), dictionary.type_signature(f.typ)?)))
                .collect::<Result<Vec<_>, XrefError>>()?;

            let entries = self.comps_by_name.entry(comp.name.clone()).or_default();
            let matched = entries
                .iter()
                .find(|(_, known)| fields_compatible(known, &fields))
                .map(|(gckey, _)| *gckey);

            let gckey = match matched {
                Some(gckey) => gckey,
                None => {
                    if let Some((_, known)) = entries.first() {
                        warn!(
                            name = %comp.name,
                            file = %file,
                            "struct name redeclared with incompatible fields"
                        );
                        self.ambiguities.push(XrefAmbiguity {
                            name: comp.name.clone(),
                            file,
                            existing: render_fields(known),
                            conflicting: render_fields(&fields),
                        });
                    }
                    let gckey = GlobalCompKey(self.next_gckey);
                    self.next_gckey += 1;
                    entries.push((gckey, fields));
                    gckey
                }
            };
            self.table.add_ckey2gckey(file, comp.ckey, gckey)?;
        }
        Ok(())
    }

    fn link_vars(
        &mut self,
        file: FileId,
        dictionary: &CFileDictionary,
        declarations: &FileDeclarations,
    ) -> Result<(), XrefError> {
        for varinfo in declarations.global_varinfos() {
            let sig = dictionary.type_signature(varinfo.typ)?;
            let entries = self.vars_by_name.entry(varinfo.name.clone()).or_default();
            let matched = entries
                .iter()
                .find(|(_, known)| known.compatible(&sig))
                .map(|(gvid, _)| *gvid);

            let gvid = match matched {
                Some(gvid) => {
                    debug!(name = %varinfo.name, %gvid, file = %file, "linked to existing global");
                    gvid
                }
                None => {
                    if let Some((_, known)) = entries.first() {
                        warn!(
                            name = %varinfo.name,
                            file = %file,
                            "global name redeclared with incompatible signature"
                        );
                        self.ambiguities.push(XrefAmbiguity {
                            name: varinfo.name.clone(),
                            file,
                            existing: known.to_string(),
                            conflicting: sig.to_string(),
                        });
                    }
                    let gvid = GlobalVarId(self.next_gvid);
                    self.next_gvid += 1;
                    entries.push((gvid, sig));
                    gvid
                }
            };
            self.table.add_vid2gvid(file, varinfo.vid, gvid)?;
            if varinfo.is_definition {
                self.table.add_definition(gvid, file);
            }
        }
        Ok(())
    }

    /// Finishes linking, yielding the read-only table and any
    /// ambiguity reports.
    pub fn finish(self) -> (XrefTable, Vec<XrefAmbiguity>) {
        info!(
            globals = self.next_gvid - 1,
            structs = self.next_gckey - 1,
            ambiguities = self.ambiguities.len(),
            "linking complete"
        );
        (self.table, self.ambiguities)
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}

fn fields_compatible(a: &[(String, TypeSig)], b: &[(String, TypeSig)]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|((na, ta), (nb, tb))| na == nb && ta.compatible(tb))
}

fn render_fields(fields: &[(String, TypeSig)]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|(name, sig)| format!("{}:{}", name, sig))
        .collect();
    format!("{{{}}}", parts.join(","))
}
