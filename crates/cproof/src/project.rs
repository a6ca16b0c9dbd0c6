//! Project state: files, functions, cross-references, contracts.

use std::collections::HashMap;

use cproof_core::{FileId, GlobalVarId, VarId};
use cproof_dictionary::{CFileDictionary, FileDeclarations, XPredicate};
use cproof_proof::{FunctionApi, FunctionContract, FunctionProofs, SummaryIndex};
use cproof_xref::{Linker, XrefAmbiguity, XrefTable};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ProjectError;
use crate::semantics::FunctionSemantics;

/// One analyzed function: its write-once semantics, obligation store
/// and api record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionState {
    pub semantics: FunctionSemantics,
    pub proofs: FunctionProofs,
    pub api: FunctionApi,
}

impl FunctionState {
    pub fn new(semantics: FunctionSemantics) -> Self {
        FunctionState {
            semantics,
            proofs: FunctionProofs::new(),
            api: FunctionApi::new(),
        }
    }
}

/// One compilation unit with its dictionary, declarations and
/// functions. A failed file keeps its state but is excluded from all
/// later rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CFile {
    pub id: FileId,
    pub name: String,
    pub dictionary: CFileDictionary,
    pub declarations: FileDeclarations,
    pub functions: Vec<FunctionState>,
    pub failed: Option<String>,
}

impl CFile {
    pub fn new(name: impl Into<String>) -> Self {
        CFile {
            id: FileId(0),
            name: name.into(),
            dictionary: CFileDictionary::new(),
            declarations: FileDeclarations::new(),
            functions: Vec::new(),
            failed: None,
        }
    }

    pub fn function(&self, vid: VarId) -> Option<&FunctionState> {
        self.functions.iter().find(|f| f.semantics.vid == vid)
    }

    pub fn function_mut(&mut self, vid: VarId) -> Option<&mut FunctionState> {
        self.functions.iter_mut().find(|f| f.semantics.vid == vid)
    }

    pub fn is_active(&self) -> bool {
        self.failed.is_none()
    }
}

/// Monotone facts about linked globals, accumulated from callee
/// guarantees over global effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalAssumptions {
    facts: Vec<(GlobalVarId, XPredicate)>,
}

impl GlobalAssumptions {
    /// Returns true when the fact is new.
    pub fn add(&mut self, gvid: GlobalVarId, predicate: XPredicate) -> bool {
        if self.facts.iter().any(|(g, p)| *g == gvid && *p == predicate) {
            return false;
        }
        self.facts.push((gvid, predicate));
        true
    }

    pub fn about(&self, gvid: GlobalVarId) -> impl Iterator<Item = &XPredicate> {
        self.facts
            .iter()
            .filter(move |(g, _)| *g == gvid)
            .map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// The whole analyzed application.
#[derive(Debug)]
pub struct Project {
    pub files: Vec<CFile>,
    pub xref: XrefTable,
    pub ambiguities: Vec<XrefAmbiguity>,
    pub summaries: SummaryIndex,
    pub contracts: HashMap<String, FunctionContract>,
    pub global_assumptions: GlobalAssumptions,
}

impl Project {
    /// Assembles a project: numbers the files, links their global
    /// declarations, installs user contracts into the matching function
    /// apis and seals primary obligation generation.
    ///
    /// A file whose declarations cannot be linked is marked failed and
    /// skipped; linking continues with the remaining files.
    pub fn assemble(
        mut files: Vec<CFile>,
        summaries: SummaryIndex,
        contracts: Vec<FunctionContract>,
    ) -> Result<Project, ProjectError> {
        for (i, file) in files.iter_mut().enumerate() {
            file.id = FileId(i as u32);
        }

        let mut linker = Linker::new();
        for file in &mut files {
            if !file.is_active() {
                continue;
            }
            if let Err(e) = linker.link_file(file.id, &file.dictionary, &file.declarations) {
                warn!(file = %file.name, error = %e, "linking failed, excluding file");
                file.failed = Some(format!("linking failed: {}", e));
            }
        }
        let (xref, ambiguities) = linker.finish();

        let contracts: HashMap<String, FunctionContract> = contracts
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        for file in &mut files {
            for function in &mut file.functions {
                function.proofs.seal_ppos();
                if let Some(contract) = contracts.get(&function.semantics.name) {
                    for predicate in &contract.assumptions {
                        function.api.contract_assumption(predicate.clone());
                    }
                    for predicate in &contract.guarantees {
                        function
                            .api
                            .record_guarantee(predicate.clone(), cproof_proof::Origin::Contract);
                    }
                    info!(function = %function.semantics.name, "contract installed");
                }
            }
        }

        Ok(Project {
            files,
            xref,
            ambiguities,
            summaries,
            contracts,
            global_assumptions: GlobalAssumptions::default(),
        })
    }

    pub fn file(&self, id: FileId) -> Option<&CFile> {
        self.files.get(id.0 as usize)
    }

    /// Locates the defining occurrence of a function by its global id.
    pub fn function_by_gvid(&self, gvid: GlobalVarId) -> Option<(FileId, VarId)> {
        let file = self.xref.defining_file(gvid)?;
        let vid = self.xref.vid_in_file(gvid, file)?;
        Some((file, vid))
    }

    /// (open, safe, violation) counts over every file, failed included:
    /// established statuses survive later failures.
    pub fn obligation_counts(&self) -> (u64, u64, u64) {
        let mut open = 0;
        let mut safe = 0;
        let mut violations = 0;
        for file in &self.files {
            for function in &file.functions {
                open += function.proofs.open_count();
                safe += function.proofs.safe_count();
                violations += function.proofs.violation_count();
            }
        }
        (open, safe, violations)
    }

    pub fn missing_summary_count(&self) -> u64 {
        self.files
            .iter()
            .flat_map(|f| &f.functions)
            .map(|f| f.api.missing_summaries().count() as u64)
            .sum()
    }

    pub fn failed_file_count(&self) -> u64 {
        self.files.iter().filter(|f| !f.is_active()).count() as u64
    }
}
