//! Shared fixtures for the integration tests.
//!
//! The workhorse is a two-file project: `a.c` defines `main`, which
//! calls `getindex` (defined in `f2.c`) with a constant argument and
//! indexes a ten-element array with the result. Obligation and
//! expression ids in the caller are deterministic and recorded in
//! [`IdentityIds`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use cproof::analyzer::{AnalyzerError, FileAnalysis, FileAnalyzer};
use cproof::project::{CFile, FunctionState, Project};
use cproof::semantics::{CallSite, CallTarget, Formal, FunctionSemantics};
use cproof_core::{ContextId, ExpId, PoId, VarId};
use cproof_dictionary::{
    CTyp, Constant, Context, Exp, IntKind, Predicate, SourceLoc, VarInfo,
};
use cproof_proof::{FunctionContract, SummaryIndex};

/// Routes engine logs through the test harness; safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Replays scripted verdicts keyed by file name and round; files and
/// rounds without a script analyze to nothing.
pub struct ScriptedAnalyzer {
    script: Mutex<HashMap<(String, u32), FileAnalysis>>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        ScriptedAnalyzer {
            script: Mutex::new(HashMap::new()),
        }
    }

    pub fn on(mut self, file: &str, round: u32, analysis: FileAnalysis) -> Self {
        self.script
            .get_mut()
            .unwrap()
            .insert((file.to_string(), round), analysis);
        self
    }
}

impl FileAnalyzer for ScriptedAnalyzer {
    fn analyze(&self, file: &CFile, round: u32) -> Result<FileAnalysis, AnalyzerError> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .remove(&(file.name.clone(), round))
            .unwrap_or_default())
    }
}

pub fn varinfo(
    vid: u32,
    name: &str,
    typ: cproof_core::TypeId,
    is_global: bool,
    is_function: bool,
    is_definition: bool,
) -> VarInfo {
    VarInfo {
        vid: VarId(vid),
        name: name.to_string(),
        typ,
        is_global,
        is_function,
        is_definition,
        header: None,
    }
}

/// Caller-side ids in the identity fixture. The caller's obligation
/// store starts with exactly one PPO, so ids added by integration
/// continue from 2.
pub struct IdentityIds {
    /// `index-upper-bound(tmp,10)` at line 12.
    pub ppo: PoId,
    /// `tmp`, the variable receiving the call result.
    pub tmp: ExpId,
    /// The constant argument expression.
    pub value: ExpId,
    pub call_context: ContextId,
    pub return_context: ContextId,
}

/// Caller: vid 1 `main`, vid 2 `tmp`, vid 5 `getindex` (declaration),
/// vid 7 `counter` (global declaration).
fn caller_file(value: i64, ptr_formal: bool) -> (CFile, IdentityIds) {
    let mut file = CFile::new("a.c");
    let int = file.dictionary.intern_typ(CTyp::Int(IntKind::Int));
    let formal_typ = if ptr_formal {
        let ch = file.dictionary.intern_typ(CTyp::Int(IntKind::Char));
        file.dictionary.intern_typ(CTyp::Ptr(ch))
    } else {
        int
    };
    let fun1 = file.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![formal_typ],
        varargs: false,
    });
    let fun0 = file.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![],
        varargs: false,
    });
    file.declarations
        .add_varinfo(varinfo(1, "main", fun0, true, true, true))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(2, "tmp", int, false, false, true))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(5, "getindex", fun1, true, true, false))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(7, "counter", int, true, false, false))
        .unwrap();

    let tmp = file.dictionary.intern_exp(Exp::Var(VarId(2)));
    let value = file
        .dictionary
        .intern_exp(Exp::Const(Constant::Int(value)));
    let bound = file.dictionary.intern_exp(Exp::Const(Constant::Int(10)));

    let call_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(11, 240)));
    let return_context = file.dictionary.intern_context(
        Context::at(SourceLoc::new(11, 240)).extend("return-site"),
    );
    let ppo_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(12, 270)));

    let mut semantics = FunctionSemantics::new("main", VarId(1));
    semantics.callsites.push(CallSite {
        target: CallTarget::Direct(VarId(5)),
        args: vec![value],
        lhs: Some(tmp),
        call_context,
        return_context,
    });
    let mut function = FunctionState::new(semantics);
    let index_check = file.dictionary.intern_predicate(Predicate::IndexUpperBound {
        index: tmp,
        bound,
    });
    let ppo = function.proofs.add_ppo(index_check, ppo_context).unwrap();
    file.functions.push(function);

    (
        file,
        IdentityIds {
            ppo,
            tmp,
            value,
            call_context,
            return_context,
        },
    )
}

/// Callee: vid 1 `getindex` (definition), vid 2 formal `x`, vid 3
/// `counter` (global definition).
fn callee_file(ptr_formal: bool) -> CFile {
    let mut file = CFile::new("f2.c");
    let int = file.dictionary.intern_typ(CTyp::Int(IntKind::Int));
    let formal_typ = if ptr_formal {
        let ch = file.dictionary.intern_typ(CTyp::Int(IntKind::Char));
        file.dictionary.intern_typ(CTyp::Ptr(ch))
    } else {
        int
    };
    let fun1 = file.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![formal_typ],
        varargs: false,
    });
    file.declarations
        .add_varinfo(varinfo(1, "getindex", fun1, true, true, true))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(2, "x", formal_typ, false, false, true))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(3, "counter", int, true, false, true))
        .unwrap();

    let mut semantics = FunctionSemantics::new("getindex", VarId(1));
    semantics.formals.push(Formal {
        index: 1,
        vid: VarId(2),
        name: "x".to_string(),
    });
    file.functions.push(FunctionState::new(semantics));
    file
}

pub fn identity_project(value: i64) -> (Project, IdentityIds) {
    identity_project_with(value, SummaryIndex::default(), Vec::new())
}

pub fn identity_project_with(
    value: i64,
    summaries: SummaryIndex,
    contracts: Vec<FunctionContract>,
) -> (Project, IdentityIds) {
    let (caller, ids) = caller_file(value, false);
    let project =
        Project::assemble(vec![caller, callee_file(false)], summaries, contracts).unwrap();
    (project, ids)
}

/// Identity fixture where `getindex` takes `char *`, so the constant
/// argument mismatches the formal.
pub fn identity_project_ptr_formal(value: i64) -> (Project, IdentityIds) {
    let (caller, ids) = caller_file(value, true);
    let project = Project::assemble(
        vec![caller, callee_file(true)],
        SummaryIndex::default(),
        Vec::new(),
    )
    .unwrap();
    (project, ids)
}

/// Caller-side ids in the allocation fixture built by
/// [`library_deref_project`].
pub struct LibraryIds {
    /// `not-null(p)` at the first dereference.
    pub null_check: PoId,
    /// `buffer(p,20)`, a 20-byte access against the 12-byte allocation.
    pub bound_check: PoId,
}

/// Like [`library_call_project`] with `stdlib.h/malloc`, but `main`
/// also dereferences the allocation: a null check plus a 20-byte
/// access obligation over the 12 bytes allocated.
pub fn library_deref_project(summaries: SummaryIndex) -> (Project, LibraryIds) {
    let mut file = CFile::new("a.c");
    let int = file.dictionary.intern_typ(CTyp::Int(IntKind::Int));
    let ch = file.dictionary.intern_typ(CTyp::Int(IntKind::Char));
    let ptr = file.dictionary.intern_typ(CTyp::Ptr(ch));
    let fun0 = file.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![],
        varargs: false,
    });
    file.declarations
        .add_varinfo(varinfo(1, "main", fun0, true, true, true))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(3, "p", ptr, false, false, true))
        .unwrap();

    let p = file.dictionary.intern_exp(Exp::Var(VarId(3)));
    let size = file.dictionary.intern_exp(Exp::Const(Constant::Int(12)));
    let access = file.dictionary.intern_exp(Exp::Const(Constant::Int(20)));
    let call_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(6, 90)));
    let return_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(6, 90)).extend("return-site"));
    let deref_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(7, 110)));
    let access_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(8, 130)));

    let mut semantics = FunctionSemantics::new("main", VarId(1));
    semantics.callsites.push(CallSite {
        target: CallTarget::Library {
            header: "stdlib.h".to_string(),
            name: "malloc".to_string(),
        },
        args: vec![size],
        lhs: Some(p),
        call_context,
        return_context,
    });
    let mut function = FunctionState::new(semantics);
    let null_pred = file.dictionary.intern_predicate(Predicate::NotNull(p));
    let null_check = function.proofs.add_ppo(null_pred, deref_context).unwrap();
    let buffer_pred = file
        .dictionary
        .intern_predicate(Predicate::Buffer { exp: p, size: access });
    let bound_check = function.proofs.add_ppo(buffer_pred, access_context).unwrap();
    file.functions.push(function);

    let project = Project::assemble(vec![file], summaries, Vec::new()).unwrap();
    (
        project,
        LibraryIds {
            null_check,
            bound_check,
        },
    )
}

/// A single file whose `main` makes one library call with a constant
/// argument and uses the result.
pub fn library_call_project(header: &str, name: &str, summaries: SummaryIndex) -> Project {
    let mut file = CFile::new("a.c");
    let int = file.dictionary.intern_typ(CTyp::Int(IntKind::Int));
    let ch = file.dictionary.intern_typ(CTyp::Int(IntKind::Char));
    let ptr = file.dictionary.intern_typ(CTyp::Ptr(ch));
    let fun0 = file.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![],
        varargs: false,
    });
    file.declarations
        .add_varinfo(varinfo(1, "main", fun0, true, true, true))
        .unwrap();
    file.declarations
        .add_varinfo(varinfo(3, "p", ptr, false, false, true))
        .unwrap();

    let p = file.dictionary.intern_exp(Exp::Var(VarId(3)));
    let size = file.dictionary.intern_exp(Exp::Const(Constant::Int(12)));
    let call_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(6, 90)));
    let return_context = file
        .dictionary
        .intern_context(Context::at(SourceLoc::new(6, 90)).extend("return-site"));

    let mut semantics = FunctionSemantics::new("main", VarId(1));
    semantics.callsites.push(CallSite {
        target: CallTarget::Library {
            header: header.to_string(),
            name: name.to_string(),
        },
        args: vec![size],
        lhs: Some(p),
        call_context,
        return_context,
    });
    file.functions.push(FunctionState::new(semantics));

    Project::assemble(vec![file], summaries, Vec::new()).unwrap()
}
