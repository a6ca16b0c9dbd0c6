//! Integration-pass behavior across file boundaries: guarantee
//! propagation and dependent-obligation rewriting, assumption
//! instantiation, candidate promotion, library summaries, indirect
//! calls and global effects.

mod common;

use common::{
    identity_project, identity_project_ptr_formal, identity_project_with, library_call_project,
    library_deref_project, varinfo, ScriptedAnalyzer,
};
use cproof::analyzer::{FileAnalysis, FunctionAnalysis};
use cproof::project::{CFile, FunctionState, Project};
use cproof::propagate::integrate;
use cproof::rounds::RoundController;
use cproof::semantics::{CallSite, CallTarget, Formal, FunctionSemantics};
use cproof::{AnalysisConfig, PoStatus, RoundState, SpoSite};
use cproof_core::{FileId, PoId, VarId};
use cproof_dictionary::{
    BinOp, Constant, Context, CTyp, Exp, IntKind, SourceLoc, STerm, XPredicate,
};
use cproof_proof::{
    CandidateAssumption, FunctionContract, LibrarySummary, Origin, PoKind, SummaryIndex,
};

fn render(file: &CFile, po: PoId) -> String {
    let obligation = file.functions[0].proofs.get(po).unwrap();
    file.dictionary
        .predicate_to_string(&file.declarations, obligation.predicate)
        .unwrap()
}

fn identity_guarantee() -> XPredicate {
    XPredicate::RelationalExpr {
        op: BinOp::Eq,
        lhs: STerm::ReturnValue,
        rhs: STerm::ArgValue(1),
    }
}

// ==================== guarantee propagation ====================

#[test]
fn identity_guarantee_rewrites_dependent_obligations() {
    common::init_tracing();
    let (mut project, ids) = identity_project(4105);
    project.files[1].functions[0]
        .api
        .record_guarantee(identity_guarantee(), Origin::Analyzer);

    let added = integrate(&mut project).unwrap();
    assert_eq!(added, 2);

    let caller = &project.files[0];
    let proofs = &caller.functions[0].proofs;
    assert_eq!(proofs.len(), 3);

    // the guarantee itself, instantiated at the return site
    let direct = proofs.get(PoId(2)).unwrap();
    assert_eq!(direct.kind, PoKind::Supporting(SpoSite::Returnsite));
    assert_eq!(direct.context, ids.return_context);
    assert_eq!(render(caller, PoId(2)), "value-constraint((tmp == 4105))");

    // the index check, restated over the callee's expression
    let rewritten = proofs.get(PoId(3)).unwrap();
    assert_eq!(rewritten.kind, PoKind::Supporting(SpoSite::Returnsite));
    assert_eq!(rewritten.context, ids.return_context);
    assert_eq!(render(caller, PoId(3)), "index-upper-bound(4105,10)");
    assert!(rewritten.is_open());

    // the original obligation over tmp is untouched
    assert!(proofs.get(ids.ppo).unwrap().is_open());
    assert_eq!(render(caller, ids.ppo), "index-upper-bound(tmp,10)");
}

#[test]
fn repropagation_adds_nothing() {
    let (mut project, _ids) = identity_project(4105);
    project.files[1].functions[0]
        .api
        .record_guarantee(identity_guarantee(), Origin::Analyzer);

    assert_eq!(integrate(&mut project).unwrap(), 2);
    assert_eq!(integrate(&mut project).unwrap(), 0);
    assert_eq!(project.files[0].functions[0].proofs.len(), 3);
}

#[test]
fn return_guarantee_is_dropped_when_the_result_is_unused() {
    let (mut project, _ids) = identity_project(4105);
    // rebuild the call site without a receiver
    project.files[0].functions[0].semantics.callsites[0].lhs = None;
    project.files[1].functions[0]
        .api
        .record_guarantee(identity_guarantee(), Origin::Analyzer);

    assert_eq!(integrate(&mut project).unwrap(), 0);
    assert_eq!(project.files[0].functions[0].proofs.len(), 1);
}

#[test]
fn global_guarantees_accumulate_without_new_obligations() {
    let (mut project, _ids) = identity_project(4105);
    let gvid = project.xref.resolve(FileId(1), VarId(3)).unwrap();
    project.files[1].functions[0].api.record_guarantee(
        XPredicate::RelationalExpr {
            op: BinOp::Ge,
            lhs: STerm::GlobalValue(gvid),
            rhs: STerm::NumConstant(0),
        },
        Origin::Analyzer,
    );

    assert_eq!(integrate(&mut project).unwrap(), 0);
    assert_eq!(project.global_assumptions.about(gvid).count(), 1);
    assert_eq!(project.files[0].functions[0].proofs.len(), 1);

    // monotone set, not a growing log
    assert_eq!(integrate(&mut project).unwrap(), 0);
    assert_eq!(project.global_assumptions.about(gvid).count(), 1);
}

// ==================== assumption propagation ====================

#[test]
fn callee_assumptions_become_callsite_obligations() {
    let (mut project, ids) = identity_project(4105);
    let aid = project.files[1].functions[0]
        .api
        .record_assumption(XPredicate::NonNegative(STerm::ArgValue(1)), Origin::Analyzer);

    assert_eq!(integrate(&mut project).unwrap(), 1);

    let caller = &project.files[0];
    let spo = caller.functions[0].proofs.get(PoId(2)).unwrap();
    assert_eq!(spo.kind, PoKind::Supporting(SpoSite::Callsite));
    assert_eq!(spo.context, ids.call_context);
    assert_eq!(render(caller, PoId(2)), "non-negative(4105)");

    // the callee's record points back at the obligation guarding it
    let callee_api = &project.files[1].functions[0].api;
    assert_eq!(callee_api.assumption(aid).unwrap().spos, vec![PoId(2)]);
}

#[test]
fn contract_assumptions_propagate_like_analyzer_ones() {
    let contract = FunctionContract {
        name: "getindex".to_string(),
        assumptions: vec![XPredicate::NonNegative(STerm::ArgValue(1))],
        guarantees: vec![],
    };
    let (mut project, ids) =
        identity_project_with(4105, SummaryIndex::default(), vec![contract]);

    assert_eq!(integrate(&mut project).unwrap(), 1);

    let spo = project.files[0].functions[0].proofs.get(PoId(2)).unwrap();
    assert_eq!(spo.context, ids.call_context);
    let callee_api = &project.files[1].functions[0].api;
    let assumption = callee_api.assumptions().next().unwrap();
    assert_eq!(assumption.origin, Origin::Contract);
    assert_eq!(assumption.spos, vec![PoId(2)]);
}

#[test]
fn type_mismatch_creates_the_obligation_but_leaves_it_open() {
    let (mut project, _ids) = identity_project_ptr_formal(4105);
    project.files[1].functions[0]
        .api
        .record_assumption(XPredicate::NotNull(STerm::ArgValue(1)), Origin::Analyzer);

    assert_eq!(integrate(&mut project).unwrap(), 1);

    let caller = &project.files[0];
    let spo = caller.functions[0].proofs.get(PoId(2)).unwrap();
    assert_eq!(render(caller, PoId(2)), "not-null(4105)");
    assert!(spo.is_open());
    let diagnostic = spo.diagnostic.as_deref().unwrap();
    assert!(diagnostic.contains("actual argument 1"));
}

// ==================== candidate promotion ====================

#[test]
fn candidates_supporting_open_obligations_are_promoted() {
    let (mut project, ids) = identity_project(4105);
    project.files[0].functions[0]
        .api
        .add_candidate(CandidateAssumption {
            predicate: XPredicate::NotNull(STerm::ArgValue(1)),
            supports: vec![ids.ppo],
        });

    assert_eq!(integrate(&mut project).unwrap(), 0);

    let function = &project.files[0].functions[0];
    let status = &function.proofs.get(ids.ppo).unwrap().status;
    let PoStatus::SafeApi { assumption } = status else {
        panic!("expected SafeApi, got {:?}", status);
    };
    let committed = function.api.assumption(*assumption).unwrap();
    assert_eq!(committed.origin, Origin::Analyzer);
    assert_eq!(committed.ppos, vec![ids.ppo]);
}

#[test]
fn candidates_for_closed_obligations_are_dropped() {
    let (mut project, ids) = identity_project(4105);
    let function = &mut project.files[0].functions[0];
    function
        .proofs
        .set_status(ids.ppo, PoStatus::SafeStatement)
        .unwrap();
    function.api.add_candidate(CandidateAssumption {
        predicate: XPredicate::NotNull(STerm::ArgValue(1)),
        supports: vec![ids.ppo],
    });

    assert_eq!(integrate(&mut project).unwrap(), 0);

    let function = &project.files[0].functions[0];
    assert_eq!(function.api.assumptions().count(), 0);
    assert_eq!(
        function.proofs.get(ids.ppo).unwrap().status,
        PoStatus::SafeStatement
    );
}

// ==================== library summaries ====================

#[test]
fn summary_assumptions_instantiate_and_disjunctive_guarantees_do_not() {
    let summaries = SummaryIndex::new(vec![LibrarySummary {
        header: "stdlib.h".to_string(),
        name: "malloc".to_string(),
        assumptions: vec![XPredicate::NonNegative(STerm::ArgValue(1))],
        guarantees: vec![XPredicate::Disjunction(vec![
            XPredicate::NewMemory {
                ptr: STerm::ReturnValue,
                size: STerm::ArgValue(1),
            },
            XPredicate::Null(STerm::ReturnValue),
        ])],
    }]);
    let mut project = library_call_project("stdlib.h", "malloc", summaries);

    assert_eq!(integrate(&mut project).unwrap(), 1);

    let file = &project.files[0];
    let function = &file.functions[0];
    assert_eq!(function.proofs.len(), 1);
    assert_eq!(render(file, PoId(1)), "non-negative(12)");
    assert_eq!(
        function.api.library_calls().collect::<Vec<_>>(),
        vec![("stdlib.h/malloc", 1)]
    );
    assert_eq!(project.missing_summary_count(), 0);
}

#[test]
fn allocation_summary_discharges_the_null_check_but_not_the_bounds() {
    common::init_tracing();
    let summaries = SummaryIndex::new(vec![LibrarySummary {
        header: "stdlib.h".to_string(),
        name: "malloc".to_string(),
        assumptions: vec![XPredicate::NonNegative(STerm::ArgValue(1))],
        guarantees: vec![XPredicate::Disjunction(vec![
            XPredicate::NewMemory {
                ptr: STerm::ReturnValue,
                size: STerm::ArgValue(1),
            },
            XPredicate::Null(STerm::ReturnValue),
        ])],
    }]);
    let (mut project, ids) = library_deref_project(summaries);
    // the per-file analyzer sees the null check guarding the first
    // dereference and offers the allocation result as an assumption
    let analyzer = ScriptedAnalyzer::new().on(
        "a.c",
        1,
        FileAnalysis {
            functions: vec![FunctionAnalysis {
                vid: VarId(1),
                candidates: vec![CandidateAssumption {
                    predicate: XPredicate::NotNull(STerm::ArgValue(1)),
                    supports: vec![ids.null_check],
                }],
                ..Default::default()
            }],
        },
    );
    let controller =
        RoundController::new(AnalysisConfig::default().with_max_rounds(5), analyzer);

    let outcome = controller.run(&mut project).unwrap();
    assert_eq!(outcome.state, RoundState::Stabilized { rounds: 2 });
    assert_eq!(outcome.rounds[0].new_spos, 1);

    let file = &project.files[0];
    let function = &file.functions[0];
    // the guarded dereference closes against the committed assumption
    let status = &function.proofs.get(ids.null_check).unwrap().status;
    let PoStatus::SafeApi { assumption } = status else {
        panic!("expected SafeApi, got {:?}", status);
    };
    assert_eq!(
        function.api.assumption(*assumption).unwrap().ppos,
        vec![ids.null_check]
    );
    // the 20-byte access is not covered by the 12-byte allocation
    assert!(function.proofs.get(ids.bound_check).unwrap().is_open());
    assert_eq!(render(file, ids.bound_check), "buffer(p,20)");
    // the summary's precondition landed as a callsite obligation
    assert_eq!(render(file, PoId(3)), "non-negative(12)");
}

#[test]
fn missing_summaries_are_recorded_and_skipped() {
    let mut project =
        library_call_project("frob.h", "frobnicate", SummaryIndex::default());

    assert_eq!(integrate(&mut project).unwrap(), 0);

    let function = &project.files[0].functions[0];
    assert!(function.proofs.is_empty());
    assert_eq!(
        function.api.missing_summaries().collect::<Vec<_>>(),
        vec!["frobnicate"]
    );
    assert_eq!(project.missing_summary_count(), 1);
}

// ==================== indirect calls ====================

/// Caller `a.c` calls through a function pointer whose candidate set is
/// `candidates`; `f1.c` and `f2.c` define candidates with vids 5 and 6
/// on the caller side.
fn indirect_project(candidates: Vec<u32>) -> Project {
    let mut caller = CFile::new("a.c");
    let int = caller.dictionary.intern_typ(CTyp::Int(IntKind::Int));
    let fun1 = caller.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![int],
        varargs: false,
    });
    let fun0 = caller.dictionary.intern_typ(CTyp::Fun {
        rtype: int,
        formals: vec![],
        varargs: false,
    });
    caller
        .declarations
        .add_varinfo(varinfo(1, "main", fun0, true, true, true))
        .unwrap();
    caller
        .declarations
        .add_varinfo(varinfo(5, "apply_one", fun1, true, true, false))
        .unwrap();
    caller
        .declarations
        .add_varinfo(varinfo(6, "apply_two", fun1, true, true, false))
        .unwrap();
    let fp = caller.dictionary.intern_exp(Exp::Var(VarId(5)));
    let value = caller.dictionary.intern_exp(Exp::Const(Constant::Int(7)));
    let call_context = caller
        .dictionary
        .intern_context(Context::at(SourceLoc::new(9, 120)));
    let return_context = caller
        .dictionary
        .intern_context(Context::at(SourceLoc::new(9, 120)).extend("return-site"));
    let mut semantics = FunctionSemantics::new("main", VarId(1));
    semantics.callsites.push(CallSite {
        target: CallTarget::Indirect {
            exp: fp,
            candidates: candidates.into_iter().map(VarId).collect(),
        },
        args: vec![value],
        lhs: None,
        call_context,
        return_context,
    });
    caller.functions.push(FunctionState::new(semantics));

    let callee = |file_name: &str, fn_name: &str| {
        let mut file = CFile::new(file_name);
        let int = file.dictionary.intern_typ(CTyp::Int(IntKind::Int));
        let fun1 = file.dictionary.intern_typ(CTyp::Fun {
            rtype: int,
            formals: vec![int],
            varargs: false,
        });
        file.declarations
            .add_varinfo(varinfo(1, fn_name, fun1, true, true, true))
            .unwrap();
        file.declarations
            .add_varinfo(varinfo(2, "x", int, false, false, true))
            .unwrap();
        let mut semantics = FunctionSemantics::new(fn_name, VarId(1));
        semantics.formals.push(Formal {
            index: 1,
            vid: VarId(2),
            name: "x".to_string(),
        });
        file.functions.push(FunctionState::new(semantics));
        file
    };

    Project::assemble(
        vec![caller, callee("f1.c", "apply_one"), callee("f2.c", "apply_two")],
        SummaryIndex::default(),
        Vec::new(),
    )
    .unwrap()
}

#[test]
fn indirect_calls_propagate_only_the_shared_interface() {
    let mut project = indirect_project(vec![5, 6]);
    project.files[1].functions[0]
        .api
        .record_assumption(XPredicate::NotNull(STerm::ArgValue(1)), Origin::Analyzer);
    project.files[1].functions[0]
        .api
        .record_assumption(XPredicate::NonNegative(STerm::ArgValue(1)), Origin::Analyzer);
    project.files[2].functions[0]
        .api
        .record_assumption(XPredicate::NotNull(STerm::ArgValue(1)), Origin::Analyzer);

    assert_eq!(integrate(&mut project).unwrap(), 1);

    let caller = &project.files[0];
    assert_eq!(caller.functions[0].proofs.len(), 1);
    assert_eq!(render(caller, PoId(1)), "not-null(7)");
}

#[test]
fn unresolvable_indirect_candidates_suppress_propagation() {
    let mut project = indirect_project(vec![5, 99]);
    project.files[1].functions[0]
        .api
        .record_assumption(XPredicate::NotNull(STerm::ArgValue(1)), Origin::Analyzer);

    assert_eq!(integrate(&mut project).unwrap(), 0);
    assert!(project.files[0].functions[0].proofs.is_empty());
}

// ==================== failed files ====================

#[test]
fn failed_files_neither_export_nor_import_interfaces() {
    let (mut project, _ids) = identity_project(4105);
    project.files[1].functions[0]
        .api
        .record_guarantee(identity_guarantee(), Origin::Analyzer);
    project.files[1].failed = Some("analyzer timed out after 600s".to_string());

    assert_eq!(integrate(&mut project).unwrap(), 0);
    assert_eq!(project.files[0].functions[0].proofs.len(), 1);
}
