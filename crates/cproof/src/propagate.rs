//! The assumption propagation engine.
//!
//! One integration pass runs single-threaded over the global snapshot,
//! in three steps:
//!
//! 1. promote analyzer candidate assumptions that back open obligations
//!    into committed api assumptions, closing those obligations
//!    `SafeApi`;
//! 2. instantiate every callee assumption at every call site as a
//!    supporting obligation in the caller's store;
//! 3. instantiate callee guarantees just after each call, either as
//!    supporting obligations at the return context, as rewrites of
//!    obligations that depend on the call's result, or as global
//!    assumption updates.
//!
//! Contracts and library summaries were folded into the function apis
//! at assembly time, so precedence is already resolved by the time a
//! snapshot is taken here. The pass returns the number of SPOs it
//! added; a pass that adds zero means the project has stabilized.

use std::collections::HashMap;

use cproof_core::{ApiAssumptionId, ContextId, ExpId, FileId, GlobalVarId, PoId, VarId};
use cproof_dictionary::{
    BinOp, CFileDictionary, DictionaryError, STerm, TypeSig, XPredicate,
};
use cproof_proof::{FunctionProofs, Origin, PoStatus, SpoSite};
use cproof_xref::XrefTable;
use tracing::{debug, info, warn};

use crate::error::ProjectError;
use crate::project::{CFile, FunctionState, Project};
use crate::semantics::{CallSite, CallTarget};
use crate::subst::{CallBinding, Instantiator, SubstError};

/// Effective callee interface for one integration pass, taken after
/// every file's analysis for the round has completed.
#[derive(Debug, Clone, Default)]
struct CalleeInterface {
    /// Assumption id in the callee's api, absent for summaries and
    /// joined function-pointer interfaces.
    assumptions: Vec<(Option<ApiAssumptionId>, XPredicate)>,
    guarantees: Vec<XPredicate>,
    /// Formal type signatures, empty when unavailable (type checking is
    /// then skipped).
    formal_sigs: Vec<TypeSig>,
}

/// Runs one integration pass. Returns the number of SPOs added.
pub fn integrate(project: &mut Project) -> Result<u64, ProjectError> {
    promote_candidates(project)?;
    let interfaces = collect_interfaces(project);
    let added = instantiate_interfaces(project, &interfaces)?;
    info!(added, "integration pass complete");
    Ok(added)
}

/// Step 1: candidate promotion.
///
/// A candidate only commits if at least one obligation it supports is
/// still open; candidates whose obligations all closed by other means
/// are dropped.
fn promote_candidates(project: &mut Project) -> Result<(), ProjectError> {
    for file in project.files.iter_mut().filter(|f| f.is_active()) {
        for function in &mut file.functions {
            let FunctionState {
                semantics,
                proofs,
                api,
            } = function;
            for candidate in api.take_candidates() {
                let open: Vec<PoId> = candidate
                    .supports
                    .iter()
                    .copied()
                    .filter(|id| proofs.get(*id).map(|po| po.is_open()).unwrap_or(false))
                    .collect();
                if open.is_empty() {
                    debug!(
                        function = %semantics.name,
                        predicate = %candidate.predicate,
                        "candidate supports no open obligation, dropped"
                    );
                    continue;
                }
                let id = api.record_assumption(candidate.predicate.clone(), Origin::Analyzer);
                for po in open {
                    proofs.set_status(po, PoStatus::SafeApi { assumption: id })?;
                    api.attach_ppo(id, po);
                }
                debug!(function = %semantics.name, assumption = %id, "candidate promoted");
            }
        }
    }
    Ok(())
}

/// Snapshot of every linked function's effective interface. Only the
/// defining occurrence contributes.
fn collect_interfaces(project: &Project) -> HashMap<GlobalVarId, CalleeInterface> {
    let mut interfaces = HashMap::new();
    for file in project.files.iter().filter(|f| f.is_active()) {
        for function in &file.functions {
            let Some(gvid) = project.xref.resolve(file.id, function.semantics.vid) else {
                warn!(function = %function.semantics.name, "function not linked, interface skipped");
                continue;
            };
            if project.xref.defining_file(gvid) != Some(file.id) {
                continue;
            }
            let snapshot = function.api.snapshot();
            let formal_sigs: Vec<TypeSig> = function
                .semantics
                .formals
                .iter()
                .map(|f| {
                    file.declarations
                        .varinfo(f.vid)
                        .and_then(|v| file.dictionary.type_signature(v.typ))
                })
                .collect::<Result<_, _>>()
                .unwrap_or_default();
            interfaces.insert(
                gvid,
                CalleeInterface {
                    assumptions: snapshot
                        .assumptions
                        .into_iter()
                        .map(|(id, p)| (Some(id), p))
                        .collect(),
                    guarantees: snapshot.guarantees,
                    formal_sigs,
                },
            );
        }
    }
    interfaces
}

/// Steps 2 and 3 over every call site of every active file.
fn instantiate_interfaces(
    project: &mut Project,
    interfaces: &HashMap<GlobalVarId, CalleeInterface>,
) -> Result<u64, ProjectError> {
    let mut added = 0u64;
    let mut deferred: Vec<(GlobalVarId, ApiAssumptionId, PoId)> = Vec::new();

    let Project {
        files,
        xref,
        summaries,
        global_assumptions,
        ..
    } = project;

    for file in files.iter_mut().filter(|f| f.is_active()) {
        let CFile {
            id,
            dictionary,
            declarations,
            functions,
            ..
        } = file;
        let fid = *id;
        for function in functions.iter_mut() {
            let FunctionState {
                semantics,
                proofs,
                api,
            } = function;
            for cs in &semantics.callsites {
                let (iface, callee_gvid) = match &cs.target {
                    CallTarget::Direct(vid) => {
                        let Some(gvid) = xref.resolve(fid, *vid) else {
                            debug!(caller = %semantics.name, "call target not linked");
                            continue;
                        };
                        let Some(iface) = interfaces.get(&gvid) else {
                            debug!(caller = %semantics.name, %gvid, "no interface for callee");
                            continue;
                        };
                        (iface.clone(), Some(gvid))
                    }
                    CallTarget::Library { header, name } => {
                        api.record_library_call(header, name);
                        match summaries.lookup(name) {
                            Some(summary) => (
                                CalleeInterface {
                                    assumptions: summary
                                        .assumptions
                                        .iter()
                                        .map(|p| (None, p.clone()))
                                        .collect(),
                                    guarantees: summary.guarantees.clone(),
                                    formal_sigs: Vec::new(),
                                },
                                None,
                            ),
                            None => {
                                api.record_missing_summary(name);
                                continue;
                            }
                        }
                    }
                    CallTarget::Indirect { candidates, .. } => {
                        match join_candidates(fid, xref, interfaces, candidates) {
                            Some(iface) => (iface, None),
                            None => {
                                debug!(
                                    caller = %semantics.name,
                                    "no shared interface across indirect candidates"
                                );
                                continue;
                            }
                        }
                    }
                };

                let binding = CallBinding {
                    args: &cs.args,
                    lhs: cs.lhs,
                };

                added += instantiate_assumptions(
                    dictionary,
                    declarations,
                    fid,
                    xref,
                    proofs,
                    cs,
                    &binding,
                    &iface,
                    callee_gvid,
                    &mut deferred,
                )?;

                added += instantiate_guarantees(
                    dictionary,
                    declarations,
                    fid,
                    xref,
                    proofs,
                    cs,
                    &binding,
                    &iface,
                    global_assumptions,
                )?;
            }
        }
    }

    // attach the new SPOs to the callee assumptions they came from
    for (gvid, assumption, po) in deferred {
        let Some(def_file) = xref.defining_file(gvid) else {
            continue;
        };
        let Some(vid) = xref.vid_in_file(gvid, def_file) else {
            continue;
        };
        if let Some(file) = files.get_mut(def_file.0 as usize) {
            if let Some(function) = file.function_mut(vid) {
                function.api.attach_spo(assumption, po);
            }
        }
    }

    Ok(added)
}

/// Step 2: each callee assumption, actuals substituted for formals,
/// becomes a callsite SPO in the caller. A type mismatch still creates
/// the obligation but pins a diagnostic on it; it will stay open.
#[allow(clippy::too_many_arguments)]
fn instantiate_assumptions(
    dictionary: &mut CFileDictionary,
    declarations: &cproof_dictionary::FileDeclarations,
    fid: FileId,
    xref: &XrefTable,
    proofs: &mut FunctionProofs,
    cs: &CallSite,
    binding: &CallBinding<'_>,
    iface: &CalleeInterface,
    callee_gvid: Option<GlobalVarId>,
    deferred: &mut Vec<(GlobalVarId, ApiAssumptionId, PoId)>,
) -> Result<u64, ProjectError> {
    let mut added = 0;
    for (assumption_id, xp) in &iface.assumptions {
        let mut inst = Instantiator::new(dictionary, declarations, fid, xref);
        let diagnostic = match inst.check_types(xp, binding, &iface.formal_sigs) {
            Ok(d) => d,
            Err(SubstError::Dictionary(e)) => return Err(e.into()),
            Err(e) => {
                debug!(error = %e, predicate = %xp, "type check skipped");
                None
            }
        };
        match inst.instantiate(xp, binding) {
            Ok(predicate) => {
                let pid = dictionary.intern_predicate(predicate);
                let (po, new) = proofs.add_spo(SpoSite::Callsite, pid, cs.call_context);
                if new {
                    added += 1;
                }
                if let Some(msg) = diagnostic {
                    proofs.set_diagnostic(po, msg)?;
                }
                if let (Some(gvid), Some(aid)) = (callee_gvid, assumption_id) {
                    deferred.push((gvid, *aid, po));
                }
            }
            Err(e) => {
                debug!(error = %e, predicate = %xp, "assumption not instantiable at call site");
            }
        }
    }
    Ok(added)
}

/// Step 3: guarantees instantiate just after the call.
#[allow(clippy::too_many_arguments)]
fn instantiate_guarantees(
    dictionary: &mut CFileDictionary,
    declarations: &cproof_dictionary::FileDeclarations,
    fid: FileId,
    xref: &XrefTable,
    proofs: &mut FunctionProofs,
    cs: &CallSite,
    binding: &CallBinding<'_>,
    iface: &CalleeInterface,
    global_assumptions: &mut crate::project::GlobalAssumptions,
) -> Result<u64, ProjectError> {
    let mut added = 0;
    for xp in &iface.guarantees {
        if let Some(gvid) = global_target(xp) {
            if global_assumptions.add(gvid, xp.clone()) {
                debug!(%gvid, predicate = %xp, "global assumption recorded");
            }
            continue;
        }
        if matches!(xp, XPredicate::Disjunction(_)) {
            debug!(predicate = %xp, "disjunctive guarantee left to per-file analysis");
            continue;
        }

        let mut inst = Instantiator::new(dictionary, declarations, fid, xref);
        match inst.instantiate(xp, binding) {
            Ok(predicate) => {
                let pid = dictionary.intern_predicate(predicate);
                let (_, new) = proofs.add_spo(SpoSite::Returnsite, pid, cs.return_context);
                if new {
                    added += 1;
                }
            }
            Err(SubstError::NoReturnValue) => {
                debug!(predicate = %xp, "call result unused, return guarantee dropped");
            }
            Err(e) => {
                debug!(error = %e, predicate = %xp, "guarantee not instantiable at return site");
            }
        }

        // a functional equality lets obligations that consume the call
        // result be restated over the callee's expression
        if let Some(value_term) = functional_value(xp) {
            if let Some(lhs) = cs.lhs {
                let mut inst = Instantiator::new(dictionary, declarations, fid, xref);
                match inst.term_to_exp(value_term, binding) {
                    Ok(value_exp) => {
                        added += rewrite_dependents(
                            dictionary,
                            proofs,
                            cs.return_context,
                            lhs,
                            value_exp,
                        )?;
                    }
                    Err(e) => {
                        debug!(error = %e, predicate = %xp, "equality guarantee not resolvable");
                    }
                }
            }
        }
    }
    Ok(added)
}

/// Restates every open obligation consuming `lhs` with `value` in its
/// place, as a returnsite SPO.
fn rewrite_dependents(
    dictionary: &mut CFileDictionary,
    proofs: &mut FunctionProofs,
    return_context: ContextId,
    lhs: ExpId,
    value: ExpId,
) -> Result<u64, ProjectError> {
    let mut added = 0;
    // obligations already sitting at the return context came from this
    // same guarantee; rewriting them again only manufactures trivia
    let open_predicates: Vec<_> = proofs
        .iter()
        .filter(|po| po.is_open() && po.context != return_context)
        .map(|po| po.predicate)
        .collect();
    for pid in open_predicates {
        let predicate = dictionary.predicate(pid)?.clone();
        let mut involved = false;
        for e in predicate.exp_operands() {
            if dictionary.exp_contains(e, lhs)? {
                involved = true;
                break;
            }
        }
        if !involved {
            continue;
        }
        let mut failure: Option<DictionaryError> = None;
        let rewritten = predicate.map_exps(&mut |e| match dictionary.exp_replace(e, lhs, value) {
            Ok(x) => x,
            Err(err) => {
                failure = Some(err);
                e
            }
        });
        if let Some(err) = failure {
            return Err(err.into());
        }
        if rewritten == predicate {
            continue;
        }
        let npid = dictionary.intern_predicate(rewritten);
        let (_, new) = proofs.add_spo(SpoSite::Returnsite, npid, return_context);
        if new {
            added += 1;
        }
    }
    Ok(added)
}

/// The non-return side of an `return-value == t` guarantee.
fn functional_value(xp: &XPredicate) -> Option<&STerm> {
    let XPredicate::RelationalExpr {
        op: BinOp::Eq,
        lhs,
        rhs,
    } = xp
    else {
        return None;
    };
    match (lhs == &STerm::ReturnValue, rhs == &STerm::ReturnValue) {
        (true, false) if !rhs.mentions_return() => Some(rhs),
        (false, true) if !lhs.mentions_return() => Some(lhs),
        _ => None,
    }
}

/// For a guarantee stated purely over globals and constants, the global
/// it is about.
fn global_target(xp: &XPredicate) -> Option<GlobalVarId> {
    let mut target = None;
    for term in xp.terms() {
        if !term_is_global_or_constant(term, &mut target) {
            return None;
        }
    }
    target
}

fn term_is_global_or_constant(term: &STerm, target: &mut Option<GlobalVarId>) -> bool {
    match term {
        STerm::NumConstant(_) => true,
        STerm::GlobalValue(gvid) => {
            target.get_or_insert(*gvid);
            true
        }
        STerm::ArithmeticExpr { lhs, rhs, .. } => {
            term_is_global_or_constant(lhs, target) && term_is_global_or_constant(rhs, target)
        }
        STerm::ArgValue(_) | STerm::ReturnValue => false,
    }
}

/// Conservative join over function-pointer candidates: only interface
/// entries shared structurally by every candidate survive; an
/// unresolvable candidate suppresses everything.
fn join_candidates(
    fid: FileId,
    xref: &XrefTable,
    interfaces: &HashMap<GlobalVarId, CalleeInterface>,
    candidates: &[VarId],
) -> Option<CalleeInterface> {
    let mut resolved = Vec::with_capacity(candidates.len());
    for vid in candidates {
        let gvid = xref.resolve(fid, *vid)?;
        resolved.push(interfaces.get(&gvid)?);
    }
    let first = resolved.first()?;
    let assumptions = first
        .assumptions
        .iter()
        .filter(|(_, p)| {
            resolved
                .iter()
                .all(|i| i.assumptions.iter().any(|(_, q)| q == p))
        })
        .map(|(_, p)| (None, p.clone()))
        .collect();
    let guarantees = first
        .guarantees
        .iter()
        .filter(|p| resolved.iter().all(|i| i.guarantees.contains(p)))
        .cloned()
        .collect();
    let formal_sigs = if resolved.iter().all(|i| i.formal_sigs == first.formal_sigs) {
        first.formal_sigs.clone()
    } else {
        Vec::new()
    };
    Some(CalleeInterface {
        assumptions,
        guarantees,
        formal_sigs,
    })
}
