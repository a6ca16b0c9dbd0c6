//! The api record of a function.
//!
//! Assumptions a function places on its callers, guarantees it offers
//! them, analyzer candidates awaiting promotion, and the bookkeeping
//! for contract precedence. Everything here is stated in interface
//! predicates, so callers can instantiate entries in their own
//! dictionaries.

use std::collections::{BTreeMap, BTreeSet};

use cproof_core::{ApiAssumptionId, PoId};
use cproof_dictionary::{XPredicate, XSlot};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where an interface predicate came from. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Derived by the native analyzer.
    Analyzer,
    /// Supplied by a user contract or library summary.
    Contract,
}

/// A committed api assumption with the obligations that depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAssumption {
    pub id: ApiAssumptionId,
    pub predicate: XPredicate,
    pub origin: Origin,
    /// Obligations in this function discharged against the assumption.
    pub ppos: Vec<PoId>,
    /// Supporting obligations instantiated from it elsewhere.
    pub spos: Vec<PoId>,
}

/// A guarantee the function offers its callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantee {
    pub predicate: XPredicate,
    pub origin: Origin,
}

/// An analyzer-proposed assumption that would discharge the listed open
/// obligations if committed. Promotion happens in the integration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAssumption {
    pub predicate: XPredicate,
    pub supports: Vec<PoId>,
}

/// Read-only view of a function's effective interface for one round.
///
/// Taken at the integration barrier, after every file's analysis for
/// the round has completed, so propagation never sees half-updated
/// state.
#[derive(Debug, Clone, Default)]
pub struct ApiSnapshot {
    pub assumptions: Vec<(ApiAssumptionId, XPredicate)>,
    pub guarantees: Vec<XPredicate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionApi {
    next_assumption: u32,
    assumptions: BTreeMap<u32, ApiAssumption>,
    guarantees: Vec<Guarantee>,
    /// Slots claimed by contract entries; analyzer submissions for
    /// these slots are dropped.
    contract_slots: Vec<XSlot>,
    candidates: Vec<CandidateAssumption>,
    missing_summaries: BTreeSet<String>,
    library_calls: BTreeMap<String, u32>,
}

impl FunctionApi {
    pub fn new() -> Self {
        FunctionApi {
            next_assumption: 1,
            assumptions: BTreeMap::new(),
            guarantees: Vec::new(),
            contract_slots: Vec::new(),
            candidates: Vec::new(),
            missing_summaries: BTreeSet::new(),
            library_calls: BTreeMap::new(),
        }
    }

    fn slot_is_contracted(&self, slot: &XSlot) -> bool {
        self.contract_slots.contains(slot)
    }

    // ==================== assumptions ====================


    /// Records an assumption, deduplicating on the exact predicate.
    ///
    /// An analyzer submission whose slot is held by a contract entry is
    /// suppressed: the contract entry's id is returned instead.
    pub fn record_assumption(&mut self, predicate: XPredicate, origin: Origin) -> ApiAssumptionId {
        if origin == Origin::Analyzer && self.slot_is_contracted(&predicate.slot()) {
            let slot = predicate.slot();
            if let Some(existing) = self
                .assumptions
                .values()
                .find(|a| a.origin == Origin::Contract && a.predicate.slot() == slot)
            {
                debug!(slot = ?slot, "analyzer assumption suppressed by contract");
                return existing.id;
            }
        }
        if let Some(existing) = self
            .assumptions
            .values()
            .find(|a| a.predicate == predicate)
        {
            return existing.id;
        }
        let id = ApiAssumptionId(self.next_assumption);
        self.next_assumption += 1;
        self.assumptions.insert(
            id.0,
            ApiAssumption {
                id,
                predicate,
                origin,
                ppos: Vec::new(),
                spos: Vec::new(),
            },
        );
        id
    }

    /// Installs a contract assumption and claims its slot, so the
    /// analyzer can never regenerate a competing entry for it.
    pub fn contract_assumption(&mut self, predicate: XPredicate) -> ApiAssumptionId {
        let slot = predicate.slot();
        if !self.contract_slots.contains(&slot) {
            self.contract_slots.push(slot);
        }
        self.record_assumption(predicate, Origin::Contract)
    }

    pub fn attach_ppo(&mut self, id: ApiAssumptionId, po: PoId) {
        if let Some(a) = self.assumptions.get_mut(&id.0) {
            if !a.ppos.contains(&po) {
                a.ppos.push(po);
            }
        }
    }

    pub fn attach_spo(&mut self, id: ApiAssumptionId, po: PoId) {
        if let Some(a) = self.assumptions.get_mut(&id.0) {
            if !a.spos.contains(&po) {
                a.spos.push(po);
            }
        }
    }

    pub fn assumption(&self, id: ApiAssumptionId) -> Option<&ApiAssumption> {
        self.assumptions.get(&id.0)
    }

    pub fn assumptions(&self) -> impl Iterator<Item = &ApiAssumption> {
        self.assumptions.values()
    }

    // ==================== guarantees ====================

    /// Records a guarantee. Contract entries claim their slot and evict
    /// an analyzer entry occupying it; analyzer entries are dropped
    /// when their slot is contracted. Returns whether the set changed.
    pub fn record_guarantee(&mut self, predicate: XPredicate, origin: Origin) -> bool {
        let slot = predicate.slot();
        match origin {
            Origin::Analyzer => {
                if self.slot_is_contracted(&slot) {
                    debug!(slot = ?slot, "analyzer guarantee suppressed by contract");
                    return false;
                }
            }
            Origin::Contract => {
                if !self.contract_slots.contains(&slot) {
                    self.contract_slots.push(slot.clone());
                }
                self.guarantees
                    .retain(|g| !(g.origin == Origin::Analyzer && g.predicate.slot() == slot));
            }
        }
        if self.guarantees.iter().any(|g| g.predicate == predicate) {
            return false;
        }
        self.guarantees.push(Guarantee { predicate, origin });
        true
    }

    pub fn guarantees(&self) -> &[Guarantee] {
        &self.guarantees
    }

    // ==================== candidates ====================

    pub fn add_candidate(&mut self, candidate: CandidateAssumption) {
        if !self.candidates.contains(&candidate) {
            self.candidates.push(candidate);
        }
    }

    /// Drains the candidates recorded since the last integration pass.
    pub fn take_candidates(&mut self) -> Vec<CandidateAssumption> {
        std::mem::take(&mut self.candidates)
    }

    // ==================== library bookkeeping ====================

    pub fn record_library_call(&mut self, header: &str, name: &str) {
        *self
            .library_calls
            .entry(format!("{}/{}", header, name))
            .or_insert(0) += 1;
    }

    pub fn record_missing_summary(&mut self, name: impl Into<String>) {
        self.missing_summaries.insert(name.into());
    }

    pub fn missing_summaries(&self) -> impl Iterator<Item = &str> {
        self.missing_summaries.iter().map(|s| s.as_str())
    }

    pub fn library_calls(&self) -> impl Iterator<Item = (&str, u32)> {
        self.library_calls.iter().map(|(k, v)| (k.as_str(), *v))
    }

    // ==================== snapshot ====================

    /// The effective interface: committed assumptions and guarantees
    /// with contract precedence already applied.
    pub fn snapshot(&self) -> ApiSnapshot {
        ApiSnapshot {
            assumptions: self
                .assumptions
                .values()
                .map(|a| (a.id, a.predicate.clone()))
                .collect(),
            guarantees: self.guarantees.iter().map(|g| g.predicate.clone()).collect(),
        }
    }
}

impl Default for FunctionApi {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cproof_dictionary::STerm;

    fn not_null(arg: u32) -> XPredicate {
        XPredicate::NotNull(STerm::ArgValue(arg))
    }

    fn non_negative(arg: u32) -> XPredicate {
        XPredicate::NonNegative(STerm::ArgValue(arg))
    }

    // ==================== assumption tests ====================

    #[test]
    fn assumptions_dedupe_on_predicate() {
        let mut api = FunctionApi::new();
        let a = api.record_assumption(not_null(1), Origin::Analyzer);
        let b = api.record_assumption(not_null(1), Origin::Analyzer);
        let c = api.record_assumption(not_null(2), Origin::Analyzer);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(api.assumptions().count(), 2);
    }

    #[test]
    fn contract_slot_suppresses_analyzer_assumption() {
        let mut api = FunctionApi::new();
        let contract_id = api.contract_assumption(not_null(1));
        let analyzer_id = api.record_assumption(not_null(1), Origin::Analyzer);
        assert_eq!(contract_id, analyzer_id);
        assert_eq!(api.assumption(contract_id).unwrap().origin, Origin::Contract);
    }

    #[test]
    fn contract_precedence_is_per_slot() {
        let mut api = FunctionApi::new();
        api.contract_assumption(not_null(1));
        // a different slot is unaffected
        let id = api.record_assumption(non_negative(2), Origin::Analyzer);
        assert_eq!(api.assumption(id).unwrap().origin, Origin::Analyzer);
    }

    #[test]
    fn obligations_attach_once() {
        let mut api = FunctionApi::new();
        let id = api.record_assumption(not_null(1), Origin::Analyzer);
        api.attach_ppo(id, PoId(4));
        api.attach_ppo(id, PoId(4));
        api.attach_spo(id, PoId(9));
        let a = api.assumption(id).unwrap();
        assert_eq!(a.ppos, vec![PoId(4)]);
        assert_eq!(a.spos, vec![PoId(9)]);
    }

    // ==================== guarantee tests ====================

    #[test]
    fn contract_guarantee_evicts_analyzer_entry_in_its_slot() {
        let mut api = FunctionApi::new();
        assert!(api.record_guarantee(
            XPredicate::NotNull(STerm::ReturnValue),
            Origin::Analyzer
        ));
        assert!(api.record_guarantee(
            XPredicate::NotNull(STerm::ReturnValue),
            Origin::Contract
        ));
        assert_eq!(api.guarantees().len(), 1);
        assert_eq!(api.guarantees()[0].origin, Origin::Contract);
        // the analyzer cannot take the slot back
        assert!(!api.record_guarantee(
            XPredicate::NotNull(STerm::ReturnValue),
            Origin::Analyzer
        ));
    }

    #[test]
    fn duplicate_guarantees_do_not_grow_the_set() {
        let mut api = FunctionApi::new();
        assert!(api.record_guarantee(non_negative(1), Origin::Analyzer));
        assert!(!api.record_guarantee(non_negative(1), Origin::Analyzer));
        assert_eq!(api.guarantees().len(), 1);
    }

    // ==================== candidate tests ====================

    #[test]
    fn candidates_drain_on_take() {
        let mut api = FunctionApi::new();
        api.add_candidate(CandidateAssumption {
            predicate: not_null(1),
            supports: vec![PoId(2)],
        });
        api.add_candidate(CandidateAssumption {
            predicate: not_null(1),
            supports: vec![PoId(2)],
        });
        let drained = api.take_candidates();
        assert_eq!(drained.len(), 1);
        assert!(api.take_candidates().is_empty());
    }

    // ==================== bookkeeping tests ====================

    #[test]
    fn library_calls_and_missing_summaries_accumulate() {
        let mut api = FunctionApi::new();
        api.record_library_call("stdlib.h", "malloc");
        api.record_library_call("stdlib.h", "malloc");
        api.record_missing_summary("frobnicate");
        api.record_missing_summary("frobnicate");
        assert_eq!(
            api.library_calls().collect::<Vec<_>>(),
            vec![("stdlib.h/malloc", 2)]
        );
        assert_eq!(api.missing_summaries().collect::<Vec<_>>(), vec!["frobnicate"]);
    }

    #[test]
    fn snapshot_reflects_committed_state() {
        let mut api = FunctionApi::new();
        let id = api.record_assumption(not_null(1), Origin::Analyzer);
        api.record_guarantee(XPredicate::NotNull(STerm::ReturnValue), Origin::Analyzer);
        api.add_candidate(CandidateAssumption {
            predicate: non_negative(2),
            supports: vec![],
        });
        let snap = api.snapshot();
        assert_eq!(snap.assumptions, vec![(id, not_null(1))]);
        assert_eq!(snap.guarantees.len(), 1);
        // candidates are not part of the interface until promoted
        assert!(!snap
            .assumptions
            .iter()
            .any(|(_, p)| *p == non_negative(2)));
    }

    #[test]
    fn api_round_trips_through_json() {
        let mut api = FunctionApi::new();
        api.contract_assumption(not_null(1));
        api.record_guarantee(XPredicate::NotNull(STerm::ReturnValue), Origin::Contract);
        let json = serde_json::to_string(&api).unwrap();
        let mut back: FunctionApi = serde_json::from_str(&json).unwrap();
        // contract slots survive the round trip
        let id = back.record_assumption(not_null(1), Origin::Analyzer);
        assert_eq!(back.assumption(id).unwrap().origin, Origin::Contract);
    }
}
