//! The per-function obligation store.

use std::collections::BTreeMap;

use cproof_core::{ApiAssumptionId, ContextId, PoId, PredId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProofError;
use crate::obligation::{PoKind, ProofObligation, SpoSite};
use crate::status::PoStatus;

/// Result of a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Updated,
    /// The obligation already carried this status.
    Unchanged,
}

/// All obligations of one function.
///
/// Primary obligations are added once and sealed; supporting
/// obligations accumulate across rounds, idempotently on their
/// (predicate, context) shape. Ids are issued from one counter so a
/// `PoId` is unambiguous within the function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionProofs {
    obligations: BTreeMap<u32, ProofObligation>,
    ppos_sealed: bool,
    next_id: u32,
}

impl FunctionProofs {
    pub fn new() -> Self {
        FunctionProofs {
            obligations: BTreeMap::new(),
            ppos_sealed: false,
            next_id: 1,
        }
    }

    /// Adds a primary obligation. Duplicate shapes return the existing
    /// id; additions after sealing are a protocol error.
    pub fn add_ppo(&mut self, predicate: PredId, context: ContextId) -> Result<PoId, ProofError> {
        if self.ppos_sealed {
            return Err(ProofError::PposSealed);
        }
        if let Some(existing) = self.find_shape(predicate, context) {
            return Ok(existing);
        }
        Ok(self.push(predicate, context, PoKind::Primary))
    }

    /// Marks primary obligation generation complete.
    pub fn seal_ppos(&mut self) {
        self.ppos_sealed = true;
    }

    /// Adds a supporting obligation; idempotent on (predicate,
    /// context). Returns the id and whether the obligation is new.
    pub fn add_spo(
        &mut self,
        site: SpoSite,
        predicate: PredId,
        context: ContextId,
    ) -> (PoId, bool) {
        if let Some(existing) = self.find_shape(predicate, context) {
            return (existing, false);
        }
        let id = self.push(predicate, context, PoKind::Supporting(site));
        (id, true)
    }

    fn push(&mut self, predicate: PredId, context: ContextId, kind: PoKind) -> PoId {
        let id = PoId(self.next_id);
        self.next_id += 1;
        self.obligations
            .insert(id.0, ProofObligation::new(id, predicate, context, kind));
        id
    }

    fn find_shape(&self, predicate: PredId, context: ContextId) -> Option<PoId> {
        self.obligations
            .values()
            .find(|po| po.predicate == predicate && po.context == context)
            .map(|po| po.id)
    }

    pub fn get(&self, id: PoId) -> Result<&ProofObligation, ProofError> {
        self.obligations
            .get(&id.0)
            .ok_or(ProofError::UnknownObligation { id })
    }

    /// Applies a status, enforcing monotonicity: `Open` may move to any
    /// closed status; a closed status accepts only itself (a no-op).
    pub fn set_status(&mut self, id: PoId, status: PoStatus) -> Result<StatusChange, ProofError> {
        let po = self
            .obligations
            .get_mut(&id.0)
            .ok_or(ProofError::UnknownObligation { id })?;
        if po.status == status {
            return Ok(StatusChange::Unchanged);
        }
        if po.status.is_closed() {
            return Err(ProofError::StatusRegression {
                id,
                from: po.status.clone(),
                to: status,
            });
        }
        if let PoStatus::SafeApi { assumption } = &status {
            if !po.dependencies.contains(assumption) {
                po.dependencies.push(*assumption);
            }
        }
        debug!(%id, status = %status, "obligation closed");
        po.status = status;
        Ok(StatusChange::Updated)
    }

    pub fn set_diagnostic(&mut self, id: PoId, diagnostic: impl Into<String>) -> Result<(), ProofError> {
        let po = self
            .obligations
            .get_mut(&id.0)
            .ok_or(ProofError::UnknownObligation { id })?;
        po.diagnostic = Some(diagnostic.into());
        Ok(())
    }

    pub fn record_dependency(&mut self, id: PoId, assumption: ApiAssumptionId) -> Result<(), ProofError> {
        let po = self
            .obligations
            .get_mut(&id.0)
            .ok_or(ProofError::UnknownObligation { id })?;
        if !po.dependencies.contains(&assumption) {
            po.dependencies.push(assumption);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProofObligation> {
        self.obligations.values()
    }

    /// Obligations satisfying `filter`, in id order.
    pub fn list(&self, filter: impl Fn(&ProofObligation) -> bool) -> Vec<&ProofObligation> {
        self.obligations.values().filter(|po| filter(po)).collect()
    }

    pub fn open_count(&self) -> u64 {
        self.obligations.values().filter(|po| po.is_open()).count() as u64
    }

    pub fn safe_count(&self) -> u64 {
        self.obligations
            .values()
            .filter(|po| po.status.is_safe())
            .count() as u64
    }

    pub fn violation_count(&self) -> u64 {
        self.obligations
            .values()
            .filter(|po| po.status.is_violation())
            .count() as u64
    }

    pub fn len(&self) -> usize {
        self.obligations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obligations.is_empty()
    }
}
