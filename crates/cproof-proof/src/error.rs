use cproof_core::PoId;
use thiserror::Error;

use crate::status::PoStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// Primary obligations are generated exactly once; additions after
    /// sealing indicate a frontend protocol violation.
    #[error("primary obligations are sealed, cannot add more")]
    PposSealed,

    #[error("unknown proof obligation id {id}")]
    UnknownObligation { id: PoId },

    /// A closed status may never change. Reported when a caller tries
    /// to reopen or reclassify a closed obligation.
    #[error("obligation {id} is already {from}, refusing transition to {to}")]
    StatusRegression {
        id: PoId,
        from: PoStatus,
        to: PoStatus,
    },
}
