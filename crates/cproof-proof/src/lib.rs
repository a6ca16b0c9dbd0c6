//! Proof obligations and api assumptions.
//!
//! Each analyzed function owns two records: a proof-obligation store
//! (primary obligations generated once at parse time, supporting
//! obligations appended by the integration rounds) and an api record
//! (the assumptions the function places on its callers, the guarantees
//! it offers them, and the contract entries that override both).
//! Obligation statuses only ever move from open to closed.

pub mod api;
pub mod contracts;
pub mod error;
pub mod obligation;
pub mod status;
pub mod store;

pub use api::{ApiAssumption, ApiSnapshot, CandidateAssumption, FunctionApi, Guarantee, Origin};
pub use contracts::{FunctionContract, LibrarySummary, SummaryIndex};
pub use error::ProofError;
pub use obligation::{PoKind, ProofObligation, SpoSite};
pub use status::PoStatus;
pub use store::{FunctionProofs, StatusChange};
