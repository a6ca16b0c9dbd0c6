//! Round-state machine and per-round statistics.
//!
//! The integration controller alternates per-file analysis with a
//! single-threaded integration pass. The states here make the legal
//! transitions explicit:
//!
//! ```text
//! Parsed -> Analyzing(1) -> Integrating(1) -> Analyzing(2) -> ...
//!        -> Stabilized | RoundLimitReached | Interrupted
//! ```
//!
//! `Stabilized` fires when an integration pass adds zero SPOs project
//! wide; `RoundLimitReached` when the round budget is exhausted while
//! SPOs were still being added. Neither terminal state is an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of the round controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// Artifacts loaded, no round started yet.
    Parsed,
    /// Per-file analysis workers running for round `round`.
    Analyzing { round: u32 },
    /// Integration pass running for round `round`; all file analyses
    /// for this round have completed (the barrier).
    Integrating { round: u32 },
    /// A round added zero SPOs; the project is at a fixpoint.
    Stabilized { rounds: u32 },
    /// The round budget ran out while SPOs were still being added.
    RoundLimitReached { rounds: u32, open_obligations: u64 },
    /// Cancellation was requested between rounds.
    Interrupted { rounds: u32 },
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RoundState::Stabilized { .. }
                | RoundState::RoundLimitReached { .. }
                | RoundState::Interrupted { .. }
        )
    }

    /// Checked transition; the controller only ever moves forward.
    pub fn advance(self, next: RoundState) -> Result<RoundState, RoundTransitionError> {
        let ok = match (&self, &next) {
            (RoundState::Parsed, RoundState::Analyzing { round: 1 }) => true,
            (RoundState::Analyzing { round: a }, RoundState::Integrating { round: i }) => a == i,
            (RoundState::Integrating { round: i }, RoundState::Analyzing { round: a }) => {
                *a == *i + 1
            }
            (RoundState::Integrating { .. }, RoundState::Stabilized { .. }) => true,
            (RoundState::Integrating { .. }, RoundState::RoundLimitReached { .. }) => true,
            // a zero-round budget exhausts immediately
            (RoundState::Parsed, RoundState::RoundLimitReached { rounds: 0, .. }) => true,
            (RoundState::Parsed, RoundState::Interrupted { .. }) => true,
            (RoundState::Integrating { .. }, RoundState::Interrupted { .. }) => true,
            _ => false,
        };
        if ok {
            Ok(next)
        } else {
            Err(RoundTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal round transition: {from:?} -> {to:?}")]
pub struct RoundTransitionError {
    pub from: RoundState,
    pub to: RoundState,
}

/// Obligation and propagation counts for one completed round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub round: u32,
    /// SPOs added by this round's integration pass.
    pub new_spos: u64,
    pub open: u64,
    pub safe: u64,
    pub violations: u64,
    /// Library calls still lacking a summary, project wide.
    pub missing_summaries: u64,
    /// Files excluded after a per-file failure.
    pub failed_files: u64,
}

/// Final result of a controller run: terminal state plus the per-round
/// statistics trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub state: RoundState,
    pub rounds: Vec<RoundStats>,
}

impl AnalysisOutcome {
    pub fn stabilized(&self) -> bool {
        matches!(self.state, RoundState::Stabilized { .. })
    }

    /// Open-obligation count after the last completed round.
    pub fn open_obligations(&self) -> u64 {
        self.rounds.last().map(|s| s.open).unwrap_or(0)
    }

    pub fn total_new_spos(&self) -> u64 {
        self.rounds.iter().map(|s| s.new_spos).sum()
    }
}
