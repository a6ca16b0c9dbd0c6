//! The round controller.
//!
//! Analysis alternates two phases until a fixpoint: every active file
//! is analyzed in parallel, then one single-threaded integration pass
//! moves assumptions across file boundaries. Collecting the per-file
//! results is the barrier between the phases; integration never sees a
//! half-analyzed round.
//!
//! A round that adds zero supporting obligations is the fixpoint. The
//! round budget bounds divergence; running out of budget is a reported
//! outcome, not an error. Cancellation is honored between rounds only,
//! so every completed round leaves consistent state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cproof_core::{AnalysisConfig, AnalysisOutcome, RoundState, RoundStats};
use cproof_proof::ProofError;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::analyzer::{AnalyzerError, FileAnalysis, FileAnalyzer};
use crate::error::ProjectError;
use crate::project::{CFile, Project};
use crate::propagate;

pub struct RoundController<A> {
    config: AnalysisConfig,
    analyzer: A,
    cancel: Arc<AtomicBool>,
}

impl<A: FileAnalyzer> RoundController<A> {
    pub fn new(config: AnalysisConfig, analyzer: A) -> Self {
        RoundController {
            config,
            analyzer,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag a signal handler can set to stop after the current
    /// round.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs rounds until stabilization, budget exhaustion or
    /// cancellation.
    pub fn run(&self, project: &mut Project) -> Result<AnalysisOutcome, ProjectError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_parallelism())
            .build()
            .map_err(|e| ProjectError::Pool(e.to_string()))?;

        let mut state = RoundState::Parsed;
        let mut rounds = Vec::new();

        if self.config.max_rounds == 0 {
            let (open, _, _) = project.obligation_counts();
            state = state.advance(RoundState::RoundLimitReached {
                rounds: 0,
                open_obligations: open,
            })?;
            return Ok(AnalysisOutcome { state, rounds });
        }

        for round in 1..=self.config.max_rounds {
            if self.cancel.load(Ordering::SeqCst) {
                state = state.advance(RoundState::Interrupted { rounds: round - 1 })?;
                info!(rounds = round - 1, "analysis interrupted");
                return Ok(AnalysisOutcome { state, rounds });
            }

            state = state.advance(RoundState::Analyzing { round })?;
            let results: Vec<(usize, Result<FileAnalysis, AnalyzerError>)> = pool.install(|| {
                project
                    .files
                    .par_iter()
                    .enumerate()
                    .filter(|(_, file)| file.is_active())
                    .map(|(i, file)| (i, self.analyzer.analyze(file, round)))
                    .collect()
            });

            for (i, result) in results {
                let file = &mut project.files[i];
                match result {
                    Ok(analysis) => apply_analysis(file, analysis),
                    Err(e) => {
                        warn!(file = %file.name, error = %e, "file analysis failed, excluding file");
                        file.failed = Some(e.to_string());
                    }
                }
            }

            state = state.advance(RoundState::Integrating { round })?;
            let new_spos = propagate::integrate(project)?;

            let (open, safe, violations) = project.obligation_counts();
            rounds.push(RoundStats {
                round,
                new_spos,
                open,
                safe,
                violations,
                missing_summaries: project.missing_summary_count(),
                failed_files: project.failed_file_count(),
            });
            info!(round, new_spos, open, safe, violations, "round complete");

            if new_spos == 0 {
                state = state.advance(RoundState::Stabilized { rounds: round })?;
                return Ok(AnalysisOutcome { state, rounds });
            }
        }

        let (open, _, _) = project.obligation_counts();
        state = state.advance(RoundState::RoundLimitReached {
            rounds: self.config.max_rounds,
            open_obligations: open,
        })?;
        Ok(AnalysisOutcome { state, rounds })
    }
}

/// Folds one file's analysis results into its state.
///
/// Analyzer output is advisory: verdicts for unknown obligations and
/// replays of already-closed ones are logged and dropped rather than
/// failing the run, since the analyzer may legitimately re-derive an
/// earlier round's verdict.
fn apply_analysis(file: &mut CFile, analysis: FileAnalysis) {
    for fa in analysis.functions {
        let file_name = file.name.clone();
        let Some(function) = file.function_mut(fa.vid) else {
            warn!(file = %file_name, vid = %fa.vid, "verdicts for unknown function dropped");
            continue;
        };
        for (po, status) in fa.discharges {
            match function.proofs.set_status(po, status) {
                Ok(_) => {}
                Err(ProofError::StatusRegression { id, from, to }) => {
                    warn!(file = %file_name, %id, %from, %to, "conflicting verdict dropped");
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "verdict dropped");
                }
            }
        }
        for candidate in fa.candidates {
            function.api.add_candidate(candidate);
        }
        for guarantee in fa.guarantees {
            function
                .api
                .record_guarantee(guarantee, cproof_proof::Origin::Analyzer);
        }
    }
}
