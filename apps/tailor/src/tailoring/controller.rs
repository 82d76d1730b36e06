//! Refinement Controller: analyze once, then draft and critique in a bounded loop.
//!
//! # State machine
//! `Analyzing → Drafting → Reflecting → (Refining → Drafting | Deciding) → Terminal`
//!
//! - The analyzer runs once. Its failure is fatal.
//! - Each round drafts a new candidate and critiques it. The best candidate is
//!   replaced only on a strictly higher score, so ties keep the earliest one.
//! - A score below `ACCEPTABLE_SCORE` raises a low-confidence warning and asks the
//!   injected `DecisionPolicy` whether to continue.
//! - Another round runs only while the critic asks for revision and the
//!   refinement bound (default 2, i.e. at most 3 drafts) is not reached.
//! - The accepted result is the best candidate, not necessarily the last one.
//!
//! Critic failures: in round 1 the run fails (nothing has been scored). In later
//! rounds the loop stops and the best candidate scored so far is accepted; the
//! failure is recorded in the outcome.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{AppError, Step};
use crate::models::{Candidate, Critique, RequirementProfile};
use crate::tailoring::analyzer::Analyzer;
use crate::tailoring::coverage::{compute_coverage, CoverageReport};
use crate::tailoring::critic::Critic;
use crate::tailoring::decision::{Decision, DecisionPolicy, LowConfidenceWarning};
use crate::tailoring::synthesizer::{SynthesisInput, Synthesizer};

/// Scores below this raise a low-confidence warning.
pub const ACCEPTABLE_SCORE: u8 = 70;
/// Refinement rounds allowed after the initial draft.
pub const DEFAULT_MAX_REFINEMENTS: u32 = 2;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Analyzing,
    Drafting,
    Reflecting,
    Refining,
    Deciding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Terminal {
    Accepted,
    Aborted,
}

/// Everything observed in one draft-and-critique round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    pub round: u32,
    pub critique: Critique,
    pub coverage: CoverageReport,
    /// Best score across rounds 1..=round.
    pub best_score_after: u8,
}

/// Result of a run that reached a terminal state.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub terminal: Terminal,
    pub profile: RequirementProfile,
    pub best: Candidate,
    pub best_critique: Critique,
    pub rounds: Vec<RoundRecord>,
    pub warnings: Vec<LowConfidenceWarning>,
    pub critic_failure: Option<String>,
}

impl RunOutcome {
    pub fn best_score(&self) -> u8 {
        self.best_critique.match_score()
    }

    pub fn scored_rounds(&self) -> usize {
        self.rounds.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Workflow state
// ────────────────────────────────────────────────────────────────────────────

/// Controller-owned state for one run. Discarded once the outcome is built.
#[derive(Debug)]
struct WorkflowState {
    current: Option<Candidate>,
    best: Option<(Candidate, Critique)>,
    /// `None` sorts below every valid score.
    best_score: Option<u8>,
    /// Refinement rounds taken so far.
    attempt: u32,
    max_refinements: u32,
    revision_guidance: Option<String>,
}

impl WorkflowState {
    fn new(max_refinements: u32) -> Self {
        Self {
            current: None,
            best: None,
            best_score: None,
            attempt: 0,
            max_refinements,
            revision_guidance: None,
        }
    }

    fn round(&self) -> u32 {
        self.attempt + 1
    }

    /// Records a critiqued candidate as `current`. It also becomes `best` only on
    /// a strictly higher score. Returns true when `best` changed.
    fn record(&mut self, candidate: Candidate, critique: &Critique) -> bool {
        let score = critique.match_score();
        let improved = Some(score) > self.best_score;
        if improved {
            self.best_score = Some(score);
            self.best = Some((candidate.clone(), critique.clone()));
        }
        self.current = Some(candidate);
        improved
    }

    fn can_refine(&self) -> bool {
        self.attempt < self.max_refinements
    }

    fn refine(&mut self, guidance: String) {
        self.attempt += 1;
        self.revision_guidance = Some(guidance);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

pub struct RefinementController {
    analyzer: Analyzer,
    synthesizer: Synthesizer,
    critic: Arc<dyn Critic>,
    policy: Arc<dyn DecisionPolicy>,
    max_refinements: u32,
}

impl RefinementController {
    pub fn new(
        analyzer: Analyzer,
        synthesizer: Synthesizer,
        critic: Arc<dyn Critic>,
        policy: Arc<dyn DecisionPolicy>,
    ) -> Self {
        Self {
            analyzer,
            synthesizer,
            critic,
            policy,
            max_refinements: DEFAULT_MAX_REFINEMENTS,
        }
    }

    pub fn with_max_refinements(mut self, max_refinements: u32) -> Self {
        self.max_refinements = max_refinements;
        self
    }

    /// Runs the workflow to a terminal state.
    ///
    /// `Err` means a fatal failure. An abort chosen by the decision policy is a
    /// normal outcome with `Terminal::Aborted`.
    pub async fn run(
        &self,
        source_resume: &str,
        job_description: &str,
    ) -> Result<RunOutcome, AppError> {
        enter(Phase::Analyzing, 0);
        let profile = self
            .analyzer
            .analyze(job_description)
            .await
            .map_err(AppError::step(Step::Analyzing))?;

        let mut state = WorkflowState::new(self.max_refinements);
        let mut rounds = Vec::new();
        let mut warnings = Vec::new();
        let mut critic_failure = None;

        let terminal = loop {
            let round = state.round();

            enter(Phase::Drafting, round);
            let input = SynthesisInput {
                source_resume,
                job_description,
                profile: &profile,
                revision_guidance: state.revision_guidance.as_deref(),
            };
            let candidate = self
                .synthesizer
                .synthesize(input, round)
                .await
                .map_err(AppError::step(Step::Drafting))?;

            enter(Phase::Reflecting, round);
            let critique = match self
                .critic
                .critique(&candidate, job_description, source_resume)
                .await
            {
                Ok(critique) => critique,
                Err(e) if state.best.is_some() => {
                    warn!(round, error = %e, "Critique failed; accepting best candidate so far");
                    critic_failure = Some(format!("round {round}: {e}"));
                    break Terminal::Accepted;
                }
                Err(e) => return Err(AppError::step(Step::Reflecting)(e)),
            };

            let coverage = compute_coverage(candidate.markup(), source_resume, &profile);
            if !coverage.unsupported_terms.is_empty() {
                warn!(
                    round,
                    terms = ?coverage.unsupported_terms,
                    "Candidate mentions skills not found in the source resume"
                );
            }

            if state.record(candidate, &critique) {
                info!(round, score = critique.match_score(), "New best candidate");
            }
            rounds.push(RoundRecord {
                round,
                critique: critique.clone(),
                coverage,
                best_score_after: state.best_score.unwrap_or_default(),
            });

            enter(Phase::Deciding, round);
            if critique.match_score() < ACCEPTABLE_SCORE {
                let warning = LowConfidenceWarning {
                    round,
                    score: critique.match_score(),
                    threshold: ACCEPTABLE_SCORE,
                    critique_points: critique.critique_points().to_vec(),
                };
                warn!(
                    round,
                    score = warning.score,
                    threshold = ACCEPTABLE_SCORE,
                    points = ?warning.critique_points,
                    "Low confidence: match score below threshold"
                );
                let decision = self.policy.on_low_confidence(&warning).await;
                warnings.push(warning);
                if decision == Decision::Abort {
                    warn!(round, "Run aborted by low-confidence policy");
                    break Terminal::Aborted;
                }
            }

            if critique.needs_revision() && state.can_refine() {
                enter(Phase::Refining, round);
                state.refine(critique.revision_guidance());
                continue;
            }

            break Terminal::Accepted;
        };

        let final_round = state.current.as_ref().map(Candidate::round).unwrap_or(0);
        let (best, best_critique) = state.best.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("workflow ended without a scored candidate"))
        })?;

        info!(
            terminal = ?terminal,
            best_round = best.round(),
            final_round,
            best_score = best_critique.match_score(),
            scored_rounds = rounds.len(),
            "Refinement loop finished"
        );

        Ok(RunOutcome {
            terminal,
            profile,
            best,
            best_critique,
            rounds,
            warnings,
            critic_failure,
        })
    }
}

fn enter(phase: Phase, round: u32) {
    debug!(?phase, round, "Workflow transition");
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
