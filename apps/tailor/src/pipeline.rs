// End-to-end run: inputs → refinement controller → render → artifacts.
// Artifacts are written only for an accepted run, and only all together.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifacts::{self, ArtifactPaths, ArtifactSet};
use crate::errors::AppError;
use crate::input::{load_job_description, load_resume};
use crate::state::AppState;
use crate::tailoring::controller::Terminal;
use crate::tailoring::report::RunReport;

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub resume: PathBuf,
    /// File path or literal description text.
    pub job_description: String,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: RunReport,
    pub paths: ArtifactPaths,
}

pub async fn run(state: &AppState, request: &RunRequest) -> Result<RunSummary, AppError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, model = %state.llm.model(), "Starting resume tailoring run");

    let source_resume = load_resume(state.extractor.clone(), &request.resume).await?;
    let job_description =
        load_job_description(state.extractor.clone(), &request.job_description).await?;

    let outcome = state
        .controller()
        .run(&source_resume, &job_description)
        .await?;

    if outcome.terminal == Terminal::Aborted {
        let (round, score) = outcome
            .warnings
            .last()
            .map(|w| (w.round, w.score))
            .unwrap_or((outcome.best.round(), outcome.best_score()));
        warn!(round, score, "Run aborted by low-confidence policy; no artifacts written");
        return Err(AppError::Aborted { round, score });
    }

    let document = state.renderer.render(outcome.best.markup()).await?;
    let report = RunReport::new(run_id, state.llm.model(), started_at, &outcome, state.llm.usage());

    let analysis_json = serde_json::to_vec_pretty(&outcome.profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize analysis: {e}")))?;
    let report_json = serde_json::to_vec_pretty(&report)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize run report: {e}")))?;

    let paths = ArtifactPaths::from_base(&request.output, document.extension);
    artifacts::write_all(
        &paths,
        &ArtifactSet {
            analysis_json: &analysis_json,
            markdown: outcome.best.markup().as_bytes(),
            document: &document.bytes,
            report_json: &report_json,
        },
    )?;

    info!(
        %run_id,
        rounds = outcome.scored_rounds(),
        best_round = report.best_round,
        best_score = report.best_score,
        total_tokens = report.usage.total_tokens,
        "Run complete"
    );
    Ok(RunSummary { report, paths })
}
