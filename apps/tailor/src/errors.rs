use thiserror::Error;

use crate::input::ExtractionError;
use crate::llm_client::LlmError;
use crate::render::RenderError;

/// Workflow step a Gateway failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Analyzing,
    Drafting,
    Reflecting,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Analyzing => "job description analysis",
            Step::Drafting => "resume drafting",
            Step::Reflecting => "resume critique",
        };
        f.write_str(name)
    }
}

/// Application-level error type.
/// `main` maps each category to a distinct process exit code via `exit_code()`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}\n  hint: {hint}")]
    Config { message: String, hint: String },

    #[error("Input error: {0}")]
    Input(String),

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: LlmError,
    },

    #[error("Run aborted after round {round} (score {score}/100 below acceptable threshold)")]
    Aborted { round: u32, score: u8 },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to write artifact {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn config(message: impl Into<String>, hint: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn step(step: Step) -> impl FnOnce(LlmError) -> Self {
        move |source| AppError::Step { step, source }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config { .. } => 2,
            AppError::Input(_) | AppError::Extraction(_) => 3,
            AppError::Step { .. } => 4,
            AppError::Aborted { .. } => 5,
            AppError::Render(_) | AppError::Artifact { .. } => 6,
            AppError::Internal(_) => 1,
        }
    }
}
