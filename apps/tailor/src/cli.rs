//! Command-line arguments.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::config::ConfigOverrides;
use crate::render::OutputFormat;
use crate::tailoring::controller::ACCEPTABLE_SCORE;
use crate::tailoring::decision::{
    AlwaysAbort, AlwaysContinue, DecisionPolicy, InteractivePrompt, MinimumScore,
};

/// What to do when a draft scores below the acceptable threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LowScoreAction {
    /// Log a warning and keep refining
    Continue,
    /// Stop the run without writing artifacts
    Abort,
    /// Ask on the terminal
    Prompt,
}

/// Tailor a resume to a job description
///
/// Analyzes the job description, rewrites the resume to target it using only
/// facts from the original, then scores and refines the draft until it is good
/// enough or the refinement limit is reached.
#[derive(Parser, Debug, Clone)]
#[command(name = "resume-tailor")]
#[command(version)]
pub struct Args {
    /// Source resume (.pdf, .md or .txt)
    #[arg(value_name = "RESUME")]
    pub resume: PathBuf,

    /// Job description: a file path, or the description text itself
    #[arg(value_name = "JOB_DESCRIPTION")]
    pub job_description: String,

    /// Output base name; artifacts are written as <BASE>.md, <BASE>.pdf, ...
    #[arg(short, long, value_name = "BASE", default_value = "tailored_resume")]
    pub output: PathBuf,

    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(short = 'k', long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model identifier (overrides TAILOR_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Refinement rounds allowed after the first draft (overrides TAILOR_MAX_REFINEMENTS)
    #[arg(long, value_name = "N")]
    pub max_refinements: Option<u32>,

    /// Final document format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pdf)]
    pub format: OutputFormat,

    /// Action when a draft scores below 70
    #[arg(long, value_enum, default_value_t = LowScoreAction::Continue)]
    pub on_low_score: LowScoreAction,

    /// Abort when a draft scores below SCORE (at most 70; drafts scoring 70 or
    /// more are never checked)
    #[arg(
        long,
        value_name = "SCORE",
        conflicts_with = "on_low_score",
        value_parser = clap::value_parser!(u8).range(0..=ACCEPTABLE_SCORE as i64)
    )]
    pub min_score: Option<u8>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            max_refinements: self.max_refinements,
            verbose: self.verbose,
        }
    }

    pub fn decision_policy(&self) -> Arc<dyn DecisionPolicy> {
        if let Some(min) = self.min_score {
            return Arc::new(MinimumScore(min));
        }
        match self.on_low_score {
            LowScoreAction::Continue => Arc::new(AlwaysContinue),
            LowScoreAction::Abort => Arc::new(AlwaysAbort),
            LowScoreAction::Prompt => Arc::new(InteractivePrompt),
        }
    }
}
