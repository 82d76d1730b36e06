use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::input::{FileExtractor, TextExtractor};
use crate::llm_client::{ChatBackend, LlmClient, LlmError, OpenAiBackend};
use crate::render::DocumentRenderer;
use crate::tailoring::analyzer::Analyzer;
use crate::tailoring::controller::RefinementController;
use crate::tailoring::critic::LlmCritic;
use crate::tailoring::decision::DecisionPolicy;
use crate::tailoring::synthesizer::Synthesizer;

/// Everything a run needs, built once from `Config` and handed to the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    pub extractor: Arc<dyn TextExtractor>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub policy: Arc<dyn DecisionPolicy>,
}

impl AppState {
    /// `connect` is only invoked with a fully resolved config, so a missing
    /// credential is reported before any network client exists.
    pub fn from_config<F>(
        config: Config,
        connect: F,
        renderer: Arc<dyn DocumentRenderer>,
        policy: Arc<dyn DecisionPolicy>,
    ) -> Result<Self, AppError>
    where
        F: FnOnce(&Config) -> Result<Arc<dyn ChatBackend>, LlmError>,
    {
        let backend = connect(&config).map_err(|e| {
            AppError::config(
                format!("could not initialise the model client: {e}"),
                "check OPENAI_BASE_URL",
            )
        })?;
        let llm = LlmClient::new(backend, config.model.clone());

        Ok(Self {
            config,
            llm,
            extractor: Arc::new(FileExtractor),
            renderer,
            policy,
        })
    }

    /// Fresh controller sharing this state's client, so usage accumulates in one place.
    pub fn controller(&self) -> RefinementController {
        RefinementController::new(
            Analyzer::new(self.llm.clone()),
            Synthesizer::new(self.llm.clone()),
            Arc::new(LlmCritic::new(self.llm.clone())),
            self.policy.clone(),
        )
        .with_max_refinements(self.config.max_refinements)
    }
}

/// Connects to the OpenAI-compatible endpoint named in the config.
pub fn openai_backend(config: &Config) -> Result<Arc<dyn ChatBackend>, LlmError> {
    let backend = OpenAiBackend::new(
        &config.base_url,
        config.api_key.clone(),
        config.llm_timeout,
        config.max_retries,
    )?;
    Ok(Arc::new(backend))
}
