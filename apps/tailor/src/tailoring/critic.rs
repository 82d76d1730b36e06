//! Quality Critic: scores a candidate against the job description.
//!
//! Trait-based so the controller can be driven by any scoring backend.
//! `LlmCritic` is the production implementation: one deterministic,
//! schema-constrained gateway call per candidate.

use async_trait::async_trait;
use tracing::info;

use crate::llm_client::{LlmClient, LlmError, LlmRequest, Variability};
use crate::models::candidate::CritiqueReply;
use crate::models::{Candidate, Critique};
use crate::tailoring::prompts::{
    critique_schema, CRITIQUE_PROMPT_TEMPLATE, CRITIQUE_SCHEMA_NAME, CRITIQUE_SYSTEM,
};

/// Implement this to swap scoring backends without touching the controller.
#[async_trait]
pub trait Critic: Send + Sync {
    /// `source_resume` is the ground truth for the hallucination check.
    async fn critique(
        &self,
        candidate: &Candidate,
        job_description: &str,
        source_resume: &str,
    ) -> Result<Critique, LlmError>;
}

pub struct LlmCritic {
    llm: LlmClient,
}

impl LlmCritic {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Critic for LlmCritic {
    async fn critique(
        &self,
        candidate: &Candidate,
        job_description: &str,
        source_resume: &str,
    ) -> Result<Critique, LlmError> {
        let prompt = CRITIQUE_PROMPT_TEMPLATE
            .replace("{job_description}", job_description)
            .replace("{original_resume}", source_resume)
            .replace("{tailored_resume}", candidate.markup());

        let request = LlmRequest::structured(
            "REFLECTION",
            CRITIQUE_SYSTEM,
            prompt,
            Variability::Deterministic,
            critique_schema(),
        );

        let reply: CritiqueReply = self.llm.call_json(&request).await?;
        let critique = Critique::try_from(reply).map_err(|e| LlmError::SchemaViolation {
            schema: CRITIQUE_SCHEMA_NAME.to_string(),
            reason: e.to_string(),
        })?;

        info!(
            round = candidate.round(),
            score = critique.match_score(),
            needs_revision = critique.needs_revision(),
            hallucination = critique.hallucination_check(),
            "Candidate critiqued"
        );
        Ok(critique)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedBackend;

    fn critic_with(backend: &Arc<ScriptedBackend>) -> LlmCritic {
        LlmCritic::new(LlmClient::new(backend.clone(), "m"))
    }

    #[tokio::test]
    async fn test_critique_decodes_reply() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(json!({
            "match_score": 85,
            "critique_points": ["Point 1"],
            "hallucination_check": false,
            "needs_revision": false
        }));

        let critique = critic_with(&backend)
            .critique(&Candidate::new(1, "# Jane"), "JD text", "Original")
            .await
            .unwrap();
        assert_eq!(critique.match_score(), 85);
        assert_eq!(critique.critique_points(), ["Point 1"]);
        assert!(!critique.needs_revision());
    }

    #[tokio::test]
    async fn test_critique_sends_source_and_candidate_deterministically() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(json!({
            "match_score": 50,
            "critique_points": [],
            "hallucination_check": true,
            "needs_revision": true
        }));

        critic_with(&backend)
            .critique(&Candidate::new(1, "TAILORED-MARKER"), "JD-MARKER", "SOURCE-MARKER")
            .await
            .unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.temperature, 0.0);
        let prompt = &sent.messages[1].content;
        assert!(prompt.contains("TAILORED-MARKER"));
        assert!(prompt.contains("JD-MARKER"));
        assert!(prompt.contains("SOURCE-MARKER"));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_schema_violation() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(json!({
            "match_score": 110,
            "critique_points": [],
            "hallucination_check": false,
            "needs_revision": true
        }));

        let err = critic_with(&backend)
            .critique(&Candidate::new(1, "# Jane"), "JD", "Original")
            .await
            .unwrap_err();
        match err {
            LlmError::SchemaViolation { schema, reason } => {
                assert_eq!(schema, CRITIQUE_SCHEMA_NAME);
                assert!(reason.contains("110"));
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }
}
