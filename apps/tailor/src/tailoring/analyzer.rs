//! Document Analyzer: extracts a `RequirementProfile` from a raw job description.
//!
//! One schema-constrained, deterministic gateway call. A schema violation is
//! returned as-is; there is no partially-filled fallback profile.

use tracing::{info, warn};

use crate::llm_client::{LlmClient, LlmError, LlmRequest, Variability};
use crate::models::RequirementProfile;
use crate::tailoring::prompts::{profile_schema, ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM};

#[derive(Clone)]
pub struct Analyzer {
    llm: LlmClient,
}

impl Analyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn analyze(&self, job_description: &str) -> Result<RequirementProfile, LlmError> {
        let request = build_request(job_description);
        let profile = self
            .llm
            .call_json::<RequirementProfile>(&request)
            .await?
            .normalized();

        info!(
            responsibilities = profile.responsibilities.len(),
            skills = profile.skills.len(),
            keywords = profile.keywords.len(),
            "Job description analyzed"
        );
        if profile.is_empty() {
            warn!("Requirement profile is empty; drafts will be scored against the raw job description only");
        }
        Ok(profile)
    }
}

fn build_request(job_description: &str) -> LlmRequest {
    LlmRequest::structured(
        "JOB ANALYSIS",
        ANALYSIS_SYSTEM,
        ANALYSIS_PROMPT_TEMPLATE.replace("{job_description}", job_description),
        Variability::Deterministic,
        profile_schema(),
    )
}
