//! Resume Synthesizer: rewrites the source resume for the target job.
//!
//! Output is a complete markdown document, never a diff. From the second round
//! on, the previous critique is passed in as revision guidance.

use tracing::{debug, info};

use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError, LlmRequest, Variability};
use crate::models::{Candidate, RequirementProfile};
use crate::tailoring::prompts::{
    REVISION_SECTION_TEMPLATE, SYNTHESIS_PROMPT_TEMPLATE, SYNTHESIS_SYSTEM,
};

/// Inputs for one synthesis round.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub source_resume: &'a str,
    pub job_description: &'a str,
    pub profile: &'a RequirementProfile,
    /// Critique points from the previous round. `None` or blank on the first pass.
    pub revision_guidance: Option<&'a str>,
}

#[derive(Clone)]
pub struct Synthesizer {
    llm: LlmClient,
}

impl Synthesizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn synthesize(
        &self,
        input: SynthesisInput<'_>,
        round: u32,
    ) -> Result<Candidate, LlmError> {
        let request = LlmRequest::text(
            "RESUME TAILORING",
            SYNTHESIS_SYSTEM,
            build_prompt(&input),
            Variability::Creative,
        );

        let text = self.llm.call(&request).await?;
        let markup = strip_markdown_fence(&text).to_string();
        if markup.is_empty() {
            return Err(LlmError::EmptyContent);
        }

        info!(round, chars = markup.len(), "Candidate resume drafted");
        Ok(Candidate::new(round, markup))
    }
}

fn build_prompt(input: &SynthesisInput<'_>) -> String {
    // Serializing strings and string lists cannot fail.
    let profile_json = serde_json::to_string_pretty(input.profile)
        .unwrap_or_else(|_| format!("{:?}", input.profile));

    let revision_section = match input.revision_guidance.map(str::trim) {
        Some(guidance) if !guidance.is_empty() => {
            debug!("Including revision guidance in synthesis prompt");
            REVISION_SECTION_TEMPLATE.replace("{critique_points}", guidance)
        }
        _ => String::new(),
    };

    SYNTHESIS_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{job_description}", input.job_description)
        .replace("{profile_json}", &profile_json)
        .replace("{original_resume}", input.source_resume)
        .replace("{revision_section}", &revision_section)
}

/// Models sometimes wrap the whole document in a ```markdown fence.
fn strip_markdown_fence(text: &str) -> &str {
    let text = text.trim();
    for opener in ["```markdown", "```md", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            if let Some(inner) = rest.trim_end().strip_suffix("```") {
                return inner.trim();
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::ScriptedBackend;

    const RESUME: &str = "Jane Doe\nSoftware Engineer at Acme (2019-2024)\n- Built Django APIs";
    const JD: &str = "Backend engineer, Python and Django required.";

    fn profile() -> RequirementProfile {
        RequirementProfile {
            skills: vec!["Python".to_string(), "Django".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_synthesize_returns_candidate_for_round() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("# Jane Doe\n\n## Experience\n- Built Django APIs");
        let synthesizer = Synthesizer::new(LlmClient::new(backend.clone(), "m"));
        let profile = profile();

        let candidate = synthesizer
            .synthesize(
                SynthesisInput {
                    source_resume: RESUME,
                    job_description: JD,
                    profile: &profile,
                    revision_guidance: None,
                },
                1,
            )
            .await
            .unwrap();

        assert_eq!(candidate.round(), 1);
        assert!(candidate.markup().starts_with("# Jane Doe"));
        assert!(backend.requests()[0].temperature > 0.0);
        assert!(backend.requests()[0].response_format.is_none());
    }

    #[test]
    fn test_prompt_contains_sources_and_grounding_rule() {
        let profile = profile();
        let prompt = build_prompt(&SynthesisInput {
            source_resume: RESUME,
            job_description: JD,
            profile: &profile,
            revision_guidance: None,
        });
        assert!(prompt.contains(RESUME));
        assert!(prompt.contains(JD));
        assert!(prompt.contains("\"Django\""));
        assert!(prompt.contains("Do NOT introduce skills"));
        assert!(!prompt.contains("REVISION GUIDANCE"));
    }

    #[test]
    fn test_prompt_includes_revision_guidance_when_present() {
        let profile = profile();
        let prompt = build_prompt(&SynthesisInput {
            source_resume: RESUME,
            job_description: JD,
            profile: &profile,
            revision_guidance: Some("- Mention PostgreSQL migration work"),
        });
        assert!(prompt.contains("REVISION GUIDANCE"));
        assert!(prompt.contains("- Mention PostgreSQL migration work"));
    }

    #[test]
    fn test_blank_guidance_is_ignored() {
        let profile = profile();
        let prompt = build_prompt(&SynthesisInput {
            source_resume: RESUME,
            job_description: JD,
            profile: &profile,
            revision_guidance: Some("   "),
        });
        assert!(!prompt.contains("REVISION GUIDANCE"));
    }

    #[test]
    fn test_strip_markdown_fence() {
        assert_eq!(strip_markdown_fence("```markdown\n# Jane\n```"), "# Jane");
        assert_eq!(strip_markdown_fence("```\n# Jane\n```"), "# Jane");
        assert_eq!(strip_markdown_fence("# Jane"), "# Jane");
    }
}
