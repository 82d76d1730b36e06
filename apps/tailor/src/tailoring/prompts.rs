// LLM prompt constants and response schemas for the tailoring workflow.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde_json::json;

use crate::llm_client::ResponseSchema;

pub const PROFILE_SCHEMA_NAME: &str = "requirement_profile";
pub const CRITIQUE_SCHEMA_NAME: &str = "resume_critique";

/// System prompt for job description analysis.
pub const ANALYSIS_SYSTEM: &str = "You are an expert resume consultant and ATS \
    (Applicant Tracking System) specialist. Your job is to analyze job descriptions \
    and extract the most important information for resume tailoring.";

/// Analysis prompt template. Replace `{job_description}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this job description and extract:
1. Key responsibilities (top 5-7), most important first
2. Required skills and technologies
3. Important keywords for ATS optimization
4. Desired experience level and background
5. Key performance metrics or success criteria mentioned

Use the job's own wording for skills and keywords. Use empty lists when the
description says nothing about a field; never invent requirements.

JOB DESCRIPTION:
{job_description}"#;

/// System prompt for resume synthesis.
pub const SYNTHESIS_SYSTEM: &str = "You are an expert resume writer specializing in \
    tailoring resumes for specific job postings. Your goal is to rewrite resumes to \
    highlight the most relevant experience for the target role, use keywords from the \
    job description for ATS optimization, quantify achievements wherever the original \
    resume supports it, and maintain strict truthfulness. Never fabricate experience. \
    Return the resume in clean markdown format, well-structured and professional.";

/// Synthesis prompt template.
/// Replace: {grounding_instruction}, {job_description}, {profile_json},
///          {original_resume}, {revision_section}
pub const SYNTHESIS_PROMPT_TEMPLATE: &str = r#"Please rewrite this resume to target the following job posting.

{grounding_instruction}

JOB DESCRIPTION:
{job_description}

KEY REQUIREMENTS FROM ANALYSIS:
{profile_json}

ORIGINAL RESUME:
{original_resume}
{revision_section}
INSTRUCTIONS:
1. Create a professional summary that speaks directly to this role
2. Reorder and reframe experience sections to emphasize relevant skills
3. Use specific keywords from the job description where the original resume supports them
4. Surface metrics and quantifiable achievements already present in the original resume
5. Keep the most relevant experience detailed, summarize less relevant roles
6. Ensure ATS compatibility
7. Format in clean markdown with clear sections

Return ONLY the tailored resume in markdown format, starting with the name and contact info."#;

/// Inserted into the synthesis prompt from the second round on.
/// Replace `{critique_points}`.
pub const REVISION_SECTION_TEMPLATE: &str = r#"
REVISION GUIDANCE (a reviewer scored the previous draft; address every point
without breaking the rule against inventing facts):
{critique_points}
"#;

/// System prompt for the critic.
pub const CRITIQUE_SYSTEM: &str = "You are a strict hiring manager and ATS auditor. \
    You score how well a tailored resume matches a job description and you check it \
    for fabricated content by comparing it against the candidate's original resume.";

/// Critique prompt template.
/// Replace: {job_description}, {original_resume}, {tailored_resume}
pub const CRITIQUE_PROMPT_TEMPLATE: &str = r#"Evaluate the TAILORED RESUME against the JOB DESCRIPTION.

Return:
- match_score: integer 0-100 for how well the tailored resume matches the job
  (requirements coverage, ATS keywords, relevance of highlighted experience)
- critique_points: specific, actionable weaknesses; missing keywords; claims that
  need quantification. Empty when there is nothing to improve.
- hallucination_check: true if the tailored resume contains skills, employers,
  titles, dates or metrics that do NOT appear in the ORIGINAL RESUME
- needs_revision: true if another rewrite would materially improve the match

JOB DESCRIPTION:
{job_description}

ORIGINAL RESUME (source of truth):
{original_resume}

TAILORED RESUME:
{tailored_resume}"#;

fn string_list() -> serde_json::Value {
    json!({"type": "array", "items": {"type": "string"}})
}

/// Strict schema for `RequirementProfile`.
pub fn profile_schema() -> ResponseSchema {
    ResponseSchema::new(
        PROFILE_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "responsibilities": string_list(),
                "skills": string_list(),
                "keywords": string_list(),
                "experience_requirements": {"type": "string"},
                "success_metrics": string_list()
            },
            "required": [
                "responsibilities",
                "skills",
                "keywords",
                "experience_requirements",
                "success_metrics"
            ],
            "additionalProperties": false
        }),
    )
}

/// Strict schema for the critic reply. The 0–100 range is checked by `Critique::new`.
pub fn critique_schema() -> ResponseSchema {
    ResponseSchema::new(
        CRITIQUE_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "match_score": {"type": "integer"},
                "critique_points": string_list(),
                "hallucination_check": {"type": "boolean"},
                "needs_revision": {"type": "boolean"}
            },
            "required": [
                "match_score",
                "critique_points",
                "hallucination_check",
                "needs_revision"
            ],
            "additionalProperties": false
        }),
    )
}
