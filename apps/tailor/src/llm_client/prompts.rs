// Shared prompt fragments.
// Each component that calls the LLM keeps its own prompts alongside it
// (see tailoring::prompts). This file holds cross-cutting pieces only.

/// Appended to every synthesis prompt. The critic checks the same rule post hoc.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Use ONLY facts present in the ORIGINAL RESUME. \
    Do NOT introduce skills, employers, job titles, dates, degrees or metrics \
    that are absent from it. You may reorder, reword, merge and emphasize; \
    you may not invent. If a requirement of the job is not supported by the \
    original resume, leave it out.";

