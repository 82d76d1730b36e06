//! Keyword Coverage: deterministic, LLM-free check of a candidate against the
//! requirement profile.
//!
//! Algorithm:
//! 1. Each profile skill (weight 1.0) and ATS keyword (weight 0.8) is looked up in
//!    the candidate, case-insensitively, on word boundaries.
//! 2. coverage_percent = Σ(weight of matched terms) / Σ(weight of all terms) × 100
//! 3. Unsupported terms: profile skills the candidate mentions but the source
//!    resume never does. A local fabrication hint next to the critic's flag.
//!
//! Coverage is reported per round. It never drives the refinement loop.

use serde::Serialize;

use crate::models::RequirementProfile;

const SKILL_WEIGHT: f32 = 1.0;
const KEYWORD_WEIGHT: f32 = 0.8;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    pub coverage_percent: u32, // 0 – 100
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub unsupported_terms: Vec<String>,
}

pub fn compute_coverage(
    candidate_markup: &str,
    source_resume: &str,
    profile: &RequirementProfile,
) -> CoverageReport {
    let candidate_lower = candidate_markup.to_lowercase();
    let source_lower = source_resume.to_lowercase();

    let (matched_skills, missing_skills) = partition_terms(&profile.skills, &candidate_lower);
    let (matched_keywords, missing_keywords) =
        partition_terms(&profile.keywords, &candidate_lower);

    let total_weight = profile.skills.len() as f32 * SKILL_WEIGHT
        + profile.keywords.len() as f32 * KEYWORD_WEIGHT;
    let matched_weight = matched_skills.len() as f32 * SKILL_WEIGHT
        + matched_keywords.len() as f32 * KEYWORD_WEIGHT;

    let coverage_percent = if total_weight > 0.0 {
        ((matched_weight / total_weight) * 100.0).round() as u32
    } else {
        0
    };

    let unsupported_terms = matched_skills
        .iter()
        .filter(|skill| !contains_term(&source_lower, &skill.to_lowercase()))
        .cloned()
        .collect();

    CoverageReport {
        coverage_percent,
        matched_skills,
        missing_skills,
        matched_keywords,
        missing_keywords,
        unsupported_terms,
    }
}

fn partition_terms(terms: &[String], haystack_lower: &str) -> (Vec<String>, Vec<String>) {
    terms
        .iter()
        .cloned()
        .partition(|term| contains_term(haystack_lower, &term.to_lowercase()))
}

/// True if `term` occurs in `haystack` with no alphanumeric character directly
/// before or after it. Both arguments must already be lowercase.
fn contains_term(haystack: &str, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return false;
    }

    haystack.match_indices(term).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
