use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Structured requirements extracted from a job description.
///
/// Produced once per run by the analyzer and never mutated afterwards.
/// Every list defaults to empty; `null` is rejected at the gateway boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementProfile {
    /// Key responsibilities, most important first (target 5–7).
    #[serde(default)]
    pub responsibilities: Vec<String>,
    /// Required skills and technologies. Unique, case-insensitively.
    #[serde(default)]
    pub skills: Vec<String>,
    /// ATS keywords. Unique, case-insensitively.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Desired experience level and background, free text.
    #[serde(default)]
    pub experience_requirements: String,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

impl RequirementProfile {
    /// Trims entries, drops blanks and removes case-insensitive duplicates from
    /// the set-like fields. Order of first occurrence is kept.
    pub fn normalized(self) -> Self {
        Self {
            responsibilities: clean(self.responsibilities),
            skills: dedup_ci(clean(self.skills)),
            keywords: dedup_ci(clean(self.keywords)),
            experience_requirements: self.experience_requirements.trim().to_string(),
            success_metrics: clean(self.success_metrics),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.responsibilities.is_empty()
            && self.skills.is_empty()
            && self.keywords.is_empty()
            && self.experience_requirements.is_empty()
            && self.success_metrics.is_empty()
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn dedup_ci(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}
