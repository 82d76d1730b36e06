//! Run report: the machine-readable record of one workflow run, written next
//! to the other artifacts as `<base>_report.json`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::llm_client::UsageTotals;
use crate::tailoring::controller::{RoundRecord, RunOutcome, Terminal};
use crate::tailoring::decision::LowConfidenceWarning;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub terminal: Terminal,
    pub best_round: u32,
    pub best_score: u8,
    pub rounds: Vec<RoundRecord>,
    pub low_confidence_warnings: Vec<LowConfidenceWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critic_failure: Option<String>,
    pub usage: UsageTotals,
}

impl RunReport {
    pub fn new(
        run_id: Uuid,
        model: &str,
        started_at: DateTime<Utc>,
        outcome: &RunOutcome,
        usage: UsageTotals,
    ) -> Self {
        Self {
            run_id,
            model: model.to_string(),
            started_at,
            finished_at: Utc::now(),
            terminal: outcome.terminal,
            best_round: outcome.best.round(),
            best_score: outcome.best_score(),
            rounds: outcome.rounds.clone(),
            low_confidence_warnings: outcome.warnings.clone(),
            critic_failure: outcome.critic_failure.clone(),
            usage,
        }
    }

    /// Multi-line human summary for the terminal.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Best candidate: round {} with match score {}/100 ({} round(s), {} LLM calls, {} tokens)",
            self.best_round,
            self.best_score,
            self.rounds.len(),
            self.usage.calls,
            self.usage.total_tokens
        )];
        for record in &self.rounds {
            lines.push(format!(
                "  round {}: score {}, keyword coverage {}%{}{}",
                record.round,
                record.critique.match_score(),
                record.coverage.coverage_percent,
                if record.critique.hallucination_check() {
                    ", possible fabricated content flagged"
                } else {
                    ""
                },
                if record.critique.needs_revision() {
                    ", revision requested"
                } else {
                    ""
                },
            ));
        }
        for warning in &self.low_confidence_warnings {
            lines.push(format!(
                "  warning: round {} scored {} (below {})",
                warning.round, warning.score, warning.threshold
            ));
        }
        if let Some(failure) = &self.critic_failure {
            lines.push(format!("  critique failed in {failure}; kept best earlier candidate"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Critique, RequirementProfile};
    use crate::tailoring::coverage::CoverageReport;

    fn outcome() -> RunOutcome {
        let first = Critique::new(40, vec!["Add metrics".to_string()], true, true).unwrap();
        let second = Critique::new(80, vec![], false, false).unwrap();
        RunOutcome {
            terminal: Terminal::Accepted,
            profile: RequirementProfile::default(),
            best: Candidate::new(2, "# Jane"),
            best_critique: second.clone(),
            rounds: vec![
                RoundRecord {
                    round: 1,
                    critique: first,
                    coverage: CoverageReport::default(),
                    best_score_after: 40,
                },
                RoundRecord {
                    round: 2,
                    critique: second,
                    coverage: CoverageReport::default(),
                    best_score_after: 80,
                },
            ],
            warnings: vec![LowConfidenceWarning {
                round: 1,
                score: 40,
                threshold: 70,
                critique_points: vec!["Add metrics".to_string()],
            }],
            critic_failure: None,
        }
    }

    #[test]
    fn test_report_serializes_rounds_and_flags() {
        let report = RunReport::new(
            Uuid::new_v4(),
            "gpt-4o",
            Utc::now(),
            &outcome(),
            UsageTotals::default(),
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["terminal"], "Accepted");
        assert_eq!(value["best_round"], 2);
        assert_eq!(value["best_score"], 80);
        assert_eq!(value["rounds"][0]["critique"]["hallucination_check"], true);
        assert_eq!(value["rounds"][1]["best_score_after"], 80);
        assert!(value.get("critic_failure").is_none());
    }

    #[test]
    fn test_summary_mentions_warnings_and_flags() {
        let report = RunReport::new(
            Uuid::new_v4(),
            "gpt-4o",
            Utc::now(),
            &outcome(),
            UsageTotals::default(),
        );
        let summary = report.summary();
        assert!(summary.contains("round 2 with match score 80/100"));
        assert!(summary.contains("possible fabricated content flagged"));
        assert!(summary.contains("warning: round 1 scored 40"));
    }
}
