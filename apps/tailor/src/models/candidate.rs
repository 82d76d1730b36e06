use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest valid match score.
pub const MAX_SCORE: u8 = 100;

/// A generated resume: one complete markdown document from one synthesis round.
///
/// Candidates are never edited. A refinement round produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    round: u32,
    markup: String,
}

impl Candidate {
    pub fn new(round: u32, markup: impl Into<String>) -> Self {
        Self {
            round,
            markup: markup.into(),
        }
    }

    /// 1-based synthesis round that produced this candidate.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CritiqueError {
    #[error("match score {0} is outside 0..=100")]
    ScoreOutOfRange(i64),
}

/// Scored evaluation of one candidate against the job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Critique {
    match_score: u8,
    critique_points: Vec<String>,
    hallucination_check: bool,
    needs_revision: bool,
}

impl Critique {
    /// Validates the score range. Out-of-range values are rejected, never clamped.
    pub fn new(
        match_score: i64,
        critique_points: Vec<String>,
        hallucination_check: bool,
        needs_revision: bool,
    ) -> Result<Self, CritiqueError> {
        if !(0..=MAX_SCORE as i64).contains(&match_score) {
            return Err(CritiqueError::ScoreOutOfRange(match_score));
        }
        Ok(Self {
            match_score: match_score as u8,
            critique_points,
            hallucination_check,
            needs_revision,
        })
    }

    pub fn match_score(&self) -> u8 {
        self.match_score
    }

    pub fn critique_points(&self) -> &[String] {
        &self.critique_points
    }

    /// True when the critic suspects content not traceable to the source resume.
    pub fn hallucination_check(&self) -> bool {
        self.hallucination_check
    }

    pub fn needs_revision(&self) -> bool {
        self.needs_revision
    }

    /// Critique points joined into revision guidance for the next round.
    pub fn revision_guidance(&self) -> String {
        self.critique_points
            .iter()
            .map(|p| format!("- {p}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Unvalidated critic reply, exactly as decoded from the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct CritiqueReply {
    pub match_score: i64,
    #[serde(default)]
    pub critique_points: Vec<String>,
    pub hallucination_check: bool,
    pub needs_revision: bool,
}

impl TryFrom<CritiqueReply> for Critique {
    type Error = CritiqueError;

    fn try_from(reply: CritiqueReply) -> Result<Self, Self::Error> {
        Critique::new(
            reply.match_score,
            reply.critique_points,
            reply.hallucination_check,
            reply.needs_revision,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critique_accepts_bounds() {
        assert_eq!(Critique::new(0, vec![], false, false).unwrap().match_score(), 0);
        assert_eq!(Critique::new(100, vec![], false, false).unwrap().match_score(), 100);
    }

    #[test]
    fn test_critique_rejects_out_of_range_scores() {
        assert_eq!(
            Critique::new(110, vec![], false, true),
            Err(CritiqueError::ScoreOutOfRange(110))
        );
        assert_eq!(
            Critique::new(-1, vec![], false, true),
            Err(CritiqueError::ScoreOutOfRange(-1))
        );
    }

    #[test]
    fn test_critique_reply_converts_with_validation() {
        let reply: CritiqueReply = serde_json::from_str(
            r#"{"match_score": 85, "critique_points": ["Missing specific technologies"],
                "hallucination_check": false, "needs_revision": true}"#,
        )
        .unwrap();
        let critique = Critique::try_from(reply).unwrap();
        assert_eq!(critique.match_score(), 85);
        assert_eq!(critique.critique_points(), ["Missing specific technologies"]);
        assert!(critique.needs_revision());
        assert!(!critique.hallucination_check());
    }

    #[test]
    fn test_revision_guidance_lists_points() {
        let critique = Critique::new(
            55,
            vec!["Add Kubernetes keyword".to_string(), "Quantify impact".to_string()],
            false,
            true,
        )
        .unwrap();
        assert_eq!(
            critique.revision_guidance(),
            "- Add Kubernetes keyword\n- Quantify impact"
        );
    }

    #[test]
    fn test_candidate_exposes_round_and_markup() {
        let candidate = Candidate::new(2, "# Jane Doe");
        assert_eq!(candidate.round(), 2);
        assert_eq!(candidate.markup(), "# Jane Doe");
    }
}
