//! Low-confidence decision policies.
//!
//! When a round scores below the acceptability threshold the controller asks a
//! `DecisionPolicy` whether to keep going. This is the only point where a run
//! can be halted from outside once it has started.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Continue,
    Abort,
}

/// Advisory signal raised for a round that scored below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowConfidenceWarning {
    pub round: u32,
    pub score: u8,
    pub threshold: u8,
    pub critique_points: Vec<String>,
}

#[async_trait]
pub trait DecisionPolicy: Send + Sync {
    async fn on_low_confidence(&self, warning: &LowConfidenceWarning) -> Decision;
}

/// Default for unattended runs: keep going and report the warning.
pub struct AlwaysContinue;

#[async_trait]
impl DecisionPolicy for AlwaysContinue {
    async fn on_low_confidence(&self, _warning: &LowConfidenceWarning) -> Decision {
        Decision::Continue
    }
}

pub struct AlwaysAbort;

#[async_trait]
impl DecisionPolicy for AlwaysAbort {
    async fn on_low_confidence(&self, _warning: &LowConfidenceWarning) -> Decision {
        Decision::Abort
    }
}

/// Aborts when a low-confidence round scores below the wrapped minimum.
pub struct MinimumScore(pub u8);

#[async_trait]
impl DecisionPolicy for MinimumScore {
    async fn on_low_confidence(&self, warning: &LowConfidenceWarning) -> Decision {
        if warning.score < self.0 {
            Decision::Abort
        } else {
            Decision::Continue
        }
    }
}

/// Asks on the terminal. Reads stdin on a blocking thread so the runtime stays free.
/// Anything other than "n"/"no" continues, including EOF and read errors.
pub struct InteractivePrompt;

#[async_trait]
impl DecisionPolicy for InteractivePrompt {
    async fn on_low_confidence(&self, warning: &LowConfidenceWarning) -> Decision {
        let prompt = format_prompt(warning);
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{prompt}");
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => parse_answer(&line),
            Ok(Err(e)) => {
                warn!("Could not read decision from terminal ({e}); continuing");
                Decision::Continue
            }
            Err(e) => {
                warn!("Decision prompt task failed ({e}); continuing");
                Decision::Continue
            }
        }
    }
}

fn format_prompt(warning: &LowConfidenceWarning) -> String {
    let mut out = format!(
        "\nLow match score in round {}: {}/100 (threshold {}).\n",
        warning.round, warning.score, warning.threshold
    );
    for point in &warning.critique_points {
        out.push_str(&format!("  - {point}\n"));
    }
    out.push_str("Continue anyway? [Y/n] ");
    out
}

fn parse_answer(line: &str) -> Decision {
    match line.trim().to_lowercase().as_str() {
        "n" | "no" => Decision::Abort,
        _ => Decision::Continue,
    }
}
