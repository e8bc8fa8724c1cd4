//! Cross-check panel: every registry model grades one result.
//!
//! Used for transparency displays and as the optional scoring hook in A/B
//! tests. A failing panelist degrades to an error-marker evaluation; the
//! panel itself never fails.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::ModelId;
use crate::evaluation::CrossChecker;
use crate::llm::{Message, PromptClient};
use crate::team::CheckerScore;
use crate::utilities::errors::TeamError;
use crate::utilities::score::parse_score;

/// Result of grading one output with the full panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckReport {
    /// Per-panelist verbatim evaluations.
    pub checks: Vec<CheckerScore>,
    /// Number of panelists that were asked.
    pub total_checkers: usize,
}

impl CrossCheckReport {
    /// Mean of the panel scores that parse to a number, if any do.
    pub fn mean_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .checks
            .iter()
            .filter_map(|c| parse_score(&c.evaluation))
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}

fn grading_messages(task: &str, result: &str) -> Vec<Message> {
    vec![Message::user(format!(
        "Grade the following output out of 100.\n\n\
         Original task:\n{task}\n\n\
         Output:\n{result}\n\n\
         Criteria (25 points each): accuracy, soundness, security, performance.\n\
         Reply in this format:\n\
         Accuracy: X/25\nSoundness: Y/25\nSecurity: Z/25\nPerformance: W/25\n\
         Total: N/100\n\n\
         Then list concrete improvement suggestions."
    ))]
}

/// Ask every registry model to grade `result` against `task`.
///
/// Panelists run concurrently; each one's failure is captured as an
/// `"evaluation error: ..."` entry so the report is always complete.
pub async fn cross_check(
    client: &Arc<dyn PromptClient>,
    task: &str,
    result: &str,
) -> CrossCheckReport {
    let futures = ModelId::ALL.into_iter().map(|model| {
        let client = client.clone();
        let messages = grading_messages(task, result);
        async move {
            let evaluation = match client.invoke(model, &messages).await {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("cross-check panelist {} failed: {e}", model.display_name());
                    format!("evaluation error: {e}")
                }
            };
            CheckerScore {
                checker: model.display_name().to_string(),
                evaluation,
            }
        }
    });

    let checks = join_all(futures).await;
    let total_checkers = checks.len();
    CrossCheckReport {
        checks,
        total_checkers,
    }
}

// ---------------------------------------------------------------------------
// A/B cross-checker backed by the panel
// ---------------------------------------------------------------------------

/// [`CrossChecker`] that scores a result as the panel's mean score.
pub struct PanelCrossChecker {
    client: Arc<dyn PromptClient>,
}

impl PanelCrossChecker {
    pub fn new(client: Arc<dyn PromptClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CrossChecker for PanelCrossChecker {
    async fn score(&self, result: &str, task: &str) -> Result<f64, TeamError> {
        let report = cross_check(&self.client, task, result).await;
        report
            .mean_score()
            .ok_or_else(|| TeamError::Runner("no panelist produced a parseable score".to_string()))
    }
}
