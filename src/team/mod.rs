//! Three-stage team pipeline and arbitration.
//!
//! One task flows through exactly three prompt calls, in order: the creator
//! produces an initial output, the checker critiques it, and the leader
//! issues the final result. The stages are chained by data dependency and
//! must never run in parallel.
//!
//! Arbitration is deliberately one-sided: the leader's output is the final
//! result verbatim, and checker evaluations ride alongside as recorded,
//! advisory annotations. Nothing downstream may use a checker score to
//! silently override the leader.

pub mod crosscheck;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{TeamConfig, TeamRole};
use crate::llm::{Message, PromptClient};
use crate::utilities::errors::TeamError;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One checker's verbatim evaluation of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerScore {
    /// Display name of the model that produced the evaluation.
    pub checker: String,
    /// The evaluation text, recorded verbatim (or an error marker if the
    /// checker call failed).
    pub evaluation: String,
}

/// Human-readable description of the team that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    pub leader: String,
    pub creator: String,
    pub checker: String,
}

impl TeamInfo {
    /// Describe a team configuration with registry display names.
    pub fn from_config(config: &TeamConfig) -> Self {
        Self {
            name: config.name.clone(),
            leader: config.leader.display_name().to_string(),
            creator: config.creator.display_name().to_string(),
            checker: config.checker.display_name().to_string(),
        }
    }
}

/// Envelope returned by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRunOutput {
    /// The leader's output, verbatim.
    pub final_result: String,
    /// Checker evaluations, advisory and recorded. Always at least one.
    pub scores: Vec<CheckerScore>,
    /// The team that produced the result.
    pub team: TeamInfo,
}

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// Combine leader output and checker evaluations into the result envelope.
///
/// Pure combination: the leader result passes through unmodified and no
/// numeric aggregation happens here. Score extraction from evaluation text
/// is a separate, best-effort concern ([`crate::utilities::score`]).
pub fn resolve(
    leader_result: String,
    checker_scores: Vec<CheckerScore>,
    team: TeamInfo,
) -> TeamRunOutput {
    TeamRunOutput {
        final_result: leader_result,
        scores: checker_scores,
        team,
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Executes the creator → checker → leader protocol for one team.
///
/// The configuration is captured at construction time; changing the config
/// store mid-run cannot affect an in-flight pipeline.
pub struct TeamPipeline {
    config: TeamConfig,
    client: Arc<dyn PromptClient>,
}

impl TeamPipeline {
    /// Create a pipeline over a configuration snapshot.
    pub fn new(config: TeamConfig, client: Arc<dyn PromptClient>) -> Self {
        Self { config, client }
    }

    /// The configuration snapshot this pipeline runs with.
    pub fn config(&self) -> &TeamConfig {
        &self.config
    }

    /// Describe the team with display names.
    pub fn team_info(&self) -> TeamInfo {
        TeamInfo::from_config(&self.config)
    }

    /// Run one task through the three stages.
    ///
    /// Creator and leader failures are fatal and propagate; the caller is
    /// responsible for recording a failed execution. A checker failure
    /// degrades to an `"evaluation error: ..."` marker and the run still
    /// completes on the strength of the creator output alone.
    pub async fn run(&self, task: &str, context: &str) -> Result<TeamRunOutput, TeamError> {
        let key = self.config.team_key;

        let creator_output = self
            .call_stage(TeamRole::Creator, prompts::creator_messages(key, task, context))
            .await?;

        let checker_output = match self
            .call_stage(TeamRole::Checker, prompts::checker_messages(key, task, &creator_output))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("checker stage degraded for team {key}: {e}");
                format!("evaluation error: {e}")
            }
        };

        let leader_output = self
            .call_stage(
                TeamRole::Leader,
                prompts::leader_messages(key, task, &creator_output, &checker_output),
            )
            .await?;

        Ok(resolve(
            leader_output,
            vec![CheckerScore {
                checker: self.config.checker.display_name().to_string(),
                evaluation: checker_output,
            }],
            self.team_info(),
        ))
    }

    /// Wrap this pipeline as an opaque [`TeamRunner`] for benchmark and A/B
    /// evaluation. The runner returns only the final result text.
    pub fn into_runner(self) -> PipelineRunner {
        PipelineRunner { pipeline: self }
    }

    async fn call_stage(&self, role: TeamRole, messages: Vec<Message>) -> Result<String, TeamError> {
        let model = self.config.model_for(role);
        log::debug!(
            "team {} {role} stage: model={}",
            self.config.team_key,
            model.display_name()
        );
        self.client
            .invoke(model, &messages)
            .await
            .map_err(|source| TeamError::Stage { role, source })
    }
}

// ---------------------------------------------------------------------------
// TeamRunner adapter
// ---------------------------------------------------------------------------

/// [`TeamRunner`] over a full pipeline run with empty context.
pub struct PipelineRunner {
    pipeline: TeamPipeline,
}

#[async_trait::async_trait]
impl crate::evaluation::TeamRunner for PipelineRunner {
    async fn run(&self, task: &str) -> Result<String, TeamError> {
        let output = self.pipeline.run(task, "").await?;
        Ok(output.final_result)
    }
}
