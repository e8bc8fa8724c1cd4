//! Team evaluation: records, fingerprints, and the three evaluators.
//!
//! Three methodologies feed one recommendation surface:
//! - [`history::HistoryEvaluator`] aggregates real execution records;
//! - [`benchmark::BenchmarkEvaluator`] runs a fixed synthetic suite;
//! - [`ab_test::AbTestEvaluator`] races two configurations head to head.
//!
//! All of them only append to the [`store::EvaluationStore`]; records are
//! immutable once written and always embed the [`TeamConfig`] snapshot that
//! was actually used, never a live reference.

pub mod benchmark;
pub mod history;
pub mod manager;
pub mod store;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::config::{TeamConfig, TeamKey};
use crate::utilities::errors::TeamError;

// ---------------------------------------------------------------------------
// Callback boundaries
// ---------------------------------------------------------------------------

/// Black-box team execution: task in, final result text out.
///
/// Benchmark and A/B evaluation treat teams as opaque runners so they can
/// compare arbitrary configurations (or arbitrary non-pipeline baselines).
#[async_trait]
pub trait TeamRunner: Send + Sync {
    async fn run(&self, task: &str) -> Result<String, TeamError>;
}

/// Optional scorer used by A/B tests to grade both sides' outputs.
#[async_trait]
pub trait CrossChecker: Send + Sync {
    /// Score a result against the original task, 0-100.
    async fn score(&self, result: &str, task: &str) -> Result<f64, TeamError>;
}

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

/// Truncated content hash of a team configuration.
///
/// Analytics-grade grouping only: equal configs always hash equal, but the
/// 8-hex-char truncation makes collisions possible, so this must never stand
/// in for correctness-critical equality.
pub fn team_config_hash(config: &TeamConfig) -> String {
    // serde_json preserves struct field order, so equal configs serialize
    // identically.
    let json = serde_json::to_string(config).unwrap_or_default();
    let digest = Md5::digest(json.as_bytes());
    hex::encode(digest)[..8].to_string()
}

/// Truncated hash of a normalized task, for similar-task grouping.
pub fn task_hash(task: &str) -> String {
    let normalized: String = task.to_lowercase().trim().chars().take(100).collect();
    let digest = Md5::digest(normalized.as_bytes());
    hex::encode(digest)[..8].to_string()
}

// ---------------------------------------------------------------------------
// Execution records
// ---------------------------------------------------------------------------

/// One appended record per completed or failed task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Opaque row id.
    pub id: String,
    pub team_key: TeamKey,
    /// Snapshot of the configuration actually used.
    pub team_config: TeamConfig,
    pub task_type: String,
    pub task_hash: String,
    /// Quality score in [0, 100] when the run was scored. Unscored runs are
    /// `None` and stay out of averages.
    pub quality_score: Option<f64>,
    /// Wall-clock seconds.
    pub response_time: Option<f64>,
    pub token_count: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregated statistics for one team over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub total_executions: i64,
    /// Mean over scored records only; `None` when nothing was scored.
    pub avg_quality_score: Option<f64>,
    pub avg_response_time: Option<f64>,
    /// Percentage, 0 when there are no records.
    pub success_rate: f64,
    pub avg_tokens: Option<i64>,
}

impl TeamStats {
    /// Stats for a team with no records in the window.
    pub fn empty() -> Self {
        Self {
            total_executions: 0,
            avg_quality_score: None,
            avg_response_time: None,
            success_rate: 0.0,
            avg_tokens: None,
        }
    }
}

/// One team's row in a cross-team comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_key: TeamKey,
    /// Snapshot from the most recent record in the window.
    pub team_config: Option<TeamConfig>,
    pub total_executions: i64,
    pub avg_quality_score: Option<f64>,
    pub avg_response_time: Option<f64>,
    pub success_rate: f64,
}

/// Winner of the data-sufficiency-gated best-team query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestTeam {
    pub team_key: TeamKey,
    pub team_config: Option<TeamConfig>,
    pub avg_score: f64,
    pub sample_count: i64,
}

// ---------------------------------------------------------------------------
// Benchmark records
// ---------------------------------------------------------------------------

/// Outcome of one benchmark task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub name: String,
    /// Keyword-fraction score, 0-100. A failed run scores 0.
    pub score: f64,
    /// Wall-clock seconds; 0 for failed runs.
    pub time: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one benchmark suite run, as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub benchmark_id: String,
    pub team_key: TeamKey,
    /// Mean over all registered tasks; failed tasks contribute 0.
    pub avg_score: f64,
    pub avg_time: f64,
    pub task_results: Vec<TaskResult>,
}

/// One persisted benchmark result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub benchmark_id: String,
    pub team_config: Option<TeamConfig>,
    pub score: f64,
    pub response_time: f64,
    pub details: Vec<TaskResult>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// A/B test records
// ---------------------------------------------------------------------------

/// Outcome for one side of an A/B race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbSide {
    /// Snapshot of the side's configuration.
    pub config: TeamConfig,
    /// The side's output, or the error text if the runner failed.
    pub result: String,
    /// Cross-checker score; `None` when unscored, `Some(0.0)` on failure.
    pub score: Option<f64>,
    /// Wall-clock seconds.
    pub time: f64,
    pub success: bool,
}

/// Winner of an A/B test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    TeamA,
    TeamB,
    Draw,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::TeamA => "team_a",
            Winner::TeamB => "team_b",
            Winner::Draw => "draw",
        }
    }

    pub fn parse(s: &str) -> Option<Winner> {
        match s {
            "team_a" => Some(Winner::TeamA),
            "team_b" => Some(Winner::TeamB),
            "draw" => Some(Winner::Draw),
            _ => None,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one A/B test, as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestOutcome {
    pub test_id: String,
    pub task: String,
    pub team_a: AbSide,
    pub team_b: AbSide,
    pub winner: Winner,
}

/// Compact side view used in A/B history listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbSideSummary {
    pub config: Option<TeamConfig>,
    pub score: Option<f64>,
    pub time: f64,
}

/// One persisted A/B test, without the full result texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestRecord {
    pub test_id: String,
    pub task: String,
    pub team_a: AbSideSummary,
    pub team_b: AbSideSummary,
    pub winner: Winner,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Round to one decimal place.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
