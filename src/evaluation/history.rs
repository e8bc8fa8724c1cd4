//! History-based evaluation over real execution records.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::{TeamConfig, TeamKey};
use crate::evaluation::store::EvaluationStore;
use crate::evaluation::{task_hash, BestTeam, ExecutionRecord, TeamStats, TeamSummary};
use crate::utilities::errors::TeamError;

/// Default trailing window for statistics, in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Minimum scored samples before a team can win the best-team query.
/// Keeps single-sample noise out of recommendations.
pub const MIN_SAMPLES: i64 = 3;

/// Input for one execution record.
///
/// `quality_score` is expected in [0, 100] but not enforced; aggregation
/// simply reflects whatever was recorded.
#[derive(Debug, Clone)]
pub struct ExecutionInput {
    pub team_key: TeamKey,
    /// Snapshot of the configuration the run actually used.
    pub team_config: TeamConfig,
    pub task_type: String,
    pub task: String,
    pub quality_score: Option<f64>,
    pub response_time: Option<f64>,
    pub token_count: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ExecutionInput {
    /// A successful, unscored execution; set the optional fields as needed.
    pub fn new(
        team_key: TeamKey,
        team_config: TeamConfig,
        task_type: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            team_key,
            team_config,
            task_type: task_type.into(),
            task: task.into(),
            quality_score: None,
            response_time: None,
            token_count: None,
            success: true,
            error_message: None,
        }
    }
}

/// Aggregates execution records into per-team statistics and rankings.
pub struct HistoryEvaluator {
    store: Arc<EvaluationStore>,
}

impl HistoryEvaluator {
    pub fn new(store: Arc<EvaluationStore>) -> Self {
        Self { store }
    }

    /// Append one execution record and return it.
    pub fn record_execution(&self, input: ExecutionInput) -> Result<ExecutionRecord, TeamError> {
        let record = ExecutionRecord {
            id: Uuid::new_v4().to_string(),
            team_key: input.team_key,
            team_config: input.team_config,
            task_type: input.task_type,
            task_hash: task_hash(&input.task),
            quality_score: input.quality_score,
            response_time: input.response_time,
            token_count: input.token_count,
            success: input.success,
            error_message: input.error_message,
            created_at: Utc::now(),
        };
        self.store.insert_execution(&record)?;
        log::debug!(
            "recorded execution: team={} task_type={} success={}",
            record.team_key,
            record.task_type,
            record.success
        );
        Ok(record)
    }

    /// Statistics for one team over a trailing window of `days`.
    pub fn get_team_stats(&self, team_key: TeamKey, days: i64) -> Result<TeamStats, TeamError> {
        self.store
            .team_stats(team_key, Utc::now() - Duration::days(days))
    }

    /// All teams seen in the window, best average quality score first;
    /// teams with no scored executions rank below those with any.
    pub fn get_all_teams_comparison(&self, days: i64) -> Result<Vec<TeamSummary>, TeamError> {
        self.store
            .teams_comparison(Utc::now() - Duration::days(days))
    }

    /// Highest-average team for a task type, gated on [`MIN_SAMPLES`] scored
    /// records. `None` means insufficient data, not an error.
    pub fn get_best_team_for_task_type(
        &self,
        task_type: &str,
    ) -> Result<Option<BestTeam>, TeamError> {
        self.store.best_team_for_task_type(task_type, MIN_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_team_config;

    fn evaluator() -> HistoryEvaluator {
        HistoryEvaluator::new(Arc::new(EvaluationStore::in_memory().unwrap()))
    }

    fn scored(team_key: TeamKey, task_type: &str, score: f64) -> ExecutionInput {
        let mut input = ExecutionInput::new(
            team_key,
            default_team_config(team_key),
            task_type,
            "sample task",
        );
        input.quality_score = Some(score);
        input
    }

    #[test]
    fn test_record_and_stats() {
        let history = evaluator();
        history.record_execution(scored(TeamKey::Coder, "coder", 88.0)).unwrap();
        let mut failed = ExecutionInput::new(
            TeamKey::Coder,
            default_team_config(TeamKey::Coder),
            "coder",
            "bad task",
        );
        failed.success = false;
        failed.error_message = Some("creator stage failed".to_string());
        history.record_execution(failed).unwrap();

        let stats = history.get_team_stats(TeamKey::Coder, 30).unwrap();
        assert_eq!(stats.total_executions, 2);
        assert_eq!(stats.avg_quality_score, Some(88.0));
        assert_eq!(stats.success_rate, 50.0);
    }

    #[test]
    fn test_empty_stats_have_no_division_by_zero() {
        let history = evaluator();
        let stats = history.get_team_stats(TeamKey::Searcher, 30).unwrap();
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_quality_score, None);
    }

    #[test]
    fn test_best_team_boundary_at_three_samples() {
        let history = evaluator();
        history.record_execution(scored(TeamKey::Coder, "review", 80.0)).unwrap();
        history.record_execution(scored(TeamKey::Coder, "review", 82.0)).unwrap();
        assert!(history.get_best_team_for_task_type("review").unwrap().is_none());

        history.record_execution(scored(TeamKey::Coder, "review", 84.0)).unwrap();
        let best = history.get_best_team_for_task_type("review").unwrap().unwrap();
        assert_eq!(best.team_key, TeamKey::Coder);
    }

    #[test]
    fn test_best_team_picks_max_average() {
        let history = evaluator();
        for score in [70.0, 72.0, 74.0] {
            history.record_execution(scored(TeamKey::Coder, "mixed", score)).unwrap();
        }
        for score in [90.0, 91.0, 92.0] {
            history.record_execution(scored(TeamKey::Auditor, "mixed", score)).unwrap();
        }

        let best = history.get_best_team_for_task_type("mixed").unwrap().unwrap();
        assert_eq!(best.team_key, TeamKey::Auditor);
        assert_eq!(best.avg_score, 91.0);
        assert_eq!(best.sample_count, 3);
    }
}
