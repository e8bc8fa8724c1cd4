//! Façade composing the three evaluators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{TeamConfig, TeamKey};
use crate::evaluation::ab_test::AbTestEvaluator;
use crate::evaluation::benchmark::BenchmarkEvaluator;
use crate::evaluation::history::{ExecutionInput, HistoryEvaluator, DEFAULT_WINDOW_DAYS};
use crate::evaluation::store::EvaluationStore;
use crate::evaluation::{
    AbTestOutcome, AbTestRecord, BenchmarkRecord, BenchmarkRun, BestTeam, CrossChecker,
    ExecutionRecord, TeamRunner, TeamStats, TeamSummary, Winner,
};
use crate::utilities::errors::TeamError;

/// Number of trailing A/B records tallied for insights.
const AB_INSIGHT_WINDOW: usize = 20;

/// Number of benchmark runs surfaced in a recommendation.
const RECENT_BENCHMARKS: usize = 3;

// ---------------------------------------------------------------------------
// Recommendation types
// ---------------------------------------------------------------------------

/// Win/draw tally over recent A/B tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinDistribution {
    pub team_a: usize,
    pub team_b: usize,
    pub draw: usize,
}

/// Aggregated A/B signal for a recommendation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbTestInsights {
    pub total_tests: usize,
    pub win_distribution: WinDistribution,
}

/// Combined team recommendation for one task type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub task_type: String,
    /// History-based pick, `None` on insufficient data.
    pub best_from_history: Option<BestTeam>,
    pub recent_benchmarks: Vec<BenchmarkRecord>,
    pub ab_test_insights: AbTestInsights,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Single entry point over history, benchmark, and A/B evaluation.
///
/// Pure composition: every method delegates to one of the evaluators, and
/// [`EvaluationManager::get_recommendation`] merely stitches their answers
/// together.
pub struct EvaluationManager {
    history: HistoryEvaluator,
    benchmark: BenchmarkEvaluator,
    ab_test: AbTestEvaluator,
}

impl EvaluationManager {
    pub fn new(store: Arc<EvaluationStore>) -> Self {
        Self {
            history: HistoryEvaluator::new(store.clone()),
            benchmark: BenchmarkEvaluator::new(store.clone()),
            ab_test: AbTestEvaluator::new(store),
        }
    }

    // --- History ---

    /// Append one execution record.
    pub fn record_execution(&self, input: ExecutionInput) -> Result<ExecutionRecord, TeamError> {
        self.history.record_execution(input)
    }

    /// Team statistics over the default 30-day window.
    pub fn get_team_stats(&self, team_key: TeamKey) -> Result<TeamStats, TeamError> {
        self.history.get_team_stats(team_key, DEFAULT_WINDOW_DAYS)
    }

    /// Cross-team comparison over the default 30-day window.
    pub fn get_all_teams_comparison(&self) -> Result<Vec<TeamSummary>, TeamError> {
        self.history.get_all_teams_comparison(DEFAULT_WINDOW_DAYS)
    }

    /// History-based best team for a task type.
    pub fn get_best_team_for_task(&self, task_type: &str) -> Result<Option<BestTeam>, TeamError> {
        self.history.get_best_team_for_task_type(task_type)
    }

    // --- Benchmarks ---

    /// Run the fixed benchmark suite for a team.
    pub async fn run_benchmark(
        &self,
        team_key: TeamKey,
        team_config: &TeamConfig,
        runner: &dyn TeamRunner,
    ) -> Result<BenchmarkRun, TeamError> {
        self.benchmark.run_benchmark(team_key, team_config, runner).await
    }

    /// Past benchmark results, most recent first.
    pub fn get_benchmark_history(
        &self,
        team_key: TeamKey,
        limit: usize,
    ) -> Result<Vec<BenchmarkRecord>, TeamError> {
        self.benchmark.get_benchmark_history(team_key, limit)
    }

    // --- A/B tests ---

    /// Race two configurations on one task.
    pub async fn run_ab_test(
        &self,
        task: &str,
        team_a_config: TeamConfig,
        team_b_config: TeamConfig,
        runner_a: &dyn TeamRunner,
        runner_b: &dyn TeamRunner,
        cross_checker: Option<&dyn CrossChecker>,
    ) -> Result<AbTestOutcome, TeamError> {
        self.ab_test
            .run_ab_test(task, team_a_config, team_b_config, runner_a, runner_b, cross_checker)
            .await
    }

    /// Past A/B tests, most recent first.
    pub fn get_ab_test_history(&self, limit: usize) -> Result<Vec<AbTestRecord>, TeamError> {
        self.ab_test.get_ab_test_history(limit)
    }

    // --- Recommendation ---

    /// Combine all three signals into one recommendation for a task type.
    pub fn get_recommendation(&self, task_type: &str) -> Result<Recommendation, TeamError> {
        let best_from_history = self.history.get_best_team_for_task_type(task_type)?;

        // Task types conventionally coincide with team keys; benchmark
        // history only exists for real teams.
        let recent_benchmarks = match TeamKey::parse(task_type) {
            Some(team_key) => self
                .benchmark
                .get_benchmark_history(team_key, RECENT_BENCHMARKS)?,
            None => Vec::new(),
        };

        let ab_history = self.ab_test.get_ab_test_history(AB_INSIGHT_WINDOW)?;
        Ok(Recommendation {
            task_type: task_type.to_string(),
            best_from_history,
            recent_benchmarks,
            ab_test_insights: analyze_ab_tests(&ab_history),
        })
    }
}

/// Tally winners over a slice of A/B records.
pub fn analyze_ab_tests(records: &[AbTestRecord]) -> AbTestInsights {
    let mut distribution = WinDistribution::default();
    for record in records {
        match record.winner {
            Winner::TeamA => distribution.team_a += 1,
            Winner::TeamB => distribution.team_b += 1,
            Winner::Draw => distribution.draw += 1,
        }
    }
    AbTestInsights {
        total_tests: records.len(),
        win_distribution: distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_team_config;
    use async_trait::async_trait;

    struct EchoRunner;

    #[async_trait]
    impl TeamRunner for EchoRunner {
        async fn run(&self, task: &str) -> Result<String, TeamError> {
            Ok(task.to_string())
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl TeamRunner for FailingRunner {
        async fn run(&self, _task: &str) -> Result<String, TeamError> {
            Err(TeamError::Runner("down".to_string()))
        }
    }

    fn manager() -> EvaluationManager {
        EvaluationManager::new(Arc::new(EvaluationStore::in_memory().unwrap()))
    }

    fn scored_input(team_key: TeamKey, task_type: &str, score: f64) -> ExecutionInput {
        let mut input = ExecutionInput::new(
            team_key,
            default_team_config(team_key),
            task_type,
            "task",
        );
        input.quality_score = Some(score);
        input
    }

    #[tokio::test]
    async fn test_recommendation_combines_all_three_signals() {
        let manager = manager();

        for score in [85.0, 87.0, 89.0] {
            manager
                .record_execution(scored_input(TeamKey::Coder, "coder", score))
                .unwrap();
        }
        manager
            .run_benchmark(TeamKey::Coder, &default_team_config(TeamKey::Coder), &EchoRunner)
            .await
            .unwrap();
        manager
            .run_ab_test(
                "task",
                default_team_config(TeamKey::Coder),
                default_team_config(TeamKey::Auditor),
                &EchoRunner,
                &FailingRunner,
                None,
            )
            .await
            .unwrap();

        let recommendation = manager.get_recommendation("coder").unwrap();
        assert_eq!(
            recommendation.best_from_history.as_ref().unwrap().team_key,
            TeamKey::Coder
        );
        assert_eq!(recommendation.recent_benchmarks.len(), 1);
        assert_eq!(recommendation.ab_test_insights.total_tests, 1);
        assert_eq!(recommendation.ab_test_insights.win_distribution.team_a, 1);
    }

    #[tokio::test]
    async fn test_failed_pipeline_run_is_recorded_by_caller() {
        use crate::llm::{Message, PromptClient, PromptError};
        use crate::team::TeamPipeline;

        struct DeadClient;

        #[async_trait]
        impl PromptClient for DeadClient {
            async fn invoke(
                &self,
                _model: crate::config::ModelId,
                _messages: &[Message],
            ) -> Result<String, PromptError> {
                Err(PromptError::Provider("provider offline".to_string()))
            }
        }

        let manager = manager();
        let config = default_team_config(TeamKey::Coder);
        let pipeline = TeamPipeline::new(config.clone(), Arc::new(DeadClient));

        // Creator failure propagates; the caller records the failed run.
        let err = pipeline.run("task", "").await.unwrap_err();
        let mut input = ExecutionInput::new(TeamKey::Coder, config, "coder", "task");
        input.success = false;
        input.error_message = Some(err.to_string());
        manager.record_execution(input).unwrap();

        let stats = manager.get_team_stats(TeamKey::Coder).unwrap();
        assert_eq!(stats.total_executions, 1);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_quality_score, None);
    }

    #[test]
    fn test_recommendation_with_no_data() {
        let manager = manager();
        let recommendation = manager.get_recommendation("coder").unwrap();
        assert!(recommendation.best_from_history.is_none());
        assert!(recommendation.recent_benchmarks.is_empty());
        assert_eq!(recommendation.ab_test_insights.total_tests, 0);
    }

    #[tokio::test]
    async fn test_win_distribution_tally() {
        let manager = manager();
        // team_a wins, team_b wins, both-failed draw.
        let pairs: [(&dyn TeamRunner, &dyn TeamRunner); 3] = [
            (&EchoRunner, &FailingRunner),
            (&FailingRunner, &EchoRunner),
            (&FailingRunner, &FailingRunner),
        ];
        for (a, b) in pairs {
            manager
                .run_ab_test(
                    "task",
                    default_team_config(TeamKey::Coder),
                    default_team_config(TeamKey::Auditor),
                    a,
                    b,
                    None,
                )
                .await
                .unwrap();
        }

        let insights = analyze_ab_tests(&manager.get_ab_test_history(20).unwrap());
        assert_eq!(insights.total_tests, 3);
        assert_eq!(
            insights.win_distribution,
            WinDistribution { team_a: 1, team_b: 1, draw: 1 }
        );
    }
}
