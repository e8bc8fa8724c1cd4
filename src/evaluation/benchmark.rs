//! Synthetic benchmark evaluation.
//!
//! Each team has a fixed registry of benchmark tasks scored by keyword
//! presence: `(matched keywords / expected keywords) * 100`, case-insensitive
//! substring match. The heuristic is intentionally crude (no stemming, no
//! synonyms) and must stay that way so scores remain comparable with the
//! accumulated history.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::config::{TeamConfig, TeamKey};
use crate::evaluation::store::EvaluationStore;
use crate::evaluation::{round1, round2, BenchmarkRecord, BenchmarkRun, TaskResult, TeamRunner};
use crate::utilities::errors::TeamError;

// ---------------------------------------------------------------------------
// Task registry
// ---------------------------------------------------------------------------

/// One registered benchmark task.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkTask {
    pub name: &'static str,
    pub task: &'static str,
    pub expected_keywords: &'static [&'static str],
}

/// The fixed benchmark suite for a team.
pub fn benchmark_tasks(team_key: TeamKey) -> &'static [BenchmarkTask] {
    match team_key {
        TeamKey::Coder => &[
            BenchmarkTask {
                name: "fibonacci function",
                task: "Write a Python function that returns the nth Fibonacci number.",
                expected_keywords: &["def", "fibonacci", "return"],
            },
            BenchmarkTask {
                name: "list operations",
                task: "Write a Python function that removes duplicates from a list \
                       and returns it sorted ascending.",
                expected_keywords: &["def", "list", "sort", "set"],
            },
            BenchmarkTask {
                name: "api call",
                task: "Write a Python function that fetches JSON data over HTTP \
                       using the requests library.",
                expected_keywords: &["requests", "json", "get"],
            },
        ],
        TeamKey::Auditor => &[BenchmarkTask {
            name: "code review",
            task: "Point out the problems in this code:\n\
                   def add(a,b): return a+b\nresult = add('1', 2)",
            expected_keywords: &["type", "error", "typeerror"],
        }],
        TeamKey::Data => &[BenchmarkTask {
            name: "data analysis",
            task: "Analyze the mean, max, min, and trend of the sales data \
                   [100, 150, 200, 180, 220].",
            expected_keywords: &["mean", "max", "min", "trend"],
        }],
        TeamKey::Searcher => &[BenchmarkTask {
            name: "information search",
            task: "Briefly explain asynchronous processing in Python.",
            expected_keywords: &["async", "await", "coroutine"],
        }],
    }
}

/// Fraction of expected keywords present in `result`, as a 0-100 score.
/// Case-insensitive substring match, two-decimal rounding.
pub fn keyword_score(result: &str, expected_keywords: &[&str]) -> f64 {
    if expected_keywords.is_empty() {
        return 0.0;
    }
    let haystack = result.to_lowercase();
    let matched = expected_keywords
        .iter()
        .filter(|kw| haystack.contains(&kw.to_lowercase()))
        .count();
    round2(matched as f64 / expected_keywords.len() as f64 * 100.0)
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Runs the fixed benchmark suite for a team and persists the result.
pub struct BenchmarkEvaluator {
    store: Arc<EvaluationStore>,
}

impl BenchmarkEvaluator {
    pub fn new(store: Arc<EvaluationStore>) -> Self {
        Self { store }
    }

    /// Run every registered task for the team through `runner`.
    ///
    /// Task failures are isolated: a failed task is recorded with score 0
    /// and time 0, the remaining tasks still run, and the zero stays in the
    /// average. Only a storage failure surfaces as `Err`.
    pub async fn run_benchmark(
        &self,
        team_key: TeamKey,
        team_config: &TeamConfig,
        runner: &dyn TeamRunner,
    ) -> Result<BenchmarkRun, TeamError> {
        let benchmark_id = short_id();
        let tasks = benchmark_tasks(team_key);

        let mut task_results = Vec::with_capacity(tasks.len());
        let mut total_score = 0.0;
        let mut total_time = 0.0;

        for task in tasks {
            let started = Instant::now();
            match runner.run(task.task).await {
                Ok(result) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    let score = keyword_score(&result, task.expected_keywords);
                    total_score += score;
                    total_time += elapsed;
                    task_results.push(TaskResult {
                        name: task.name.to_string(),
                        score,
                        time: round2(elapsed),
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    log::warn!("benchmark task {:?} failed for team {team_key}: {e}", task.name);
                    task_results.push(TaskResult {
                        name: task.name.to_string(),
                        score: 0.0,
                        time: 0.0,
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let avg_score = round1(total_score / tasks.len() as f64);
        let avg_time = round2(total_time / tasks.len() as f64);

        self.store.insert_benchmark(
            &benchmark_id,
            team_key,
            team_config,
            &format!("{team_key}_standard"),
            avg_score,
            avg_time,
            &task_results,
        )?;

        Ok(BenchmarkRun {
            benchmark_id,
            team_key,
            avg_score,
            avg_time,
            task_results,
        })
    }

    /// Past benchmark results for a team, most recent first.
    pub fn get_benchmark_history(
        &self,
        team_key: TeamKey,
        limit: usize,
    ) -> Result<Vec<BenchmarkRecord>, TeamError> {
        self.store.benchmark_history(team_key, limit)
    }
}

fn short_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_team_config;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Runner stub answering from a script, one entry per task in order.
    struct ScriptedRunner {
        replies: Mutex<Vec<Result<String, String>>>,
    }

    impl ScriptedRunner {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl TeamRunner for ScriptedRunner {
        async fn run(&self, _task: &str) -> Result<String, TeamError> {
            let mut replies = self.replies.lock();
            match replies.remove(0) {
                Ok(text) => Ok(text),
                Err(msg) => Err(TeamError::Runner(msg)),
            }
        }
    }

    fn evaluator() -> BenchmarkEvaluator {
        BenchmarkEvaluator::new(Arc::new(EvaluationStore::in_memory().unwrap()))
    }

    #[test]
    fn test_keyword_score_case_insensitive() {
        // Two of three keywords, "RETURN" matching "return".
        let score = keyword_score("def solve(): RETURN 42", &["def", "fibonacci", "return"]);
        assert!((score - 66.67).abs() < 0.01);
    }

    #[test]
    fn test_keyword_score_bounds() {
        assert_eq!(keyword_score("def fibonacci(): return", &["def", "fibonacci", "return"]), 100.0);
        assert_eq!(keyword_score("nothing relevant", &["def"]), 0.0);
    }

    #[tokio::test]
    async fn test_run_benchmark_scores_and_persists() {
        let evaluator = evaluator();
        let runner = ScriptedRunner::new(vec![
            Ok("def fibonacci(n): return n"),        // 3/3
            Ok("def dedupe(list): return sorted(set(list))"), // sort matches "sorted"
            Ok("import requests; r.json()"),          // 2/3 (no "get")
        ]);

        let run = evaluator
            .run_benchmark(TeamKey::Coder, &default_team_config(TeamKey::Coder), &runner)
            .await
            .unwrap();

        assert_eq!(run.task_results.len(), 3);
        assert_eq!(run.task_results[0].score, 100.0);
        assert_eq!(run.task_results[1].score, 100.0);
        assert!((run.task_results[2].score - 66.67).abs() < 0.01);
        assert!(run.task_results.iter().all(|t| t.success));

        let history = evaluator.get_benchmark_history(TeamKey::Coder, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].benchmark_id, run.benchmark_id);
        assert_eq!(history[0].details.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_task_is_isolated_and_zeroed_in_average() {
        let evaluator = evaluator();
        let runner = ScriptedRunner::new(vec![
            Ok("def fibonacci(n): return n"), // 100
            Err("runner crashed"),
            Ok("requests.get(url).json()"), // 100
        ]);

        let run = evaluator
            .run_benchmark(TeamKey::Coder, &default_team_config(TeamKey::Coder), &runner)
            .await
            .unwrap();

        let failed = &run.task_results[1];
        assert!(!failed.success);
        assert_eq!(failed.score, 0.0);
        assert_eq!(failed.time, 0.0);
        assert!(failed.error.as_ref().unwrap().contains("runner crashed"));

        // Failed task contributes 0 to the average rather than being excluded.
        assert_eq!(run.avg_score, round1(200.0 / 3.0));
    }

    #[tokio::test]
    async fn test_single_task_suite() {
        let evaluator = evaluator();
        let runner = ScriptedRunner::new(vec![Ok("That is a TypeError: type mismatch error")]);
        let run = evaluator
            .run_benchmark(TeamKey::Auditor, &default_team_config(TeamKey::Auditor), &runner)
            .await
            .unwrap();
        assert_eq!(run.task_results.len(), 1);
        assert_eq!(run.task_results[0].score, 100.0);
    }
}
