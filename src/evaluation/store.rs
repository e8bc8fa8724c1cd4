//! Append-only SQLite store for evaluation records.
//!
//! Three logical tables (executions, benchmark results, A/B test results)
//! each keyed by an opaque generated id and queryable by team key and a
//! trailing time window. Rows are written once and never mutated; retention
//! is an external concern.
//!
//! Team configurations are stored as JSON snapshot columns so that a
//! persisted record reproduces the exact role-to-model assignment used at
//! run time, regardless of later configuration changes.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::{TeamConfig, TeamKey};
use crate::evaluation::{
    AbSideSummary, AbTestOutcome, AbTestRecord, BenchmarkRecord, BestTeam, ExecutionRecord,
    TaskResult, TeamStats, TeamSummary, Winner,
};
use crate::utilities::errors::TeamError;

/// Append-only evaluation store.
pub struct EvaluationStore {
    conn: Mutex<Connection>,
}

impl EvaluationStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TeamError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory store. Used by tests and throwaway sessions.
    pub fn in_memory() -> Result<Self, TeamError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, TeamError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS executions (
                id TEXT PRIMARY KEY,
                team_key TEXT NOT NULL,
                team_config TEXT NOT NULL,
                task_type TEXT NOT NULL,
                task_hash TEXT NOT NULL,
                quality_score REAL,
                response_time REAL,
                token_count INTEGER,
                success INTEGER NOT NULL DEFAULT 1,
                error_message TEXT,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS benchmark_results (
                id TEXT PRIMARY KEY,
                benchmark_id TEXT NOT NULL,
                team_key TEXT NOT NULL,
                team_config TEXT NOT NULL,
                benchmark_name TEXT NOT NULL,
                score REAL NOT NULL,
                response_time REAL NOT NULL,
                details TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS ab_test_results (
                id TEXT PRIMARY KEY,
                test_id TEXT NOT NULL,
                task TEXT NOT NULL,
                team_a_config TEXT NOT NULL,
                team_a_result TEXT,
                team_a_score REAL,
                team_a_time REAL NOT NULL,
                team_b_config TEXT NOT NULL,
                team_b_result TEXT,
                team_b_score REAL,
                team_b_time REAL NOT NULL,
                winner TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // -----------------------------------------------------------------------
    // Executions
    // -----------------------------------------------------------------------

    /// Append one execution record.
    pub fn insert_execution(&self, record: &ExecutionRecord) -> Result<(), TeamError> {
        let config_json = serde_json::to_string(&record.team_config)
            .map_err(|e| TeamError::CorruptRecord(e.to_string()))?;
        self.conn.lock().execute(
            "INSERT INTO executions
             (id, team_key, team_config, task_type, task_hash, quality_score,
              response_time, token_count, success, error_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id,
                record.team_key.as_str(),
                config_json,
                record.task_type,
                record.task_hash,
                record.quality_score,
                record.response_time,
                record.token_count,
                record.success as i64,
                record.error_message,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Aggregate statistics for one team since the given instant.
    pub fn team_stats(
        &self,
        team_key: TeamKey,
        since: DateTime<Utc>,
    ) -> Result<TeamStats, TeamError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT COUNT(*),
                    AVG(quality_score),
                    AVG(response_time),
                    SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END),
                    AVG(token_count)
             FROM executions
             WHERE team_key = ?1 AND created_at >= ?2",
            params![team_key.as_str(), since.to_rfc3339()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            },
        )?;

        let (total, avg_score, avg_time, successes, avg_tokens) = row;
        if total == 0 {
            return Ok(TeamStats::empty());
        }
        Ok(TeamStats {
            total_executions: total,
            avg_quality_score: avg_score.map(super::round1),
            avg_response_time: avg_time.map(super::round2),
            success_rate: super::round1(successes.unwrap_or(0) as f64 / total as f64 * 100.0),
            avg_tokens: avg_tokens.map(|t| t as i64),
        })
    }

    /// Per-team summaries since the given instant, best average score first,
    /// unscored teams last.
    pub fn teams_comparison(&self, since: DateTime<Utc>) -> Result<Vec<TeamSummary>, TeamError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT team_key,
                    team_config,
                    MAX(created_at),
                    COUNT(*),
                    AVG(quality_score),
                    AVG(response_time),
                    SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END) * 100.0 / COUNT(*)
             FROM executions
             WHERE created_at >= ?1
             GROUP BY team_key
             ORDER BY AVG(quality_score) DESC",
        )?;

        let rows = stmt.query_map(params![since.to_rfc3339()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, f64>(6)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (key, config_json, total, avg_score, avg_time, success_rate) = row?;
            let Some(team_key) = TeamKey::parse(&key) else {
                log::warn!("skipping execution rows with unknown team key {key:?}");
                continue;
            };
            summaries.push(TeamSummary {
                team_key,
                team_config: decode_config(&config_json),
                total_executions: total,
                avg_quality_score: avg_score.map(super::round1),
                avg_response_time: avg_time.map(super::round2),
                success_rate: super::round1(success_rate),
            });
        }
        Ok(summaries)
    }

    /// Best-scoring team for a task type among teams with at least
    /// `min_samples` scored records. `None` when no team qualifies.
    pub fn best_team_for_task_type(
        &self,
        task_type: &str,
        min_samples: i64,
    ) -> Result<Option<BestTeam>, TeamError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT team_key, team_config, AVG(quality_score), COUNT(*)
                 FROM executions
                 WHERE task_type = ?1 AND quality_score IS NOT NULL
                 GROUP BY team_key
                 HAVING COUNT(*) >= ?2
                 ORDER BY AVG(quality_score) DESC
                 LIMIT 1",
                params![task_type, min_samples],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.and_then(|(key, config_json, avg_score, count)| {
            let team_key = TeamKey::parse(&key)?;
            Some(BestTeam {
                team_key,
                team_config: decode_config(&config_json),
                avg_score: super::round1(avg_score),
                sample_count: count,
            })
        }))
    }

    // -----------------------------------------------------------------------
    // Benchmarks
    // -----------------------------------------------------------------------

    /// Append one benchmark result.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_benchmark(
        &self,
        benchmark_id: &str,
        team_key: TeamKey,
        team_config: &TeamConfig,
        benchmark_name: &str,
        score: f64,
        response_time: f64,
        details: &[TaskResult],
    ) -> Result<(), TeamError> {
        let config_json = serde_json::to_string(team_config)
            .map_err(|e| TeamError::CorruptRecord(e.to_string()))?;
        let details_json = serde_json::to_string(details)
            .map_err(|e| TeamError::CorruptRecord(e.to_string()))?;
        self.conn.lock().execute(
            "INSERT INTO benchmark_results
             (id, benchmark_id, team_key, team_config, benchmark_name, score,
              response_time, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Uuid::new_v4().to_string(),
                benchmark_id,
                team_key.as_str(),
                config_json,
                benchmark_name,
                score,
                response_time,
                details_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Benchmark results for one team, most recent first.
    pub fn benchmark_history(
        &self,
        team_key: TeamKey,
        limit: usize,
    ) -> Result<Vec<BenchmarkRecord>, TeamError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT benchmark_id, team_config, score, response_time, details, created_at
             FROM benchmark_results
             WHERE team_key = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![team_key.as_str(), limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (benchmark_id, config_json, score, response_time, details_json, created_at) = row?;
            records.push(BenchmarkRecord {
                benchmark_id,
                team_config: decode_config(&config_json),
                score,
                response_time,
                details: serde_json::from_str(&details_json).unwrap_or_else(|e| {
                    log::warn!("undecodable benchmark details: {e}");
                    Vec::new()
                }),
                created_at: decode_timestamp(&created_at)?,
            });
        }
        Ok(records)
    }

    // -----------------------------------------------------------------------
    // A/B tests
    // -----------------------------------------------------------------------

    /// Append one A/B test outcome. Result texts are truncated to keep row
    /// sizes bounded; the full texts live only in the returned outcome.
    pub fn insert_ab_test(&self, outcome: &AbTestOutcome) -> Result<(), TeamError> {
        let config_a = serde_json::to_string(&outcome.team_a.config)
            .map_err(|e| TeamError::CorruptRecord(e.to_string()))?;
        let config_b = serde_json::to_string(&outcome.team_b.config)
            .map_err(|e| TeamError::CorruptRecord(e.to_string()))?;
        self.conn.lock().execute(
            "INSERT INTO ab_test_results
             (id, test_id, task, team_a_config, team_a_result, team_a_score, team_a_time,
              team_b_config, team_b_result, team_b_score, team_b_time, winner, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                Uuid::new_v4().to_string(),
                outcome.test_id,
                truncate_chars(&outcome.task, 500),
                config_a,
                truncate_chars(&outcome.team_a.result, 2000),
                outcome.team_a.score,
                outcome.team_a.time,
                config_b,
                truncate_chars(&outcome.team_b.result, 2000),
                outcome.team_b.score,
                outcome.team_b.time,
                outcome.winner.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// A/B test history, most recent first.
    pub fn ab_test_history(&self, limit: usize) -> Result<Vec<AbTestRecord>, TeamError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT test_id, task, team_a_config, team_a_score, team_a_time,
                    team_b_config, team_b_score, team_b_time, winner, created_at
             FROM ab_test_results
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                test_id,
                task,
                config_a,
                score_a,
                time_a,
                config_b,
                score_b,
                time_b,
                winner,
                created_at,
            ) = row?;
            let winner = Winner::parse(&winner)
                .ok_or_else(|| TeamError::CorruptRecord(format!("unknown winner {winner:?}")))?;
            records.push(AbTestRecord {
                test_id,
                task,
                team_a: AbSideSummary {
                    config: decode_config(&config_a),
                    score: score_a,
                    time: time_a,
                },
                team_b: AbSideSummary {
                    config: decode_config(&config_b),
                    score: score_b,
                    time: time_b,
                },
                winner,
                created_at: decode_timestamp(&created_at)?,
            });
        }
        Ok(records)
    }
}

fn decode_config(json: &str) -> Option<TeamConfig> {
    match serde_json::from_str(json) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("undecodable team config snapshot: {e}");
            None
        }
    }
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, TeamError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TeamError::CorruptRecord(format!("bad timestamp {raw:?}: {e}")))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_team_config;
    use crate::evaluation::{task_hash, AbSide};
    use chrono::Duration;

    fn record(team_key: TeamKey, score: Option<f64>, success: bool) -> ExecutionRecord {
        ExecutionRecord {
            id: Uuid::new_v4().to_string(),
            team_key,
            team_config: default_team_config(team_key),
            task_type: team_key.as_str().to_string(),
            task_hash: task_hash("some task"),
            quality_score: score,
            response_time: Some(1.5),
            token_count: Some(400),
            success,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_on_empty_store() {
        let store = EvaluationStore::in_memory().unwrap();
        let stats = store
            .team_stats(TeamKey::Coder, Utc::now() - Duration::days(30))
            .unwrap();
        assert_eq!(stats, TeamStats::empty());
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_stats_excludes_null_scores_from_average() {
        let store = EvaluationStore::in_memory().unwrap();
        store.insert_execution(&record(TeamKey::Coder, Some(80.0), true)).unwrap();
        store.insert_execution(&record(TeamKey::Coder, Some(90.0), true)).unwrap();
        store.insert_execution(&record(TeamKey::Coder, None, false)).unwrap();

        let stats = store
            .team_stats(TeamKey::Coder, Utc::now() - Duration::days(1))
            .unwrap();
        assert_eq!(stats.total_executions, 3);
        // Mean of 80 and 90; the unscored record is excluded, not zeroed.
        assert_eq!(stats.avg_quality_score, Some(85.0));
        assert_eq!(stats.success_rate, 66.7);
    }

    #[test]
    fn test_stats_window_excludes_old_records() {
        let store = EvaluationStore::in_memory().unwrap();
        let mut old = record(TeamKey::Data, Some(50.0), true);
        old.created_at = Utc::now() - Duration::days(45);
        store.insert_execution(&old).unwrap();
        store.insert_execution(&record(TeamKey::Data, Some(70.0), true)).unwrap();

        let stats = store
            .team_stats(TeamKey::Data, Utc::now() - Duration::days(30))
            .unwrap();
        assert_eq!(stats.total_executions, 1);
        assert_eq!(stats.avg_quality_score, Some(70.0));
    }

    #[test]
    fn test_comparison_sorts_desc_with_nulls_last() {
        let store = EvaluationStore::in_memory().unwrap();
        // Insertion order deliberately scrambled.
        store.insert_execution(&record(TeamKey::Data, None, true)).unwrap();
        store.insert_execution(&record(TeamKey::Coder, Some(70.0), true)).unwrap();
        store.insert_execution(&record(TeamKey::Auditor, Some(95.0), true)).unwrap();

        let summaries = store
            .teams_comparison(Utc::now() - Duration::days(30))
            .unwrap();
        let keys: Vec<TeamKey> = summaries.iter().map(|s| s.team_key).collect();
        assert_eq!(keys, vec![TeamKey::Auditor, TeamKey::Coder, TeamKey::Data]);
        assert_eq!(summaries[2].avg_quality_score, None);
    }

    #[test]
    fn test_best_team_requires_three_scored_samples() {
        let store = EvaluationStore::in_memory().unwrap();
        store.insert_execution(&record(TeamKey::Coder, Some(90.0), true)).unwrap();
        store.insert_execution(&record(TeamKey::Coder, Some(92.0), true)).unwrap();
        // Two samples: below the gate.
        assert!(store.best_team_for_task_type("coder", 3).unwrap().is_none());

        store.insert_execution(&record(TeamKey::Coder, Some(94.0), true)).unwrap();
        // Exactly three: qualifies.
        let best = store.best_team_for_task_type("coder", 3).unwrap().unwrap();
        assert_eq!(best.team_key, TeamKey::Coder);
        assert_eq!(best.sample_count, 3);
        assert_eq!(best.avg_score, 92.0);
    }

    #[test]
    fn test_best_team_ignores_unscored_samples() {
        let store = EvaluationStore::in_memory().unwrap();
        for _ in 0..5 {
            store.insert_execution(&record(TeamKey::Searcher, None, true)).unwrap();
        }
        assert!(store.best_team_for_task_type("searcher", 3).unwrap().is_none());
    }

    #[test]
    fn test_config_snapshot_survives_live_changes() {
        let store = EvaluationStore::in_memory().unwrap();
        let mut rec = record(TeamKey::Coder, Some(80.0), true);
        rec.team_config.checker = crate::config::ModelId::Gemini;
        store.insert_execution(&rec).unwrap();

        // The "live" default still names Gpt as checker; the stored snapshot
        // must keep Gemini.
        let summaries = store
            .teams_comparison(Utc::now() - Duration::days(1))
            .unwrap();
        let stored = summaries[0].team_config.as_ref().unwrap();
        assert_eq!(stored.checker, crate::config::ModelId::Gemini);
        assert_eq!(default_team_config(TeamKey::Coder).checker, crate::config::ModelId::Gpt);
    }

    #[test]
    fn test_benchmark_history_most_recent_first() {
        let store = EvaluationStore::in_memory().unwrap();
        let config = default_team_config(TeamKey::Coder);
        for (id, score) in [("first", 50.0), ("second", 60.0), ("third", 70.0)] {
            store
                .insert_benchmark(id, TeamKey::Coder, &config, "coder_standard", score, 1.0, &[])
                .unwrap();
        }

        let history = store.benchmark_history(TeamKey::Coder, 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].benchmark_id, "third");
        assert_eq!(history[1].benchmark_id, "second");
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evaluations.db");

        let store = EvaluationStore::open(&path).unwrap();
        store.insert_execution(&record(TeamKey::Coder, Some(75.0), true)).unwrap();
        drop(store);

        let reopened = EvaluationStore::open(&path).unwrap();
        let stats = reopened
            .team_stats(TeamKey::Coder, Utc::now() - Duration::days(1))
            .unwrap();
        assert_eq!(stats.total_executions, 1);
        assert_eq!(stats.avg_quality_score, Some(75.0));
    }

    #[test]
    fn test_ab_history_round_trip_and_truncation() {
        let store = EvaluationStore::in_memory().unwrap();
        let side = |key: TeamKey| AbSide {
            config: default_team_config(key),
            result: "x".repeat(3000),
            score: Some(88.0),
            time: 2.0,
            success: true,
        };
        let outcome = AbTestOutcome {
            test_id: "t1".to_string(),
            task: "y".repeat(600),
            team_a: side(TeamKey::Coder),
            team_b: side(TeamKey::Auditor),
            winner: Winner::Draw,
        };
        store.insert_ab_test(&outcome).unwrap();

        let history = store.ab_test_history(10).unwrap();
        assert_eq!(history.len(), 1);
        let rec = &history[0];
        assert_eq!(rec.winner, Winner::Draw);
        assert_eq!(rec.task.chars().count(), 500);
        assert_eq!(rec.team_a.score, Some(88.0));
        assert_eq!(
            rec.team_b.config.as_ref().unwrap().team_key,
            TeamKey::Auditor
        );
    }
}
