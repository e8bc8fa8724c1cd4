//! Troika: leader/creator/checker team orchestration and comparative team
//! evaluation for LLM agents.
//!
//! A task runs through a three-role pipeline (a creator drafts, a checker
//! critiques, a leader decides) and exactly one arbiter (the leader)
//! produces the final result; checker evaluations are recorded verbatim as
//! advisory annotations. Execution outcomes accumulate in an append-only
//! store, and three evaluation methodologies read them back:
//!
//! - historical statistics over real executions ([`evaluation::history`]),
//! - a fixed synthetic benchmark suite ([`evaluation::benchmark`]),
//! - paired A/B races between two configurations ([`evaluation::ab_test`]),
//!
//! composed behind [`EvaluationManager`] into per-team rankings and a
//! recommendation for "which team should take this kind of task".
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use troika::{ConfigStore, EvaluationManager, TeamKey, TeamPipeline};
//! use troika::evaluation::history::ExecutionInput;
//! use troika::evaluation::store::EvaluationStore;
//! use troika::llm::http::HttpPromptClient;
//!
//! # async fn demo() -> Result<(), troika::TeamError> {
//! let configs = ConfigStore::new();
//! let client = Arc::new(HttpPromptClient::from_env());
//! let store = Arc::new(EvaluationStore::open("team_evaluations.db")?);
//! let manager = EvaluationManager::new(store);
//!
//! let config = configs.get(TeamKey::Coder);
//! let pipeline = TeamPipeline::new(config.clone(), client);
//! let output = pipeline.run("Write a CSV parser", "").await?;
//!
//! manager.record_execution(ExecutionInput::new(
//!     TeamKey::Coder,
//!     config,
//!     "coder",
//!     "Write a CSV parser",
//! ))?;
//! println!("{}", output.final_result);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod evaluation;
pub mod llm;
pub mod team;
pub mod utilities;

pub use config::{ConfigStore, ModelId, Provider, TeamConfig, TeamKey, TeamRole};
pub use evaluation::manager::EvaluationManager;
pub use llm::{Message, PromptClient, PromptError, Role};
pub use team::{resolve, CheckerScore, TeamInfo, TeamPipeline, TeamRunOutput};
pub use utilities::errors::TeamError;
pub use utilities::score::parse_score;
