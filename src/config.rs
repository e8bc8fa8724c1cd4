//! Model registry and team configuration.
//!
//! Every team is a fixed trio of roles (leader, creator, checker), each
//! backed by one model from a small, closed registry. Team composition is
//! looked up through an explicit [`ConfigStore`] so that callers always work
//! against a point-in-time [`TeamConfig`] snapshot: recorded results must
//! reflect the configuration actually used for a run, not whatever the
//! store holds at aggregation time.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Upstream API provider for a registry model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAI,
    Google,
    Groq,
    XAI,
    Perplexity,
}

impl Provider {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Google => "GEMINI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
            Provider::XAI => "XAI_API_KEY",
            Provider::Perplexity => "PERPLEXITY_API_KEY",
        }
    }

    /// OpenAI-compatible chat-completions base URL for this provider.
    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::XAI => "https://api.x.ai/v1",
            Provider::Perplexity => "https://api.perplexity.ai",
        }
    }
}

// ---------------------------------------------------------------------------
// Model registry
// ---------------------------------------------------------------------------

/// Key into the fixed model registry.
///
/// The registry is closed: role assignments in a [`TeamConfig`] can only
/// name one of these variants, so an invalid model id is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    Claude,
    Gpt,
    Gemini,
    Grok,
    Llama,
    Perplexity,
}

/// Registry metadata for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Upstream provider.
    pub provider: Provider,
    /// Provider-side model identifier sent on the wire.
    pub model: &'static str,
    /// Human-readable name used in team info and score attributions.
    pub display_name: &'static str,
}

impl ModelId {
    /// All registry models, in registry order.
    pub const ALL: [ModelId; 6] = [
        ModelId::Claude,
        ModelId::Gpt,
        ModelId::Gemini,
        ModelId::Grok,
        ModelId::Llama,
        ModelId::Perplexity,
    ];

    /// Registry metadata for this model.
    pub fn info(&self) -> ModelInfo {
        match self {
            ModelId::Claude => ModelInfo {
                provider: Provider::Anthropic,
                model: "claude-sonnet-4-5-20250929",
                display_name: "Claude Sonnet 4.5",
            },
            ModelId::Gpt => ModelInfo {
                provider: Provider::OpenAI,
                model: "gpt-5.2",
                display_name: "GPT-5.2",
            },
            ModelId::Gemini => ModelInfo {
                provider: Provider::Google,
                model: "gemini-3-pro-preview",
                display_name: "Gemini 3 Pro",
            },
            ModelId::Grok => ModelInfo {
                provider: Provider::XAI,
                model: "grok-4-1-thinking",
                display_name: "Grok 4.1 Thinking",
            },
            ModelId::Llama => ModelInfo {
                provider: Provider::Groq,
                model: "llama-3.3-70b-versatile",
                display_name: "Llama 3.3 70B",
            },
            ModelId::Perplexity => ModelInfo {
                provider: Provider::Perplexity,
                model: "sonar-pro",
                display_name: "Perplexity Sonar Pro",
            },
        }
    }

    /// Human-readable name for this model.
    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Team keys and roles
// ---------------------------------------------------------------------------

/// Identifies one of the fixed agent teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamKey {
    /// Implementation / code-review team.
    Coder,
    /// Audit and analysis team.
    Auditor,
    /// Data processing and consistency team.
    Data,
    /// Search and verification team.
    Searcher,
}

impl TeamKey {
    /// All team keys, in presentation order.
    pub const ALL: [TeamKey; 4] = [
        TeamKey::Coder,
        TeamKey::Auditor,
        TeamKey::Data,
        TeamKey::Searcher,
    ];

    /// Stable string form used as the persistence key.
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamKey::Coder => "coder",
            TeamKey::Auditor => "auditor",
            TeamKey::Data => "data",
            TeamKey::Searcher => "searcher",
        }
    }

    /// Parse a persistence key back into a `TeamKey`.
    pub fn parse(s: &str) -> Option<TeamKey> {
        match s {
            "coder" => Some(TeamKey::Coder),
            "auditor" => Some(TeamKey::Auditor),
            "data" => Some(TeamKey::Data),
            "searcher" => Some(TeamKey::Searcher),
            _ => None,
        }
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three pipeline roles within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Leader,
    Creator,
    Checker,
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRole::Leader => write!(f, "leader"),
            TeamRole::Creator => write!(f, "creator"),
            TeamRole::Checker => write!(f, "checker"),
        }
    }
}

// ---------------------------------------------------------------------------
// Team configuration
// ---------------------------------------------------------------------------

/// Role-to-model assignment for one team.
///
/// This type is a value, not a reference: a pipeline or evaluator clones it
/// at the start of a run and the clone travels into every persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Which team this configuration belongs to.
    pub team_key: TeamKey,
    /// Human-readable team name.
    pub name: String,
    /// Model making the final decision.
    pub leader: ModelId,
    /// Model producing the initial output.
    pub creator: ModelId,
    /// Model critiquing the creator's output.
    pub checker: ModelId,
}

impl TeamConfig {
    /// Model assigned to the given role.
    pub fn model_for(&self, role: TeamRole) -> ModelId {
        match role {
            TeamRole::Leader => self.leader,
            TeamRole::Creator => self.creator,
            TeamRole::Checker => self.checker,
        }
    }
}

/// Built-in default composition for each team.
pub fn default_team_config(key: TeamKey) -> TeamConfig {
    match key {
        TeamKey::Coder => TeamConfig {
            team_key: key,
            name: "Coding Team".to_string(),
            leader: ModelId::Claude,
            creator: ModelId::Claude,
            checker: ModelId::Gpt,
        },
        TeamKey::Auditor => TeamConfig {
            team_key: key,
            name: "Audit Team".to_string(),
            leader: ModelId::Gpt,
            creator: ModelId::Claude,
            checker: ModelId::Gemini,
        },
        TeamKey::Data => TeamConfig {
            team_key: key,
            name: "Data Team".to_string(),
            leader: ModelId::Llama,
            creator: ModelId::Llama,
            checker: ModelId::Grok,
        },
        TeamKey::Searcher => TeamConfig {
            team_key: key,
            name: "Search Team".to_string(),
            leader: ModelId::Grok,
            creator: ModelId::Perplexity,
            checker: ModelId::Llama,
        },
    }
}

// ---------------------------------------------------------------------------
// Config store
// ---------------------------------------------------------------------------

/// Explicit team-configuration store.
///
/// Overrides shadow the built-in defaults per team key. The store is passed
/// by reference into whatever needs a config; `get` hands out an owned
/// snapshot, so in-flight runs are unaffected by later `set_override` calls.
#[derive(Debug, Default)]
pub struct ConfigStore {
    overrides: RwLock<HashMap<TeamKey, TeamConfig>>,
}

impl ConfigStore {
    /// Create a store with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current configuration for a team: the override if one is set,
    /// otherwise the built-in default. Always an owned snapshot.
    pub fn get(&self, key: TeamKey) -> TeamConfig {
        self.overrides
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| default_team_config(key))
    }

    /// Replace the composition for one team.
    pub fn set_override(&self, key: TeamKey, leader: ModelId, creator: ModelId, checker: ModelId) {
        let mut config = default_team_config(key);
        config.leader = leader;
        config.creator = creator;
        config.checker = checker;
        self.overrides.write().insert(key, config);
    }

    /// Drop all overrides, reverting every team to its default.
    pub fn reset_overrides(&self) {
        self.overrides.write().clear();
    }
}
