//! Prompt-call boundary.
//!
//! The pipeline and evaluators never talk to a provider SDK directly; they
//! go through the [`PromptClient`] trait, which takes a registry model and a
//! list of role-tagged messages and returns generated text. The concrete
//! HTTP implementation lives in [`http`]; tests substitute scripted clients.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ModelId;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged message sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single prompt call.
///
/// Whether this is fatal depends on the stage: creator and leader failures
/// abort a pipeline run, checker failures degrade to marker text.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The provider rejected or failed the request.
    #[error("provider error: {0}")]
    Provider(String),

    /// No API key configured for the model's provider.
    #[error("missing API key: {0} is not set")]
    MissingApiKey(&'static str),

    /// The call did not complete within the configured timeout.
    #[error("prompt call timed out after {0}s")]
    Timeout(u64),
}

// ---------------------------------------------------------------------------
// PromptClient trait
// ---------------------------------------------------------------------------

/// Opaque text-generation boundary.
///
/// Implementations must isolate their own failures into a [`PromptError`];
/// retries, if any, belong inside the implementation, not in callers.
#[async_trait]
pub trait PromptClient: Send + Sync {
    /// Generate text from the given model and messages.
    async fn invoke(&self, model: ModelId, messages: &[Message]) -> Result<String, PromptError>;
}
