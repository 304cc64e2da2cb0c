//! Generative Fallback Boundary
//!
//! When no confident local match exists, the engine hands the query to an
//! external generative model. This module owns the boundary only: the
//! request/response types, the provider trait, and the static apology text
//! every fallback failure resolves to. Errors from the boundary are caught
//! by the engine and converted to the apology, never propagated raw to the
//! user.

mod openai;

pub use openai::OpenAiChat;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Generative provider error types.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum FallbackError {
    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("fallback transport failed: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("fallback provider returned {status}: {body}")]
    Api { status: u16, body: String },
    /// The response body did not contain generated text.
    #[error("malformed fallback response: {0}")]
    Malformed(String),
}

// ============================================================================
// CHAT TYPES
// ============================================================================

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of conversation. The session layer owns the history; the core
/// only reads a slice of it as optional fallback-prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A fully-constructed generative request.
#[derive(Debug, Clone)]
pub struct FallbackRequest {
    /// System instruction text.
    pub system: String,
    /// Ordered role-tagged messages, ending with the user's query.
    pub messages: Vec<ChatTurn>,
    /// Model identifier.
    pub model: String,
    /// Optional cap on generated length.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: f32,
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// An external generative model. Implementations perform the network call;
/// the engine decides when to call and with what context.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Generate a reply for the request.
    async fn generate(&self, request: &FallbackRequest) -> Result<String, FallbackError>;
}

// ============================================================================
// STATIC TEXTS
// ============================================================================

/// Shown when the fallback itself fails. The pipeline never terminates a
/// session on a single request's failure; it degrades to this.
pub const APOLOGY_REPLY: &str = "Sorry, I couldn't reach the server. Try again later.";

/// System instruction supplied with every fallback request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant specialized in Crescent \
    University information. If you don't know an answer, politely say so and refer to \
    university resources.";
