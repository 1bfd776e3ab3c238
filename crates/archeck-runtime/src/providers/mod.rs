//! Guarded model abstractions for archeck-runtime.
//!
//! This module defines the trait for guarded chat backends and the request
//! types they accept. The request types serialize directly into the
//! Converse wire format.
//!
//! ## Security
//!
//! Providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "bedrock")]
mod bedrock;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "bedrock")]
pub use bedrock::BedrockProvider;

/// Errors from the inference service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Service not configured: {0}")]
    NotConfigured(String),
}

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A block of message content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    Text(String),
}

/// A chat message: a role and ordered content blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    /// Create a user message with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }
}

/// Trace setting sent with the guardrail. Only enabled traces are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    Enabled,
}

/// Reference to the guardrail applied to the call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardrailRef {
    #[serde(rename = "guardrailIdentifier")]
    pub identifier: String,

    #[serde(rename = "guardrailVersion")]
    pub version: String,

    pub trace: TraceMode,
}

/// One guarded chat request.
///
/// `model_id` travels in the URL, not the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(skip)]
    pub model_id: String,

    pub messages: Vec<ChatMessage>,

    pub guardrail_config: GuardrailRef,
}

/// Backend abstraction for guarded chat calls.
///
/// # Contract
/// One call to `converse` is exactly one outbound request. Implementations
/// never retry; failures are returned to the caller as-is.
#[async_trait]
pub trait GuardedModel: Send + Sync {
    /// Execute a guarded chat call and return the raw response document.
    async fn converse(
        &self,
        request: &ConverseRequest,
        timeout: Duration,
    ) -> Result<JsonValue, ServiceError>;

    /// Get backend name for logging.
    fn name(&self) -> &str;
}
