//! # archeck-runtime
//!
//! Guarded model invocation for archeck.
//!
//! This crate sends one chat request to the Bedrock Converse API with a
//! guardrail attached and tracing enabled, and returns the response for
//! `archeck-core` to render.
//!
//! ## Important
//!
//! Rendering in `archeck-core` never makes network calls. This crate is the
//! only place a request leaves the process, and it sends exactly one per
//! run. Nothing is retried.
//!
//! ## Example
//!
//! ```rust,ignore
//! use archeck_runtime::{invoke, InvocationConfig};
//!
//! let config = InvocationConfig::new("7qodk4ucyidf");
//! let invocation = invoke(&config).await?;
//! print!("{}", archeck_core::render(&invocation.response)?);
//! ```

pub mod config;
pub mod issuer;
pub mod providers;

pub use config::{ConfigError, InvocationConfig};
pub use issuer::{Invocation, RequestIssuer};
pub use providers::{
    ApiCredential, ChatMessage, ConverseRequest, GuardedModel, GuardrailRef, ServiceError,
    TraceMode,
};

#[cfg(feature = "bedrock")]
pub use providers::BedrockProvider;

use thiserror::Error;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Service call failed: {0}")]
    Service(#[from] ServiceError),
}

/// Invoke the configured model once through Bedrock.
#[cfg(feature = "bedrock")]
pub async fn invoke(config: &InvocationConfig) -> Result<Invocation, RuntimeError> {
    config.validate()?;
    let provider = BedrockProvider::from_config(config)?;
    RequestIssuer::new(std::sync::Arc::new(provider))
        .issue(config)
        .await
}
