//! Bedrock Converse provider implementation.
//!
//! Calls `POST {endpoint}/model/{modelId}/converse` with a guardrail
//! reference attached and returns the raw response document.
//!
//! ## Security
//!
//! Authentication uses a Bedrock API key sent as a bearer token. The key is
//! held in an [`ApiCredential`]; see the [`secrets`](super::secrets) module.

use super::{
    secrets::{ApiCredential, CredentialSource},
    ConverseRequest, GuardedModel, ServiceError,
};
use crate::config::{regional_endpoint, InvocationConfig};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

const CREDENTIAL_NAME: &str = "Bedrock API key";

/// Bedrock runtime provider.
///
/// # Security
///
/// The API key is stored using [`ApiCredential`] which:
/// - Cannot be accidentally printed via `Debug` or `Display`
/// - Is zeroed on drop
/// - Must be explicitly exposed via `.expose()` when needed
pub struct BedrockProvider {
    credential: ApiCredential,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for BedrockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockProvider")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl BedrockProvider {
    /// Create a new provider for a region.
    ///
    /// # Arguments
    /// * `api_key` - Bedrock API key (will be stored securely)
    /// * `region` - AWS region of the runtime endpoint
    pub fn new(api_key: impl Into<String>, region: &str) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                CREDENTIAL_NAME,
            ),
            endpoint: regional_endpoint(region),
            client: reqwest::Client::new(),
        }
    }

    /// Create from an invocation config.
    ///
    /// The key is read from the variable named by `api_key_env`; the
    /// endpoint follows the config's override or region.
    pub fn from_config(config: &InvocationConfig) -> Result<Self, ServiceError> {
        let credential = ApiCredential::from_env(&config.api_key_env, CREDENTIAL_NAME)?;
        Ok(Self {
            credential,
            endpoint: config.endpoint_url(),
            client: reqwest::Client::new(),
        })
    }

    /// Set custom endpoint.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Base URL of the runtime endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Converse URL for a model. The model ID is encoded as one path segment
    /// so ARNs containing `/` stay intact.
    fn converse_url(&self, model_id: &str) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            ServiceError::NotConfigured(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::NotConfigured(format!(
                    "endpoint '{}' cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .push("model")
            .push(model_id)
            .push("converse");

        Ok(url)
    }
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct BedrockError {
    #[serde(alias = "Message")]
    message: String,
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<BedrockError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[async_trait]
impl GuardedModel for BedrockProvider {
    async fn converse(
        &self,
        request: &ConverseRequest,
        timeout: Duration,
    ) -> Result<JsonValue, ServiceError> {
        let url = self.converse_url(&request.model_id)?;

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(url)
            .bearer_auth(self.credential.expose())
            .header("accept", "application/json")
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout(timeout)
                } else {
                    ServiceError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ServiceError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ServiceError::AuthError(message));
            }

            return Err(ServiceError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}
