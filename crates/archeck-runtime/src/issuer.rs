//! Request issuer: one guarded model call per run.
//!
//! The issuer turns an [`InvocationConfig`] into a single Converse request,
//! sends it once, and hands back the parsed [`Response`] together with the
//! raw document. There is no retry; any failure goes straight to the caller.

use std::sync::Arc;

use archeck_core::Response;
use serde_json::Value as JsonValue;

use crate::config::InvocationConfig;
use crate::providers::{
    ChatMessage, ConverseRequest, GuardedModel, GuardrailRef, ServiceError, TraceMode,
};
use crate::RuntimeError;

/// Result of one guarded call.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Parsed response
    pub response: Response,

    /// Response document exactly as received
    pub document: JsonValue,
}

/// Issues guarded chat requests through a [`GuardedModel`].
pub struct RequestIssuer {
    model: Arc<dyn GuardedModel>,
}

impl RequestIssuer {
    pub fn new(model: Arc<dyn GuardedModel>) -> Self {
        Self { model }
    }

    /// Build the request for a config: one user message, trace enabled.
    pub fn build_request(config: &InvocationConfig) -> ConverseRequest {
        ConverseRequest {
            model_id: config.model_id.clone(),
            messages: vec![ChatMessage::user(config.prompt.clone())],
            guardrail_config: GuardrailRef {
                identifier: config.guardrail_id.clone(),
                version: config.guardrail_version.clone(),
                trace: TraceMode::Enabled,
            },
        }
    }

    /// Validate the config, send the request once and parse the response.
    pub async fn issue(&self, config: &InvocationConfig) -> Result<Invocation, RuntimeError> {
        config.validate()?;
        let timeout = config.timeout()?;
        let request = Self::build_request(config);

        tracing::info!(
            backend = self.model.name(),
            model_id = %config.model_id,
            guardrail_id = %config.guardrail_id,
            guardrail_version = %config.guardrail_version,
            region = %config.region,
            "Invoking model with guardrail"
        );

        let document = self.model.converse(&request, timeout).await?;

        let response = Response::from_value(document.clone())
            .map_err(|e| ServiceError::ParseError(e.to_string()))?;

        tracing::info!(
            stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
            latency_ms = response.latency_ms,
            has_trace = response.trace.is_some(),
            "Response received"
        );

        if response.guardrail_intervened() {
            tracing::warn!(
                guardrail_id = %config.guardrail_id,
                "Guardrail intervened; model output was replaced"
            );
        }

        Ok(Invocation { response, document })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mock backend for testing
    struct MockModel {
        reply: Result<JsonValue, u16>,
        seen: Mutex<Vec<(ConverseRequest, Duration)>>,
    }

    impl MockModel {
        fn replying(reply: JsonValue) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(ConverseRequest, Duration)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GuardedModel for MockModel {
        async fn converse(
            &self,
            request: &ConverseRequest,
            timeout: Duration,
        ) -> Result<JsonValue, ServiceError> {
            self.seen.lock().unwrap().push((request.clone(), timeout));
            match &self.reply {
                Ok(doc) => Ok(doc.clone()),
                Err(status) => Err(ServiceError::ApiError {
                    status: *status,
                    message: "mock failure".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn config() -> InvocationConfig {
        let mut config = InvocationConfig::new("7qodk4ucyidf");
        config.prompt = "How many vacation days?".to_string();
        config.timeout = "5s".to_string();
        config
    }

    #[test]
    fn test_build_request_enables_trace() {
        let request = RequestIssuer::build_request(&config());
        assert_eq!(request.model_id, "anthropic.claude-3-sonnet-20240229-v1:0");
        assert_eq!(request.messages, vec![ChatMessage::user("How many vacation days?")]);
        assert_eq!(request.guardrail_config.identifier, "7qodk4ucyidf");
        assert_eq!(request.guardrail_config.version, "DRAFT");
        assert_eq!(request.guardrail_config.trace, TraceMode::Enabled);
    }

    #[tokio::test]
    async fn test_issue_makes_exactly_one_call() {
        let model = MockModel::replying(json!({
            "output": { "message": { "role": "assistant", "content": [{ "text": "15 days." }] } },
            "stopReason": "end_turn",
            "trace": { "guardrail": {} }
        }));
        let issuer = RequestIssuer::new(model.clone());

        let invocation = issuer.issue(&config()).await.unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Duration::from_secs(5));
        assert_eq!(invocation.response.output.as_deref(), Some("15 days."));
        assert!(invocation.response.trace.is_some());
        assert_eq!(invocation.document["stopReason"], "end_turn");
    }

    #[tokio::test]
    async fn test_guardrail_intervention_is_not_an_error() {
        let model = MockModel::replying(json!({
            "output": { "message": { "content": [{ "text": "Sorry, blocked." }] } },
            "stopReason": "guardrail_intervened"
        }));
        let issuer = RequestIssuer::new(model);

        let invocation = issuer.issue(&config()).await.unwrap();
        assert!(invocation.response.guardrail_intervened());
    }

    #[tokio::test]
    async fn test_service_error_propagates_without_retry() {
        let model = MockModel::failing(400);
        let issuer = RequestIssuer::new(model.clone());

        let result = issuer.issue(&config()).await;

        assert!(matches!(
            result,
            Err(RuntimeError::Service(ServiceError::ApiError { status: 400, .. }))
        ));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_makes_no_call() {
        let model = MockModel::replying(json!({}));
        let issuer = RequestIssuer::new(model.clone());

        let result = issuer.issue(&InvocationConfig::default()).await;

        assert!(matches!(result, Err(RuntimeError::Config(_))));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_document_is_parse_error() {
        let model = MockModel::replying(json!(["not", "a", "response"]));
        let issuer = RequestIssuer::new(model);

        let result = issuer.issue(&config()).await;
        assert!(matches!(
            result,
            Err(RuntimeError::Service(ServiceError::ParseError(_)))
        ));
    }
}
