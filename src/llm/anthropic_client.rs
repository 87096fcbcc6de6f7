//! Anthropic Messages API client with retry and backoff

use super::anthropic_config::AnthropicConfig;
use super::models::*;
use super::{CollaboratorError, OutputSchema, TextGenerator};
use crate::metrics::METRICS;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Anthropic client implementing [`TextGenerator`]
pub struct AnthropicClient {
    http: Client,
    config: AnthropicConfig,
    api_key: SecretString,
}

impl AnthropicClient {
    /// Create a new client. Fails if no API key is configured.
    pub fn new(config: AnthropicConfig) -> Result<Self, CollaboratorError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            CollaboratorError::Initialization(
                "ANTHROPIC_API_KEY environment variable is required".to_string(),
            )
        })?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CollaboratorError::Initialization(e.to_string()))?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str, max_output_tokens: u32) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: max_output_tokens,
            messages: vec![Message::user(prompt)],
            temperature: self.config.temperature,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    /// Send a request, retrying transient failures with exponential backoff
    async fn send(
        &self,
        request: &MessagesRequest,
        operation: &'static str,
    ) -> Result<MessagesResponse, CollaboratorError> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.call_messages_api(request).await {
                Ok(response) => {
                    debug!(
                        "{} succeeded on attempt {} (input_tokens={}, output_tokens={})",
                        operation, attempt, response.usage.input_tokens, response.usage.output_tokens
                    );
                    METRICS.record_llm_request(operation, "success", start.elapsed());
                    return Ok(response);
                }
                Err(e) => {
                    if !e.is_retryable() || attempt > self.config.max_retries {
                        error!("{} failed after {} attempts: {}", operation, attempt, e);
                        METRICS.record_llm_request(operation, e.kind(), start.elapsed());
                        return Err(e);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "{} attempt {} failed: {}, retrying in {:?}",
                        operation, attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Call the Messages API once
    async fn call_messages_api(
        &self,
        request: &MessagesRequest,
    ) -> Result<MessagesResponse, CollaboratorError> {
        let response = self
            .http
            .post(self.config.messages_url())
            .header("x-api-key", self.api_key.expose_secret().as_str())
            .header("anthropic-version", self.config.api_version.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(e.to_string())
                } else {
                    CollaboratorError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| format!("{}: {}", e.error.kind, e.error.message))
                .unwrap_or(body);

            return Err(if status.as_u16() == 429 {
                CollaboratorError::RateLimited(message)
            } else {
                CollaboratorError::Api {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))
    }

    /// Exponential backoff with up to 25% jitter
    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(6) as u32;
        let base = self.config.retry_backoff_ms.saturating_mul(1u64 << exponent);
        let jitter = rand::thread_rng().gen_range(0..=base / 4);
        Duration::from_millis(base + jitter)
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String, CollaboratorError> {
        let request = self.build_request(prompt, max_output_tokens);
        let response = self.send(&request, "generate").await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| {
                CollaboratorError::MalformedResponse("no text content block in response".to_string())
            })
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
        max_output_tokens: u32,
    ) -> Result<serde_json::Value, CollaboratorError> {
        let mut request = self.build_request(prompt, max_output_tokens);
        request.tools = vec![ToolDefinition {
            name: schema.name.clone(),
            description: schema.description.clone(),
            input_schema: schema.schema.clone(),
        }];
        request.tool_choice = Some(ToolChoice::tool(schema.name.clone()));

        let response = self.send(&request, "generate_structured").await?;

        response.tool_input(&schema.name).cloned().ok_or_else(|| {
            CollaboratorError::MalformedResponse(format!(
                "no `{}` tool call in response",
                schema.name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config(base_url: String) -> AnthropicConfig {
        AnthropicConfig {
            base_url,
            api_key: Some(SecretString::new("test-key".to_string())),
            retry_backoff_ms: 1,
            ..Default::default()
        }
    }

    fn text_body(text: &str) -> String {
        json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })
        .to_string()
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = AnthropicClient::new(AnthropicConfig::default());
        assert!(matches!(result, Err(CollaboratorError::Initialization(_))));
    }

    #[test]
    fn test_backoff_grows() {
        let client = AnthropicClient::new(AnthropicConfig {
            api_key: Some(SecretString::new("k".to_string())),
            retry_backoff_ms: 100,
            ..Default::default()
        })
        .unwrap();

        let first = client.calculate_backoff(1);
        let second = client.calculate_backoff(2);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", "2023-06-01")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(text_body("  - Buy milk\n"))
            .expect(1)
            .create_async()
            .await;

        let client = AnthropicClient::new(test_config(server.url())).unwrap();
        let text = client.generate("Summarize: Buy milk.", 256).await.unwrap();

        assert_eq!(text, "- Buy milk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body(r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens too large"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = AnthropicClient::new(test_config(server.url())).unwrap();
        let err = client.generate("prompt", 256).await.unwrap_err();

        match err {
            CollaboratorError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("max_tokens too large"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
            .expect(3)
            .create_async()
            .await;

        let client = AnthropicClient::new(test_config(server.url())).unwrap();
        let err = client.generate("prompt", 256).await.unwrap_err();

        assert!(matches!(err, CollaboratorError::Api { status: 529, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_body(r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#)
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.max_retries = 0;
        let client = AnthropicClient::new(config).unwrap();
        let err = client.generate("prompt", 256).await.unwrap_err();

        assert!(matches!(err, CollaboratorError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_missing_text_block_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(json!({"content": [], "stop_reason": "end_turn"}).to_string())
            .create_async()
            .await;

        let client = AnthropicClient::new(test_config(server.url())).unwrap();
        let err = client.generate("prompt", 256).await.unwrap_err();

        assert!(matches!(err, CollaboratorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_structured_forces_tool() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(mockito::Matcher::PartialJson(json!({
                "tool_choice": {"type": "tool", "name": "record_classification"}
            })))
            .with_status(200)
            .with_body(
                json!({
                    "content": [{
                        "type": "tool_use",
                        "id": "toolu_1",
                        "name": "record_classification",
                        "input": {"category": "todo", "confidence": 0.9, "reasoning": "A task"}
                    }],
                    "stop_reason": "tool_use"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = AnthropicClient::new(test_config(server.url())).unwrap();
        let schema = OutputSchema {
            name: "record_classification".to_string(),
            description: "Record the memo category".to_string(),
            schema: json!({"type": "object"}),
        };
        let value = client.generate_structured("classify", &schema, 512).await.unwrap();

        assert_eq!(value["category"], "todo");
        mock.assert_async().await;
    }
}
