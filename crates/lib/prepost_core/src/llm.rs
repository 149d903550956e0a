//! Chat model access.
//!
//! [`ChatModel`] is the seam the API depends on; [`OpenAiCompatClient`] is
//! the production implementation and talks to any OpenAI-compatible
//! `/chat/completions` endpoint, including gateways that expect the key in an
//! `api-key` or `Ocp-Apim-Subscription-Key` header rather than as a bearer
//! token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::LlmSettings;

/// Errors that can occur while calling the model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model request failed: {0}")]
    Transport(String),

    #[error("Model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model response parse error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

/// Anything that can answer a list of messages with text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    max_tokens: u32,
}

/// Client for OpenAI-compatible chat completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    completions_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            completions_url: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String, LlmError> {
        tracing::debug!(
            url = %self.completions_url,
            model = %self.model,
            messages = messages.len(),
            "sending chat completion"
        );
        let resp = self
            .client
            .post(&self.completions_url)
            .header("api-key", &self.api_key)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&CompletionRequest {
                model: &self.model,
                messages,
                temperature: options.temperature,
                max_tokens: options.max_tokens,
            })
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(extract_content(&data))
    }
}

/// `choices[0].message.content`, trimmed; the whole body when that is missing.
fn extract_content(data: &Value) -> String {
    match data.pointer("/choices/0/message/content").and_then(Value::as_str) {
        Some(content) => content.trim().to_string(),
        None => {
            tracing::warn!("completion response has no message content");
            data.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::json;

    use super::*;

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}/v1/")
    }

    fn settings(base_url: String) -> LlmSettings {
        LlmSettings {
            base_url,
            api_key: "secret".into(),
            model: "test-model".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn content_is_extracted_and_trimmed() {
        let data = json!({"choices": [{"message": {"content": "  Pci: 101 \n"}}]});
        assert_eq!(extract_content(&data), "Pci: 101");
    }

    #[test]
    fn missing_content_falls_back_to_body() {
        let data = json!({"unexpected": true});
        assert_eq!(extract_content(&data), r#"{"unexpected":true}"#);
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(Message::system("hi")).unwrap();
        assert_eq!(json, json!({"role": "system", "content": "hi"}));
    }

    #[tokio::test]
    async fn chat_posts_payload_with_gateway_headers() {
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["api-key"], "secret");
                assert_eq!(headers["ocp-apim-subscription-key"], "secret");
                assert_eq!(headers["authorization"], "Bearer secret");
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["max_tokens"], 900);
                assert_eq!(body["messages"][1]["role"], "user");
                Json(json!({"choices": [{"message": {"content": " ok "}}]}))
            }),
        );
        let client = OpenAiCompatClient::new(&settings(serve(app).await)).unwrap();
        assert!(client.completions_url().ends_with("/v1/chat/completions"));

        let messages = [Message::system("s"), Message::user("u")];
        let options = ChatOptions {
            temperature: 0.1,
            max_tokens: 900,
        };
        assert_eq!(client.chat(&messages, options).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = OpenAiCompatClient::new(&settings(serve(app).await)).unwrap();
        let err = client
            .chat(&[Message::user("u")], ChatOptions::default())
            .await
            .unwrap_err();
        match err {
            LlmError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = OpenAiCompatClient::new(&settings(format!("http://{addr}"))).unwrap();
        let err = client
            .chat(&[Message::user("u")], ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }
}
