//! Chat widget client. Submits a question and renders the reply.
//!
//! One widget covers both the snippet-retrieval and the full-context modes;
//! the mode is a builder flag sent as `full` with every request.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::format::format_answer;
use crate::protocol::{ChatRequest, is_truthy};

/// Shown in place of an answer when the exchange fails.
pub const ERROR_MESSAGE: &str = "Error contacting server.";

#[derive(Debug, Error)]
enum WidgetError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Submits questions to a chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatWidget {
    client: Client,
    endpoint: String,
    full_context: bool,
}

/// Builder for [`ChatWidget`].
#[derive(Debug, Clone)]
pub struct ChatWidgetBuilder {
    client: Option<Client>,
    endpoint: String,
    full_context: bool,
}

impl ChatWidgetBuilder {
    /// Ask the server to use the full documents rather than snippets.
    pub fn full_context(mut self, full_context: bool) -> Self {
        self.full_context = full_context;
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> ChatWidget {
        ChatWidget {
            client: self.client.unwrap_or_default(),
            endpoint: self.endpoint,
            full_context: self.full_context,
        }
    }
}

impl ChatWidget {
    pub fn builder(endpoint: impl Into<String>) -> ChatWidgetBuilder {
        ChatWidgetBuilder {
            client: None,
            endpoint: endpoint.into(),
            full_context: false,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn full_context(&self) -> bool {
        self.full_context
    }

    /// Submit `query` and return the markup to display.
    ///
    /// Returns `None` for a blank query, which is not sent. Any failure to
    /// reach the server or decode its reply renders [`ERROR_MESSAGE`].
    pub async fn submit(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let rendered = match self.exchange(query).await {
            Ok(body) => format_answer(&display_value(body)),
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, "chat request failed: {e}");
                ERROR_MESSAGE.to_string()
            }
        };
        Some(rendered)
    }

    async fn exchange(&self, query: &str) -> Result<Value, WidgetError> {
        let request = ChatRequest {
            query: query.to_string(),
            full: self.full_context,
        };
        // Error statuses still carry a JSON body with a fallback answer.
        let bytes = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// The `answer` field when it is truthy, else the whole body as JSON text.
fn display_value(body: Value) -> Value {
    match body.get("answer") {
        Some(answer) if is_truthy(answer) => answer.clone(),
        _ => Value::String(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::json;

    use super::*;

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}/api/chat")
    }

    #[test]
    fn truthiness_follows_answer_field() {
        assert_eq!(display_value(json!({"answer": "hi"})), json!("hi"));
        assert_eq!(display_value(json!({"answer": 7})), json!(7));
        assert_eq!(
            display_value(json!({"answer": "", "error": "x"})),
            json!(r#"{"answer":"","error":"x"}"#)
        );
        assert_eq!(
            display_value(json!({"error": "query is required"})),
            json!(r#"{"error":"query is required"}"#)
        );
    }

    #[tokio::test]
    async fn blank_query_is_not_sent() {
        let widget = ChatWidget::builder("http://127.0.0.1:9/api/chat").build();
        assert_eq!(widget.submit("   ").await, None);
    }

    #[tokio::test]
    async fn submit_sends_mode_and_formats_answer() {
        let app = axum::Router::new().route(
            "/api/chat",
            post(|Json(req): Json<ChatRequest>| async move {
                Json(json!({"answer": format!("Query: {}\nFull: {}", req.query, req.full)}))
            }),
        );
        let widget = ChatWidget::builder(serve(app).await)
            .full_context(true)
            .build();
        assert!(widget.full_context());

        let html = widget.submit("  pci of cell 1 ").await.unwrap();
        assert_eq!(
            html,
            concat!(
                r#"<div class="structured">"#,
                r#"<div class="kv"><strong>Query:</strong> pci of cell 1</div>"#,
                r#"<div class="kv"><strong>Full:</strong> true</div>"#,
                "</div>"
            )
        );
    }

    #[tokio::test]
    async fn error_status_body_is_still_rendered() {
        let app = axum::Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"answer": "<p>service unavailable</p>", "error": "down"})),
                )
            }),
        );
        let widget = ChatWidget::builder(serve(app).await).build();
        assert_eq!(
            widget.submit("q").await.unwrap(),
            "<p>service unavailable</p>"
        );
    }

    #[tokio::test]
    async fn undecodable_body_renders_error_message() {
        let app = axum::Router::new().route("/api/chat", post(|| async { "not json" }));
        let widget = ChatWidget::builder(serve(app).await).build();
        assert_eq!(widget.submit("q").await.unwrap(), ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn unreachable_server_renders_error_message() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let widget = ChatWidget::builder(format!("http://{addr}/api/chat")).build();
        assert_eq!(widget.submit("q").await.unwrap(), ERROR_MESSAGE);
    }
}
