//! JSON shapes exchanged between the chat widget and the API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
    /// Send both documents in full instead of retrieved snippets.
    #[serde(default)]
    pub full: bool,
}

impl ChatRequest {
    /// Lenient reading of a decoded request body.
    ///
    /// A missing or non-string `query` reads as empty. `full` is on when its
    /// value is truthy, so `1` and `"yes"` count and `0`, `""` and `null` do not.
    pub fn from_json(body: &Value) -> Self {
        Self {
            query: body
                .get("query")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            full: body.get("full").is_some_and(is_truthy),
        }
    }
}

/// JavaScript-style truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reply of `POST /api/chat`, for both answered and degraded requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Ids of the retrieved chunks (`pre:0`, `post:3`, ...).
    #[serde(default)]
    pub snippets: Vec<String>,
    /// Whether a computed comparison section leads the answer.
    #[serde(default)]
    pub structured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
