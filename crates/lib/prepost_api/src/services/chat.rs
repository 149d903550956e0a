//! Chat service: grounds a question in the snapshots and asks the model.
//!
//! Model failures are not errors here: the caller still gets a
//! [`ChatResponse`], with a fallback answer and `502 Bad Gateway`.

use axum::http::StatusCode;

use prepost_core::compare::{compare, render_html};
use prepost_core::format::escape_html;
use prepost_core::llm::ChatOptions;
use prepost_core::prompt::{NO_SNIPPETS, build_messages, full_context, wants_comparison};
use prepost_core::protocol::{ChatRequest, ChatResponse};
use prepost_core::rag::Retriever;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Answer shown when the model cannot be reached.
pub const FALLBACK_MESSAGE: &str = concat!(
    "Could not reach the language model service right now. ",
    "Network/DNS or gateway access may be unavailable. ",
    "Here are the most relevant XML snippets for your query; please try again later."
);

/// Sampling used for grounded answers.
pub const ANSWER_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.1,
    max_tokens: 900,
};

/// Answer one chat request.
pub async fn answer(state: &AppState, request: ChatRequest) -> AppResult<(StatusCode, ChatResponse)> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query is required".into()));
    }
    let settings = &state.config.settings;
    let max_chars = settings.retrieval.max_full_context_chars;

    // Documents are read lazily and at most once per request.
    let (context, snippet_ids, docs) = if request.full {
        let pair = settings.documents.read_truncated(max_chars).await?;
        (full_context(&pair, max_chars), Vec::new(), Some(pair))
    } else {
        let retrieved =
            Retriever::new(&state.index).retrieve(query, settings.retrieval.max_snippets);
        let context = if retrieved.is_empty() {
            NO_SNIPPETS.to_string()
        } else {
            retrieved.formatted
        };
        (context, retrieved.ids, None)
    };

    let comparison_html = if wants_comparison(query) {
        let pair = match docs {
            Some(pair) => pair,
            None => settings.documents.read_truncated(max_chars).await?,
        };
        Some(match compare(&pair.pre, &pair.post) {
            Ok(comparison) => render_html(&comparison),
            Err(e) => {
                tracing::warn!("comparison failed: {e}");
                format!("<p>Comparison error: {}</p>", escape_html(&e.to_string()))
            }
        })
    } else {
        None
    };
    let structured = comparison_html.is_some();

    let messages = build_messages(&context, query);
    tracing::info!(
        full = request.full,
        snippets = snippet_ids.len(),
        structured,
        "answering chat query"
    );

    match state.model.chat(&messages, ANSWER_OPTIONS).await {
        Ok(answer) => {
            let answer = match &comparison_html {
                Some(html) => format!("{html}<hr><div>{answer}</div>"),
                None => answer,
            };
            Ok((
                StatusCode::OK,
                ChatResponse {
                    answer,
                    snippets: snippet_ids,
                    structured,
                    error: None,
                },
            ))
        }
        Err(e) => {
            tracing::warn!("model call failed: {e}");
            let answer = match &comparison_html {
                Some(html) => format!("{html}<p>{FALLBACK_MESSAGE}</p>"),
                None => FALLBACK_MESSAGE.to_string(),
            };
            Ok((
                StatusCode::BAD_GATEWAY,
                ChatResponse {
                    answer,
                    snippets: snippet_ids,
                    structured,
                    error: Some(e.to_string()),
                },
            ))
        }
    }
}
