//! # prepost_api
//!
//! HTTP API library for Prepost.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use prepost_core::llm::ChatModel;
use prepost_core::rag::Index;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{chat, health};

/// Route paths served by [`router`].
pub mod routes {
    pub const POST_API_CHAT: &str = "/api/chat";
    pub const GET_API_HEALTH: &str = "/api/health";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Retrieval index over both snapshots, built at start-up.
    pub index: Arc<Index>,
    /// Chat model used to answer questions.
    pub model: Arc<dyn ChatModel>,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::POST_API_CHAT, post(chat::chat_handler))
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .layer(cors)
        .with_state(state)
}
