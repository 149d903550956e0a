//! API server configuration.

use prepost_core::config::Settings;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// Documents, model endpoint and retrieval limits.
    pub settings: Settings,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// `BIND_ADDR` defaults to `127.0.0.1:8000`; the remaining variables are
    /// documented on [`Settings::from_env`].
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
            settings: Settings::from_env(),
        }
    }
}
