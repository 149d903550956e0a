//! # prepost_core
//!
//! Core domain logic for Prepost: answer formatting, XML comparison,
//! retrieval over the `pre`/`post` snapshots and chat model access.

pub mod compare;
pub mod config;
pub mod documents;
pub mod format;
pub mod llm;
pub mod prompt;
pub mod protocol;
pub mod rag;
pub mod widget;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
