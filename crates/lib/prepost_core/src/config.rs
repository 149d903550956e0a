//! Environment-driven settings.

use std::env;
use std::str::FromStr;

use crate::documents::DocumentPaths;

pub const DEFAULT_PRE_XML: &str = "pre.xml";
pub const DEFAULT_POST_XML: &str = "post.xml";
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_SNIPPETS: usize = 8;
pub const DEFAULT_MAX_CHARS_PER_SNIPPET: usize = 1600;
pub const DEFAULT_MAX_FULL_CONTEXT_CHARS: usize = 1_500_000;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the chat model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.into(),
            api_key: String::new(),
            model: DEFAULT_LLM_MODEL.into(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

/// Retrieval and context limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalSettings {
    /// Chunks placed in the prompt per question.
    pub max_snippets: usize,
    /// Target chunk size in characters.
    pub max_chars_per_snippet: usize,
    /// Per-document cap when sending whole files.
    pub max_full_context_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_snippets: DEFAULT_MAX_SNIPPETS,
            max_chars_per_snippet: DEFAULT_MAX_CHARS_PER_SNIPPET,
            max_full_context_chars: DEFAULT_MAX_FULL_CONTEXT_CHARS,
        }
    }
}

/// Everything the service needs to answer questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub documents: DocumentPaths,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            documents: DocumentPaths::new(DEFAULT_PRE_XML, DEFAULT_POST_XML),
            llm: LlmSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl Settings {
    /// Reads settings from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                      |
    /// |--------------------------|------------------------------|
    /// | `PREPOST_PRE_XML`        | `pre.xml`                    |
    /// | `PREPOST_POST_XML`       | `post.xml`                   |
    /// | `LLM_BASE_URL`           | `http://localhost:11434/v1`  |
    /// | `LLM_API_KEY`            | empty                        |
    /// | `LLM_MODEL`              | `gpt-4o-mini`                |
    /// | `LLM_TIMEOUT_SECS`       | `30`                         |
    /// | `MAX_SNIPPETS`           | `8`                          |
    /// | `MAX_CHARS_PER_SNIPPET`  | `1600`                       |
    /// | `MAX_FULL_CONTEXT_CHARS` | `1500000`                    |
    ///
    /// Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Self {
            documents: DocumentPaths::new(
                text("PREPOST_PRE_XML", DEFAULT_PRE_XML),
                text("PREPOST_POST_XML", DEFAULT_POST_XML),
            ),
            llm: LlmSettings {
                base_url: text("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
                api_key: text("LLM_API_KEY", ""),
                model: text("LLM_MODEL", DEFAULT_LLM_MODEL),
                timeout_secs: parsed(&lookup, "LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS),
            },
            retrieval: RetrievalSettings {
                max_snippets: parsed(&lookup, "MAX_SNIPPETS", DEFAULT_MAX_SNIPPETS),
                max_chars_per_snippet: parsed(
                    &lookup,
                    "MAX_CHARS_PER_SNIPPET",
                    DEFAULT_MAX_CHARS_PER_SNIPPET,
                ),
                max_full_context_chars: parsed(
                    &lookup,
                    "MAX_FULL_CONTEXT_CHARS",
                    DEFAULT_MAX_FULL_CONTEXT_CHARS,
                ),
            },
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
        None => default,
    }
}
