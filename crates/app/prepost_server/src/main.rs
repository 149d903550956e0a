//! Prepost API server binary.
//!
//! Indexes the `pre` and `post` snapshots once, then serves the chat API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use prepost_api::config::{ApiConfig, DEFAULT_BIND_ADDR};
use prepost_core::config::Settings;
use prepost_core::documents::DocumentPaths;
use prepost_core::llm::OpenAiCompatClient;
use prepost_core::rag::Index;
use tracing::info;

/// CLI arguments for the API server. Unset values fall back to the
/// environment (see `Settings::from_env`).
#[derive(Parser, Debug)]
#[command(name = "prepost_server", about = "Prepost chat API server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Path of the snapshot taken before the change.
    #[arg(long)]
    pre: Option<PathBuf>,

    /// Path of the snapshot taken after the change.
    #[arg(long)]
    post: Option<PathBuf>,

    /// Chat model name.
    #[arg(long)]
    model: Option<String>,

    /// Number of retrieved chunks placed in each prompt.
    #[arg(long)]
    max_snippets: Option<usize>,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_env();
        if self.pre.is_some() || self.post.is_some() {
            settings.documents = DocumentPaths::new(
                self.pre.clone().unwrap_or(settings.documents.pre),
                self.post.clone().unwrap_or(settings.documents.post),
            );
        }
        if let Some(model) = &self.model {
            settings.llm.model = model.clone();
        }
        if let Some(k) = self.max_snippets {
            settings.retrieval.max_snippets = k;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,prepost_api=debug,prepost_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    let settings = args.settings();

    info!(
        pre = %settings.documents.pre.display(),
        post = %settings.documents.post.display(),
        model = %settings.llm.model,
        "starting prepost_server"
    );

    let index = Index::from_files(&settings.documents, settings.retrieval.max_chars_per_snippet).await?;
    let model = OpenAiCompatClient::new(&settings.llm)?;
    info!(url = model.completions_url(), "using chat model endpoint");

    let config = ApiConfig {
        bind_addr: args.bind,
        settings,
    };
    let state = prepost_api::AppState {
        config: config.clone(),
        index: Arc::new(index),
        model: Arc::new(model),
    };
    let app = prepost_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
