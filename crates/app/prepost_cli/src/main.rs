// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::io::Read;
use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands, DocumentArgs};
use prepost_core::compare::{compare, render_html};
use prepost_core::documents::DocumentPaths;
use prepost_core::format::{format_answer, format_answer_text};
use prepost_core::rag::{Index, Retriever};
use prepost_core::widget::ChatWidget;

mod cli;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(execute(args.command))?;
    println!("{output}");

    Ok(())
}

async fn execute(command: Commands) -> Result<String> {
    match command {
        Commands::Format { file, json } => {
            let input = read_input(file.as_deref())?;
            if json {
                let value: serde_json::Value = serde_json::from_str(&input)?;
                Ok(format_answer(&value))
            } else {
                Ok(format_answer_text(&input))
            }
        }
        Commands::Compare { docs, html } => {
            let pair = paths(&docs).read().await?;
            let comparison = compare(&pair.pre, &pair.post)?;
            if html {
                Ok(render_html(&comparison))
            } else {
                Ok(serde_json::to_string_pretty(&comparison)?)
            }
        }
        Commands::Search {
            query,
            docs,
            k,
            chunk_chars,
        } => {
            let index = Index::from_files(&paths(&docs), chunk_chars).await?;
            let retrieved = Retriever::new(&index).retrieve(&query, k);
            if retrieved.is_empty() {
                log::warn!("no snippets matched {query:?}");
            }
            Ok(retrieved.formatted)
        }
        Commands::Ask {
            query,
            endpoint,
            full,
        } => {
            let widget = ChatWidget::builder(endpoint).full_context(full).build();
            widget
                .submit(&query)
                .await
                .ok_or_else(|| Error::Custom("query is empty".into()))
        }
        Commands::Version => Ok(format!(
            "{} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )),
    }
}

fn paths(docs: &DocumentArgs) -> DocumentPaths {
    DocumentPaths::new(&docs.pre, &docs.post)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
