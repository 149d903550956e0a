use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use prepost_core::config::{DEFAULT_MAX_CHARS_PER_SNIPPET, DEFAULT_MAX_SNIPPETS};

#[derive(Parser, Debug)]
#[command(name = "prepost", about = "Ask and diff pre/post XML snapshots", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The two snapshot files.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Snapshot taken before the change.
    #[arg(long, env = "PREPOST_PRE_XML", default_value = "pre.xml")]
    pub pre: PathBuf,

    /// Snapshot taken after the change.
    #[arg(long, env = "PREPOST_POST_XML", default_value = "post.xml")]
    pub post: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a raw answer (file or stdin) as display markup.
    Format {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,

        /// Treat the input as a JSON value instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Compare the two snapshots.
    Compare {
        #[command(flatten)]
        docs: DocumentArgs,

        /// Print the markup report instead of JSON.
        #[arg(long)]
        html: bool,
    },

    /// Show the snippets retrieval would send for a question.
    Search {
        query: String,

        #[command(flatten)]
        docs: DocumentArgs,

        /// Number of snippets.
        #[arg(short, long, default_value_t = DEFAULT_MAX_SNIPPETS)]
        k: usize,

        /// Target chunk size in characters.
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS_PER_SNIPPET)]
        chunk_chars: usize,
    },

    /// Ask a running server and print the rendered answer.
    Ask {
        query: String,

        /// Chat endpoint URL.
        #[arg(
            long,
            env = "PREPOST_ENDPOINT",
            default_value = "http://127.0.0.1:8000/api/chat"
        )]
        endpoint: String,

        /// Send whole documents instead of retrieved snippets.
        #[arg(long)]
        full: bool,
    },

    /// Print the version.
    Version,
}
