//! Retrieval over the `pre` and `post` snapshots.
//!
//! Both documents are cut into line-aligned chunks ([`chunk::chunk_xml`]),
//! whitespace-normalised and scored with a BM25-style ranking
//! ([`bm25::Bm25`]). [`Retriever`] turns the top chunks into a labelled
//! context block for the prompt.

pub mod bm25;
pub mod chunk;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::documents::{DocumentError, DocumentPaths};

use bm25::Bm25;
use chunk::{chunk_xml, normalize_space};

/// Which snapshot a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Pre,
    Post,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Pre => "pre",
            Source::Post => "post",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrievable slice of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub source: Source,
    pub chunk_id: usize,
    pub text: String,
}

impl DocumentChunk {
    /// Stable identifier such as `pre:3`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.source, self.chunk_id)
    }
}

/// Chunked and scored view over both snapshots.
#[derive(Debug, Clone)]
pub struct Index {
    chunks: Vec<DocumentChunk>,
    bm25: Bm25,
}

impl Index {
    /// Build an index from the two document texts. `pre` chunks come first.
    pub fn build(pre: &str, post: &str, max_chars_per_chunk: usize) -> Self {
        let mut chunks = Vec::new();
        for (source, text) in [(Source::Pre, pre), (Source::Post, post)] {
            chunks.extend(
                chunk_xml(text, max_chars_per_chunk)
                    .iter()
                    .enumerate()
                    .map(|(chunk_id, chunk)| DocumentChunk {
                        source,
                        chunk_id,
                        text: normalize_space(chunk),
                    }),
            );
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let bm25 = Bm25::new(&texts);
        tracing::info!(chunks = chunks.len(), "built retrieval index");
        Self { chunks, bm25 }
    }

    /// Read both snapshots from disk and index them.
    pub async fn from_files(
        paths: &DocumentPaths,
        max_chars_per_chunk: usize,
    ) -> Result<Self, DocumentError> {
        let pair = paths.read().await?;
        Ok(Self::build(&pair.pre, &pair.post, max_chars_per_chunk))
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` best-scoring chunks for `query`.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<&DocumentChunk> {
        self.bm25
            .score_query(query)
            .into_iter()
            .take(k)
            .map(|(idx, _)| &self.chunks[idx])
            .collect()
    }
}

/// Context block handed to the model, plus the ids of the chunks in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub formatted: String,
    pub ids: Vec<String>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Formats the best chunks for a query as labelled context.
#[derive(Debug, Clone, Copy)]
pub struct Retriever<'a> {
    index: &'a Index,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    pub fn retrieve(&self, query: &str, k: usize) -> RetrievedContext {
        let top = self.index.top_k(query, k);
        tracing::debug!(query, hits = top.len(), "retrieved chunks");
        RetrievedContext {
            formatted: top
                .iter()
                .map(|c| {
                    format!(
                        "[{} #{}]\n{}",
                        c.source.as_str().to_uppercase(),
                        c.chunk_id,
                        c.text
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            ids: top.iter().map(|c| c.id()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE: &str = "<config>\n  <cell>\n    <pci>101</pci>\n  </cell>\n</config>";
    const POST: &str = "<config>\n  <cell>\n    <pci>202</pci>\n    <band>3</band>\n  </cell>\n</config>";

    #[test]
    fn index_orders_pre_before_post() {
        let index = Index::build(PRE, POST, 20);
        assert!(index.len() > 2);
        let first_post = index
            .chunks()
            .iter()
            .position(|c| c.source == Source::Post)
            .unwrap();
        assert!(index.chunks()[..first_post].iter().all(|c| c.source == Source::Pre));
        assert_eq!(index.chunks()[first_post].chunk_id, 0);
    }

    #[test]
    fn retrieve_labels_blocks_and_ids() {
        let index = Index::build(PRE, POST, 10_000);
        assert_eq!(index.len(), 2);
        let ctx = Retriever::new(&index).retrieve("band", 8);
        assert_eq!(ctx.ids, vec!["post:0".to_string()]);
        assert_eq!(
            ctx.formatted,
            "[POST #0]\n<config> <cell> <pci>202</pci> <band>3</band> </cell> </config>"
        );
    }

    #[test]
    fn retrieve_without_matches_is_empty() {
        let index = Index::build(PRE, POST, 10_000);
        let ctx = Retriever::new(&index).retrieve("earfcn", 8);
        assert!(ctx.is_empty());
        assert!(ctx.formatted.is_empty());
    }

    #[test]
    fn top_k_is_bounded() {
        let index = Index::build(PRE, POST, 1);
        assert_eq!(index.top_k("pci cell config", 2).len(), 2);
    }
}
