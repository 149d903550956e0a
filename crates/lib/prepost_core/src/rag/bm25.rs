//! Lightweight BM25-style lexical scorer.

use std::collections::{HashMap, HashSet};

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// Lowercased runs of ASCII alphanumerics, `_` and `-`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Term statistics over a fixed document set.
#[derive(Debug, Clone)]
pub struct Bm25 {
    doc_terms: Vec<HashMap<String, usize>>,
    doc_lengths: Vec<usize>,
    term_df: HashMap<String, usize>,
    avgdl: f64,
}

impl Bm25 {
    pub fn new<S: AsRef<str>>(docs: &[S]) -> Self {
        let mut doc_terms = Vec::with_capacity(docs.len());
        let mut doc_lengths = Vec::with_capacity(docs.len());
        let mut term_df: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let tokens = tokenize(doc.as_ref());
            doc_lengths.push(tokens.len());
            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *term_df.entry(term.clone()).or_insert(0) += 1;
            }
            doc_terms.push(tf);
        }

        let avgdl = doc_lengths.iter().sum::<usize>() as f64 / docs.len().max(1) as f64;
        Self {
            doc_terms,
            doc_lengths,
            term_df,
            avgdl,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_terms.is_empty()
    }

    /// Score every document against `query`.
    ///
    /// Returns `(doc_index, score)` for documents matching at least one query
    /// term, best first. Equal scores keep document order.
    pub fn score_query(&self, query: &str) -> Vec<(usize, f64)> {
        let n = self.doc_terms.len() as f64;
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
        let mut scores: HashMap<usize, f64> = HashMap::new();

        for term in &query_terms {
            let df = self.term_df.get(term).copied().unwrap_or(0);
            if df == 0 {
                continue;
            }
            let df = df as f64;
            let idf = ((n - df + 0.5) / (df + 0.5)).max(0.0);
            for (idx, terms) in self.doc_terms.iter().enumerate() {
                let Some(&tf) = terms.get(term) else {
                    continue;
                };
                let tf = tf as f64;
                let dl = self.doc_lengths[idx] as f64;
                let denom = tf + K1 * (1.0 - B + B * (dl / self.avgdl.max(1e-6)));
                *scores.entry(idx).or_insert(0.0) += idf * (tf * (K1 + 1.0)) / denom;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}
