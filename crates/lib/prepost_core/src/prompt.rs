//! Prompt assembly for the configuration assistant.

use crate::documents::{DocumentPair, truncate_chars};
use crate::llm::Message;

/// System instructions for grounded answers over the two snapshots.
pub const SYSTEM_PROMPT: &str = concat!(
    "You are a precise telecom configuration assistant operating with two XMLs: pre.xml and post.xml. ",
    "- If the user asks for comparison, output three sections in order: ",
    "(1) Structure Same?, (2) Totals (pre vs post), (3) Differences (key tag frequency diffs and notable paths only in one). ",
    "- Otherwise (non-comparison queries), answer grounded strictly in the provided context with minimal tokens. ",
    "Return ONLY the result asked for, as short and precise lines separated by newlines. ",
    "Do NOT include explanations, headers, bullets, or extra prose. If multiple values, list each on its own line. ",
    "After the result lines, add one final short line starting with 'Summary:' that briefly comments on the result (at most 15 words). ",
    "If the answer isn't present in context, reply exactly: 'Not found in provided context.' ",
    "When applicable, you may mention which file (pre or post) better fits within the Summary line only. ",
    "Use concise, readable formatting; avoid speculation."
);

/// Context used when retrieval finds nothing.
pub const NO_SNIPPETS: &str = "(No relevant snippets found in pre/post)";

/// Words that turn a question into a comparison request.
const COMPARISON_WORDS: &[&str] = &["compare", "difference", "diff", "different", "change"];

/// Build the `[system, user]` message pair for a question.
pub fn build_messages(context: &str, query: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Use the following context from pre.xml and post.xml. If answer isn't present, say so.\n\n{context}\n\nQuestion: {query}"
        )),
    ]
}

/// True when the question asks for a pre/post comparison.
pub fn wants_comparison(query: &str) -> bool {
    let query = query.to_lowercase();
    COMPARISON_WORDS.iter().any(|word| query.contains(word))
}

/// Both documents in full (up to `max_chars` each), labelled by file.
pub fn full_context(docs: &DocumentPair, max_chars: usize) -> String {
    format!(
        "[PRE.xml]\n{}\n\n[POST.xml]\n{}",
        truncate_chars(&docs.pre, max_chars),
        truncate_chars(&docs.post, max_chars)
    )
}
