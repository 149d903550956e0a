//! Line-oriented chunking of XML text.

/// Split `text` into chunks of roughly `max_chars` characters.
///
/// Lines are never split. A chunk closes once its size (line lengths plus one
/// per newline) reaches `max_chars` on a line that ends with `>`, so chunks
/// tend to end on a tag boundary. Trailing lines form a final chunk.
pub fn chunk_xml(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut size = 0;

    for line in text.lines() {
        current.push(line);
        size += line.chars().count() + 1;
        if size >= max_chars && line.trim().ends_with('>') {
            chunks.push(current.join("\n"));
            current.clear();
            size = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

/// Collapse whitespace runs into single spaces and trim.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
