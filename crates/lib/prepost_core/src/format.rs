//! Answer formatter: turns a raw answer value into display markup.
//!
//! The decision tree, in order:
//!
//! 1. Non-string values render as their escaped textual form.
//! 2. Strings that already carry block-level markup (see [`TRUSTED_TAGS`])
//!    pass through untouched. The server is the only producer of such
//!    answers and is trusted to emit safe markup.
//! 3. Strings whose first three non-empty lines are labelled
//!    `Structure:`, `Values:` and `Differences:` render as a structured
//!    comparison block with at most [`MAX_DIFFERENCES`] list items.
//! 4. Everything else renders line by line, bolding `label:` prefixes.
//!
//! Formatting never fails; every input maps to one of the renderings above.

use serde_json::Value;

/// Tag names that mark an answer as pre-rendered markup.
pub const TRUSTED_TAGS: &[&str] = &[
    "p", "div", "table", "ul", "ol", "section", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "br",
    "strong", "em",
];

/// Upper bound on rendered difference items in the structured form.
pub const MAX_DIFFERENCES: usize = 3;

/// Escapes `&`, `<`, `>`, `"` and `'` for embedding in markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Formats an answer value of any JSON shape.
///
/// `null`, numbers, booleans, arrays and objects are rendered from their
/// compact JSON text and escaped. Strings go through [`format_answer_text`].
pub fn format_answer(raw: &Value) -> String {
    match raw {
        Value::String(text) => format_answer_text(text),
        other => escape_html(&other.to_string()),
    }
}

/// Formats an answer string.
pub fn format_answer_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if contains_trusted_markup(raw) {
        return raw.to_string();
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    render_structured(&lines).unwrap_or_else(|| render_generic(&lines))
}

/// Returns true when `raw` opens or closes one of the [`TRUSTED_TAGS`].
///
/// A tag is recognised when `<` (or `</`) is followed by a trusted name that
/// ends at `>`, `/`, whitespace or end of input, so `<pre>` is not `<p>`.
pub fn contains_trusted_markup(raw: &str) -> bool {
    raw.match_indices('<').any(|(idx, _)| {
        let rest = &raw[idx + 1..];
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let name_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        if name_len == 0 {
            return false;
        }
        let (name, tail) = rest.split_at(name_len);
        let terminated = match tail.chars().next() {
            None => true,
            Some(c) => c == '>' || c == '/' || c.is_whitespace(),
        };
        terminated
            && TRUSTED_TAGS
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(name))
    })
}

/// Strips a case-insensitive `label` prefix from `line`.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label)
        .then(|| &line[label.len()..])
}

/// Text after the first colon, trimmed. Empty when there is no colon.
fn after_first_colon(line: &str) -> &str {
    line.split_once(':').map_or("", |(_, value)| value.trim())
}

/// Removes a leading ordinal such as `1.` or `12 ` from a list item.
fn strip_ordinal(item: &str) -> &str {
    let rest = item.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == item.len() {
        return item;
    }
    rest.strip_prefix('.').unwrap_or(rest).trim_start()
}

fn render_structured(lines: &[&str]) -> Option<String> {
    let [structure, values, differences, ..] = lines else {
        return None;
    };
    strip_label(structure, "structure:")?;
    strip_label(values, "values:")?;
    let diffs = strip_label(differences, "differences:")?.trim();

    let structure_val = escape_html(after_first_colon(structure));
    let values_val = escape_html(after_first_colon(values));

    let mut diffs_html = String::from(r#"<div class="kv">-</div>"#);
    if !diffs.is_empty() && diffs != "-" {
        let items: Vec<String> = diffs
            .split(';')
            .map(|item| strip_ordinal(item.trim()).trim())
            .filter(|item| !item.is_empty())
            .take(MAX_DIFFERENCES)
            .map(|item| format!("<li>{}</li>", escape_html(item)))
            .collect();
        if !items.is_empty() {
            diffs_html = format!(r#"<ol class="diff-list">{}</ol>"#, items.concat());
        }
    }

    Some(format!(
        concat!(
            r#"<div class="structured">"#,
            r#"<div class="kv"><strong>Structure:</strong> {}</div>"#,
            r#"<div class="kv"><strong>Values:</strong> {}</div>"#,
            r#"<div class="kv"><strong>Differences:</strong></div>"#,
            "{}",
            "</div>"
        ),
        structure_val, values_val, diffs_html
    ))
}

fn render_generic(lines: &[&str]) -> String {
    let rows: String = lines
        .iter()
        .map(|line| match line.split_once(':') {
            Some((label, value)) if !label.is_empty() => format!(
                r#"<div class="kv"><strong>{}:</strong> {}</div>"#,
                escape_html(label),
                escape_html(value.trim_start())
            ),
            _ => format!(r#"<div class="line">{}</div>"#, escape_html(line)),
        })
        .collect();
    format!(r#"<div class="structured">{rows}</div>"#)
}
