//! XML comparison of structure, tag frequencies and leaf values
//! between a `pre` and a `post` document.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::escape_html;

const MAX_ONLY_IN_PATHS: usize = 50;
const MAX_FREQUENCY_DIFFERENCES: usize = 100;
const MAX_VALUE_DIFFERENCES: usize = 200;
/// Rows per list in the rendered report.
const REPORT_LIMIT: usize = 20;

/// Errors that can occur while comparing documents.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Failed to parse XML ({side}): {message}")]
    Parse { side: &'static str, message: String },
}

/// Element count mismatch for a single tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyDifference {
    pub tag: String,
    pub pre: usize,
    pub post: usize,
}

/// Leaf value mismatch at the same path and position in both documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDifference {
    pub tag: String,
    pub path: String,
    pub pre: String,
    pub post: String,
}

/// Result of comparing two XML documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub structure_same: bool,
    pub total_elements_pre: usize,
    pub total_elements_post: usize,
    pub only_in_pre_paths: Vec<String>,
    pub only_in_post_paths: Vec<String>,
    pub frequency_differences: Vec<FrequencyDifference>,
    pub value_differences: Vec<ValueDifference>,
}

/// Everything the comparison needs from one parsed document.
#[derive(Debug, Default)]
struct DocumentProfile {
    paths: BTreeSet<String>,
    tag_counts: BTreeMap<String, usize>,
    /// Leaf value signatures per path, in document order.
    leaf_values: BTreeMap<String, Vec<String>>,
}

impl DocumentProfile {
    fn total_elements(&self) -> usize {
        self.tag_counts.values().sum()
    }
}

struct Frame {
    path: String,
    attrs: String,
    text: String,
    has_children: bool,
}

impl Frame {
    fn signature(&self) -> String {
        format!("{}|{}", self.attrs, self.text.trim())
            .trim_matches('|')
            .to_string()
    }
}

/// Compare two XML documents.
pub fn compare(pre: &str, post: &str) -> Result<Comparison, CompareError> {
    let pre = profile(pre).map_err(|message| CompareError::Parse { side: "pre", message })?;
    let post = profile(post).map_err(|message| CompareError::Parse { side: "post", message })?;

    let only_in_pre_paths: Vec<String> = pre
        .paths
        .difference(&post.paths)
        .take(MAX_ONLY_IN_PATHS)
        .cloned()
        .collect();
    let only_in_post_paths: Vec<String> = post
        .paths
        .difference(&pre.paths)
        .take(MAX_ONLY_IN_PATHS)
        .cloned()
        .collect();

    let all_tags: BTreeSet<&String> = pre.tag_counts.keys().chain(post.tag_counts.keys()).collect();
    let frequency_differences = all_tags
        .into_iter()
        .filter_map(|tag| {
            let a = pre.tag_counts.get(tag).copied().unwrap_or(0);
            let b = post.tag_counts.get(tag).copied().unwrap_or(0);
            (a != b).then(|| FrequencyDifference {
                tag: tag.clone(),
                pre: a,
                post: b,
            })
        })
        .take(MAX_FREQUENCY_DIFFERENCES)
        .collect();

    let mut value_differences = Vec::new();
    'paths: for (path, pre_values) in &pre.leaf_values {
        let Some(post_values) = post.leaf_values.get(path) else {
            continue;
        };
        let tag = path.rsplit('/').next().unwrap_or(path);
        for (a, b) in pre_values.iter().zip(post_values) {
            if a != b {
                value_differences.push(ValueDifference {
                    tag: tag.to_string(),
                    path: path.clone(),
                    pre: a.clone(),
                    post: b.clone(),
                });
                if value_differences.len() >= MAX_VALUE_DIFFERENCES {
                    break 'paths;
                }
            }
        }
    }

    let comparison = Comparison {
        structure_same: pre.paths == post.paths,
        total_elements_pre: pre.total_elements(),
        total_elements_post: post.total_elements(),
        only_in_pre_paths,
        only_in_post_paths,
        frequency_differences,
        value_differences,
    };
    tracing::debug!(
        structure_same = comparison.structure_same,
        total_pre = comparison.total_elements_pre,
        total_post = comparison.total_elements_post,
        value_diffs = comparison.value_differences.len(),
        "compared documents"
    );
    Ok(comparison)
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn unescape_lossy(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&raw) {
        Ok(Cow::Owned(s)) => s,
        _ => raw.into_owned(),
    }
}

/// Sorted `key=value` pairs, namespace declarations excluded.
fn attribute_signature(start: &BytesStart<'_>) -> Result<String, String> {
    let mut pairs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        pairs.push((key, unescape_lossy(&attr.value)));
    }
    pairs.sort();
    Ok(pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" "))
}

fn profile(xml: &str) -> Result<DocumentProfile, String> {
    let mut reader = Reader::from_str(xml);
    let mut doc = DocumentProfile::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{e} at position {}", reader.buffer_position()))?;
        match event {
            Event::Start(ref start) | Event::Empty(ref start) => {
                if stack.is_empty() {
                    if seen_root {
                        return Err("junk after document element".into());
                    }
                    seen_root = true;
                }
                let name = local_name(start);
                let path = match stack.last_mut() {
                    Some(parent) => {
                        parent.has_children = true;
                        format!("{}/{name}", parent.path)
                    }
                    None => name.clone(),
                };
                doc.paths.insert(path.clone());
                *doc.tag_counts.entry(name).or_insert(0) += 1;
                let frame = Frame {
                    path,
                    attrs: attribute_signature(start)?,
                    text: String::new(),
                    has_children: false,
                };
                if matches!(event, Event::Empty(_)) {
                    doc.leaf_values
                        .entry(frame.path.clone())
                        .or_default()
                        .push(frame.signature());
                } else {
                    stack.push(frame);
                }
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or("unexpected closing tag")?;
                if !frame.has_children {
                    let signature = frame.signature();
                    doc.leaf_values.entry(frame.path).or_default().push(signature);
                }
            }
            Event::Text(text) => {
                let chunk = String::from_utf8_lossy(&text);
                append_text(&mut stack, &chunk)?;
            }
            Event::CData(data) => {
                let chunk = String::from_utf8_lossy(&data);
                append_text(&mut stack, &chunk)?;
            }
            Event::GeneralRef(entity) => {
                let reference = format!("&{};", String::from_utf8_lossy(&entity));
                let resolved = quick_xml::escape::unescape(&reference)
                    .map_err(|e| e.to_string())?
                    .into_owned();
                append_text(&mut stack, &resolved)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of input: unclosed element".into());
    }
    if !seen_root {
        return Err("no element found".into());
    }
    Ok(doc)
}

/// Element text is the content before the first child element.
fn append_text(stack: &mut [Frame], chunk: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(frame) if !frame.has_children => frame.text.push_str(chunk),
        Some(_) => {}
        None if chunk.trim().is_empty() => {}
        None => return Err("text outside of the document element".into()),
    }
    Ok(())
}

/// Render a comparison as the markup section shown above model answers.
pub fn render_html(comparison: &Comparison) -> String {
    let rows: String = comparison
        .frequency_differences
        .iter()
        .take(REPORT_LIMIT)
        .map(|d| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&d.tag),
                d.pre,
                d.post
            )
        })
        .collect();
    let list = |paths: &[String]| -> String {
        paths
            .iter()
            .take(REPORT_LIMIT)
            .map(|p| format!("<li>{}</li>", escape_html(p)))
            .collect()
    };

    format!(
        concat!(
            "<section><h3>Structure Same?</h3><p>{same}</p>",
            "<h3>Totals</h3><p>pre: {pre}, post: {post}</p>",
            "<h3>Differences</h3>",
            "<h4>Tag frequency differences (top {limit})</h4>",
            "<table><thead><tr><th>tag</th><th>pre</th><th>post</th></tr></thead><tbody>{rows}</tbody></table>",
            "<h4>Paths only in pre (top {limit})</h4><ul>{only_pre}</ul>",
            "<h4>Paths only in post (top {limit})</h4><ul>{only_post}</ul>",
            "</section>"
        ),
        same = if comparison.structure_same { "Yes" } else { "No" },
        pre = comparison.total_elements_pre,
        post = comparison.total_elements_post,
        limit = REPORT_LIMIT,
        rows = rows,
        only_pre = list(&comparison.only_in_pre_paths),
        only_post = list(&comparison.only_in_post_paths),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE: &str = r#"<?xml version="1.0"?>
<config>
  <cell id="1"><pci>101</pci><tac>7</tac></cell>
  <cell id="2"><pci>102</pci><tac>7</tac></cell>
</config>"#;

    #[test]
    fn identical_documents_have_no_differences() {
        let cmp = compare(PRE, PRE).unwrap();
        assert!(cmp.structure_same);
        assert_eq!(cmp.total_elements_pre, 7);
        assert_eq!(cmp.total_elements_post, 7);
        assert!(cmp.only_in_pre_paths.is_empty());
        assert!(cmp.only_in_post_paths.is_empty());
        assert!(cmp.frequency_differences.is_empty());
        assert!(cmp.value_differences.is_empty());
    }

    #[test]
    fn added_element_is_reported() {
        let post = r#"<config>
  <cell id="1"><pci>101</pci><tac>7</tac><band>3</band></cell>
  <cell id="2"><pci>102</pci><tac>7</tac></cell>
</config>"#;
        let cmp = compare(PRE, post).unwrap();
        assert!(!cmp.structure_same);
        assert_eq!(cmp.only_in_post_paths, vec!["config/cell/band".to_string()]);
        assert!(cmp.only_in_pre_paths.is_empty());
        assert_eq!(
            cmp.frequency_differences,
            vec![FrequencyDifference {
                tag: "band".into(),
                pre: 0,
                post: 1
            }]
        );
    }

    #[test]
    fn changed_leaf_values_are_reported_in_order() {
        let post = r#"<config>
  <cell id="1"><pci>101</pci><tac>7</tac></cell>
  <cell id="2"><pci>202</pci><tac>8</tac></cell>
</config>"#;
        let cmp = compare(PRE, post).unwrap();
        assert!(cmp.structure_same);
        assert_eq!(cmp.value_differences.len(), 2);
        assert_eq!(
            cmp.value_differences[0],
            ValueDifference {
                tag: "pci".into(),
                path: "config/cell/pci".into(),
                pre: "102".into(),
                post: "202".into(),
            }
        );
        assert_eq!(cmp.value_differences[1].tag, "tac");
    }

    #[test]
    fn leaf_signature_includes_sorted_attributes() {
        let pre = r#"<r><band b="2" a="1"/></r>"#;
        let post = r#"<r><band a="1" b="3"/></r>"#;
        let cmp = compare(pre, post).unwrap();
        assert_eq!(cmp.value_differences.len(), 1);
        assert_eq!(cmp.value_differences[0].pre, "a=1 b=2");
        assert_eq!(cmp.value_differences[0].post, "a=1 b=3");
    }

    #[test]
    fn namespace_prefixes_are_removed() {
        let pre = r#"<x:root xmlns:x="urn:a"><x:item>1</x:item></x:root>"#;
        let post = r#"<root><item>1</item></root>"#;
        let cmp = compare(pre, post).unwrap();
        assert!(cmp.structure_same);
        assert!(cmp.value_differences.is_empty());
    }

    #[test]
    fn entities_are_resolved_in_text() {
        let pre = r#"<r><v>a &amp; b</v></r>"#;
        let post = r#"<r><v>a &#38; b</v></r>"#;
        let cmp = compare(pre, post).unwrap();
        assert!(cmp.value_differences.is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = compare(PRE, "<config><cell></config>").unwrap_err();
        assert!(matches!(err, CompareError::Parse { side: "post", .. }));

        assert!(compare("", PRE).is_err());
        assert!(compare("<a></a><b></b>", PRE).is_err());
        assert!(compare("<a>", PRE).is_err());
    }

    #[test]
    fn rendered_report_escapes_and_limits() {
        let cmp = Comparison {
            structure_same: false,
            total_elements_pre: 3,
            total_elements_post: 4,
            only_in_pre_paths: vec![],
            only_in_post_paths: (0..30).map(|i| format!("r/<n{i}>")).collect(),
            frequency_differences: vec![FrequencyDifference {
                tag: "band".into(),
                pre: 0,
                post: 1,
            }],
            value_differences: vec![],
        };
        let html = render_html(&cmp);
        assert!(html.starts_with("<section><h3>Structure Same?</h3><p>No</p>"));
        assert!(html.contains("<p>pre: 3, post: 4</p>"));
        assert!(html.contains("<tr><td>band</td><td>0</td><td>1</td></tr>"));
        assert!(html.contains("<li>r/&lt;n0&gt;</li>"));
        assert_eq!(html.matches("<li>").count(), REPORT_LIMIT);
        assert!(html.ends_with("</section>"));
    }
}
