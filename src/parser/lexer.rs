//! Tokenizer for illustration markers embedded in chapter text.
//!
//! A chapter body is a run of plain text interrupted by illustration blocks:
//!
//! ```text
//! <comic-panel src="/images/cave.png" alt="The cave entrance" id="cave">
//! "It's a cave," said Gerald.
//! </comic-panel>
//! ```
//!
//! `<illustration>` is accepted as a synonym for `<comic-panel>`, and a
//! self-closing `<comic-panel ... />` yields a block with no inner text.
//! Markers that are never closed, or whose opening tag never ends, are left
//! in place as plain text.

use regex::Regex;
use std::sync::OnceLock;

/// Tag names recognised as illustration markers.
pub const MARKER_TAGS: [&str; 2] = ["comic-panel", "illustration"];

/// One piece of a chapter body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Illustration(IllustrationBlock),
}

/// Attributes and inner text of a single illustration marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IllustrationBlock {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub id: Option<String>,
    pub inner: String,
}

impl IllustrationBlock {
    /// Non-empty trimmed lines of the inner text.
    pub fn lines(&self) -> Vec<String> {
        self.inner
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Split a chapter body into text spans and illustration blocks.
pub fn tokenize(body: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = body[cursor..].find('<') {
        let open = cursor + offset;
        match read_marker(body, open) {
            Some((block, end)) => {
                if open > text_start {
                    segments.push(Segment::Text(&body[text_start..open]));
                }
                segments.push(Segment::Illustration(block));
                text_start = end;
                cursor = end;
            }
            None => cursor = open + 1,
        }
    }

    if text_start < body.len() {
        segments.push(Segment::Text(&body[text_start..]));
    }
    segments
}

/// Try to read a complete marker starting at the `<` at `open`.
///
/// Returns the block and the byte offset just past its closing tag.
fn read_marker(body: &str, open: usize) -> Option<(IllustrationBlock, usize)> {
    let rest = &body[open + 1..];
    let tag = MARKER_TAGS.iter().copied().find(|tag| {
        rest.strip_prefix(tag)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
    })?;

    let attrs_start = open + 1 + tag.len();
    let tag_end = attrs_start + find_tag_end(&body[attrs_start..])?;

    let raw_attrs = &body[attrs_start..tag_end];
    let (raw_attrs, self_closing) = match raw_attrs.trim_end().strip_suffix('/') {
        Some(attrs) => (attrs, true),
        None => (raw_attrs, false),
    };

    let mut block = parse_attributes(raw_attrs);
    if self_closing {
        return Some((block, tag_end + 1));
    }

    let close_tag = format!("</{tag}>");
    let inner_start = tag_end + 1;
    let close = inner_start + body[inner_start..].find(&close_tag)?;
    block.inner = body[inner_start..close].trim().to_string();

    Some((block, close + close_tag.len()))
}

/// Offset of the `>` closing an opening tag, skipping quoted attribute values.
///
/// A stray `<` or an unterminated quote means the tag never ends.
fn find_tag_end(attrs: &str) -> Option<usize> {
    let mut quote = None;
    let mut after_equals = false;

    for (offset, c) in attrs.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if after_equals => quote = Some(c),
            '>' => return Some(offset),
            '<' => return None,
            _ => {}
        }
        if !c.is_whitespace() {
            after_equals = c == '=';
        }
    }
    None
}

/// Extract `src`, `alt` and `id` from an opening tag's attribute text.
///
/// Values may be double quoted, single quoted or bare. Unknown attributes
/// are ignored, the first occurrence of a name wins, and empty values are
/// treated as absent.
fn parse_attributes(raw: &str) -> IllustrationBlock {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    let attribute = ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
            .unwrap()
    });

    let mut block = IllustrationBlock::default();
    for cap in attribute.captures_iter(raw) {
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| m.as_str().trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let slot = match cap[1].to_ascii_lowercase().as_str() {
            "src" => &mut block.src,
            "alt" => &mut block.alt,
            "id" => &mut block.id,
            _ => continue,
        };
        if slot.is_none() {
            *slot = value;
        }
    }
    block
}
