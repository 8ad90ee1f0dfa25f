//! Markup to plain text lines.
//!
//! Markdown is flattened from the `pulldown-cmark` event stream, which walks
//! the node tree in pre-order: a node's own text comes before the text of its
//! children, which comes before whatever follows the node. Structural tokens
//! (heading hashes, emphasis markers, list bullets, link syntax) never reach
//! the output. HTML documents go through `html2text` instead.

use super::TextError;
use super::cleaner::clean_text;
use crate::source::{DocumentFormat, RawDocument};
use html2text::render::text_renderer::TrivialDecorator;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

/// Default number of columns a tab expands to.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Render width for HTML; wide enough that paragraphs are not wrapped.
const HTML_RENDER_WIDTH: usize = 1000;

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern should compile"))
}

/// Remove angle-bracket delimited tags from a string.
pub fn remove_tags(text: &str) -> String {
    tag_regex().replace_all(text, "").into_owned()
}

/// Extract plain text lines from a retrieved document.
pub fn extract_document(doc: &RawDocument, tab_width: usize) -> Result<Vec<String>, TextError> {
    match doc.format() {
        DocumentFormat::Markdown => extract(doc.bytes(), tab_width),
        DocumentFormat::Html => extract_html(doc.bytes()),
    }
}

/// Extract plain text lines from Markdown bytes.
///
/// Every returned line is trimmed, cleaned for TTS, and non-empty. Document
/// order is preserved.
pub fn extract(raw: &[u8], tab_width: usize) -> Result<Vec<String>, TextError> {
    if tab_width == 0 {
        return Err(TextError::InvalidTabWidth);
    }

    let text = std::str::from_utf8(raw)?;
    let text = expand_tabs(text.trim(), tab_width);

    Ok(into_lines(&flatten_markdown(&text)))
}

fn extract_html(raw: &[u8]) -> Result<Vec<String>, TextError> {
    let html = std::str::from_utf8(raw)?;
    let text = html2text::from_read_with_decorator(
        html.as_bytes(),
        HTML_RENDER_WIDTH,
        TrivialDecorator::new(),
    );

    Ok(into_lines(&text))
}

/// Flatten Markdown into text with one line per block.
fn flatten_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for event in Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::Html(html) | Event::InlineHtml(html) => out.push_str(&remove_tags(&html)),
            Event::SoftBreak | Event::HardBreak | Event::Rule => out.push('\n'),
            Event::End(TagEnd::TableCell) => out.push(' '),
            Event::Start(tag) if starts_nested_block(&tag) => out.push('\n'),
            Event::End(tag) if ends_block(&tag) => out.push('\n'),
            _ => {}
        }
    }

    out
}

/// Blocks that can open inside a tight list item, right after the item's text.
fn starts_nested_block(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::List { .. } | Tag::Item | Tag::BlockQuote { .. } | Tag::CodeBlock { .. }
    )
}

fn ends_block(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Paragraph
            | TagEnd::Heading { .. }
            | TagEnd::BlockQuote { .. }
            | TagEnd::CodeBlock
            | TagEnd::HtmlBlock
            | TagEnd::Item
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::FootnoteDefinition
    )
}

/// Expand tabs to the next multiple of `tab_width` columns.
fn expand_tabs(text: &str, tab_width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;

    for c in text.chars() {
        match c {
            '\t' => {
                let pad = tab_width - column % tab_width;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }

    out
}

fn into_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| clean_text(&remove_tags(line)))
        .filter(|line| !line.is_empty())
        .collect()
}
