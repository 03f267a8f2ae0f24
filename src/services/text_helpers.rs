use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("TAG_RE is a valid regex pattern"));

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "br", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "tr",
    "td", "th", "table", "section",
];

/// Collapses runs of whitespace to a single space and trims the ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Truncates on a char boundary.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

pub fn word_count(input: &str) -> usize {
    input.split_whitespace().count()
}

/// Removes tags after padding each boundary with a space, so adjacent
/// elements never fuse into one token. Entities are left untouched.
pub fn strip_tags_spaced(html: &str) -> String {
    let padded = html.replace('<', " <").replace('>', "> ");
    collapse_whitespace(&TAG_RE.replace_all(&padded, " "))
}

/// Text content of an element with entities decoded; block-level children
/// are separated by spaces, inline children are concatenated.
pub fn element_plain_text(element: ElementRef<'_>) -> String {
    let mut buf = String::new();
    push_text(element, &mut buf);
    collapse_whitespace(&buf)
}

fn push_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let is_block = BLOCK_TAGS.contains(&el.name());
                if is_block {
                    buf.push(' ');
                }
                if !matches!(el.name(), "script" | "style") {
                    push_text(child_ref, buf);
                }
                if is_block {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Plain text of an HTML fragment (markup stripped, entities decoded).
pub fn html_to_plain(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    element_plain_text(fragment.root_element())
}
