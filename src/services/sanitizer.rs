use std::collections::HashSet;

use scraper::{node::Element, ElementRef, Html, Node};

use crate::services::text_helpers::escape_html;

const OUTPUT_TAGS: &[&str] = &[
    "h2", "h3", "h4", "p", "ul", "ol", "li", "strong", "em", "b", "i", "br", "blockquote",
];
const VOID_TAGS: &[&str] = &["br"];
/// Dropped together with everything inside them.
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "head", "title",
];

/// Elements that may survive sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedTags {
    tags: HashSet<String>,
}

impl AllowedTags {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(|t| t.into().to_lowercase()).collect(),
        }
    }

    /// The FAQ element set; anchors only when external links are allowed.
    pub fn for_output(allow_links: bool) -> Self {
        let mut allowed = Self::new(OUTPUT_TAGS.iter().copied());
        if allow_links {
            allowed.tags.insert("a".to_string());
        }
        allowed
    }

    pub fn allows(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

pub trait Sanitizer: Send + Sync {
    fn clean(&self, html: &str, allowed: &AllowedTags) -> String;
}

/// Tree-based allow-list sanitizer. Disallowed elements are unwrapped (their
/// text is kept), dangerous ones are dropped whole, and only link attributes
/// with a safe target survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowListSanitizer;

impl Sanitizer for AllowListSanitizer {
    fn clean(&self, html: &str, allowed: &AllowedTags) -> String {
        let fragment = Html::parse_fragment(html);
        let mut out = String::with_capacity(html.len());
        write_children(fragment.root_element(), allowed, &mut out);
        out.trim().to_string()
    }
}

fn write_children(parent: ElementRef<'_>, allowed: &AllowedTags, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element(el) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    write_element(child_ref, el, allowed, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, el: &Element, allowed: &AllowedTags, out: &mut String) {
    let name = el.name();
    if STRIPPED_TAGS.contains(&name) {
        return;
    }
    if !allowed.allows(name) {
        write_children(element, allowed, out);
        return;
    }

    let attrs = if name == "a" {
        match link_attributes(el) {
            Some(attrs) => attrs,
            None => {
                write_children(element, allowed, out);
                return;
            }
        }
    } else {
        String::new()
    };

    out.push('<');
    out.push_str(name);
    out.push_str(&attrs);
    out.push('>');
    if VOID_TAGS.contains(&name) {
        return;
    }
    write_children(element, allowed, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn link_attributes(el: &Element) -> Option<String> {
    let href = el.attr("href").map(str::trim).filter(|h| is_safe_href(h))?;
    let mut attrs = format!(" href=\"{}\"", escape_html(href));
    if let Some(target) = el.attr("target").filter(|t| *t == "_blank") {
        attrs.push_str(&format!(" target=\"{}\"", target));
    }
    if let Some(rel) = el.attr("rel") {
        let rel: Vec<&str> = rel
            .split_whitespace()
            .filter(|r| matches!(*r, "noopener" | "noreferrer" | "nofollow"))
            .collect();
        if !rel.is_empty() {
            attrs.push_str(&format!(" rel=\"{}\"", rel.join(" ")));
        }
    }
    Some(attrs)
}

fn is_safe_href(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("https://")
        || lower.starts_with("http://")
        || lower.starts_with("mailto:")
        || (lower.starts_with('/') && !lower.starts_with("//"))
        || lower.starts_with('#')
}
