use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```[A-Za-z0-9_-]*(?:[ \t]*\n|[ \t]+|$)")
        .expect("LEADING_FENCE_RE is a valid regex pattern")
});
static TRAILING_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\n)[ \t]*```[ \t]*$").expect("TRAILING_FENCE_RE is a valid regex pattern")
});

static MD_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+\S").expect("MD_HEADING_RE is a valid regex pattern")
});
static MD_BOLD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*[^*\n]+\*\*|__[^_\n]+__").expect("MD_BOLD_RE is a valid regex pattern")
});
static MD_ITALIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|[^*\w])\*[^*\s][^*\n]*\*(?:[^*\w]|$)")
        .expect("MD_ITALIC_RE is a valid regex pattern")
});
static MD_LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+[.)])[ \t]+\S").expect("MD_LIST_RE is a valid regex pattern")
});
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:h[1-6]|p|ul|ol|li|strong|em|b|i|a|br|blockquote)\b[^>]*>")
        .expect("HTML_TAG_RE is a valid regex pattern")
});

static LINE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#{1,6})[ \t]+(.+?)[ \t#]*$").expect("LINE_HEADING_RE is a valid regex pattern")
});
static LINE_BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-*+][ \t]+(.+)$").expect("LINE_BULLET_RE is a valid regex pattern")
});
static LINE_ORDERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+[.)][ \t]+(.+)$").expect("LINE_ORDERED_RE is a valid regex pattern")
});
static INLINE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").expect("INLINE_LINK_RE is a valid regex pattern")
});
static INLINE_BOLD_STAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*([^*\n]+?)\*\*").expect("INLINE_BOLD_STAR_RE is a valid regex pattern")
});
static INLINE_BOLD_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"__([^_\n]+?)__").expect("INLINE_BOLD_UNDERSCORE_RE is a valid regex pattern")
});
static INLINE_ITALIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^*\w])\*([^*\s][^*\n]*?)\*").expect("INLINE_ITALIC_RE is a valid regex pattern")
});

/// Makes raw model output safe to validate: fences removed, stray Markdown
/// converted to HTML. Applying it twice gives the same result as once.
pub fn normalize_output(raw: &str) -> String {
    let stripped = strip_code_fences(raw);
    if markdown_score(&stripped) > markup_score(&stripped) {
        log::debug!("output looks like Markdown, converting to HTML");
        markdown_to_html(&stripped)
    } else {
        stripped
    }
}

pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    loop {
        let before = text.len();
        if let Some(m) = LEADING_FENCE_RE.find(&text) {
            text = text[m.end()..].trim().to_string();
        }
        if let Some(m) = TRAILING_FENCE_RE.find(&text) {
            text = text[..m.start()].trim().to_string();
        }
        if text.len() == before {
            return text;
        }
    }
}

pub fn markdown_score(text: &str) -> usize {
    MD_HEADING_RE.find_iter(text).count()
        + MD_BOLD_RE.find_iter(text).count()
        + MD_ITALIC_RE.find_iter(text).count()
        + MD_LIST_RE.find_iter(text).count()
}

pub fn markup_score(text: &str) -> usize {
    HTML_TAG_RE.find_iter(text).count()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(&self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

struct LineConverter {
    lines: Vec<String>,
    open_list: Option<ListKind>,
}

impl LineConverter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            open_list: None,
        }
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.open_list.take() {
            self.lines.push(format!("</{}>", kind.tag()));
        }
    }

    fn list_item(&mut self, kind: ListKind, text: &str) {
        if self.open_list != Some(kind) {
            self.close_list();
            self.lines.push(format!("<{}>", kind.tag()));
            self.open_list = Some(kind);
        }
        self.lines.push(format!("<li>{}</li>", convert_inline(text)));
    }

    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            self.close_list();
            return;
        }

        if line.starts_with('<') {
            self.close_list();
            self.lines.push(line.to_string());
        } else if let Some(caps) = LINE_HEADING_RE.captures(line) {
            self.close_list();
            let text = caps[2].trim();
            let level = if text.ends_with('?') {
                3
            } else {
                caps[1].len().max(2)
            };
            self.lines
                .push(format!("<h{level}>{}</h{level}>", convert_inline(text)));
        } else if let Some(caps) = LINE_BULLET_RE.captures(line) {
            self.list_item(ListKind::Unordered, &caps[1]);
        } else if let Some(caps) = LINE_ORDERED_RE.captures(line) {
            self.list_item(ListKind::Ordered, &caps[1]);
        } else {
            self.close_list();
            self.lines.push(format!("<p>{}</p>", convert_inline(line)));
        }
    }

    fn finish(mut self) -> String {
        self.close_list();
        self.lines.join("\n")
    }
}

/// Line-oriented Markdown to HTML conversion. Lines that already start with a
/// tag pass through untouched.
pub fn markdown_to_html(text: &str) -> String {
    let mut converter = LineConverter::new();
    for line in text.lines() {
        converter.push_line(line);
    }
    converter.finish()
}

fn convert_inline(text: &str) -> String {
    let text = INLINE_LINK_RE.replace_all(text, "<a href=\"${2}\">${1}</a>");
    let text = INLINE_BOLD_STAR_RE.replace_all(&text, "<strong>${1}</strong>");
    let text = INLINE_BOLD_UNDERSCORE_RE.replace_all(&text, "<strong>${1}</strong>");
    INLINE_ITALIC_RE
        .replace_all(&text, "${1}<em>${2}</em>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_language_tagged_fences() {
        let raw = "```html\n<h3>Question one?</h3>\n<p>Answer.</p>\n```";
        assert_eq!(
            normalize_output(raw),
            "<h3>Question one?</h3>\n<p>Answer.</p>"
        );
    }

    #[test]
    fn strips_nested_fences() {
        let raw = "```\n```html\n<p>x</p>\n```\n```";
        assert_eq!(strip_code_fences(raw), "<p>x</p>");
    }

    #[test]
    fn leaves_html_untouched() {
        let html = "<h2>FAQ</h2>\n<h3>What is it?</h3>\n<p>It is **really** good.</p>";
        assert_eq!(normalize_output(html), html);
    }

    #[test]
    fn converts_markdown_headings_lists_and_emphasis() {
        let md = "## Frequently Asked Questions\n\n### What is a heat pump?\nA **heat pump** moves *heat* around.\n\n- cheap to run\n- quiet\n\n1. first\n2. second\n\nSee [the guide](https://example.com/guide).";
        let html = normalize_output(md);

        assert_eq!(
            html,
            "<h2>Frequently Asked Questions</h2>\n<h3>What is a heat pump?</h3>\n<p>A <strong>heat pump</strong> moves <em>heat</em> around.</p>\n<ul>\n<li>cheap to run</li>\n<li>quiet</li>\n</ul>\n<ol>\n<li>first</li>\n<li>second</li>\n</ol>\n<p>See <a href=\"https://example.com/guide\">the guide</a>.</p>"
        );
    }

    #[test]
    fn question_headings_become_h3_regardless_of_level() {
        let md = "## How long does it last?\nAbout fifteen years with **regular** service.";
        assert!(normalize_output(md).starts_with("<h3>How long does it last?</h3>"));
    }

    #[test]
    fn switching_list_kind_closes_previous_list() {
        let html = markdown_to_html("- a\n1. b");
        assert_eq!(html, "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "```html\n<h3>Q?</h3><p>A</p>\n```",
            "## Title\n\n### Question?\n**bold** and *italic*\n- item\n- item two\n\ntext",
            "<p>**a** **b** **c** **d**</p>",
            "```html <h3>x</h3>```",
            "***strange*** markers * here *",
            "",
            "plain text only",
        ];
        for sample in samples {
            let once = normalize_output(sample);
            let twice = normalize_output(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn scores_count_indicators() {
        assert_eq!(markdown_score("# Title\n- a\n- b\n**x**"), 4);
        assert_eq!(markup_score("<h3>a</h3><p>b</p>"), 4);
    }
}
