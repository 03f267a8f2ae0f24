use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::{
    config::PipelineConfig,
    models::{
        domain::{record::content_hash, Record, RejectedRecord, RejectionReason},
        dto::response::ExtractionStrategy,
    },
    services::{
        quality_filter::QualityFilter,
        similarity::is_near_duplicate,
        text_helpers::{collapse_whitespace, element_plain_text, escape_html, html_to_plain},
    },
};

pub const QUESTION_TAG: &str = "h3";

/// Elements whose markup is carried into a record's answer.
const ANSWER_TAGS: &[&str] = &[
    "p", "ul", "ol", "strong", "b", "em", "i", "a", "br", "span", "blockquote",
];

static SOURCES_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:sources?|references?|citations?|further reading)\s*:?\s*$")
        .expect("SOURCES_HEADING_RE is a valid regex pattern")
});
static BLOCK_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:p|div|li|br|h[1-6]|ul|ol|tr|blockquote)\b[^>]*>")
        .expect("BLOCK_BREAK_RE is a valid regex pattern")
});
static SINGLE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^q(?:uestion)?\s*\d*\s*[:.)]\s*(.+?)\s+a(?:nswer)?\s*[:.)]\s*(.+)$")
        .expect("SINGLE_LINE_RE is a valid regex pattern")
});
static QUESTION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^q(?:uestion)?\s*\d*\s*[:.)]\s*(.+)$")
        .expect("QUESTION_LINE_RE is a valid regex pattern")
});
static ANSWER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^a(?:nswer)?\s*[:.)]\s*(.+)$").expect("ANSWER_LINE_RE is a valid regex pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    question: String,
    answer_html: String,
    answer_plain: String,
}

impl Candidate {
    fn new(question: String, answer_html: String) -> Self {
        let answer_plain = html_to_plain(&answer_html);
        Self {
            question,
            answer_html,
            answer_plain,
        }
    }
}

#[derive(Debug, Default)]
struct StructuralParse {
    candidates: Vec<Candidate>,
    leading_header: Option<String>,
    sources_html: Option<String>,
}

/// Result of parsing one normalized output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedRecord>,
    pub strategy: ExtractionStrategy,
    /// Candidates found before any filtering.
    pub candidate_count: usize,
    pub leading_header: Option<String>,
    pub sources_html: Option<String>,
}

impl Extraction {
    pub fn clean_count(&self) -> usize {
        self.records.len()
    }
}

#[derive(Debug, Clone)]
pub struct RecordExtractor {
    filter: QualityFilter,
    similarity_threshold: f64,
}

impl RecordExtractor {
    pub fn new(filter: QualityFilter, similarity_threshold: f64) -> Self {
        Self {
            filter,
            similarity_threshold,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            QualityFilter::new(config.quality.clone()),
            config.similarity_threshold,
        )
    }

    pub fn filter(&self) -> &QualityFilter {
        &self.filter
    }

    pub fn extract(&self, html: &str) -> Extraction {
        let structural = structural_walk(html);
        let (candidates, strategy, leading_header, sources_html) =
            if !structural.candidates.is_empty() {
                (
                    structural.candidates,
                    ExtractionStrategy::StructuralWalk,
                    structural.leading_header,
                    structural.sources_html,
                )
            } else {
                let legacy = legacy_candidates(html);
                let strategy = if legacy.is_empty() {
                    ExtractionStrategy::None
                } else {
                    ExtractionStrategy::LegacyPattern
                };
                (legacy, strategy, None, None)
            };

        let candidate_count = candidates.len();
        let mut records: Vec<Record> = Vec::with_capacity(candidate_count);
        let mut rejected = Vec::new();

        for candidate in candidates {
            let verdict = self.filter.check(
                &candidate.question,
                &candidate.answer_plain,
                &candidate.answer_html,
            );
            let reason = match verdict.reason {
                Some(reason) => Some(reason),
                None => self.batch_conflict(&records, &candidate),
            };

            match reason {
                Some(reason) => {
                    log::debug!(
                        "dropping record '{}': {}",
                        candidate.question,
                        reason
                    );
                    rejected.push(RejectedRecord {
                        question: candidate.question,
                        answer_plain: candidate.answer_plain,
                        reason,
                    });
                }
                None => records.push(Record::new(
                    candidate.question,
                    candidate.answer_plain,
                    candidate.answer_html,
                )),
            }
        }

        Extraction {
            records,
            rejected,
            strategy,
            candidate_count,
            leading_header,
            sources_html,
        }
    }

    fn batch_conflict(&self, kept: &[Record], candidate: &Candidate) -> Option<RejectionReason> {
        let hash = content_hash(&candidate.question, &candidate.answer_plain);
        if kept.iter().any(|r| r.content_hash == hash) {
            return Some(RejectionReason::DuplicateContent);
        }
        if is_near_duplicate(
            &candidate.question,
            kept.iter().map(|r| r.question.as_str()),
            self.similarity_threshold,
        ) {
            return Some(RejectionReason::SimilarQuestion);
        }
        None
    }
}

fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn is_subheading(tag: &str) -> bool {
    matches!(tag, "h4" | "h5" | "h6")
}

fn contains_heading(element: ElementRef<'_>) -> bool {
    element.descendants().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| is_heading(el.name()))
    })
}

/// Walks the fragment in document order. Each question heading opens a
/// record and a sources heading ends the walk, keeping everything after it
/// verbatim. While a record is open, `h4`-`h6` belong to its answer; any
/// other heading closes it. Containers are entered only when they hold a
/// heading.
fn structural_walk(html: &str) -> StructuralParse {
    let fragment = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse(QUESTION_TAG) else {
        return StructuralParse::default();
    };
    if fragment.select(&selector).next().is_none() {
        return StructuralParse::default();
    }

    let mut walker = Walker::default();
    walker.walk(fragment.root_element());
    walker.finish()
}

#[derive(Default)]
struct Walker {
    parse: StructuralParse,
    current: Option<(String, String)>,
    seen_question: bool,
    sources: Option<String>,
}

impl Walker {
    fn walk(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            if let Some(buf) = self.sources.as_mut() {
                match child.value() {
                    Node::Text(text) => buf.push_str(&escape_html(text)),
                    Node::Element(_) => {
                        if let Some(el) = ElementRef::wrap(child) {
                            buf.push_str(&el.html());
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match child.value() {
                Node::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some((_, answer)) = self.current.as_mut() {
                        answer.push_str(&format!("<p>{}</p>", escape_html(trimmed)));
                    }
                }
                Node::Element(el) => {
                    let Some(el_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let name = el.name();
                    if is_heading(name) {
                        self.heading(name, el_ref);
                    } else if ANSWER_TAGS.contains(&name) {
                        if let Some((_, answer)) = self.current.as_mut() {
                            answer.push_str(&el_ref.html());
                        }
                    } else if contains_heading(el_ref) {
                        self.walk(el_ref);
                    }
                }
                _ => {}
            }
        }
    }

    fn heading(&mut self, name: &str, el_ref: ElementRef<'_>) {
        let text = element_plain_text(el_ref);
        if SOURCES_HEADING_RE.is_match(&text) {
            self.flush();
            self.sources = Some(el_ref.html());
        } else if name == QUESTION_TAG {
            self.flush();
            self.seen_question = true;
            self.current = Some((text, String::new()));
        } else if is_subheading(name) && self.current.is_some() {
            if let Some((_, answer)) = self.current.as_mut() {
                answer.push_str(&el_ref.html());
            }
        } else {
            self.flush();
            if !self.seen_question && self.parse.leading_header.is_none() {
                self.parse.leading_header = Some(el_ref.html());
            }
        }
    }

    fn flush(&mut self) {
        if let Some((question, answer)) = self.current.take() {
            self.parse.candidates.push(Candidate::new(question, answer));
        }
    }

    fn finish(mut self) -> StructuralParse {
        self.flush();
        self.parse.sources_html = self.sources;
        self.parse
    }
}

/// Older templates emitted `Question: … Answer: …` pairs, either on one
/// line or split across two adjacent blocks.
fn legacy_candidates(html: &str) -> Vec<Candidate> {
    let broken = BLOCK_BREAK_RE.replace_all(html, "\n");
    let lines: Vec<String> = broken
        .lines()
        .map(html_to_plain)
        .map(|l| collapse_whitespace(&l))
        .filter(|l| !l.is_empty())
        .collect();

    let mut candidates = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(caps) = SINGLE_LINE_RE.captures(&lines[i]) {
            candidates.push(legacy_candidate(&caps[1], &caps[2]));
            i += 1;
            continue;
        }
        if let (Some(q), Some(a)) = (
            QUESTION_LINE_RE.captures(&lines[i]),
            lines.get(i + 1).and_then(|next| ANSWER_LINE_RE.captures(next)),
        ) {
            candidates.push(legacy_candidate(&q[1], &a[1]));
            i += 2;
            continue;
        }
        i += 1;
    }
    candidates
}

fn legacy_candidate(question: &str, answer: &str) -> Candidate {
    let answer = answer.trim();
    Candidate {
        question: question.trim().to_string(),
        answer_html: format!("<p>{}</p>", escape_html(answer)),
        answer_plain: answer.to_string(),
    }
}
