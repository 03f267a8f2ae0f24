pub const FAQ_SYSTEM_PROMPT: &str = "You write FAQ sections for web pages. You answer only with clean HTML fragments using the elements you are told to use. You never include code, error messages, commentary about yourself, or Markdown.";

pub const FAQ_SHORT_TEMPLATE: &str = "Write an FAQ section for the page below.

PAGE TITLE: {title}
PAGE URL: {url}
LANGUAGE: {language}
REGION: {region}

## OUTPUT FORMAT

- Start with <h2>Frequently Asked Questions</h2>
- Write exactly {faq_count} questions. Wrap each question in <h3> and its answer in one or two <p> elements.
- Keep each answer between 40 and 80 words. Answers may use <ul>, <ol>, <li>, <strong> and <em>.
- {link_policy}
- Return only the HTML fragment. No Markdown, no code fences, no preamble.

## CONTENT RULES

- Base every answer on the source text. Do not invent prices, dates or statistics.
- Cover distinct topics; never ask the same thing twice in different words.
- Avoid these phrases entirely: {banned_phrases}
- Focus angle for this batch: {angle}

## SOURCE TEXT

{source_text}";

pub const FAQ_LONG_TEMPLATE: &str = "Write a detailed FAQ section for the page below.

PAGE TITLE: {title}
PAGE URL: {url}
LANGUAGE: {language}
REGION: {region}

## OUTPUT FORMAT

- Start with <h2>Frequently Asked Questions</h2>
- Write exactly {faq_count} questions. Wrap each question in <h3> and its answer in two or three <p> elements.
- Keep each answer between 80 and 150 words. Answers may use <ul>, <ol>, <li>, <strong> and <em>.
- {link_policy}
- If you cite external pages, finish with <h2>Sources</h2> followed by a <ul> of links.
- Return only the HTML fragment. No Markdown, no code fences, no preamble.

## CONTENT RULES

- Base every answer on the source text. Do not invent prices, dates or statistics.
- Cover distinct topics; never ask the same thing twice in different words.
- Avoid these phrases entirely: {banned_phrases}
- Focus angle for this batch: {angle}

## SOURCE TEXT

{source_text}";

pub const FAQ_FILL_TEMPLATE: &str = "Write {faq_count} additional FAQ entries for the page below.

PAGE TITLE: {title}
PAGE URL: {url}
LANGUAGE: {language}

These questions already exist. Do not repeat or rephrase any of them:
{existing_questions}

## OUTPUT FORMAT

- Wrap each question in <h3> and its answer in one or two <p> elements.
- Keep each answer between 40 and 80 words.
- {link_policy}
- Return only the HTML fragment. No headings other than <h3>, no Markdown, no code fences.

## SOURCE TEXT

{source_text}";

pub const FAQ_REWRITE_TEMPLATE: &str = "The FAQ below is too similar to FAQs already published for other pages. Rewrite every question and answer with different wording and examples while keeping the same facts and the same HTML structure (<h2>, <h3>, <p>, lists).

Return only the rewritten HTML fragment.

{source_text}";

/// Instruction fragments that must never show up inside a generated answer.
pub const PROMPT_ECHO_MARKERS: &[&str] = &[
    "page title:",
    "page url:",
    "source text:",
    "output format",
    "content rules",
    "return only the html",
    "no markdown, no code fences",
    "wrap each question in",
    "keep each answer between",
    "write exactly",
    "focus angle for this batch",
    "avoid these phrases",
    "these questions already exist",
    "as an ai language model",
    "as an ai model",
    "i cannot browse",
    "here is the faq",
    "here are the faqs",
    "here's the faq",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_templates_carry_core_placeholders() {
        for template in [FAQ_SHORT_TEMPLATE, FAQ_LONG_TEMPLATE] {
            for placeholder in [
                "{title}",
                "{url}",
                "{source_text}",
                "{faq_count}",
                "{link_policy}",
                "{banned_phrases}",
                "{angle}",
            ] {
                assert!(template.contains(placeholder), "missing {}", placeholder);
            }
        }
    }

    #[test]
    fn fill_template_excludes_existing_questions() {
        assert!(FAQ_FILL_TEMPLATE.contains("{existing_questions}"));
        assert!(FAQ_FILL_TEMPLATE.contains("{faq_count}"));
    }

    #[test]
    fn echo_markers_are_lowercase() {
        assert!(PROMPT_ECHO_MARKERS
            .iter()
            .all(|m| m.to_lowercase() == *m));
    }
}
