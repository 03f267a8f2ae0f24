use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{
    models::{domain::Variant, dto::request::GenerateFaqRequest},
    services::text_helpers::truncate_chars,
};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([a-z_]+)\}").expect("PLACEHOLDER_RE is a valid regex pattern")
});

/// Values available to a prompt template.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub title: String,
    pub url: String,
    pub source_text: String,
    pub language: String,
    pub region: Option<String>,
    pub allow_external_links: bool,
    pub variant: Variant,
    pub faq_count: usize,
    pub banned_phrases: Vec<String>,
    pub angle: Option<String>,
    pub existing_questions: Vec<String>,
}

impl PromptContext {
    pub fn from_request(request: &GenerateFaqRequest) -> Self {
        Self {
            title: request.title.clone(),
            url: request.url.clone(),
            source_text: request.source_text.clone(),
            language: request.language.clone(),
            region: request.region.clone(),
            allow_external_links: request.allow_external_links,
            variant: request.variant,
            faq_count: request.variant.target_count(),
            banned_phrases: request.banned_phrases.clone(),
            angle: request.angle.clone(),
            existing_questions: Vec::new(),
        }
    }

    pub fn with_faq_count(mut self, count: usize) -> Self {
        self.faq_count = count;
        self
    }

    pub fn with_existing_questions(mut self, questions: Vec<String>) -> Self {
        self.existing_questions = questions;
        self
    }

    fn link_policy(&self) -> &'static str {
        if self.allow_external_links {
            "You may link to authoritative external sources with <a href=\"...\" target=\"_blank\" rel=\"noopener\">."
        } else {
            "Do not include any links."
        }
    }

    fn values(&self, max_source_chars: usize) -> HashMap<&'static str, String> {
        let banned = if self.banned_phrases.is_empty() {
            "none".to_string()
        } else {
            self.banned_phrases
                .iter()
                .map(|p| format!("\"{}\"", p.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let existing = if self.existing_questions.is_empty() {
            "- none".to_string()
        } else {
            self.existing_questions
                .iter()
                .map(|q| format!("- {}", q))
                .collect::<Vec<_>>()
                .join("\n")
        };

        HashMap::from([
            ("title", self.title.trim().to_string()),
            ("url", self.url.trim().to_string()),
            (
                "source_text",
                truncate_chars(self.source_text.trim(), max_source_chars).to_string(),
            ),
            ("language", self.language.clone()),
            (
                "region",
                self.region.clone().unwrap_or_else(|| "unspecified".to_string()),
            ),
            ("link_policy", self.link_policy().to_string()),
            ("variant", self.variant.to_string()),
            ("faq_count", self.faq_count.to_string()),
            ("banned_phrases", banned),
            (
                "angle",
                self.angle
                    .clone()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| "general overview".to_string()),
            ),
            ("existing_questions", existing),
        ])
    }
}

/// Substitutes every recognized `{placeholder}` in `template`. Unknown
/// placeholders are kept verbatim.
pub fn compose_prompt(template: &str, context: &PromptContext, max_source_chars: usize) -> String {
    let values = context.values(max_source_chars);
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PromptContext {
        PromptContext {
            title: "Heat Pumps".to_string(),
            url: "https://example.com/heat".to_string(),
            source_text: "Heat pumps move heat.".to_string(),
            language: "English".to_string(),
            faq_count: 8,
            ..PromptContext::default()
        }
    }

    #[test]
    fn substitutes_known_placeholders() {
        let prompt = compose_prompt("{title} at {url}: {faq_count} items", &context(), 100);
        assert_eq!(prompt, "Heat Pumps at https://example.com/heat: 8 items");
    }

    #[test]
    fn leaves_unknown_placeholders_intact() {
        let prompt = compose_prompt("{title} {nonsense} {Title}", &context(), 100);
        assert_eq!(prompt, "Heat Pumps {nonsense} {Title}");
    }

    #[test]
    fn truncates_source_text() {
        let mut ctx = context();
        ctx.source_text = "abcdefghij".to_string();
        assert_eq!(compose_prompt("{source_text}", &ctx, 4), "abcd");
    }

    #[test]
    fn link_policy_follows_flag() {
        let mut ctx = context();
        assert_eq!(compose_prompt("{link_policy}", &ctx, 100), "Do not include any links.");
        ctx.allow_external_links = true;
        assert!(compose_prompt("{link_policy}", &ctx, 100).contains("target=\"_blank\""));
    }

    #[test]
    fn variation_directives_have_defaults() {
        let mut ctx = context();
        assert_eq!(compose_prompt("{banned_phrases}|{angle}", &ctx, 100), "none|general overview");

        ctx.banned_phrases = vec!["game changer".to_string(), "unlock".to_string()];
        ctx.angle = Some("costs".to_string());
        assert_eq!(
            compose_prompt("{banned_phrases}|{angle}", &ctx, 100),
            "\"game changer\", \"unlock\"|costs"
        );
    }

    #[test]
    fn existing_questions_render_as_list() {
        let ctx = context().with_existing_questions(vec![
            "What is a heat pump?".to_string(),
            "How much does it cost?".to_string(),
        ]);
        assert_eq!(
            compose_prompt("{existing_questions}", &ctx, 100),
            "- What is a heat pump?\n- How much does it cost?"
        );
    }

    #[test]
    fn from_request_uses_variant_target() {
        let request = GenerateFaqRequest::new("T", "https://example.com", "text")
            .with_variant(Variant::Long);
        let ctx = PromptContext::from_request(&request);
        assert_eq!(ctx.faq_count, 10);
        assert_eq!(compose_prompt("{variant}", &ctx, 100), "long");
    }
}
