use crate::{
    models::domain::Record,
    services::{record_extractor::QUESTION_TAG, text_helpers::escape_html},
};

/// Reassembles output from surviving records only. The leading header and
/// the sources section are carried over verbatim.
pub fn rebuild_html(
    leading_header: Option<&str>,
    records: &[Record],
    sources_html: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(records.len() + 2);

    if let Some(header) = leading_header.filter(|h| !h.trim().is_empty()) {
        parts.push(header.trim().to_string());
    }
    for record in records {
        parts.push(format!(
            "<{tag}>{}</{tag}>\n{}",
            escape_html(&record.question),
            record.answer_html.trim(),
            tag = QUESTION_TAG
        ));
    }
    if let Some(sources) = sources_html.filter(|s| !s.trim().is_empty()) {
        parts.push(sources.trim().to_string());
    }

    parts.join("\n")
}
