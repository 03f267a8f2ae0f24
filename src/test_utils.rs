#[cfg(test)]
pub mod fixtures {
    use std::ops::Range;

    pub const FAQ_HEADER: &str = "<h2>Frequently Asked Questions</h2>";

    const QUESTIONS: &[&str] = &[
        "What is an air source heat pump?",
        "How much does installation usually cost?",
        "Can I get a government grant?",
        "Will my existing radiators still work?",
        "How noisy is the outdoor unit?",
        "Does it work during freezing winters?",
        "Who should service the system each year?",
        "Is planning permission ever required?",
        "What maintenance keeps efficiency high?",
        "Can solar panels power the pump?",
        "How long do these systems last?",
        "Where is the best spot for the fan unit?",
    ];

    const ANSWERS: &[&str] = &[
        "An air source heat pump draws warmth from outdoor air and moves it indoors, using a small amount of electricity to run the compressor and fans.",
        "Installation prices vary with property size, insulation levels and the model chosen, so most households should request several written quotes from certified installers before deciding.",
        "Many regions offer grants or rebates for low carbon heating, and eligibility usually depends on the age of the property and whether an energy assessment is complete.",
        "Most modern radiators work well, although some rooms may need larger emitters because a heat pump runs at lower flow temperatures than a typical gas boiler.",
        "A well sited outdoor unit produces a steady hum similar to a refrigerator, and manufacturers publish sound ratings so you can compare quieter models before buying.",
        "Cold climate models keep heating homes well below freezing, although efficiency drops on the coldest days and a correctly sized unit matters more than ever.",
        "An accredited engineer should inspect the refrigerant circuit, clean the filters and check the controls once a year to keep the warranty valid and performance steady.",
        "Permission is rarely needed for a single unit on a house, but listed buildings, flats and conservation areas often have extra rules worth checking with your council.",
        "Keeping the outdoor coil free of leaves, cleaning indoor filters and leaving thermostats at steady settings all help the system deliver its rated efficiency for longer.",
        "Solar panels can cover part of the electricity demand during sunny months, which lowers running costs, although winter heating still relies mostly on grid power.",
        "With regular servicing a typical system lasts around fifteen to twenty years, and the compressor is usually the most expensive component to replace later on.",
        "The fan unit needs free airflow, a firm level base and some distance from bedroom windows, so a side or rear wall is often the best choice.",
    ];

    /// Distinct, filter-clean question. Indices wrap after twelve.
    pub fn question_text(index: usize) -> &'static str {
        QUESTIONS[index % QUESTIONS.len()]
    }

    pub fn answer_text(index: usize) -> String {
        ANSWERS[index % ANSWERS.len()].to_string()
    }

    pub fn record_html(index: usize) -> String {
        format!(
            "<h3>{}</h3>\n<p>{}</p>",
            question_text(index),
            answer_text(index)
        )
    }

    /// Records without a section header, as a fill response returns them.
    pub fn records_html(range: Range<usize>) -> String {
        range.map(record_html).collect::<Vec<_>>().join("\n")
    }

    /// A complete FAQ section with `count` clean records.
    pub fn faq_html(count: usize) -> String {
        format!("{}\n{}", FAQ_HEADER, records_html(0..count))
    }
}

#[cfg(test)]
pub mod scripted {
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;

    use crate::{
        errors::GenerationError, models::domain::GenerationRequest,
        services::generation_client::GenerationClient,
    };

    /// Replays canned responses in order and records every request. Once the
    /// script runs out every call returns `GenerationError::Empty`.
    pub struct ScriptedGenerationClient {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerationClient {
        pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn from_texts<I, S>(texts: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self::new(texts.into_iter().map(|t| Ok(t.into())).collect())
        }

        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().expect("requests lock").clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().expect("requests lock").len()
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedGenerationClient {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or(Err(GenerationError::Empty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::scripted::ScriptedGenerationClient;
    use crate::{
        errors::GenerationError, models::domain::GenerationRequest,
        services::generation_client::GenerationClient,
    };

    #[test]
    fn test_faq_html_has_header_and_records() {
        let html = faq_html(2);
        assert!(html.starts_with(FAQ_HEADER));
        assert_eq!(html.matches("<h3>").count(), 2);
    }

    #[test]
    fn test_answers_meet_minimum_length() {
        for i in 0..12 {
            assert!(answer_text(i).split_whitespace().count() >= 15);
        }
    }

    #[tokio::test]
    async fn test_scripted_client_replays_then_runs_dry() {
        let client = ScriptedGenerationClient::from_texts(["one"]);
        let request = GenerationRequest::new("p", "m", 10, 0.7, "tag");

        assert_eq!(client.generate(&request).await, Ok("one".to_string()));
        assert_eq!(client.generate(&request).await, Err(GenerationError::Empty));
        assert_eq!(client.call_count(), 2);
    }
}
