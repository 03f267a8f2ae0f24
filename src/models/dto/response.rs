use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{AttemptDiagnostic, Record, RejectedRecord};

/// How the extractor found records in the accepted output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    StructuralWalk,
    LegacyPattern,
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    pub attempts: u32,
    pub requested: usize,
    pub added: usize,
    pub dropped_duplicates: usize,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    pub attempts: Vec<AttemptDiagnostic>,
    pub rejected: Vec<RejectedRecord>,
    pub extraction_strategy: ExtractionStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillReport>,
    pub guard_rewrote: bool,
    pub rebuilt: bool,
}

/// Everything the persistence layer needs from one successful call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub context_tag: String,
    pub final_html: String,
    pub raw_text: String,
    pub records: Vec<Record>,
    pub attempts_used: u32,
    pub diagnostics: PipelineDiagnostics,
    pub generated_at: DateTime<Utc>,
}

impl PipelineOutcome {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Terminal failure payload: every attempt's reason plus the last output seen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExhaustedReport {
    pub attempts: Vec<AttemptDiagnostic>,
    pub last_raw: String,
    pub last_normalized: String,
}

impl ExhaustedReport {
    pub fn reason_codes(&self) -> Vec<&'static str> {
        self.attempts.iter().map(|a| a.reason.code()).collect()
    }
}
