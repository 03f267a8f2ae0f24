use serde::{Deserialize, Serialize};

use crate::models::domain::{record::RejectionReason, validation::ValidationReason};

/// Hard ceiling on whole-output generation attempts per pipeline call.
pub const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// Per-call retry bookkeeping owned by the retry controller.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryState {
    pub attempt: u32,
    pub last_reason: Option<ValidationReason>,
    pub trail: Vec<AttemptDiagnostic>,
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            attempt: 0,
            last_reason: None,
            trail: Vec::new(),
        }
    }

    /// Moves to the next attempt, or returns `None` once the budget is spent.
    pub fn advance(&mut self) -> Option<u32> {
        if self.attempt >= MAX_GENERATION_ATTEMPTS {
            return None;
        }
        self.attempt += 1;
        Some(self.attempt)
    }

    pub fn record(&mut self, diagnostic: AttemptDiagnostic) {
        self.last_reason = Some(diagnostic.reason.clone());
        self.trail.push(diagnostic);
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptDiagnostic {
    pub attempt: u32,
    pub temperature: f32,
    pub reason: ValidationReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub record_count: usize,
    /// Why each dropped record of this attempt was rejected, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectionReason>,
}

impl AttemptDiagnostic {
    pub fn new(attempt: u32, temperature: f32, reason: ValidationReason) -> Self {
        Self {
            attempt,
            temperature,
            reason,
            detail: None,
            record_count: 0,
            rejected: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_record_count(mut self, record_count: usize) -> Self {
        self.record_count = record_count;
        self
    }

    pub fn with_rejected(mut self, rejected: Vec<RejectionReason>) -> Self {
        self.rejected = rejected;
        self
    }
}
