use thiserror::Error;

use crate::models::dto::response::ExhaustedReport;

/// Failure of a single call to the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation returned no text")]
    Empty,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Exhausted retries after {} attempts", .0.attempts.len())]
    ExhaustedRetries(Box<ExhaustedReport>),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "invalid_request",
            AppError::ExhaustedRetries(_) => "exhausted_retries",
            AppError::FetchError(_) => "fetch_failed",
            AppError::InternalError(_) => "internal_error",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{AttemptDiagnostic, ValidationReason};

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::ValidationError("test".into()).error_code(),
            "invalid_request"
        );
        assert_eq!(
            AppError::FetchError("test".into()).error_code(),
            "fetch_failed"
        );
        let report = ExhaustedReport {
            attempts: vec![],
            last_raw: String::new(),
            last_normalized: String::new(),
        };
        assert_eq!(
            AppError::ExhaustedRetries(Box::new(report)).error_code(),
            "exhausted_retries"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::ValidationError("title is empty".into());
        assert_eq!(err.to_string(), "Validation error: title is empty");

        let report = ExhaustedReport {
            attempts: vec![
                AttemptDiagnostic::new(1, 0.7, ValidationReason::EmptyOutput),
                AttemptDiagnostic::new(2, 0.85, ValidationReason::NoHeadings),
            ],
            last_raw: String::new(),
            last_normalized: String::new(),
        };
        let err = AppError::ExhaustedRetries(Box::new(report));
        assert_eq!(err.to_string(), "Exhausted retries after 2 attempts");
    }

    #[test]
    fn test_generation_error_messages() {
        assert_eq!(GenerationError::Timeout(90).to_string(), "generation timed out after 90s");
        assert_eq!(
            GenerationError::Transport("connection reset".into()).to_string(),
            "transport error: connection reset"
        );
    }
}
