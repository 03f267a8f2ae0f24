pub mod batch;
pub mod generation;
pub mod record;
pub mod retry;
pub mod validation;
pub use batch::{Batch, Variant};
pub use generation::{GenerationRequest, RawOutput};
pub use record::{QualityVerdict, Record, RejectedRecord, RejectionReason};
pub use retry::{AttemptDiagnostic, RetryState, MAX_GENERATION_ATTEMPTS};
pub use validation::{ValidationReason, ValidationResult};
