use crate::ids::{ProgramId, QuotaId};
use thiserror::Error;

/// The single error type threaded through the algorithm and orchestration
/// crates. `sc_io` wraps lower-level I/O failures into `Io` at its boundary;
/// nothing downstream ever sees a `csv::Error` or `std::io::Error` directly.
#[derive(Debug, Error)]
pub enum ScError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid secured enrollment for applicant {applicant_id}: {reason}")]
    InvalidSecuredEnrollment { applicant_id: i64, reason: String },

    #[error("missing priority profile transition for profile {profile} at quota {quota}")]
    MissingTransition { profile: i64, quota: QuotaId },

    #[error("matching error: no program found for ({program_id}, {quota_id})")]
    MatchingError {
        program_id: ProgramId,
        quota_id: QuotaId,
    },

    #[error("I/O error: {0}")]
    Io(String),
}
