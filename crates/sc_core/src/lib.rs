//! Core, I/O-free types for the school-choice deferred acceptance engine:
//! applicants, assignment queues, programs, ids, the criterion DSL, and
//! run configuration. Nothing in this crate reads a file or touches a
//! clock; `sc_io` and `sc_pipeline` build on top of it.

pub mod applicant;
pub mod criterion;
pub mod error;
pub mod ids;
pub mod program;
pub mod queue;
pub mod rules;

pub use applicant::{Applicant, SECURED_ENROLLMENT_PRIORITY};
pub use criterion::{check_attribute_criteria, AttributeValue, Criterion};
pub use error::ScError;
pub use ids::{ApplicantId, GradeId, InstitutionId, ProgramId, ProgramKey, QuotaId};
pub use program::{Program, REGULAR_ASSIGNMENT_TYPE};
pub use queue::AssignmentQueue;
pub use rules::{Order, QuotaOrderRule, RuleClause, Rules};
