//! Tabular CSV I/O for the school-choice engine: loading the seven input
//! relations, pre-flight validation, the result writer, and the
//! lottery-number collaborator boundary. Nothing in this crate understands
//! the matching algorithm itself.

pub mod lottery;
pub mod tables;
pub mod validate;
pub mod writer;

pub use lottery::{LotteryGenerator, NoLotteryGenerator};
pub use tables::{
    load_rows, ApplicantRow, ApplicationRow, LinkRow, PriorityProfileRow, QuotaOrderRow,
    SiblingRow, VacancyRow,
};
pub use validate::{check_inputs, report_to_result, InputTables, Severity, ValidationIssue, ValidationReport};
pub use writer::{write_results, ResultRow};
