//! Typed row shapes for the seven tabular input relations, plus the
//! generic CSV loader they share.

use sc_core::ScError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One row of the program-vacancies table. `extra` captures the dynamic
/// `special_{k}_vacancies` columns, sniffed by `sc_pipeline` at assembly
/// time rather than here — `sc_io` doesn't know the domain meaning of a
/// column name, only how to get it off the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct VacancyRow {
    pub program_id: i64,
    pub quota_id: i64,
    pub institution_id: i64,
    pub grade_id: i64,
    pub regular_vacancies: i64,
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicantRow {
    pub applicant_id: i64,
    pub se_program_id: Option<i64>,
    pub se_quota_id: Option<i64>,
    #[serde(flatten)]
    pub characteristics: HashMap<String, String>,
}

/// One postulation slot. `order` is the applicant's ranking of this slot
/// (ascending = more preferred); rows are sorted by `(applicant_id, order)`
/// when assembled into an `Applicant`'s postulation vector.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationRow {
    pub applicant_id: i64,
    pub program_id: i64,
    pub quota_id: i64,
    pub order: i64,
    pub priority: i64,
    pub priority_profile: i64,
    pub lottery_number_quota: Option<f64>,
    /// Which of the program's queues this postulation slot targets:
    /// `0` for the regular queue, or a numbered special pool. Defaults to
    /// the regular queue when the column is absent.
    #[serde(default)]
    pub assignment_type: i64,
}

/// priority_profile x quota_id -> destination priority profile, plus the
/// priority value the applicant receives once transitioned there.
#[derive(Debug, Clone, Deserialize)]
pub struct PriorityProfileRow {
    pub priority_profile: i64,
    pub quota_id: i64,
    pub destination_profile: i64,
    pub priority: i64,
}

/// A quota-order rule row: for `priority_profile`, optionally gated by a
/// characteristic clause, try quotas in `ordered_quotas` (comma-separated,
/// in priority order).
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaOrderRow {
    pub priority_profile: i64,
    pub attribute: Option<String>,
    pub criterion: Option<String>,
    pub reference_value: Option<String>,
    pub ordered_quotas: String,
}

/// A sibling relationship: `applicant_id` has `sibling_id` as a sibling.
/// The institution that upgrades `applicant_id`'s priority profile is
/// resolved at assembly/matching time from wherever `sibling_id` is
/// currently matched, not stored directly on this row.
#[derive(Debug, Clone, Deserialize)]
pub struct SiblingRow {
    pub applicant_id: i64,
    pub sibling_id: i64,
}

/// A linked-postulation relationship between two applicants (e.g.
/// siblings applying together) whose postulation order should be kept in
/// step across the grades named.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkRow {
    pub applicant_id: i64,
    pub linked_applicant_id: i64,
    pub grade_id: i64,
}

/// Reads a CSV file at `path` into a `Vec<T>`, wrapping any I/O or parse
/// failure into `ScError::Io` so callers never see a raw `csv::Error`.
pub fn load_rows<T>(path: &Path) -> Result<Vec<T>, ScError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ScError::Io(format!("{}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.map_err(|e| ScError::Io(format!("{}: {}", path.display(), e)))?;
        rows.push(row);
    }
    Ok(rows)
}
