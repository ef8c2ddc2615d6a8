//! Pre-flight validation of the loaded relations, run when `Rules::check_inputs`
//! is enabled. Ported from `PolicyMaker.check_inputs`: referential integrity
//! across tables, applicant-id uniqueness, and criterion-string sanity.

use crate::tables::{ApplicantRow, ApplicationRow, LinkRow, QuotaOrderRow, SiblingRow, VacancyRow};
use sc_core::{Criterion, ScError};
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn pass(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

/// Bundles references to everything a full validation pass needs to see.
pub struct InputTables<'a> {
    pub vacancies: &'a [VacancyRow],
    pub applicants: &'a [ApplicantRow],
    pub applications: &'a [ApplicationRow],
    pub quota_order: &'a [QuotaOrderRow],
    pub siblings: &'a [SiblingRow],
    pub links: &'a [LinkRow],
}

pub fn check_inputs(tables: &InputTables) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut seen_applicant_ids = HashSet::new();
    for row in tables.applicants {
        if !seen_applicant_ids.insert(row.applicant_id) {
            report.issues.push(ValidationIssue {
                severity: Severity::Error,
                message: format!("duplicate applicant_id {}", row.applicant_id),
            });
        }
    }

    let program_keys: HashSet<(i64, i64)> = tables
        .vacancies
        .iter()
        .map(|v| (v.program_id, v.quota_id))
        .collect();

    for row in tables.applications {
        if !seen_applicant_ids.contains(&row.applicant_id) {
            report.issues.push(ValidationIssue {
                severity: Severity::Error,
                message: format!(
                    "application references unknown applicant_id {}",
                    row.applicant_id
                ),
            });
        }
        if !program_keys.contains(&(row.program_id, row.quota_id)) {
            report.issues.push(ValidationIssue {
                severity: Severity::Error,
                message: format!(
                    "application references unknown program {}/{}",
                    row.program_id, row.quota_id
                ),
            });
        }
    }

    for row in tables.siblings {
        if !seen_applicant_ids.contains(&row.applicant_id) {
            report.issues.push(ValidationIssue {
                severity: Severity::Error,
                message: format!("sibling row references unknown applicant_id {}", row.applicant_id),
            });
        }
    }

    for row in tables.links {
        if !seen_applicant_ids.contains(&row.applicant_id)
            || !seen_applicant_ids.contains(&row.linked_applicant_id)
        {
            report.issues.push(ValidationIssue {
                severity: Severity::Error,
                message: format!(
                    "link row references unknown applicant_id ({}, {})",
                    row.applicant_id, row.linked_applicant_id
                ),
            });
        }
    }

    for row in tables.quota_order {
        if let Some(criterion) = &row.criterion {
            if Criterion::from_token(criterion).is_none() {
                report.issues.push(ValidationIssue {
                    severity: Severity::Error,
                    message: format!("unrecognized criterion token '{}'", criterion),
                });
            }
        }
    }

    let applicants_with_applications: HashSet<i64> =
        tables.applications.iter().map(|a| a.applicant_id).collect();
    for applicant_id in &seen_applicant_ids {
        if !applicants_with_applications.contains(applicant_id) {
            report.issues.push(ValidationIssue {
                severity: Severity::Warning,
                message: format!(
                    "applicant {} has no applications and will be matched to nothing",
                    applicant_id
                ),
            });
        }
    }

    for issue in &report.issues {
        if issue.severity == Severity::Warning {
            warn!("{}", issue.message);
        }
    }

    report
}

/// Converts a failing report into the `InvalidInput` error the rest of the
/// pipeline expects, joining every error-severity issue into one message.
pub fn report_to_result(report: ValidationReport) -> Result<(), ScError> {
    if report.pass() {
        Ok(())
    } else {
        let joined = report
            .issues
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ScError::InvalidInput(joined))
    }
}
