//! The Result Extractor: turns final applicant/program state into the
//! flat output rows `sc_io::write_results` serializes.

use crate::driver::PolicyDriver;
use sc_io::ResultRow;

pub fn extract_results(driver: &PolicyDriver) -> Vec<ResultRow> {
    driver
        .applicants
        .iter()
        .map(|applicant| {
            let matched = applicant.matched_program();
            let institution = matched
                .and_then(|k| driver.programs.get(&k))
                .map(|p| p.institution_id.as_i64());
            let grade = driver
                .applicant_grade()
                .get(&applicant.id)
                .copied()
                .unwrap_or(sc_core::GradeId(0));
            ResultRow {
                applicant_id: applicant.id.as_i64(),
                matched_program_id: matched.map(|k| k.program_id.as_i64()),
                matched_quota_id: matched.map(|k| k.quota_id.as_i64()),
                matched_institution_id: institution,
                grade_id: grade.as_i64(),
                assignment_type: 0,
            }
        })
        .collect()
}
