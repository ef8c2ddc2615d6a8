//! Writes the Result Extractor's output rows to CSV.

use sc_core::ScError;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub applicant_id: i64,
    pub matched_program_id: Option<i64>,
    pub matched_quota_id: Option<i64>,
    pub matched_institution_id: Option<i64>,
    pub grade_id: i64,
    pub assignment_type: i64,
}

pub fn write_results(path: &Path, rows: &[ResultRow]) -> Result<(), ScError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ScError::Io(format!("{}: {}", path.display(), e)))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ScError::Io(format!("{}: {}", path.display(), e)))?;
    }
    writer
        .flush()
        .map_err(|e| ScError::Io(format!("{}: {}", path.display(), e)))?;
    Ok(())
}
