//! Orchestration layer: builds the entity graph from loaded tables, runs
//! the policy driver across every grade and assignment type, and extracts
//! the final result rows. Depends on `sc_core` + `sc_io` + `sc_algo`.

pub mod build;
pub mod driver;
pub mod extract;

pub use build::{build_entity_graph, EntityGraph};
pub use driver::PolicyDriver;
pub use extract::extract_results;

use sc_core::{GradeId, Order, ProgramId, QuotaId, Rules, ScError};
use sc_io::{
    check_inputs, load_rows, report_to_result, ApplicantRow, ApplicationRow, InputTables,
    LinkRow, LotteryGenerator, NoLotteryGenerator, PriorityProfileRow, QuotaOrderRow, ResultRow,
    SiblingRow, VacancyRow,
};
use std::path::Path;

/// Run-wide knobs that mirror the original engine's config dict. The five
/// `*_activation`/`*_assignment` flags all default to `false`, matching the
/// original's "config options default false except order" rule.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub order: Order,
    pub check_inputs: bool,
    pub se_program_id: Option<i64>,
    pub se_quota_id: Option<i64>,
    pub sibling_priority_activation: bool,
    pub linked_postulation_activation: bool,
    pub secured_enrollment_assignment: bool,
    pub forced_secured_enrollment_assignment: bool,
    pub transfer_capacity_activation: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            order: Order::Descending,
            check_inputs: true,
            se_program_id: None,
            se_quota_id: None,
            sibling_priority_activation: false,
            linked_postulation_activation: false,
            secured_enrollment_assignment: false,
            forced_secured_enrollment_assignment: false,
            transfer_capacity_activation: false,
        }
    }
}

/// Paths to the seven input CSV files.
pub struct InputPaths<'a> {
    pub vacancies: &'a Path,
    pub applicants: &'a Path,
    pub applications: &'a Path,
    pub priority_profiles: &'a Path,
    pub quota_order: &'a Path,
    pub siblings: &'a Path,
    pub links: &'a Path,
}

/// Loads every relation, validates, assembles the entity graph, runs the
/// full matching sequence, and returns the result rows. This is the
/// top-level entrypoint `sc_cli` calls, mirroring the original's
/// `PolicyMaker(...).match_applicants_and_programs().get_results()` chain.
pub fn run_from_paths(
    paths: &InputPaths,
    config: &RunConfig,
    lottery: &dyn LotteryGenerator,
) -> Result<Vec<ResultRow>, ScError> {
    let vacancies: Vec<VacancyRow> = load_rows(paths.vacancies)?;
    let applicants: Vec<ApplicantRow> = load_rows(paths.applicants)?;
    let mut applications: Vec<ApplicationRow> = load_rows(paths.applications)?;
    let priority_profiles: Vec<PriorityProfileRow> = load_rows(paths.priority_profiles)?;
    let quota_order: Vec<QuotaOrderRow> = load_rows(paths.quota_order)?;
    let siblings: Vec<SiblingRow> = load_rows(paths.siblings)?;
    let links: Vec<LinkRow> = load_rows(paths.links)?;

    lottery.fill_missing(&mut applications)?;

    if config.check_inputs {
        let tables = InputTables {
            vacancies: &vacancies,
            applicants: &applicants,
            applications: &applications,
            quota_order: &quota_order,
            siblings: &siblings,
            links: &links,
        };
        report_to_result(check_inputs(&tables))?;
    }

    let grades: Vec<GradeId> = {
        let mut g: Vec<GradeId> = vacancies.iter().map(|v| GradeId(v.grade_id)).collect();
        g.sort();
        g.dedup();
        g
    };

    let rules = build::build_rules(
        &priority_profiles,
        &quota_order,
        grades,
        config.se_program_id.map(ProgramId),
        config.se_quota_id.map(QuotaId),
        config.order,
        config.check_inputs,
        config.sibling_priority_activation,
        config.linked_postulation_activation,
        config.secured_enrollment_assignment,
        config.forced_secured_enrollment_assignment,
        config.transfer_capacity_activation,
    );

    let graph = build_entity_graph(&vacancies, &applicants, &applications, &siblings, &links);
    let mut driver = PolicyDriver::new(graph, rules);
    driver.match_applicants_and_programs()?;

    Ok(extract_results(&driver))
}

/// Convenience wrapper for callers that don't need to supply a custom
/// lottery-fallback collaborator.
pub fn run_from_paths_default_lottery(
    paths: &InputPaths,
    config: &RunConfig,
) -> Result<Vec<ResultRow>, ScError> {
    run_from_paths(paths, config, &NoLotteryGenerator)
}
