mod args;

use args::Args;
use sc_pipeline::{InputPaths, RunConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = match args::parse_and_validate() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let table = |name: &str| -> PathBuf { args.input_dir.join(name) };

    let vacancies = table("vacancies.csv");
    let applicants = table("applicants.csv");
    let applications = table("applications.csv");
    let priority_profiles = table("priority_profiles.csv");
    let quota_order = table("quota_order.csv");
    let siblings = table("siblings.csv");
    let links = table("links.csv");

    let paths = InputPaths {
        vacancies: &vacancies,
        applicants: &applicants,
        applications: &applications,
        priority_profiles: &priority_profiles,
        quota_order: &quota_order,
        siblings: &siblings,
        links: &links,
    };

    let config = RunConfig {
        order: args.order.into(),
        check_inputs: !args.skip_input_checks,
        se_program_id: args.se_program_id,
        se_quota_id: args.se_quota_id,
        sibling_priority_activation: args.sibling_priority_activation,
        linked_postulation_activation: args.linked_postulation_activation,
        secured_enrollment_assignment: args.secured_enrollment_assignment,
        forced_secured_enrollment_assignment: args.forced_secured_enrollment_assignment,
        transfer_capacity_activation: args.transfer_capacity_activation,
    };

    let rows = sc_pipeline::run_from_paths_default_lottery(&paths, &config).map_err(|e| e.to_string())?;

    sc_io::write_results(&args.out, &rows).map_err(|e| e.to_string())?;

    tracing::info!(matched = rows.iter().filter(|r| r.matched_program_id.is_some()).count(), total = rows.len(), "matching complete");

    Ok(())
}
