use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("seed must be a valid u64, got '{0}'")]
    BadSeed(String),
    #[error("path '{0}' does not exist")]
    NotFound(PathBuf),
}

/// Runs a deferred-acceptance matching pass over the seven tabular input
/// relations and writes the result rows to `--out`.
#[derive(Debug, Parser)]
#[command(name = "sc_match", version, about)]
pub struct Args {
    /// Directory containing vacancies.csv, applicants.csv, applications.csv,
    /// priority_profiles.csv, quota_order.csv, siblings.csv, links.csv.
    #[arg(long)]
    pub input_dir: PathBuf,

    /// Where to write the result CSV.
    #[arg(long)]
    pub out: PathBuf,

    /// Grade processing order. Defaults to descending, matching the
    /// original engine's default.
    #[arg(long, value_enum, default_value_t = OrderArg::Descending)]
    pub order: OrderArg,

    /// Skip the pre-flight input validation pass.
    #[arg(long)]
    pub skip_input_checks: bool,

    /// program_id carrying secured-enrollment semantics, if any.
    #[arg(long)]
    pub se_program_id: Option<i64>,

    /// quota_id paired with --se-program-id.
    #[arg(long)]
    pub se_quota_id: Option<i64>,

    /// Enable dynamic sibling-priority upgrades between grades. Off by default.
    #[arg(long)]
    pub sibling_priority_activation: bool,

    /// Enable linked-postulation reordering between grades. Off by default.
    #[arg(long)]
    pub linked_postulation_activation: bool,

    /// Enable secured-enrollment postulation truncation. Off by default.
    #[arg(long)]
    pub secured_enrollment_assignment: bool,

    /// Enable forced secured-enrollment assignment after the regular round,
    /// independent of --secured-enrollment-assignment. Off by default.
    #[arg(long)]
    pub forced_secured_enrollment_assignment: bool,

    /// Enable transferring unfilled special-queue capacity into the regular
    /// queue. Off by default.
    #[arg(long)]
    pub transfer_capacity_activation: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OrderArg {
    Ascending,
    Descending,
}

impl From<OrderArg> for sc_core::Order {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Ascending => sc_core::Order::Ascending,
            OrderArg::Descending => sc_core::Order::Descending,
        }
    }
}

pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    if !args.input_dir.exists() {
        return Err(CliError::NotFound(args.input_dir.clone()));
    }
    Ok(args)
}
