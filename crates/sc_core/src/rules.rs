use crate::criterion::Criterion;
use crate::ids::{GradeId, ProgramId, QuotaId};
use std::collections::BTreeMap;

/// Direction the policy driver walks the grade sequence in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Default for Order {
    fn default() -> Self {
        Order::Descending
    }
}

/// A single clause of a quota-order rule: a characteristic name, a
/// criterion, and a reference value compared against the applicant's
/// dynamic characteristics.
#[derive(Debug, Clone)]
pub struct RuleClause {
    pub attribute: String,
    pub criterion: Criterion,
    pub reference: crate::criterion::AttributeValue,
}

/// One row of the quota-order table: for a given priority profile, an
/// ordered list of quotas to try, gated by an optional clause.
#[derive(Debug, Clone)]
pub struct QuotaOrderRule {
    pub priority_profile: i64,
    pub clause: Option<RuleClause>,
    pub ordered_quotas: Vec<QuotaId>,
}

/// The immutable run-wide configuration, built once and never mutated
/// afterward (mirrors the teacher's params layer).
#[derive(Debug, Clone)]
pub struct Rules {
    pub order: Order,
    pub check_inputs: bool,
    /// Enables the §4.4 step-3 dynamic sibling-priority mutation. Default false.
    pub sibling_priority_activation: bool,
    /// Enables the §4.4 step-3 linked-postulation reorder. Default false.
    pub linked_postulation_activation: bool,
    /// Enables §4.4 step-5 secured-enrollment postulation truncation. Default false.
    pub secured_enrollment_assignment: bool,
    /// Enables §4.4 step-7 forced secured-enrollment assignment, independent
    /// of `secured_enrollment_assignment`. Default false.
    pub forced_secured_enrollment_assignment: bool,
    /// Enables §4.4 step-7 special-to-regular capacity transfer. Default false.
    pub transfer_capacity_activation: bool,
    /// priority_profile -> (quota_id -> destination priority_profile), the
    /// sibling-priority transition table.
    pub priority_profile_sibling_transition: BTreeMap<i64, BTreeMap<QuotaId, i64>>,
    /// (quota_id, destination priority_profile) -> new priority value.
    pub priority_by_quota_and_profile: BTreeMap<(QuotaId, i64), i64>,
    /// Quota reorder rules, keyed loosely by priority_profile; matched in
    /// table order, first clause match wins.
    pub quota_order_rules: Vec<QuotaOrderRule>,
    /// program_id used for secured enrollment, if the run has SE applicants.
    pub se_program_id: Option<ProgramId>,
    pub se_quota_id: Option<QuotaId>,
    /// grades visited, in source order before `order` is applied.
    pub grades: Vec<GradeId>,
}

impl Rules {
    pub fn lookup_transition(&self, priority_profile: i64, quota_id: QuotaId) -> Option<i64> {
        self.priority_profile_sibling_transition
            .get(&priority_profile)
            .and_then(|by_quota| by_quota.get(&quota_id))
            .copied()
    }

    pub fn lookup_priority(&self, quota_id: QuotaId, destination_profile: i64) -> Option<i64> {
        self.priority_by_quota_and_profile
            .get(&(quota_id, destination_profile))
            .copied()
    }
}
