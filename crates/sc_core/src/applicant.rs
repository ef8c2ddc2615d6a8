use crate::criterion::{check_attribute_criteria, AttributeValue, Criterion};
use crate::error::ScError;
use crate::ids::{ApplicantId, GradeId, InstitutionId, ProgramId, ProgramKey, QuotaId};
use crate::rules::Rules;
use std::collections::{BTreeMap, BTreeSet};

/// Priority value assigned to an applicant's secured-enrollment slot; this
/// is deliberately the best possible priority (lowest value wins).
pub const SECURED_ENROLLMENT_PRIORITY: i64 = 0;

/// One applicant's full postulation and matching state.
///
/// `original_*` fields are the as-loaded, immutable source of truth;
/// the plain fields are the mutable working copy the policy driver
/// reorders and truncates over the course of a run. `reset_matching`
/// restores the working copy from the originals.
#[derive(Debug, Clone)]
pub struct Applicant {
    pub id: ApplicantId,
    pub se_program_id: Option<ProgramId>,
    pub se_quota_id: Option<QuotaId>,
    pub characteristics: BTreeMap<String, AttributeValue>,

    original_postulation: Vec<ProgramId>,
    original_quota_id: Vec<QuotaId>,
    original_institution_id: Vec<InstitutionId>,
    original_assignment_type: Vec<i64>,
    original_priorities: BTreeMap<ProgramKey, i64>,
    original_priority_profile: BTreeMap<ProgramId, i64>,
    scores: BTreeMap<ProgramKey, f64>,

    postulation: Vec<ProgramId>,
    quota_id: Vec<QuotaId>,
    institution_id: Vec<InstitutionId>,
    assignment_type: Vec<i64>,
    priorities: BTreeMap<ProgramKey, i64>,
    priority_profile: BTreeMap<ProgramId, i64>,
    dynamic_priority: Vec<bool>,
    linked_postulation: bool,
    linked_grades: Vec<GradeId>,

    matched: bool,
    matched_program: Option<ProgramKey>,
    cursor: usize,
}

#[allow(clippy::too_many_arguments)]
impl Applicant {
    pub fn new(
        id: ApplicantId,
        postulation: Vec<ProgramId>,
        quota_id: Vec<QuotaId>,
        institution_id: Vec<InstitutionId>,
        priorities: BTreeMap<ProgramKey, i64>,
        priority_profile: BTreeMap<ProgramId, i64>,
        scores: BTreeMap<ProgramKey, f64>,
        characteristics: BTreeMap<String, AttributeValue>,
        se_program_id: Option<ProgramId>,
        se_quota_id: Option<QuotaId>,
    ) -> Self {
        let assignment_type = vec![0i64; postulation.len()];
        Self::new_with_assignment_types(
            id,
            postulation,
            quota_id,
            institution_id,
            assignment_type,
            priorities,
            priority_profile,
            scores,
            characteristics,
            se_program_id,
            se_quota_id,
        )
    }

    /// Same as `new`, but lets each postulation slot name the assignment
    /// type (regular vs. a numbered special pool) it targets within its
    /// program.
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_assignment_types(
        id: ApplicantId,
        postulation: Vec<ProgramId>,
        quota_id: Vec<QuotaId>,
        institution_id: Vec<InstitutionId>,
        assignment_type: Vec<i64>,
        priorities: BTreeMap<ProgramKey, i64>,
        priority_profile: BTreeMap<ProgramId, i64>,
        scores: BTreeMap<ProgramKey, f64>,
        characteristics: BTreeMap<String, AttributeValue>,
        se_program_id: Option<ProgramId>,
        se_quota_id: Option<QuotaId>,
    ) -> Self {
        let mut applicant = Self {
            id,
            se_program_id,
            se_quota_id,
            characteristics,
            original_postulation: postulation.clone(),
            original_quota_id: quota_id.clone(),
            original_institution_id: institution_id.clone(),
            original_assignment_type: assignment_type.clone(),
            original_priorities: priorities.clone(),
            original_priority_profile: priority_profile.clone(),
            scores,
            postulation,
            quota_id,
            institution_id,
            assignment_type,
            priorities,
            priority_profile,
            dynamic_priority: Vec::new(),
            linked_postulation: false,
            linked_grades: Vec::new(),
            matched: false,
            matched_program: None,
            cursor: 0,
        };
        applicant.reset_matching();
        applicant
    }

    pub fn has_se(&self) -> bool {
        self.se_program_id.is_some()
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn matched_program(&self) -> Option<ProgramKey> {
        self.matched_program
    }

    pub fn postulation(&self) -> &[ProgramId] {
        &self.postulation
    }

    pub fn quotas(&self) -> &[QuotaId] {
        &self.quota_id
    }

    pub fn institutions(&self) -> &[InstitutionId] {
        &self.institution_id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The assignment type (regular=0, or a numbered special pool) the
    /// current postulation slot targets.
    pub fn assignment_type_at_cursor(&self) -> Option<i64> {
        self.assignment_type.get(self.cursor).copied()
    }

    pub fn current_key(&self) -> Option<ProgramKey> {
        if self.cursor < self.postulation.len() {
            Some(ProgramKey::new(
                self.postulation[self.cursor],
                self.quota_id[self.cursor],
            ))
        } else {
            None
        }
    }

    /// `priority + lottery` at the program key, if the applicant applied
    /// there under that quota.
    pub fn score_for(&self, key: ProgramKey) -> Option<f64> {
        let priority = *self.priorities.get(&key)?;
        let lottery = *self.scores.get(&key)?;
        Some(priority as f64 + lottery)
    }

    pub fn score_at_cursor(&self) -> Option<f64> {
        self.current_key().and_then(|k| self.score_for(k))
    }

    pub fn priority_profile_for(&self, program_id: ProgramId) -> Option<i64> {
        self.priority_profile.get(&program_id).copied()
    }

    pub fn match_to(&mut self, key: ProgramKey) {
        self.matched = true;
        self.matched_program = Some(key);
    }

    pub fn match_to_none(&mut self) {
        self.matched = true;
        self.matched_program = None;
    }

    pub fn unmatch(&mut self) {
        self.matched = false;
        self.matched_program = None;
    }

    /// Advances past the rejected postulation. Returns `true` if there is a
    /// next postulation to try, `false` if exhausted (caller should then
    /// call `match_to_none`).
    pub fn advance(&mut self) -> bool {
        self.cursor += 1;
        self.cursor < self.postulation.len()
    }

    pub fn check_attribute_criteria(
        &self,
        attribute: &str,
        criterion: Criterion,
        reference: &AttributeValue,
    ) -> bool {
        match self.characteristics.get(attribute) {
            Some(value) => check_attribute_criteria(value, criterion, reference),
            None => false,
        }
    }

    /// Moves the applicant's priority at postulation slot `index` to the
    /// next step of the sibling-priority transition table. Operates on an
    /// arbitrary postulation index, not just the current cursor slot, since
    /// the sibling-institution set can match several of an applicant's
    /// postulation entries at once.
    pub fn reassign_priority_profile(&mut self, index: usize, rules: &Rules) -> Result<(), ScError> {
        if index >= self.postulation.len() {
            return Err(ScError::InvalidInput(format!(
                "applicant {} has no postulation index {}",
                self.id, index
            )));
        }
        let program_id = self.postulation[index];
        let quota_id = self.quota_id[index];
        let key = ProgramKey::new(program_id, quota_id);
        let current_profile = *self
            .priority_profile
            .get(&program_id)
            .ok_or_else(|| ScError::MissingTransition {
                profile: -1,
                quota: quota_id,
            })?;
        let new_profile = rules
            .lookup_transition(current_profile, quota_id)
            .ok_or(ScError::MissingTransition {
                profile: current_profile,
                quota: quota_id,
            })?;
        let new_priority = rules
            .lookup_priority(quota_id, new_profile)
            .ok_or(ScError::MissingTransition {
                profile: new_profile,
                quota: quota_id,
            })?;
        self.priorities.insert(key, new_priority);
        self.priority_profile.insert(program_id, new_profile);
        self.dynamic_priority[index] = true;
        Ok(())
    }

    /// Permutes postulation/quota/institution/dynamic-priority together,
    /// recording the grades this reorder was linked across.
    pub fn reorder_postulation(&mut self, linked_grades: Vec<GradeId>, new_order: &[usize]) {
        self.postulation = new_order.iter().map(|&i| self.postulation[i]).collect();
        self.quota_id = new_order.iter().map(|&i| self.quota_id[i]).collect();
        self.institution_id = new_order.iter().map(|&i| self.institution_id[i]).collect();
        self.assignment_type = new_order.iter().map(|&i| self.assignment_type[i]).collect();
        self.dynamic_priority = new_order.iter().map(|&i| self.dynamic_priority[i]).collect();
        self.linked_postulation = true;
        self.linked_grades = linked_grades;
        self.cursor = 0;
    }

    pub fn linked_postulation_bool(&self) -> bool {
        self.linked_postulation
    }

    /// Truncates postulation to the last occurrence of the secured
    /// enrollment program, setting its priority to the best possible value.
    pub fn set_secured_place_as_last_postulation(&mut self) -> Result<(), ScError> {
        let se_program_id = self.se_program_id.ok_or_else(|| ScError::InvalidSecuredEnrollment {
            applicant_id: self.id.as_i64(),
            reason: "applicant has no secured enrollment program".to_string(),
        })?;
        let last = self
            .postulation
            .iter()
            .enumerate()
            .rev()
            .find(|(_, &p)| p == se_program_id)
            .map(|(i, _)| i)
            .ok_or_else(|| ScError::InvalidSecuredEnrollment {
                applicant_id: self.id.as_i64(),
                reason: "secured enrollment program not found in postulation".to_string(),
            })?;
        self.postulation.truncate(last + 1);
        self.quota_id.truncate(last + 1);
        self.institution_id.truncate(last + 1);
        self.assignment_type.truncate(last + 1);
        self.dynamic_priority.truncate(last + 1);
        let se_quota_id = self.se_quota_id.unwrap_or(QuotaId(0));
        self.priorities
            .insert(ProgramKey::new(se_program_id, se_quota_id), SECURED_ENROLLMENT_PRIORITY);
        Ok(())
    }

    /// Reorders the quota applied-to at every postulation slot pointing at
    /// `program_id`, following `ordered_quotas`. When the number of such
    /// slots doesn't match `ordered_quotas`'s length, only the quotas
    /// already present among those slots are kept (in `ordered_quotas`
    /// order) rather than padding or erroring.
    pub fn reorder_postulation_by_quota(&mut self, program_id: ProgramId, ordered_quotas: &[QuotaId]) {
        let indexes: Vec<usize> = self
            .postulation
            .iter()
            .enumerate()
            .filter(|(_, &p)| p == program_id)
            .map(|(i, _)| i)
            .collect();
        if indexes.is_empty() {
            return;
        }
        let quotas_to_use: Vec<QuotaId> = if indexes.len() != ordered_quotas.len() {
            let present: BTreeSet<QuotaId> = indexes.iter().map(|&i| self.quota_id[i]).collect();
            ordered_quotas
                .iter()
                .filter(|q| present.contains(q))
                .copied()
                .collect()
        } else {
            ordered_quotas.to_vec()
        };
        for (slot, &idx) in indexes.iter().enumerate() {
            if let Some(&q) = quotas_to_use.get(slot) {
                self.quota_id[idx] = q;
            }
        }
    }

    /// Restores the working postulation/priority state from the
    /// as-loaded originals, and resets match state. An applicant with no
    /// postulation at all is considered matched-to-nothing from the start.
    pub fn reset_matching(&mut self) {
        self.postulation = self.original_postulation.clone();
        self.quota_id = self.original_quota_id.clone();
        self.institution_id = self.original_institution_id.clone();
        self.assignment_type = self.original_assignment_type.clone();
        self.priorities = self.original_priorities.clone();
        self.priority_profile = self.original_priority_profile.clone();
        self.linked_postulation = false;
        self.linked_grades.clear();
        self.cursor = 0;

        if self.postulation.is_empty() {
            self.matched = true;
            self.matched_program = None;
            self.dynamic_priority.clear();
        } else {
            self.matched = false;
            self.matched_program = None;
            self.dynamic_priority = vec![false; self.postulation.len()];
        }
    }
}
