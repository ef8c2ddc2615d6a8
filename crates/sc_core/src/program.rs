use crate::ids::{GradeId, InstitutionId, ProgramId, QuotaId};
use crate::queue::AssignmentQueue;
use std::collections::BTreeMap;

/// Assignment type `0` is always the regular queue; any other positive
/// integer names a special queue (e.g. "special_1_vacancies" in the source
/// tables becomes assignment type `1`).
pub const REGULAR_ASSIGNMENT_TYPE: i64 = 0;

/// One (program_id, quota_id) slot: its regular queue, zero or more special
/// queues, and the waitlist of applicants rejected from it this round.
#[derive(Debug, Clone)]
pub struct Program {
    pub program_id: ProgramId,
    pub quota_id: QuotaId,
    pub institution_id: InstitutionId,
    pub grade_id: GradeId,
    regular_assignment: AssignmentQueue,
    special_assignments: BTreeMap<i64, AssignmentQueue>,
    waitlist: BTreeMap<i64, i64>,
    over_capacity: bool,
}

impl Program {
    pub fn new(
        program_id: ProgramId,
        quota_id: QuotaId,
        institution_id: InstitutionId,
        grade_id: GradeId,
        regular_capacity: i64,
        special_vacancies: BTreeMap<i64, i64>,
    ) -> Self {
        let special_assignments = special_vacancies
            .into_iter()
            .map(|(assignment_type, capacity)| (assignment_type, AssignmentQueue::new(capacity)))
            .collect();
        Self {
            program_id,
            quota_id,
            institution_id,
            grade_id,
            regular_assignment: AssignmentQueue::new(regular_capacity),
            special_assignments,
            waitlist: BTreeMap::new(),
            over_capacity: false,
        }
    }

    pub fn special_assignment_types(&self) -> Vec<i64> {
        self.special_assignments.keys().copied().collect()
    }

    pub fn queue_for(&self, assignment_type: i64) -> Option<&AssignmentQueue> {
        if assignment_type == REGULAR_ASSIGNMENT_TYPE {
            Some(&self.regular_assignment)
        } else {
            self.special_assignments.get(&assignment_type)
        }
    }

    pub fn queue_for_mut(&mut self, assignment_type: i64) -> Option<&mut AssignmentQueue> {
        if assignment_type == REGULAR_ASSIGNMENT_TYPE {
            Some(&mut self.regular_assignment)
        } else {
            self.special_assignments.get_mut(&assignment_type)
        }
    }

    /// Computes the capacity underfill of `from_assignment_type` (normally a
    /// special queue) and moves it into the regular queue. Returns the
    /// amount transferred (0 if the queue is already at or over capacity).
    pub fn transfer_underfill_to_regular(&mut self, from_assignment_type: i64) -> i64 {
        let delta = match self.queue_for_mut(from_assignment_type) {
            Some(q) => q.capacity_to_transfer(),
            None => 0,
        };
        if delta != 0 {
            self.regular_assignment.receive_transfer(delta);
        }
        delta
    }

    /// Forces an applicant into `assignment_type`'s queue, bypassing the
    /// normal cutoff/waitlist comparison. Marks the program and queue as
    /// over capacity and removes the applicant from the waitlist if present.
    pub fn force_secured_match(
        &mut self,
        applicant_id: crate::ids::ApplicantId,
        score: f64,
        assignment_type: i64,
    ) {
        self.over_capacity = true;
        if let Some(q) = self.queue_for_mut(assignment_type) {
            q.modify_over_capacity(1);
            q.add_applicant(applicant_id, score);
        }
        self.waitlist.remove(&applicant_id.as_i64());
    }

    pub fn add_to_waitlist(&mut self, applicant_id: crate::ids::ApplicantId, priority_number_quota: i64) {
        self.waitlist.insert(applicant_id.as_i64(), priority_number_quota);
    }

    pub fn waitlist(&self) -> &BTreeMap<i64, i64> {
        &self.waitlist
    }

    pub fn over_capacity(&self) -> bool {
        self.over_capacity
    }

    pub fn reset(&mut self) {
        self.regular_assignment.reset();
        for q in self.special_assignments.values_mut() {
            q.reset();
        }
        self.waitlist.clear();
        self.over_capacity = false;
    }
}
