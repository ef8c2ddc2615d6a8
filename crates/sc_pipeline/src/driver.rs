//! The policy driver: sequences deferred-acceptance rounds across grades
//! and assignment types, applying the pre/post-round mutations described
//! for dynamic sibling priority, linked postulation, secured enrollment,
//! and capacity transfer.

use crate::build::EntityGraph;
use sc_core::program::REGULAR_ASSIGNMENT_TYPE;
use sc_core::{Applicant, ApplicantId, GradeId, InstitutionId, Order, Program, ProgramKey, Rules, ScError};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub struct PolicyDriver {
    pub applicants: Vec<Applicant>,
    applicant_index_by_id: BTreeMap<ApplicantId, usize>,
    applicant_grade: BTreeMap<ApplicantId, GradeId>,
    pub programs: BTreeMap<ProgramKey, Program>,
    grade_programs: BTreeMap<GradeId, Vec<ProgramKey>>,
    program_institution: BTreeMap<ProgramKey, InstitutionId>,
    sibling_ids: BTreeMap<ApplicantId, Vec<ApplicantId>>,
    links: Vec<(ApplicantId, ApplicantId, GradeId)>,
    rules: Rules,
}

impl PolicyDriver {
    pub fn new(graph: EntityGraph, rules: Rules) -> Self {
        Self {
            applicants: graph.applicants,
            applicant_index_by_id: graph.applicant_index_by_id,
            applicant_grade: graph.applicant_grade,
            programs: graph.programs,
            grade_programs: graph.grade_programs,
            program_institution: graph.program_institution,
            sibling_ids: graph.sibling_ids,
            links: graph.links,
            rules,
        }
    }

    pub fn applicant_grade(&self) -> &BTreeMap<ApplicantId, GradeId> {
        &self.applicant_grade
    }

    fn grade_order(&self) -> Vec<GradeId> {
        let mut grades = self.rules.grades.clone();
        grades.sort();
        if self.rules.order == Order::Descending {
            grades.reverse();
        }
        grades
    }

    fn assignment_types_for_grade(&self, grade: GradeId) -> Vec<i64> {
        let mut types = std::collections::BTreeSet::new();
        if let Some(keys) = self.grade_programs.get(&grade) {
            for key in keys {
                if let Some(program) = self.programs.get(key) {
                    for t in program.special_assignment_types() {
                        types.insert(t);
                    }
                }
            }
        }
        types.into_iter().collect()
    }

    fn applicant_indices_for(&self, grade: GradeId, assignment_type: i64) -> Vec<usize> {
        self.applicants
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                self.applicant_grade.get(&a.id) == Some(&grade)
                    && !a.is_matched()
                    && a.assignment_type_at_cursor() == Some(assignment_type)
                    && a.current_key()
                        .map(|k| self.program_institution.contains_key(&k))
                        .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Runs the full matching sequence: every grade, in the configured
    /// order, every assignment type (special types ascending, then the
    /// regular assignment type last).
    pub fn match_applicants_and_programs(&mut self) -> Result<(), ScError> {
        let grades = self.grade_order();

        for (i, &grade) in grades.iter().enumerate() {
            debug!(?grade, round = i, "starting grade");

            if i != 0 {
                self.apply_pre_round_mutations(grade)?;
            }

            self.apply_quota_order_reorder(grade)?;

            for assignment_type in self.assignment_types_for_grade(grade) {
                let idxs = self.applicant_indices_for(grade, assignment_type);
                sc_algo::run_round(&mut self.applicants, &idxs, &mut self.programs, assignment_type)?;
            }

            self.transfer_special_capacity_to_regular(grade);
            self.apply_secured_enrollment_truncation(grade)?;

            let regular_idxs = self.applicant_indices_for(grade, REGULAR_ASSIGNMENT_TYPE);
            sc_algo::run_round(
                &mut self.applicants,
                &regular_idxs,
                &mut self.programs,
                REGULAR_ASSIGNMENT_TYPE,
            )?;

            self.apply_forced_secured_enrollment(grade)?;
        }

        for applicant in &self.applicants {
            if applicant.postulation().is_empty() {
                warn!(applicant_id = %applicant.id, "applicant had no applications; matched to nothing");
            }
        }

        Ok(())
    }

    /// Step 3 of the pre-round procedure: dynamic sibling priority upgrade,
    /// then linked postulation reordering, each independently gated on its
    /// own config flag. Both are skipped for the first grade processed
    /// (there is no prior-grade state yet to react to).
    fn apply_pre_round_mutations(&mut self, grade: GradeId) -> Result<(), ScError> {
        let indices: Vec<usize> = self
            .applicants
            .iter()
            .enumerate()
            .filter(|(_, a)| self.applicant_grade.get(&a.id) == Some(&grade) && !a.is_matched())
            .map(|(i, _)| i)
            .collect();

        if self.rules.sibling_priority_activation {
            for idx in &indices {
                let applicant_id = self.applicants[*idx].id;
                let sibling_institutions = self.sibling_institutions_for(applicant_id);
                if sibling_institutions.is_empty() {
                    continue;
                }
                let matching_positions: Vec<usize> = self.applicants[*idx]
                    .institutions()
                    .iter()
                    .enumerate()
                    .filter(|(_, inst)| sibling_institutions.contains(inst))
                    .map(|(i, _)| i)
                    .collect();
                for position in matching_positions {
                    self.applicants[*idx].reassign_priority_profile(position, &self.rules)?;
                }
            }
        }

        if self.rules.linked_postulation_activation {
            for (a_id, b_id, link_grade) in self.links.clone() {
                if link_grade != grade {
                    continue;
                }
                self.reorder_linked_postulation(a_id, b_id, grade);
            }
        }

        Ok(())
    }

    /// Institutions where any of `applicant_id`'s siblings is currently
    /// matched to a non-null program, resolved live from each sibling's
    /// match rather than a static per-row column.
    fn sibling_institutions_for(&self, applicant_id: ApplicantId) -> Vec<InstitutionId> {
        let mut institutions = Vec::new();
        let sibling_ids = match self.sibling_ids.get(&applicant_id) {
            Some(ids) => ids,
            None => return institutions,
        };
        for sibling_id in sibling_ids {
            let Some(&idx) = self.applicant_index_by_id.get(sibling_id) else {
                continue;
            };
            if let Some(key) = self.applicants[idx].matched_program() {
                if let Some(&inst) = self.program_institution.get(&key) {
                    if !institutions.contains(&inst) {
                        institutions.push(inst);
                    }
                }
            }
        }
        institutions
    }

    /// Reorders `a`'s postulation so that entries pointing at `b`'s target
    /// institution come first (stable partition), and vice versa.
    fn reorder_linked_postulation(&mut self, a_id: ApplicantId, b_id: ApplicantId, grade: GradeId) {
        let target_institution_of = |driver: &Self, id: ApplicantId| -> Option<InstitutionId> {
            let idx = *driver.applicant_index_by_id.get(&id)?;
            let applicant = &driver.applicants[idx];
            if let Some(key) = applicant.matched_program() {
                driver.program_institution.get(&key).copied()
            } else {
                applicant.institutions().first().copied()
            }
        };

        let a_idx = self.applicant_index_by_id.get(&a_id).copied();
        let b_idx = self.applicant_index_by_id.get(&b_id).copied();

        if let (Some(a_idx), Some(_b_idx)) = (a_idx, b_idx) {
            if let Some(target) = target_institution_of(self, b_id) {
                let new_order = stable_partition_by_institution(&self.applicants[a_idx], target);
                self.applicants[a_idx].reorder_postulation(vec![grade], &new_order);
            }
        }
        if let (Some(_a_idx), Some(b_idx)) = (a_idx, b_idx) {
            if let Some(target) = target_institution_of(self, a_id) {
                let new_order = stable_partition_by_institution(&self.applicants[b_idx], target);
                self.applicants[b_idx].reorder_postulation(vec![grade], &new_order);
            }
        }
    }

    /// Step 4: quota-order reorder, applied every round regardless of
    /// grade position. First matching rule (by priority profile, then
    /// clause) wins.
    fn apply_quota_order_reorder(&mut self, grade: GradeId) -> Result<(), ScError> {
        let indices: Vec<usize> = self
            .applicants
            .iter()
            .enumerate()
            .filter(|(_, a)| self.applicant_grade.get(&a.id) == Some(&grade) && !a.is_matched())
            .map(|(i, _)| i)
            .collect();

        for idx in indices {
            let applicant = &self.applicants[idx];
            let program_id = match applicant.current_key() {
                Some(k) => k.program_id,
                None => continue,
            };
            let profile = applicant.priority_profile_for(program_id);

            let rule = self.rules.quota_order_rules.iter().find(|rule| {
                if Some(rule.priority_profile) != profile {
                    return false;
                }
                match &rule.clause {
                    None => true,
                    Some(clause) => applicant.check_attribute_criteria(
                        &clause.attribute,
                        clause.criterion,
                        &clause.reference,
                    ),
                }
            });

            if let Some(rule) = rule {
                let ordered_quotas = rule.ordered_quotas.clone();
                self.applicants[idx].reorder_postulation_by_quota(program_id, &ordered_quotas);
            }
        }

        Ok(())
    }

    /// Transfers unfilled special-queue capacity into the regular queue,
    /// for every program in `grade`. Gated on `transfer_capacity_activation`.
    fn transfer_special_capacity_to_regular(&mut self, grade: GradeId) {
        if !self.rules.transfer_capacity_activation {
            return;
        }
        let keys = match self.grade_programs.get(&grade) {
            Some(keys) => keys.clone(),
            None => return,
        };
        for key in keys {
            if let Some(program) = self.programs.get_mut(&key) {
                for assignment_type in program.special_assignment_types() {
                    program.transfer_underfill_to_regular(assignment_type);
                }
            }
        }
    }

    /// Step 5: truncates postulation to the secured-enrollment slot for
    /// applicants who have one and aren't matched yet, ahead of the
    /// regular round. Gated on `secured_enrollment_assignment`.
    fn apply_secured_enrollment_truncation(&mut self, grade: GradeId) -> Result<(), ScError> {
        if !self.rules.secured_enrollment_assignment {
            return Ok(());
        }
        let indices: Vec<usize> = self
            .applicants
            .iter()
            .enumerate()
            .filter(|(_, a)| self.applicant_grade.get(&a.id) == Some(&grade) && a.has_se() && !a.is_matched())
            .map(|(i, _)| i)
            .collect();

        for idx in indices {
            self.applicants[idx].set_secured_place_as_last_postulation()?;
        }

        Ok(())
    }

    /// Step 7: after the regular round has settled, force-matches every
    /// applicant in `grade` still unassigned (match-to-none) into their
    /// secured-enrollment program, bypassing capacity entirely. Independent
    /// of `secured_enrollment_assignment`; gated on its own flag.
    fn apply_forced_secured_enrollment(&mut self, grade: GradeId) -> Result<(), ScError> {
        if !self.rules.forced_secured_enrollment_assignment {
            return Ok(());
        }
        let indices: Vec<usize> = self
            .applicants
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                self.applicant_grade.get(&a.id) == Some(&grade)
                    && a.has_se()
                    && a.matched_program().is_none()
            })
            .map(|(i, _)| i)
            .collect();

        for idx in indices {
            let applicant = &self.applicants[idx];
            let se_program_id = applicant.se_program_id.expect("checked by has_se");
            let se_quota_id = applicant.se_quota_id.unwrap_or(sc_core::QuotaId(0));
            let key = ProgramKey::new(se_program_id, se_quota_id);
            let score = applicant
                .score_for(key)
                .unwrap_or(sc_core::SECURED_ENROLLMENT_PRIORITY as f64);

            if let Some(program) = self.programs.get_mut(&key) {
                program.force_secured_match(applicant.id, score, REGULAR_ASSIGNMENT_TYPE);
                self.applicants[idx].match_to(key);
            }
        }

        Ok(())
    }

    /// Restores every applicant and program to post-construction state so
    /// the whole run can be repeated from scratch.
    pub fn reset_matching(&mut self) {
        for applicant in &mut self.applicants {
            applicant.reset_matching();
        }
        for program in self.programs.values_mut() {
            program.reset();
        }
    }
}

fn stable_partition_by_institution(applicant: &Applicant, target: InstitutionId) -> Vec<usize> {
    let institutions = applicant.institutions();
    let mut first: Vec<usize> = Vec::new();
    let mut rest: Vec<usize> = Vec::new();
    for (i, inst) in institutions.iter().enumerate() {
        if *inst == target {
            first.push(i);
        } else {
            rest.push(i);
        }
    }
    first.extend(rest);
    first
}
