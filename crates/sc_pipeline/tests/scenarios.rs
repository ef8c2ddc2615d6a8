//! End-to-end scenarios run directly against in-memory entity graphs (no
//! CSV fixtures needed): single-slot contests, priority-over-lottery,
//! capacity transfer, forced secured enrollment, dynamic sibling
//! priority, and linked postulation reordering.

use sc_core::{
    AttributeValue, GradeId, InstitutionId, Order, Program, ProgramId, ProgramKey, QuotaId, Rules,
};
use sc_core::{Applicant, ApplicantId};
use sc_pipeline::build::EntityGraph;
use sc_pipeline::PolicyDriver;
use std::collections::BTreeMap;

fn empty_rules(grades: Vec<GradeId>) -> Rules {
    Rules {
        order: Order::Descending,
        check_inputs: false,
        sibling_priority_activation: false,
        linked_postulation_activation: false,
        secured_enrollment_assignment: false,
        forced_secured_enrollment_assignment: false,
        transfer_capacity_activation: false,
        priority_profile_sibling_transition: BTreeMap::new(),
        priority_by_quota_and_profile: BTreeMap::new(),
        quota_order_rules: Vec::new(),
        se_program_id: None,
        se_quota_id: None,
        grades,
    }
}

fn single_applicant_program(program_id: i64, priority: i64, lottery: f64) -> Applicant {
    single_applicant_program_at(program_id, priority, lottery, InstitutionId(1))
}

fn single_applicant_program_at(program_id: i64, priority: i64, lottery: f64, institution: InstitutionId) -> Applicant {
    let pid = ProgramId(program_id);
    let qid = QuotaId(0);
    let mut priorities = BTreeMap::new();
    priorities.insert(ProgramKey::new(pid, qid), priority);
    let mut scores = BTreeMap::new();
    scores.insert(ProgramKey::new(pid, qid), lottery);
    let mut profile = BTreeMap::new();
    profile.insert(pid, 0);
    Applicant::new(
        ApplicantId(0),
        vec![pid],
        vec![qid],
        vec![institution],
        priorities,
        profile,
        scores,
        BTreeMap::<String, AttributeValue>::new(),
        None,
        None,
    )
}

fn with_id(mut applicant: Applicant, id: i64) -> Applicant {
    applicant.id = ApplicantId(id);
    applicant
}

#[test]
fn single_slot_contest_lower_combined_score_wins() {
    let grade = GradeId(0);
    let a = with_id(single_applicant_program(1, 5, 0.9), 1);
    let b = with_id(single_applicant_program(1, 5, 0.1), 2);

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(1), 0);
    applicant_index_by_id.insert(ApplicantId(2), 1);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(1), grade);
    applicant_grade.insert(ApplicantId(2), grade);

    let mut programs = BTreeMap::new();
    let key = ProgramKey::new(ProgramId(1), QuotaId(0));
    programs.insert(key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 1, BTreeMap::new()));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![a, b],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    let mut driver = PolicyDriver::new(graph, empty_rules(vec![grade]));
    driver.match_applicants_and_programs().unwrap();

    assert_eq!(driver.applicants[1].matched_program(), Some(key));
    assert_eq!(driver.applicants[0].matched_program(), None);
    assert!(driver.applicants[0].is_matched());
}

#[test]
fn priority_beats_lottery_even_when_lottery_is_worse() {
    let grade = GradeId(0);
    // Applicant 1 has worse priority (higher number) but a better lottery draw.
    let a = with_id(single_applicant_program(1, 9, 0.01), 1);
    let b = with_id(single_applicant_program(1, 1, 0.99), 2);

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(1), 0);
    applicant_index_by_id.insert(ApplicantId(2), 1);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(1), grade);
    applicant_grade.insert(ApplicantId(2), grade);

    let mut programs = BTreeMap::new();
    let key = ProgramKey::new(ProgramId(1), QuotaId(0));
    programs.insert(key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 1, BTreeMap::new()));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![a, b],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    let mut driver = PolicyDriver::new(graph, empty_rules(vec![grade]));
    driver.match_applicants_and_programs().unwrap();

    // Applicant 2 has the lower combined score (1 + 0.99 = 1.99 < 9.01) and wins.
    assert_eq!(driver.applicants[1].matched_program(), Some(key));
    assert_eq!(driver.applicants[0].matched_program(), None);
}

#[test]
fn capacity_transfers_from_underfilled_special_queue_to_regular() {
    let grade = GradeId(0);
    let applicant = with_id(single_applicant_program(1, 5, 0.5), 1);

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(1), 0);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(1), grade);

    let mut special = BTreeMap::new();
    special.insert(1i64, 3i64); // special queue has 3 seats, nobody applies for it
    let mut programs = BTreeMap::new();
    let key = ProgramKey::new(ProgramId(1), QuotaId(0));
    // regular capacity starts at zero; all seats live in the special queue.
    programs.insert(key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 0, special));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![applicant],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    let mut rules = empty_rules(vec![grade]);
    rules.transfer_capacity_activation = true;
    let mut driver = PolicyDriver::new(graph, rules);
    driver.match_applicants_and_programs().unwrap();

    // The special queue's 3 unused seats transfer to regular, so the lone
    // regular applicant is matched despite starting from zero capacity.
    assert_eq!(driver.applicants[0].matched_program(), Some(key));
}

#[test]
fn capacity_transfer_off_leaves_the_regular_applicant_unassigned() {
    let grade = GradeId(0);
    let applicant = with_id(single_applicant_program(1, 5, 0.5), 1);

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(1), 0);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(1), grade);

    let mut special = BTreeMap::new();
    special.insert(1i64, 3i64);
    let mut programs = BTreeMap::new();
    let key = ProgramKey::new(ProgramId(1), QuotaId(0));
    programs.insert(key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 0, special));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![applicant],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    // transfer_capacity_activation left off: the regular queue stays at
    // zero capacity and the lone regular applicant goes unmatched.
    let mut driver = PolicyDriver::new(graph, empty_rules(vec![grade]));
    driver.match_applicants_and_programs().unwrap();

    assert_eq!(driver.applicants[0].matched_program(), None);
    assert!(driver.applicants[0].is_matched());
}

#[test]
fn forced_secured_enrollment_bypasses_a_full_regular_queue() {
    let grade = GradeId(0);
    let se_key = ProgramKey::new(ProgramId(1), QuotaId(0));

    let filler = with_id(single_applicant_program(1, 1, 0.1), 10);

    let mut se_applicant = with_id(single_applicant_program(1, 999, 0.99), 11);
    se_applicant.se_program_id = Some(ProgramId(1));
    se_applicant.se_quota_id = Some(QuotaId(0));

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(10), 0);
    applicant_index_by_id.insert(ApplicantId(11), 1);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(10), grade);
    applicant_grade.insert(ApplicantId(11), grade);

    let mut programs = BTreeMap::new();
    programs.insert(se_key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 1, BTreeMap::new()));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![se_key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(se_key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![filler, se_applicant],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    let mut rules = empty_rules(vec![grade]);
    rules.forced_secured_enrollment_assignment = true;
    let mut driver = PolicyDriver::new(graph, rules);
    driver.match_applicants_and_programs().unwrap();

    // Both are matched: the filler took the one ordinary seat, and the
    // secured-enrollment applicant was forced in over capacity only after
    // the regular round left it match-to-none.
    assert_eq!(driver.applicants[0].matched_program(), Some(se_key));
    assert_eq!(driver.applicants[1].matched_program(), Some(se_key));
    let program = &driver.programs[&se_key];
    assert!(program.over_capacity());
    assert_eq!(program.queue_for(0).unwrap().len(), 2);
}

#[test]
fn forced_secured_enrollment_off_leaves_the_se_applicant_unassigned() {
    let grade = GradeId(0);
    let se_key = ProgramKey::new(ProgramId(1), QuotaId(0));

    let filler = with_id(single_applicant_program(1, 1, 0.1), 10);

    let mut se_applicant = with_id(single_applicant_program(1, 999, 0.99), 11);
    se_applicant.se_program_id = Some(ProgramId(1));
    se_applicant.se_quota_id = Some(QuotaId(0));

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(10), 0);
    applicant_index_by_id.insert(ApplicantId(11), 1);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(10), grade);
    applicant_grade.insert(ApplicantId(11), grade);

    let mut programs = BTreeMap::new();
    programs.insert(se_key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 1, BTreeMap::new()));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![se_key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(se_key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![filler, se_applicant],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    // forced_secured_enrollment_assignment left off: the SE applicant loses
    // the regular contest and is never forced in.
    let mut driver = PolicyDriver::new(graph, empty_rules(vec![grade]));
    driver.match_applicants_and_programs().unwrap();

    assert_eq!(driver.applicants[0].matched_program(), Some(se_key));
    assert_eq!(driver.applicants[1].matched_program(), None);
    assert!(!driver.programs[&se_key].over_capacity());
}

#[test]
fn dynamic_sibling_priority_upgrades_priority_once_sibling_matches() {
    let grade1 = GradeId(1);
    let grade2 = GradeId(2);
    let institution_x = InstitutionId(50);

    // Older sibling: solo applicant in grade 2, guaranteed to match there.
    let older = with_id(single_applicant_program_at(100, 5, 0.5, institution_x), 1);

    // Younger: a grade-1 program at the same institution, starting out with
    // worse priority (5) than the filler (1) — until the sibling bump fires.
    let younger_program = ProgramId(200);
    let younger_quota = QuotaId(0);
    let younger = with_id(single_applicant_program_at(200, 5, 0.5, institution_x), 2);
    let filler = with_id(single_applicant_program_at(200, 1, 0.1, institution_x), 3);

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(1), 0);
    applicant_index_by_id.insert(ApplicantId(2), 1);
    applicant_index_by_id.insert(ApplicantId(3), 2);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(1), grade2);
    applicant_grade.insert(ApplicantId(2), grade1);
    applicant_grade.insert(ApplicantId(3), grade1);

    let older_key = ProgramKey::new(ProgramId(100), QuotaId(0));
    let younger_key = ProgramKey::new(younger_program, younger_quota);

    let mut programs = BTreeMap::new();
    programs.insert(older_key, Program::new(ProgramId(100), QuotaId(0), institution_x, grade2, 1, BTreeMap::new()));
    programs.insert(younger_key, Program::new(younger_program, younger_quota, institution_x, grade1, 1, BTreeMap::new()));

    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade2, vec![older_key]);
    grade_programs.insert(grade1, vec![younger_key]);

    let mut program_institution = BTreeMap::new();
    program_institution.insert(older_key, institution_x);
    program_institution.insert(younger_key, institution_x);

    let mut sibling_ids = BTreeMap::new();
    sibling_ids.insert(ApplicantId(2), vec![ApplicantId(1)]);

    let mut transition_inner = BTreeMap::new();
    transition_inner.insert(younger_quota, 1i64);
    let mut priority_profile_sibling_transition = BTreeMap::new();
    priority_profile_sibling_transition.insert(0i64, transition_inner);
    let mut priority_by_quota_and_profile = BTreeMap::new();
    priority_by_quota_and_profile.insert((younger_quota, 1i64), 0i64);

    let mut rules = empty_rules(vec![grade1, grade2]);
    rules.sibling_priority_activation = true;
    rules.priority_profile_sibling_transition = priority_profile_sibling_transition;
    rules.priority_by_quota_and_profile = priority_by_quota_and_profile;

    let graph = EntityGraph {
        applicants: vec![older, younger, filler],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids,
        links: Vec::new(),
    };

    let mut driver = PolicyDriver::new(graph, rules);
    driver.match_applicants_and_programs().unwrap();

    assert_eq!(driver.applicants[0].matched_program(), Some(older_key));
    // Younger's sibling-boosted priority (0) now beats the filler's (1).
    assert_eq!(driver.applicants[1].matched_program(), Some(younger_key));
    assert_eq!(driver.applicants[2].matched_program(), None);
}

#[test]
fn linked_postulation_reorders_toward_the_linked_applicants_institution() {
    let grade1 = GradeId(1);
    let grade2 = GradeId(2);
    let institution_y = InstitutionId(70);
    let institution_z = InstitutionId(71);

    // B matches at institution Y in grade 2, ahead of grade 1 processing.
    let b = with_id(single_applicant_program_at(300, 1, 0.1, institution_y), 10);

    // A's grade-1 postulation originally prefers Z (closed, zero capacity)
    // over Y; the link to B should pull the Y entry to the front.
    let prog_z = ProgramId(400);
    let prog_y = ProgramId(401);
    let quota = QuotaId(0);
    let mut priorities = BTreeMap::new();
    priorities.insert(ProgramKey::new(prog_z, quota), 5);
    priorities.insert(ProgramKey::new(prog_y, quota), 5);
    let mut scores = BTreeMap::new();
    scores.insert(ProgramKey::new(prog_z, quota), 0.5);
    scores.insert(ProgramKey::new(prog_y, quota), 0.5);
    let mut profile = BTreeMap::new();
    profile.insert(prog_z, 0);
    profile.insert(prog_y, 0);
    let a = with_id(
        Applicant::new(
            ApplicantId(0),
            vec![prog_z, prog_y],
            vec![quota, quota],
            vec![institution_z, institution_y],
            priorities,
            profile,
            scores,
            BTreeMap::<String, AttributeValue>::new(),
            None,
            None,
        ),
        11,
    );

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(10), 0);
    applicant_index_by_id.insert(ApplicantId(11), 1);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(10), grade2);
    applicant_grade.insert(ApplicantId(11), grade1);

    let b_key = ProgramKey::new(ProgramId(300), QuotaId(0));
    let z_key = ProgramKey::new(prog_z, quota);
    let y_key = ProgramKey::new(prog_y, quota);

    let mut programs = BTreeMap::new();
    programs.insert(b_key, Program::new(ProgramId(300), QuotaId(0), institution_y, grade2, 1, BTreeMap::new()));
    programs.insert(z_key, Program::new(prog_z, quota, institution_z, grade1, 0, BTreeMap::new()));
    programs.insert(y_key, Program::new(prog_y, quota, institution_y, grade1, 1, BTreeMap::new()));

    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade2, vec![b_key]);
    grade_programs.insert(grade1, vec![z_key, y_key]);

    let mut program_institution = BTreeMap::new();
    program_institution.insert(b_key, institution_y);
    program_institution.insert(z_key, institution_z);
    program_institution.insert(y_key, institution_y);

    let mut rules = empty_rules(vec![grade1, grade2]);
    rules.linked_postulation_activation = true;

    let graph = EntityGraph {
        applicants: vec![b, a],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: vec![(ApplicantId(11), ApplicantId(10), grade1)],
    };

    let mut driver = PolicyDriver::new(graph, rules);
    driver.match_applicants_and_programs().unwrap();

    assert_eq!(driver.applicants[0].matched_program(), Some(b_key));
    // The Y-institution entry was pulled to the front of A's postulation.
    assert_eq!(driver.applicants[1].postulation(), &[prog_y, prog_z]);
    assert_eq!(driver.applicants[1].matched_program(), Some(y_key));
}

#[test]
fn idempotent_reset_reproduces_the_same_matching() {
    let grade = GradeId(0);
    let a = with_id(single_applicant_program(1, 5, 0.9), 1);
    let b = with_id(single_applicant_program(1, 5, 0.1), 2);

    let mut applicant_index_by_id = BTreeMap::new();
    applicant_index_by_id.insert(ApplicantId(1), 0);
    applicant_index_by_id.insert(ApplicantId(2), 1);
    let mut applicant_grade = BTreeMap::new();
    applicant_grade.insert(ApplicantId(1), grade);
    applicant_grade.insert(ApplicantId(2), grade);

    let mut programs = BTreeMap::new();
    let key = ProgramKey::new(ProgramId(1), QuotaId(0));
    programs.insert(key, Program::new(ProgramId(1), QuotaId(0), InstitutionId(1), grade, 1, BTreeMap::new()));
    let mut grade_programs = BTreeMap::new();
    grade_programs.insert(grade, vec![key]);
    let mut program_institution = BTreeMap::new();
    program_institution.insert(key, InstitutionId(1));

    let graph = EntityGraph {
        applicants: vec![a, b],
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids: BTreeMap::new(),
        links: Vec::new(),
    };

    let mut driver = PolicyDriver::new(graph, empty_rules(vec![grade]));
    driver.match_applicants_and_programs().unwrap();
    let first_pass: Vec<_> = driver.applicants.iter().map(|a| a.matched_program()).collect();

    driver.reset_matching();
    driver.match_applicants_and_programs().unwrap();
    let second_pass: Vec<_> = driver.applicants.iter().map(|a| a.matched_program()).collect();

    assert_eq!(first_pass, second_pass);
}
