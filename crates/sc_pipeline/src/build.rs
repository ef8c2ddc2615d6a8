//! Assembles the in-memory entity graph (applicants, programs, rules) from
//! the tabular rows `sc_io` loads. This is where domain meaning gets
//! attached to otherwise-opaque column names (e.g. `special_1_vacancies`).

use sc_core::{
    AttributeValue, Criterion, GradeId, InstitutionId, Program, ProgramId, ProgramKey, QuotaId,
    Rules,
};
use sc_core::{Applicant, ApplicantId};
use sc_core::rules::{QuotaOrderRule, RuleClause};
use sc_io::{ApplicantRow, ApplicationRow, LinkRow, PriorityProfileRow, QuotaOrderRow, SiblingRow, VacancyRow};
use std::collections::BTreeMap;

pub struct EntityGraph {
    pub applicants: Vec<Applicant>,
    pub applicant_index_by_id: BTreeMap<ApplicantId, usize>,
    pub applicant_grade: BTreeMap<ApplicantId, GradeId>,
    pub programs: BTreeMap<ProgramKey, Program>,
    pub grade_programs: BTreeMap<GradeId, Vec<ProgramKey>>,
    pub program_institution: BTreeMap<ProgramKey, InstitutionId>,
    /// applicant_id -> sibling_ids, resolved to institutions (via each
    /// sibling's current match) at matching time rather than stored here.
    pub sibling_ids: BTreeMap<ApplicantId, Vec<ApplicantId>>,
    pub links: Vec<(ApplicantId, ApplicantId, GradeId)>,
}

fn special_type_from_column(column: &str) -> Option<i64> {
    // "special_1_vacancies" -> 1
    let rest = column.strip_prefix("special_")?;
    let rest = rest.strip_suffix("_vacancies")?;
    rest.parse::<i64>().ok()
}

pub fn build_programs(vacancies: &[VacancyRow]) -> (BTreeMap<ProgramKey, Program>, BTreeMap<GradeId, Vec<ProgramKey>>, BTreeMap<ProgramKey, InstitutionId>) {
    let mut programs = BTreeMap::new();
    let mut grade_programs: BTreeMap<GradeId, Vec<ProgramKey>> = BTreeMap::new();
    let mut program_institution = BTreeMap::new();

    for row in vacancies {
        let key = ProgramKey::new(ProgramId(row.program_id), QuotaId(row.quota_id));
        let grade = GradeId(row.grade_id);
        let institution = InstitutionId(row.institution_id);

        let mut special = BTreeMap::new();
        for (column, value) in &row.extra {
            if let Some(assignment_type) = special_type_from_column(column) {
                if let Ok(capacity) = value.parse::<i64>() {
                    special.insert(assignment_type, capacity);
                }
            }
        }

        let program = Program::new(
            ProgramId(row.program_id),
            QuotaId(row.quota_id),
            institution,
            grade,
            row.regular_vacancies,
            special,
        );
        programs.insert(key, program);
        grade_programs.entry(grade).or_default().push(key);
        program_institution.insert(key, institution);
    }

    (programs, grade_programs, program_institution)
}

#[allow(clippy::too_many_arguments)]
pub fn build_rules(
    priority_profiles: &[PriorityProfileRow],
    quota_order: &[QuotaOrderRow],
    grades: Vec<GradeId>,
    se_program_id: Option<ProgramId>,
    se_quota_id: Option<QuotaId>,
    order: sc_core::Order,
    check_inputs: bool,
    sibling_priority_activation: bool,
    linked_postulation_activation: bool,
    secured_enrollment_assignment: bool,
    forced_secured_enrollment_assignment: bool,
    transfer_capacity_activation: bool,
) -> Rules {
    let mut priority_profile_sibling_transition: BTreeMap<i64, BTreeMap<QuotaId, i64>> = BTreeMap::new();
    let mut priority_by_quota_and_profile: BTreeMap<(QuotaId, i64), i64> = BTreeMap::new();

    for row in priority_profiles {
        priority_profile_sibling_transition
            .entry(row.priority_profile)
            .or_default()
            .insert(QuotaId(row.quota_id), row.destination_profile);
        priority_by_quota_and_profile.insert((QuotaId(row.quota_id), row.destination_profile), row.priority);
    }

    let mut quota_order_rules = Vec::new();
    for row in quota_order {
        let clause = match (&row.attribute, &row.criterion, &row.reference_value) {
            (Some(attribute), Some(criterion), Some(reference)) => {
                Criterion::from_token(criterion).map(|criterion| RuleClause {
                    attribute: attribute.clone(),
                    criterion,
                    reference: parse_attribute_value(reference),
                })
            }
            _ => None,
        };
        let ordered_quotas = row
            .ordered_quotas
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .map(QuotaId)
            .collect();
        quota_order_rules.push(QuotaOrderRule {
            priority_profile: row.priority_profile,
            clause,
            ordered_quotas,
        });
    }

    Rules {
        order,
        check_inputs,
        sibling_priority_activation,
        linked_postulation_activation,
        secured_enrollment_assignment,
        forced_secured_enrollment_assignment,
        transfer_capacity_activation,
        priority_profile_sibling_transition,
        priority_by_quota_and_profile,
        quota_order_rules,
        se_program_id,
        se_quota_id,
        grades,
    }
}

fn parse_attribute_value(raw: &str) -> AttributeValue {
    if let Ok(i) = raw.parse::<i64>() {
        AttributeValue::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        AttributeValue::Real(f)
    } else {
        AttributeValue::Str(raw.to_string())
    }
}

pub fn build_applicants(
    applicant_rows: &[ApplicantRow],
    application_rows: &[ApplicationRow],
    program_institution: &BTreeMap<ProgramKey, InstitutionId>,
    vacancies: &[VacancyRow],
) -> (Vec<Applicant>, BTreeMap<ApplicantId, usize>, BTreeMap<ApplicantId, GradeId>) {
    let grade_of_program: BTreeMap<(i64, i64), i64> = vacancies
        .iter()
        .map(|v| ((v.program_id, v.quota_id), v.grade_id))
        .collect();

    let mut applications_by_applicant: BTreeMap<i64, Vec<&ApplicationRow>> = BTreeMap::new();
    for row in application_rows {
        applications_by_applicant
            .entry(row.applicant_id)
            .or_default()
            .push(row);
    }
    for rows in applications_by_applicant.values_mut() {
        rows.sort_by_key(|r| r.order);
    }

    let mut applicants = Vec::with_capacity(applicant_rows.len());
    let mut applicant_index_by_id = BTreeMap::new();
    let mut applicant_grade = BTreeMap::new();

    for row in applicant_rows {
        let id = ApplicantId(row.applicant_id);
        let empty = Vec::new();
        let rows = applications_by_applicant.get(&row.applicant_id).unwrap_or(&empty);

        let mut postulation = Vec::with_capacity(rows.len());
        let mut quota_id = Vec::with_capacity(rows.len());
        let mut institution_id = Vec::with_capacity(rows.len());
        let mut assignment_type = Vec::with_capacity(rows.len());
        let mut priorities = BTreeMap::new();
        let mut priority_profile = BTreeMap::new();
        let mut scores = BTreeMap::new();

        for r in rows {
            let pid = ProgramId(r.program_id);
            let qid = QuotaId(r.quota_id);
            postulation.push(pid);
            quota_id.push(qid);
            let institution = program_institution
                .get(&ProgramKey::new(pid, qid))
                .copied()
                .unwrap_or(InstitutionId(-1));
            institution_id.push(institution);
            assignment_type.push(r.assignment_type);
            priorities.insert(ProgramKey::new(pid, qid), r.priority);
            priority_profile.insert(pid, r.priority_profile);
            scores.insert(ProgramKey::new(pid, qid), r.lottery_number_quota.unwrap_or(0.0));
        }

        let mut characteristics = BTreeMap::new();
        for (k, v) in &row.characteristics {
            characteristics.insert(k.clone(), parse_attribute_value(v));
        }

        let grade = rows
            .first()
            .and_then(|r| grade_of_program.get(&(r.program_id, r.quota_id)))
            .copied()
            .map(GradeId)
            .unwrap_or(GradeId(0));

        let applicant = Applicant::new_with_assignment_types(
            id,
            postulation,
            quota_id,
            institution_id,
            assignment_type,
            priorities,
            priority_profile,
            scores,
            characteristics,
            row.se_program_id.map(ProgramId),
            row.se_quota_id.map(QuotaId),
        );

        applicant_index_by_id.insert(id, applicants.len());
        applicant_grade.insert(id, grade);
        applicants.push(applicant);
    }

    (applicants, applicant_index_by_id, applicant_grade)
}

pub fn build_sibling_ids(siblings: &[SiblingRow]) -> BTreeMap<ApplicantId, Vec<ApplicantId>> {
    let mut map: BTreeMap<ApplicantId, Vec<ApplicantId>> = BTreeMap::new();
    for row in siblings {
        map.entry(ApplicantId(row.applicant_id))
            .or_default()
            .push(ApplicantId(row.sibling_id));
    }
    map
}

pub fn build_links(links: &[LinkRow]) -> Vec<(ApplicantId, ApplicantId, GradeId)> {
    links
        .iter()
        .map(|l| (ApplicantId(l.applicant_id), ApplicantId(l.linked_applicant_id), GradeId(l.grade_id)))
        .collect()
}

/// Full assembly of every input relation into the in-memory entity graph
/// the policy driver runs against.
#[allow(clippy::too_many_arguments)]
pub fn build_entity_graph(
    vacancies: &[VacancyRow],
    applicants: &[ApplicantRow],
    applications: &[ApplicationRow],
    siblings: &[SiblingRow],
    links: &[LinkRow],
) -> EntityGraph {
    let (programs, grade_programs, program_institution) = build_programs(vacancies);
    let (applicants, applicant_index_by_id, applicant_grade) =
        build_applicants(applicants, applications, &program_institution, vacancies);
    let sibling_ids = build_sibling_ids(siblings);
    let links = build_links(links);

    EntityGraph {
        applicants,
        applicant_index_by_id,
        applicant_grade,
        programs,
        grade_programs,
        program_institution,
        sibling_ids,
        links,
    }
}
