//! The deferred acceptance matching loop, scoped to one (grade,
//! assignment type) round. Pure: no file I/O, no randomness — applicant
//! scores already bake in whatever lottery fraction the caller assigned.

use sc_core::{Applicant, Program, ProgramKey, ScError};
use std::collections::BTreeMap;

/// Runs the worklist-based proposal loop to a fixed point over the given
/// applicant indices, against `programs`, restricted to `assignment_type`.
///
/// The worklist is a LIFO stack, matching the original engine's
/// `list.pop()` proposal order; the algorithm is confluent (the final
/// matching doesn't depend on pop order), only the intermediate waitlist
/// bookkeeping does.
pub fn run_round(
    applicants: &mut [Applicant],
    applicant_indices: &[usize],
    programs: &mut BTreeMap<ProgramKey, Program>,
    assignment_type: i64,
) -> Result<(), ScError> {
    let mut worklist: Vec<usize> = applicant_indices.to_vec();

    while let Some(idx) = worklist.pop() {
        if applicants[idx].is_matched() {
            continue;
        }
        propose(applicants, idx, programs, assignment_type, &mut worklist)?;
    }

    Ok(())
}

fn propose(
    applicants: &mut [Applicant],
    idx: usize,
    programs: &mut BTreeMap<ProgramKey, Program>,
    assignment_type: i64,
    worklist: &mut Vec<usize>,
) -> Result<(), ScError> {
    let key = match applicants[idx].current_key() {
        Some(k) => k,
        None => {
            applicants[idx].match_to_none();
            return Ok(());
        }
    };

    let new_score = applicants[idx].score_for(key).ok_or_else(|| {
        ScError::InvalidInput(format!(
            "applicant {} postulated to {} without a registered priority/score",
            applicants[idx].id, key
        ))
    })?;

    let applicant_id = applicants[idx].id;

    let program = programs.get_mut(&key).ok_or(ScError::MatchingError {
        program_id: key.program_id,
        quota_id: key.quota_id,
    })?;

    let queue = program
        .queue_for_mut(assignment_type)
        .ok_or(ScError::MatchingError {
            program_id: key.program_id,
            quota_id: key.quota_id,
        })?;

    let cut_off = queue.cut_off_score();

    if cut_off == 0.0 {
        queue.add_applicant(applicant_id, new_score);
        applicants[idx].match_to(key);
        return Ok(());
    }

    if cut_off.is_infinite() {
        advance_or_settle(applicants, idx, worklist);
        return Ok(());
    }

    if cut_off <= new_score {
        program.add_to_waitlist(applicant_id, new_score.floor() as i64);
        advance_or_settle(applicants, idx, worklist);
        return Ok(());
    }

    let queue = program.queue_for_mut(assignment_type).expect("checked above");
    let displaced_id = queue
        .cut_off_applicant(cut_off)
        .expect("cut_off score was computed from an assigned occupant");
    queue.displace(applicant_id, new_score, displaced_id);
    applicants[idx].match_to(key);
    program.add_to_waitlist(displaced_id, cut_off.floor() as i64);

    let displaced_idx = applicants
        .iter()
        .position(|a| a.id == displaced_id)
        .expect("displaced applicant must exist in the pool");
    applicants[displaced_idx].unmatch();
    worklist.push(displaced_idx);

    Ok(())
}

fn advance_or_settle(applicants: &mut [Applicant], idx: usize, worklist: &mut Vec<usize>) {
    if applicants[idx].advance() {
        worklist.push(idx);
    } else {
        applicants[idx].match_to_none();
    }
}
