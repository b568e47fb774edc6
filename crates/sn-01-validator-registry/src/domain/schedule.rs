//! Proposer rotation schedule
//!
//! ACTIVE validators ordered by descending effective stake, ties broken by
//! ascending id. The order is total, so every node derives the same
//! schedule from the same registry state.

use super::validator::Validator;
use shared_types::ValidatorId;
use std::cmp::Ordering;

/// Sort key comparator: heavier stake first, then lexicographic id.
pub fn rotation_order(a: &Validator, b: &Validator) -> Ordering {
    b.stake
        .effective_stake()
        .cmp(&a.stake.effective_stake())
        .then_with(|| a.id().cmp(b.id()))
}

/// Build the rotation schedule from any collection of validators.
pub fn build_schedule<'a>(validators: impl IntoIterator<Item = &'a Validator>) -> Vec<ValidatorId> {
    let mut active: Vec<&Validator> = validators.into_iter().filter(|v| v.is_active()).collect();
    active.sort_by(|a, b| rotation_order(a, b));
    active.into_iter().map(|v| v.id().clone()).collect()
}

/// `schedule[slot mod len]`, or `None` for an empty schedule.
pub fn proposer_at(schedule: &[ValidatorId], slot: u64) -> Option<&ValidatorId> {
    if schedule.is_empty() {
        return None;
    }
    schedule.get((slot % schedule.len() as u64) as usize)
}
