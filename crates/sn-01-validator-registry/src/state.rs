use crate::domain::{build_schedule, Validator};
use shared_types::ValidatorId;
use std::collections::BTreeMap;

/// Mutable registry state, guarded by a single lock so stake changes,
/// slashing and epoch advance are serialized against schedule reads.
#[derive(Default)]
pub struct RegistryState {
    /// Ordered by id so epoch processing and audit output are deterministic.
    pub validators: BTreeMap<ValidatorId, Validator>,
    pub schedule: Vec<ValidatorId>,
    pub epoch: u64,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild_schedule(&mut self) -> &[ValidatorId] {
        self.schedule = build_schedule(self.validators.values());
        &self.schedule
    }

    pub fn total_voting_power(&self) -> u64 {
        self.validators.values().map(|v| v.voting_power()).sum()
    }
}
