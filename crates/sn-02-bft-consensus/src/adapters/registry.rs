//! Voting power adapters
//!
//! [`RegistryVotingPower`] reads the live validator registry.
//! [`StaticVotingPower`] serves a fixed table for simulations and tests.

use crate::ports::VotingPowerSource;
use parking_lot::RwLock;
use shared_types::ValidatorId;
use sn_01_validator_registry::ValidatorRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `VotingPowerSource` over a shared [`ValidatorRegistry`].
///
/// Each call takes the registry read lock, so reads are serialized against
/// slashing and epoch advance.
#[derive(Clone)]
pub struct RegistryVotingPower {
    registry: Arc<ValidatorRegistry>,
}

impl RegistryVotingPower {
    pub fn new(registry: Arc<ValidatorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }
}

impl VotingPowerSource for RegistryVotingPower {
    fn voting_power(&self, validator_id: &ValidatorId) -> u64 {
        self.registry.voting_power(validator_id)
    }

    fn total_voting_power(&self) -> u64 {
        self.registry.total_voting_power()
    }

    fn proposer_for_slot(&self, slot: u64) -> Option<ValidatorId> {
        self.registry.proposer_for_slot(slot)
    }
}

/// Fixed validator powers with rotation by descending power, then id.
#[derive(Default)]
pub struct StaticVotingPower {
    powers: RwLock<BTreeMap<ValidatorId, u64>>,
}

impl StaticVotingPower {
    pub fn new<I, S>(powers: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<ValidatorId>,
    {
        Self {
            powers: RwLock::new(
                powers
                    .into_iter()
                    .map(|(id, power)| (id.into(), power))
                    .collect(),
            ),
        }
    }

    pub fn set_power(&self, validator_id: impl Into<ValidatorId>, power: u64) {
        self.powers.write().insert(validator_id.into(), power);
    }

    fn schedule(&self) -> Vec<ValidatorId> {
        let powers = self.powers.read();
        let mut entries: Vec<(&ValidatorId, &u64)> =
            powers.iter().filter(|(_, power)| **power > 0).collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

impl VotingPowerSource for StaticVotingPower {
    fn voting_power(&self, validator_id: &ValidatorId) -> u64 {
        self.powers.read().get(validator_id).copied().unwrap_or(0)
    }

    fn total_voting_power(&self) -> u64 {
        self.powers.read().values().sum()
    }

    fn proposer_for_slot(&self, slot: u64) -> Option<ValidatorId> {
        let schedule = self.schedule();
        if schedule.is_empty() {
            return None;
        }
        schedule.get((slot % schedule.len() as u64) as usize).cloned()
    }
}
