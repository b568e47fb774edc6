//! Driven ports (outbound dependencies)

use shared_types::ValidatorId;

/// Voting power and proposer order, usually backed by the validator
/// registry.
pub trait VotingPowerSource: Send + Sync {
    /// Current power of one validator. Zero for unknown or inactive ids.
    fn voting_power(&self, validator_id: &ValidatorId) -> u64;

    fn total_voting_power(&self) -> u64;

    fn proposer_for_slot(&self, slot: u64) -> Option<ValidatorId>;
}
