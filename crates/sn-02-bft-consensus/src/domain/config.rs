//! Consensus configuration

use std::time::Duration;

/// Round and slot tunables.
#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    /// A round older than this may be replaced by `round + 1`.
    pub round_timeout: Duration,
    /// `slot = height * slot_multiplier + round`.
    pub slot_multiplier: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            round_timeout: Duration::from_secs(30),
            slot_multiplier: 100,
        }
    }
}

impl ConsensusConfig {
    pub fn slot_for(&self, height: u64, round: u32) -> u64 {
        height
            .saturating_mul(self.slot_multiplier)
            .saturating_add(round as u64)
    }
}
