//! Round state machine and weighted quorum
//!
//! ```text
//! PROPOSE ──propose──→ PREVOTE ──>2/3 prevotes──→ PRECOMMIT ──>2/3 precommits──→ COMMIT ──→ FINALIZED
//!    └──────────────────── timeout (any phase before FINALIZED) ──→ round + 1
//! ```

use super::block::BlockHeader;
use super::vote::ConsensusVote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ContentHash, ValidatorId};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    Propose,
    Prevote,
    Precommit,
    Commit,
    Finalized,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propose => "PROPOSE",
            Self::Prevote => "PREVOTE",
            Self::Precommit => "PRECOMMIT",
            Self::Commit => "COMMIT",
            Self::Finalized => "FINALIZED",
        }
    }
}

/// `power * 3 > total * 2`, computed without overflow.
pub fn exceeds_two_thirds(power: u64, total: u64) -> bool {
    (power as u128) * 3 > (total as u128) * 2
}

/// Vote tally for one round.
///
/// `total_voting_power` is captured once when the block is proposed; stake
/// changes during the round do not move the threshold.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QuorumState {
    pub prevotes: BTreeMap<ValidatorId, ConsensusVote>,
    pub precommits: BTreeMap<ValidatorId, ConsensusVote>,
    pub prevote_power: u64,
    pub precommit_power: u64,
    pub total_voting_power: u64,
}

impl QuorumState {
    pub fn new(total_voting_power: u64) -> Self {
        Self {
            total_voting_power,
            ..Default::default()
        }
    }

    pub fn has_prevote_quorum(&self) -> bool {
        exceeds_two_thirds(self.prevote_power, self.total_voting_power)
    }

    pub fn has_precommit_quorum(&self) -> bool {
        exceeds_two_thirds(self.precommit_power, self.total_voting_power)
    }
}

/// One `(height, round)` attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusRound {
    pub height: u64,
    pub round: u32,
    pub proposer: ValidatorId,
    pub proposed_block: Option<BlockHeader>,
    pub phase: RoundPhase,
    pub quorum: Option<QuorumState>,
    pub started_at: DateTime<Utc>,
    pub timeout: Duration,
}

impl ConsensusRound {
    pub fn new(
        height: u64,
        round: u32,
        proposer: ValidatorId,
        started_at: DateTime<Utc>,
        timeout: Duration,
    ) -> Self {
        Self {
            height,
            round,
            proposer,
            proposed_block: None,
            phase: RoundPhase::Propose,
            quorum: None,
            started_at,
            timeout,
        }
    }

    pub fn proposed_hash(&self) -> Option<ContentHash> {
        self.proposed_block.as_ref().map(|b| b.block_hash())
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == RoundPhase::Finalized
    }

    /// Strictly more than `timeout` has elapsed since the round started.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Ok(timeout) = chrono::Duration::from_std(self.timeout) else {
            return false;
        };
        now.signed_duration_since(self.started_at) > timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_quorum_boundary() {
        let mut q = QuorumState::new(100);
        q.prevote_power = 66;
        assert!(!q.has_prevote_quorum());
        q.prevote_power = 67;
        assert!(q.has_prevote_quorum());
    }

    #[test]
    fn test_exact_two_thirds_is_not_quorum() {
        let mut q = QuorumState::new(90);
        q.precommit_power = 60;
        assert!(!q.has_precommit_quorum());
        q.precommit_power = 61;
        assert!(q.has_precommit_quorum());
    }

    #[test]
    fn test_zero_total_never_reaches_quorum() {
        let q = QuorumState::new(0);
        assert!(!q.has_prevote_quorum());
        assert!(!q.has_precommit_quorum());
    }

    #[test]
    fn test_expiry_is_strict() {
        let start = DateTime::from_timestamp(1_000, 0).unwrap();
        let round = ConsensusRound::new(1, 0, ValidatorId::from("v"), start, Duration::from_secs(30));
        assert!(!round.is_expired(start + chrono::Duration::seconds(30)));
        assert!(round.is_expired(start + chrono::Duration::milliseconds(30_001)));
    }

    proptest! {
        #[test]
        fn quorum_matches_integer_rule(power in any::<u64>(), total in any::<u64>()) {
            let mut q = QuorumState::new(total);
            q.prevote_power = power;
            q.precommit_power = power;
            let expected = (power as u128) * 3 > (total as u128) * 2;
            prop_assert_eq!(q.has_prevote_quorum(), expected);
            prop_assert_eq!(q.has_precommit_quorum(), expected);
        }
    }
}
