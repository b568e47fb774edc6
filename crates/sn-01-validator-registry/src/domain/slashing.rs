//! # Slashing
//!
//! Penalty table and the immutable slashing record.
//!
//! | Reason | Penalty | Jails | Marks SLASHED |
//! |--------|---------|-------|---------------|
//! | double_signing | 5% | yes | no |
//! | downtime | 1% | via uptime check | no |
//! | invalid_block | 10% | no | no |
//! | invariant_violation | 50% | yes | yes |
//! | governance_violation | 20% | no | no |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{iso8601, CanonicalRecord, ValidatorId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashingReason {
    DoubleSigning,
    Downtime,
    InvalidBlock,
    InvariantViolation,
    GovernanceViolation,
}

impl SlashingReason {
    /// Penalty in basis points of total stake.
    pub fn penalty_bps(&self) -> u64 {
        match self {
            Self::DoubleSigning => 500,
            Self::Downtime => 100,
            Self::InvalidBlock => 1_000,
            Self::InvariantViolation => 5_000,
            Self::GovernanceViolation => 2_000,
        }
    }

    /// Penalty as a fraction in `[0, 1]`.
    pub fn penalty_fraction(&self) -> f64 {
        self.penalty_bps() as f64 / 10_000.0
    }

    pub fn jails(&self) -> bool {
        matches!(self, Self::DoubleSigning | Self::InvariantViolation)
    }

    /// Permanently removes the validator from the active set.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InvariantViolation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoubleSigning => "double_signing",
            Self::Downtime => "downtime",
            Self::InvalidBlock => "invalid_block",
            Self::InvariantViolation => "invariant_violation",
            Self::GovernanceViolation => "governance_violation",
        }
    }
}

/// Append-only record of one penalty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlashingEvent {
    pub validator_id: ValidatorId,
    pub reason: SlashingReason,
    pub amount_slashed: u64,
    pub stake_before: u64,
    pub stake_after: u64,
    pub epoch: u64,
    /// Opaque evidence supplied by the reporter.
    pub evidence: Value,
    pub timestamp: DateTime<Utc>,
}

impl CanonicalRecord for SlashingEvent {
    const HASH_KEY: &'static str = "event_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("validator_id".into(), json!(self.validator_id));
        fields.insert("reason".into(), json!(self.reason.as_str()));
        fields.insert("slash_percentage".into(), json!(self.reason.penalty_fraction()));
        fields.insert("amount_slashed".into(), json!(self.amount_slashed));
        fields.insert("stake_before".into(), json!(self.stake_before));
        fields.insert("stake_after".into(), json!(self.stake_after));
        fields.insert("epoch".into(), json!(self.epoch));
        fields.insert("evidence".into(), self.evidence.clone());
        fields.insert("timestamp".into(), json!(iso8601(self.timestamp)));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::verify_record;

    #[test]
    fn test_penalty_table() {
        assert_eq!(SlashingReason::DoubleSigning.penalty_bps(), 500);
        assert_eq!(SlashingReason::Downtime.penalty_bps(), 100);
        assert_eq!(SlashingReason::InvalidBlock.penalty_bps(), 1_000);
        assert_eq!(SlashingReason::InvariantViolation.penalty_bps(), 5_000);
        assert_eq!(SlashingReason::GovernanceViolation.penalty_bps(), 2_000);
    }

    #[test]
    fn test_jailing_reasons() {
        assert!(SlashingReason::DoubleSigning.jails());
        assert!(SlashingReason::InvariantViolation.jails());
        assert!(!SlashingReason::Downtime.jails());
        assert!(!SlashingReason::GovernanceViolation.jails());
        assert!(SlashingReason::InvariantViolation.is_terminal());
    }

    #[test]
    fn test_slashing_event_record_is_self_verifying() {
        let event = SlashingEvent {
            validator_id: ValidatorId::from("v1"),
            reason: SlashingReason::InvalidBlock,
            amount_slashed: 1_000,
            stake_before: 10_000,
            stake_after: 9_000,
            epoch: 3,
            evidence: json!({"block_hash": "ab"}),
            timestamp: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
        };

        let record = event.to_record();
        assert_eq!(record["reason"], "invalid_block");
        assert!(verify_record(&record, "event_hash"));
    }
}
