//! Validator domain entities

use super::slashing::SlashingEvent;
use super::stake::ValidatorStake;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{iso8601, CanonicalRecord, ValidatorId};
use std::collections::BTreeMap;

/// Lifecycle status.
///
/// ```text
/// PENDING ──activate──→ ACTIVE ──slash(double_signing)/downtime──→ JAILED ──unjail──→ ACTIVE
///    │                    │  └──slash(invariant_violation)──→ SLASHED
///    └──────unbond────────┴──→ UNBONDING ──advance_epoch──→ ACTIVE | INACTIVE
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatorStatus {
    Pending,
    Active,
    Jailed,
    Slashed,
    Unbonding,
    Inactive,
}

impl ValidatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Jailed => "JAILED",
            Self::Slashed => "SLASHED",
            Self::Unbonding => "UNBONDING",
            Self::Inactive => "INACTIVE",
        }
    }
}

/// Immutable identity of a validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidatorCredentials {
    pub validator_id: ValidatorId,
    pub public_key: String,
    pub network_address: String,
    pub created_at: DateTime<Utc>,
}

impl CanonicalRecord for ValidatorCredentials {
    const HASH_KEY: &'static str = "credentials_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("validator_id".into(), json!(self.validator_id));
        fields.insert("public_key".into(), json!(self.public_key));
        fields.insert("network_address".into(), json!(self.network_address));
        fields.insert("created_at".into(), json!(iso8601(self.created_at)));
        fields
    }
}

/// Stake scheduled to leave the bonded set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    pub amount: u64,
    pub started_epoch: u64,
    pub completion_epoch: u64,
}

/// Validator aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Validator {
    pub credentials: ValidatorCredentials,
    pub stake: ValidatorStake,
    pub status: ValidatorStatus,
    /// Commission rate in `[0, 1]`.
    pub commission_rate: f64,
    /// Rolling uptime score in `[0, 1]`.
    pub uptime: f64,
    /// Deployment zone label, e.g. `Z1`.
    pub zone: String,
    pub slashing_history: Vec<SlashingEvent>,
    pub unbonding_queue: Vec<UnbondingEntry>,
    /// Delegator -> cumulative amount.
    pub delegations: BTreeMap<String, u64>,
    pub jailed_until_epoch: Option<u64>,
}

impl Validator {
    pub fn new(
        credentials: ValidatorCredentials,
        self_stake: u64,
        commission_rate: f64,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            stake: ValidatorStake::new(self_stake),
            status: ValidatorStatus::Pending,
            commission_rate,
            uptime: 1.0,
            zone: zone.into(),
            slashing_history: Vec::new(),
            unbonding_queue: Vec::new(),
            delegations: BTreeMap::new(),
            jailed_until_epoch: None,
        }
    }

    pub fn id(&self) -> &ValidatorId {
        &self.credentials.validator_id
    }

    pub fn is_active(&self) -> bool {
        self.status == ValidatorStatus::Active
    }

    /// Effective stake while ACTIVE, zero otherwise.
    pub fn voting_power(&self) -> u64 {
        if self.is_active() {
            self.stake.effective_stake()
        } else {
            0
        }
    }

    pub fn accepts_delegation(&self) -> bool {
        matches!(self.status, ValidatorStatus::Active | ValidatorStatus::Pending)
    }

    /// Total amount ever slashed from this validator.
    pub fn total_slashed(&self) -> u64 {
        self.slashing_history.iter().map(|e| e.amount_slashed).sum()
    }
}
