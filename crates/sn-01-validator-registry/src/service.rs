//! Validator Registry Service
//!
//! Owns the stake ledger and derives the proposer rotation schedule from
//! it. Every mutation that can change voting power (activation, slashing,
//! jailing, unbonding, epoch advance) recomputes the schedule while still
//! holding the write lock.

use crate::domain::{
    proposer_at, RegistryConfig, RegistryError, RegistryResult, SlashingEvent, SlashingReason,
    UnbondingEntry, Validator, ValidatorCredentials, ValidatorStatus,
};
use crate::events::RegistryEvent;
use crate::state::RegistryState;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{
    canonical_hash, iso8601, AuditEvent, AuditSink, SystemTimeSource, TimeSource, ValidatorId,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Point-in-time summary of the registry.
#[derive(Clone, Debug, Serialize)]
pub struct RegistryStats {
    pub epoch: u64,
    pub total_validators: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_voting_power: u64,
    pub schedule_length: usize,
}

pub struct ValidatorRegistry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,
    audit: Arc<dyn AuditSink>,
    time_source: Arc<dyn TimeSource>,
}

impl ValidatorRegistry {
    pub fn new(config: RegistryConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            state: RwLock::new(RegistryState::new()),
            config,
            audit,
            time_source: Arc::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn emit(&self, event: RegistryEvent, data: Value) {
        self.audit
            .record(AuditEvent::new(self.time_source.now(), event.as_str(), data));
    }

    fn recompute_schedule(&self, state: &mut RegistryState) {
        let epoch = state.epoch;
        let schedule = state.rebuild_schedule();
        debug!("[sn-01] Rotation schedule recomputed: {} validators", schedule.len());
        let ids: Vec<&str> = schedule.iter().map(|id| id.as_str()).collect();
        self.emit(
            RegistryEvent::ScheduleRecomputed,
            json!({"epoch": epoch, "schedule": ids}),
        );
    }

    // === LIFECYCLE ===

    /// Register a new validator in PENDING status.
    ///
    /// The id is the canonical hash of the public key and the registration
    /// timestamp.
    pub fn register(
        &self,
        public_key: &str,
        network_address: &str,
        stake: u64,
        commission_rate: f64,
        zone: &str,
    ) -> RegistryResult<ValidatorId> {
        if public_key.is_empty() {
            return Err(RegistryError::EmptyPublicKey);
        }
        if stake < self.config.min_stake {
            return Err(RegistryError::StakeBelowMinimum {
                stake,
                minimum: self.config.min_stake,
            });
        }
        if !(0.0..=1.0).contains(&commission_rate) {
            return Err(RegistryError::InvalidCommission(commission_rate));
        }

        let created_at = self.time_source.now();
        let validator_id = ValidatorId::new(
            canonical_hash(&json!({
                "public_key": public_key,
                "timestamp": iso8601(created_at),
            }))
            .to_hex(),
        );

        let mut state = self.state.write();
        if state.validators.contains_key(&validator_id) {
            return Err(RegistryError::DuplicateValidator(validator_id));
        }

        let credentials = ValidatorCredentials {
            validator_id: validator_id.clone(),
            public_key: public_key.to_string(),
            network_address: network_address.to_string(),
            created_at,
        };
        state.validators.insert(
            validator_id.clone(),
            Validator::new(credentials, stake, commission_rate, zone),
        );

        info!("[sn-01] Registered validator {} with stake {}", validator_id, stake);
        self.emit(
            RegistryEvent::ValidatorRegistered,
            json!({
                "validator_id": validator_id,
                "stake": stake,
                "commission_rate": commission_rate,
                "zone": zone,
            }),
        );
        Ok(validator_id)
    }

    /// Move a PENDING or INACTIVE validator into the active set.
    pub fn activate(&self, validator_id: &ValidatorId) -> bool {
        let mut state = self.state.write();
        let Some(validator) = state.validators.get_mut(validator_id) else {
            self.emit(
                RegistryEvent::ActivationRejected,
                json!({"validator_id": validator_id, "reason": "unknown_validator"}),
            );
            return false;
        };

        if validator.status == ValidatorStatus::Active {
            return true;
        }
        if !matches!(
            validator.status,
            ValidatorStatus::Pending | ValidatorStatus::Inactive
        ) {
            self.emit(
                RegistryEvent::ActivationRejected,
                json!({
                    "validator_id": validator_id,
                    "reason": "invalid_status",
                    "status": validator.status.as_str(),
                }),
            );
            return false;
        }

        let ratio = validator.stake.self_stake_ratio();
        if ratio < self.config.min_self_stake_ratio {
            warn!(
                "[sn-01] Activation refused for {}: self-stake ratio {:.4} < {}",
                validator_id, ratio, self.config.min_self_stake_ratio
            );
            self.emit(
                RegistryEvent::ActivationRejected,
                json!({
                    "validator_id": validator_id,
                    "reason": "insufficient_self_stake",
                    "self_stake_ratio": ratio,
                }),
            );
            return false;
        }

        validator.status = ValidatorStatus::Active;
        let power = validator.stake.effective_stake();
        info!("[sn-01] Activated validator {} (power {})", validator_id, power);
        self.emit(
            RegistryEvent::ValidatorActivated,
            json!({"validator_id": validator_id, "voting_power": power}),
        );
        self.recompute_schedule(&mut state);
        true
    }

    /// Add delegated stake. Only ACTIVE and PENDING validators accept it.
    pub fn delegate(&self, validator_id: &ValidatorId, amount: u64, delegator: &str) -> bool {
        let mut state = self.state.write();
        let rejection = match state.validators.get(validator_id) {
            None => Some("unknown_validator"),
            Some(_) if amount == 0 => Some("zero_amount"),
            Some(v) if !v.accepts_delegation() => Some("invalid_status"),
            Some(_) => None,
        };
        if let Some(reason) = rejection {
            self.emit(
                RegistryEvent::DelegationRejected,
                json!({
                    "validator_id": validator_id,
                    "delegator": delegator,
                    "amount": amount,
                    "reason": reason,
                }),
            );
            return false;
        }

        let Some(validator) = state.validators.get_mut(validator_id) else {
            return false;
        };
        validator.stake.add_delegation(amount);
        *validator.delegations.entry(delegator.to_string()).or_insert(0) += amount;
        let was_active = validator.is_active();
        let total = validator.stake.total_stake;

        self.emit(
            RegistryEvent::DelegationAdded,
            json!({
                "validator_id": validator_id,
                "delegator": delegator,
                "amount": amount,
                "total_stake": total,
            }),
        );
        if was_active {
            self.recompute_schedule(&mut state);
        }
        true
    }

    /// Start unbonding `amount`. Released after the unbonding period.
    ///
    /// Only an ACTIVE validator changes status; PENDING and INACTIVE
    /// validators queue the amount and keep their status, so they still
    /// have to pass `activate`.
    pub fn begin_unbonding(&self, validator_id: &ValidatorId, amount: u64) -> bool {
        let mut state = self.state.write();
        let epoch = state.epoch;
        let completion_epoch = epoch + self.config.unbonding_period_epochs;

        let Some(validator) = state.validators.get_mut(validator_id) else {
            self.emit(
                RegistryEvent::UnbondingRejected,
                json!({"validator_id": validator_id, "amount": amount, "reason": "unknown_validator"}),
            );
            return false;
        };

        let effective = validator.stake.effective_stake();
        if amount == 0 || !validator.stake.begin_unbonding(amount) {
            self.emit(
                RegistryEvent::UnbondingRejected,
                json!({
                    "validator_id": validator_id,
                    "amount": amount,
                    "effective_stake": effective,
                    "reason": "exceeds_effective_stake",
                }),
            );
            return false;
        }

        validator.unbonding_queue.push(UnbondingEntry {
            amount,
            started_epoch: epoch,
            completion_epoch,
        });
        if validator.status == ValidatorStatus::Active {
            validator.status = ValidatorStatus::Unbonding;
        }

        info!(
            "[sn-01] Validator {} unbonding {} until epoch {}",
            validator_id, amount, completion_epoch
        );
        self.emit(
            RegistryEvent::UnbondingStarted,
            json!({
                "validator_id": validator_id,
                "amount": amount,
                "completion_epoch": completion_epoch,
            }),
        );
        self.recompute_schedule(&mut state);
        true
    }

    /// Apply a penalty from the slashing table.
    ///
    /// Returns the appended [`SlashingEvent`], or `None` for an unknown
    /// validator.
    pub fn slash(
        &self,
        validator_id: &ValidatorId,
        reason: SlashingReason,
        evidence: Value,
    ) -> Option<SlashingEvent> {
        let mut state = self.state.write();
        let event = self.slash_locked(&mut state, validator_id, reason, evidence)?;
        self.recompute_schedule(&mut state);
        Some(event)
    }

    fn slash_locked(
        &self,
        state: &mut RegistryState,
        validator_id: &ValidatorId,
        reason: SlashingReason,
        evidence: Value,
    ) -> Option<SlashingEvent> {
        let epoch = state.epoch;
        let jail_until = epoch + self.config.jail_duration_epochs;
        let now = self.time_source.now();
        let validator = state.validators.get_mut(validator_id)?;

        let stake_before = validator.stake.total_stake;
        let amount_slashed = validator.stake.slash(reason.penalty_bps());
        let event = SlashingEvent {
            validator_id: validator_id.clone(),
            reason,
            amount_slashed,
            stake_before,
            stake_after: validator.stake.total_stake,
            epoch,
            evidence,
            timestamp: now,
        };
        validator.slashing_history.push(event.clone());

        if reason.is_terminal() {
            validator.status = ValidatorStatus::Slashed;
        } else if reason.jails() && validator.status != ValidatorStatus::Slashed {
            validator.status = ValidatorStatus::Jailed;
            validator.jailed_until_epoch = Some(jail_until);
        }

        warn!(
            "[sn-01] Slashed validator {} for {}: {} -> {}",
            validator_id,
            reason.as_str(),
            stake_before,
            event.stake_after
        );
        self.emit(
            RegistryEvent::ValidatorSlashed,
            json!({
                "validator_id": validator_id,
                "reason": reason.as_str(),
                "amount_slashed": amount_slashed,
                "stake_after": event.stake_after,
                "status": validator.status.as_str(),
            }),
        );
        Some(event)
    }

    /// Record an uptime score. A score under the downtime threshold while
    /// ACTIVE slashes for downtime and jails.
    pub fn update_uptime(&self, validator_id: &ValidatorId, score: f64) -> bool {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        let mut state = self.state.write();
        let epoch = state.epoch;

        let Some(validator) = state.validators.get_mut(validator_id) else {
            self.emit(
                RegistryEvent::UptimeRejected,
                json!({"validator_id": validator_id, "uptime": score, "reason": "unknown_validator"}),
            );
            return false;
        };
        validator.uptime = score;
        let breach = validator.is_active() && score < self.config.downtime_threshold;
        self.emit(
            RegistryEvent::UptimeUpdated,
            json!({"validator_id": validator_id, "uptime": score}),
        );

        if breach {
            self.slash_locked(
                &mut state,
                validator_id,
                SlashingReason::Downtime,
                json!({"uptime": score, "threshold": self.config.downtime_threshold}),
            );
            if let Some(validator) = state.validators.get_mut(validator_id) {
                validator.status = ValidatorStatus::Jailed;
                validator.jailed_until_epoch = Some(epoch + self.config.jail_duration_epochs);
            }
            warn!("[sn-01] Validator {} jailed for downtime ({:.3})", validator_id, score);
            self.emit(
                RegistryEvent::ValidatorJailed,
                json!({"validator_id": validator_id, "reason": "downtime"}),
            );
            self.recompute_schedule(&mut state);
        }
        true
    }

    /// Release a JAILED validator once its jail term has elapsed.
    ///
    /// SLASHED validators never return.
    pub fn unjail(&self, validator_id: &ValidatorId) -> bool {
        let mut state = self.state.write();
        let epoch = state.epoch;
        let min_ratio = self.config.min_self_stake_ratio;

        let reason = match state.validators.get(validator_id) {
            None => Some("unknown_validator"),
            Some(v) if v.status != ValidatorStatus::Jailed => Some("not_jailed"),
            Some(v) if v.jailed_until_epoch.is_some_and(|until| epoch < until) => {
                Some("jail_term_not_elapsed")
            }
            Some(v) if v.stake.self_stake_ratio() < min_ratio => Some("insufficient_self_stake"),
            Some(_) => None,
        };
        if let Some(reason) = reason {
            self.emit(
                RegistryEvent::UnjailRejected,
                json!({"validator_id": validator_id, "reason": reason}),
            );
            return false;
        }

        if let Some(validator) = state.validators.get_mut(validator_id) {
            validator.status = ValidatorStatus::Active;
            validator.jailed_until_epoch = None;
        }
        info!("[sn-01] Validator {} unjailed at epoch {}", validator_id, epoch);
        self.emit(
            RegistryEvent::ValidatorUnjailed,
            json!({"validator_id": validator_id, "epoch": epoch}),
        );
        self.recompute_schedule(&mut state);
        true
    }

    /// Increment the epoch, release matured unbonding and rebuild the
    /// schedule. Returns the new epoch.
    pub fn advance_epoch(&self) -> u64 {
        let mut state = self.state.write();
        state.epoch += 1;
        let epoch = state.epoch;
        let min_stake = self.config.min_stake;
        let min_ratio = self.config.min_self_stake_ratio;
        let mut completed = Vec::new();

        for (id, validator) in state.validators.iter_mut() {
            let (matured, pending): (Vec<_>, Vec<_>) = validator
                .unbonding_queue
                .drain(..)
                .partition(|entry| entry.completion_epoch <= epoch);
            validator.unbonding_queue = pending;
            if matured.is_empty() {
                continue;
            }

            let released: u64 = matured
                .iter()
                .map(|entry| validator.stake.complete_unbonding(entry.amount))
                .sum();

            if validator.status == ValidatorStatus::Unbonding && validator.unbonding_queue.is_empty()
            {
                validator.status = if validator.stake.total_stake >= min_stake
                    && validator.stake.self_stake_ratio() >= min_ratio
                {
                    ValidatorStatus::Active
                } else {
                    ValidatorStatus::Inactive
                };
            }
            completed.push((id.clone(), released, validator.status));
        }

        for (id, released, status) in &completed {
            info!(
                "[sn-01] Unbonding completed for {}: released {}, now {}",
                id,
                released,
                status.as_str()
            );
            self.emit(
                RegistryEvent::UnbondingCompleted,
                json!({"validator_id": id, "released": released, "status": status.as_str()}),
            );
        }
        self.emit(
            RegistryEvent::EpochAdvanced,
            json!({"epoch": epoch, "unbondings_completed": completed.len()}),
        );
        self.recompute_schedule(&mut state);
        epoch
    }

    // === ROTATION ===

    /// Rebuild the rotation schedule and return it.
    pub fn compute_rotation_schedule(&self) -> Vec<ValidatorId> {
        let mut state = self.state.write();
        self.recompute_schedule(&mut state);
        state.schedule.clone()
    }

    /// Current schedule without recomputing.
    pub fn rotation_schedule(&self) -> Vec<ValidatorId> {
        self.state.read().schedule.clone()
    }

    /// `schedule[slot mod len]`, `None` when no validator is active.
    pub fn proposer_for_slot(&self, slot: u64) -> Option<ValidatorId> {
        proposer_at(&self.state.read().schedule, slot).cloned()
    }

    // === QUERIES ===

    pub fn voting_power(&self, validator_id: &ValidatorId) -> u64 {
        self.state
            .read()
            .validators
            .get(validator_id)
            .map(|v| v.voting_power())
            .unwrap_or(0)
    }

    pub fn total_voting_power(&self) -> u64 {
        self.state.read().total_voting_power()
    }

    pub fn get_validator(&self, validator_id: &ValidatorId) -> Option<Validator> {
        self.state.read().validators.get(validator_id).cloned()
    }

    pub fn active_validators(&self) -> Vec<Validator> {
        self.state
            .read()
            .validators
            .values()
            .filter(|v| v.is_active())
            .cloned()
            .collect()
    }

    pub fn slashing_history(&self, validator_id: &ValidatorId) -> Vec<SlashingEvent> {
        self.state
            .read()
            .validators
            .get(validator_id)
            .map(|v| v.slashing_history.clone())
            .unwrap_or_default()
    }

    pub fn current_epoch(&self) -> u64 {
        self.state.read().epoch
    }

    pub fn validator_count(&self) -> usize {
        self.state.read().validators.len()
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        let mut by_status = BTreeMap::new();
        for validator in state.validators.values() {
            *by_status
                .entry(validator.status.as_str().to_string())
                .or_insert(0) += 1;
        }
        RegistryStats {
            epoch: state.epoch,
            total_validators: state.validators.len(),
            by_status,
            total_voting_power: state.total_voting_power(),
            schedule_length: state.schedule.len(),
        }
    }
}
