//! Audit event types emitted by the registry

/// Event names written to the audit sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    ValidatorRegistered,
    ValidatorActivated,
    ActivationRejected,
    DelegationAdded,
    DelegationRejected,
    UnbondingStarted,
    UnbondingRejected,
    UnbondingCompleted,
    ValidatorSlashed,
    ValidatorJailed,
    ValidatorUnjailed,
    UnjailRejected,
    UptimeUpdated,
    UptimeRejected,
    EpochAdvanced,
    ScheduleRecomputed,
}

impl RegistryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidatorRegistered => "validator_registered",
            Self::ValidatorActivated => "validator_activated",
            Self::ActivationRejected => "activation_rejected",
            Self::DelegationAdded => "delegation_added",
            Self::DelegationRejected => "delegation_rejected",
            Self::UnbondingStarted => "unbonding_started",
            Self::UnbondingRejected => "unbonding_rejected",
            Self::UnbondingCompleted => "unbonding_completed",
            Self::ValidatorSlashed => "validator_slashed",
            Self::ValidatorJailed => "validator_jailed",
            Self::ValidatorUnjailed => "validator_unjailed",
            Self::UnjailRejected => "unjail_rejected",
            Self::UptimeUpdated => "uptime_updated",
            Self::UptimeRejected => "uptime_rejected",
            Self::EpochAdvanced => "epoch_advanced",
            Self::ScheduleRecomputed => "schedule_recomputed",
        }
    }
}
