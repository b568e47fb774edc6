//! Registry configuration

/// Tunables for the validator lifecycle.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Minimum bonded stake to register or stay active after unbonding.
    pub min_stake: u64,
    /// Self-stake / total-stake floor for activation.
    pub min_self_stake_ratio: f64,
    /// Epochs between `begin_unbonding` and release.
    pub unbonding_period_epochs: u64,
    /// Uptime below this jails an ACTIVE validator.
    pub downtime_threshold: f64,
    /// Epochs a jailed validator must wait before `unjail`.
    pub jail_duration_epochs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_stake: 10_000,
            min_self_stake_ratio: 0.1,
            unbonding_period_epochs: 21,
            downtime_threshold: 0.9,
            jail_duration_epochs: 1,
        }
    }
}
