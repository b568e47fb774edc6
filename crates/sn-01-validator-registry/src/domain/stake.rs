//! Stake ledger for a single validator
//!
//! INVARIANT-1: `effective_stake = total_stake - unbonding_stake`
//! INVARIANT-2: `self_stake + delegated_stake == total_stake` after every
//! mutation. Integer rescaling rounds self stake down and assigns the
//! remainder to delegated stake so the sum is exact.

use serde::{Deserialize, Serialize};

/// Basis-point denominator (100% = 10_000 bps).
pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorStake {
    pub total_stake: u64,
    pub self_stake: u64,
    pub delegated_stake: u64,
    pub unbonding_stake: u64,
}

impl ValidatorStake {
    /// Stake bonded by the operator alone.
    pub fn new(self_stake: u64) -> Self {
        Self {
            total_stake: self_stake,
            self_stake,
            delegated_stake: 0,
            unbonding_stake: 0,
        }
    }

    /// Stake that counts toward voting power.
    pub fn effective_stake(&self) -> u64 {
        self.total_stake.saturating_sub(self.unbonding_stake)
    }

    /// Fraction of total stake bonded by the operator.
    pub fn self_stake_ratio(&self) -> f64 {
        if self.total_stake == 0 {
            return 0.0;
        }
        self.self_stake as f64 / self.total_stake as f64
    }

    pub fn add_delegation(&mut self, amount: u64) {
        self.delegated_stake = self.delegated_stake.saturating_add(amount);
        self.total_stake = self.total_stake.saturating_add(amount);
    }

    /// Move `amount` of effective stake into the unbonding bucket.
    ///
    /// Returns `false` without mutating when `amount` exceeds effective stake.
    pub fn begin_unbonding(&mut self, amount: u64) -> bool {
        if amount > self.effective_stake() {
            return false;
        }
        self.unbonding_stake += amount;
        true
    }

    /// Release matured unbonding stake. Returns the amount released.
    pub fn complete_unbonding(&mut self, amount: u64) -> u64 {
        let released = amount.min(self.unbonding_stake).min(self.total_stake);
        self.unbonding_stake -= released;
        self.rescale_to(self.total_stake - released);
        released
    }

    /// Burn `penalty_bps` of total stake. Returns the amount burned.
    pub fn slash(&mut self, penalty_bps: u64) -> u64 {
        let bps = penalty_bps.min(BPS_DENOMINATOR);
        let burned = (self.total_stake as u128 * bps as u128 / BPS_DENOMINATOR as u128) as u64;
        self.rescale_to(self.total_stake - burned);
        self.unbonding_stake = self.unbonding_stake.min(self.total_stake);
        burned
    }

    /// Shrink total stake to `new_total`, scaling self and delegated stake
    /// by the same ratio.
    fn rescale_to(&mut self, new_total: u64) {
        if self.total_stake == 0 {
            return;
        }
        let new_self =
            (self.self_stake as u128 * new_total as u128 / self.total_stake as u128) as u64;
        self.self_stake = new_self;
        self.delegated_stake = new_total - new_self;
        self.total_stake = new_total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_stake_excludes_unbonding() {
        let mut stake = ValidatorStake::new(50_000);
        assert!(stake.begin_unbonding(20_000));
        assert_eq!(stake.effective_stake(), 30_000);
        assert_eq!(stake.total_stake, 50_000);
    }

    #[test]
    fn test_unbonding_beyond_effective_rejected() {
        let mut stake = ValidatorStake::new(50_000);
        assert!(stake.begin_unbonding(40_000));
        assert!(!stake.begin_unbonding(10_001));
        assert_eq!(stake.unbonding_stake, 40_000);
    }

    #[test]
    fn test_slash_rescales_components() {
        let mut stake = ValidatorStake::new(20_000);
        stake.add_delegation(80_000);

        let burned = stake.slash(1_000); // 10%

        assert_eq!(burned, 10_000);
        assert_eq!(stake.total_stake, 90_000);
        assert_eq!(stake.self_stake, 18_000);
        assert_eq!(stake.delegated_stake, 72_000);
    }

    #[test]
    fn test_slash_keeps_sum_exact_with_rounding() {
        let mut stake = ValidatorStake::new(10_001);
        stake.add_delegation(3);
        stake.slash(500);
        assert_eq!(stake.self_stake + stake.delegated_stake, stake.total_stake);
    }

    #[test]
    fn test_full_slash_never_negative() {
        let mut stake = ValidatorStake::new(10_000);
        stake.begin_unbonding(5_000);
        stake.slash(BPS_DENOMINATOR * 2);
        assert_eq!(stake.total_stake, 0);
        assert_eq!(stake.unbonding_stake, 0);
        assert_eq!(stake.effective_stake(), 0);
    }

    #[test]
    fn test_complete_unbonding_releases_stake() {
        let mut stake = ValidatorStake::new(40_000);
        stake.add_delegation(10_000);
        stake.begin_unbonding(25_000);

        let released = stake.complete_unbonding(25_000);

        assert_eq!(released, 25_000);
        assert_eq!(stake.total_stake, 25_000);
        assert_eq!(stake.unbonding_stake, 0);
        assert_eq!(stake.self_stake, 20_000);
        assert_eq!(stake.delegated_stake, 5_000);
    }
}
