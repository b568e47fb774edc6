//! Error types for the Validator Registry
//!
//! Only input validation surfaces as an error. Lifecycle operations that
//! are refused (activation below the self-stake floor, delegation to a
//! jailed validator, over-unbonding) return `false`/`None` and leave an
//! audit entry instead.

use shared_types::ValidatorId;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Stake below minimum: {stake} < {minimum}")]
    StakeBelowMinimum { stake: u64, minimum: u64 },

    #[error("Commission rate out of range [0, 1]: {0}")]
    InvalidCommission(f64),

    #[error("Validator already registered: {0}")]
    DuplicateValidator(ValidatorId),

    #[error("Public key must not be empty")]
    EmptyPublicKey,
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
