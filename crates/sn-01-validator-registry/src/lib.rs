//! # sn-01-validator-registry
//!
//! Validator Registry subsystem for Sovereign-Net.
//!
//! ## Architecture
//!
//! The registry is the single source of validator identity, stake and
//! voting power. Consensus reads voting power and proposer order from it;
//! it never writes back except through `slash`.
//!
//! ```text
//! register ──→ PENDING ──activate──→ ACTIVE ──→ rotation schedule ──→ BFT proposer
//!                                      │
//!                slash / uptime ───────┴──→ JAILED | SLASHED (power = 0)
//! ```
//!
//! ## Stake Accounting
//!
//! - `effective_stake = total_stake - unbonding_stake`
//! - `self_stake + delegated_stake == total_stake` after every mutation
//! - Voting power is effective stake for ACTIVE validators, zero otherwise
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sn_01_validator_registry::{RegistryConfig, ValidatorRegistry};
//! use shared_types::TracingAuditSink;
//!
//! let registry = ValidatorRegistry::new(
//!     RegistryConfig::default(),
//!     Arc::new(TracingAuditSink::new("validator_registry")),
//! );
//! let id = registry.register("pk", "10.0.0.1:26656", 50_000, 0.05, "Z1")?;
//! registry.activate(&id);
//! let proposer = registry.proposer_for_slot(0);
//! ```

pub mod domain;
pub mod events;
pub mod service;
pub mod state;

pub use domain::{
    RegistryConfig, RegistryError, RegistryResult, SlashingEvent, SlashingReason, UnbondingEntry,
    Validator, ValidatorCredentials, ValidatorStake, ValidatorStatus,
};
pub use events::RegistryEvent;
pub use service::{RegistryStats, ValidatorRegistry};
