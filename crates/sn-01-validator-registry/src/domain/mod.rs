//! Domain layer for the Validator Registry
//!
//! - stake: per-validator stake ledger
//! - slashing: penalty table and slashing records
//! - validator: validator aggregate and lifecycle status
//! - schedule: deterministic proposer rotation

mod config;
mod error;
mod schedule;
mod slashing;
mod stake;
mod validator;

pub use config::*;
pub use error::*;
pub use schedule::*;
pub use slashing::*;
pub use stake::*;
pub use validator::*;
