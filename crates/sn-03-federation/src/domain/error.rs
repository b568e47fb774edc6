//! Error types for the federation subsystem

use shared_types::SiteId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FederationError {
    #[error("Site name must not be empty")]
    EmptyName,

    #[error("Site already registered: {0}")]
    DuplicateSite(SiteId),

    #[error("Bundle signing failed: {0}")]
    Signing(String),
}

/// Result type for federation operations
pub type FederationResult<T> = Result<T, FederationError>;

/// Failure reported by a [`crate::replicator::ReplayExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Block {height} failed to execute: {reason}")]
    ExecutionFailed { height: u64, reason: String },

    #[error("Block range is not contiguous at height {0}")]
    GapInRange(u64),

    #[error("Blocks do not cover heights {start}..={end}")]
    RangeMismatch { start: u64, end: u64 },
}
