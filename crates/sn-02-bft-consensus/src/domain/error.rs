//! Error types for BFT Consensus
//!
//! Wrong proposer, wrong phase and duplicate votes are soft rejections
//! (`Ok(None)` / `false` plus an audit entry). Opening a round is an error
//! when the slot has no proposer or the height is already final.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("No proposer available for height {height} round {round} (slot {slot})")]
    NoProposerAvailable { height: u64, round: u32, slot: u64 },

    #[error("Height {height} is already finalized")]
    HeightFinalized { height: u64 },
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
