//! Driving ports (inbound API)

use crate::domain::{BlockHeader, ConsensusResult, ConsensusRound};
use shared_types::{ContentHash, ValidatorId};

/// Primary consensus API.
///
/// Implemented by [`crate::BftConsensus`] and by decorators such as
/// [`crate::TrajectoryAwareConsensus`] that intercept individual calls.
pub trait ConsensusApi: Send + Sync {
    /// Open `(height, round)` in PROPOSE. Returns the existing round if it
    /// is already open.
    ///
    /// # Errors
    /// `NoProposerAvailable` when the rotation schedule is empty,
    /// `HeightFinalized` once a block at `height` is final.
    fn start_round(&self, height: u64, round: u32) -> ConsensusResult<ConsensusRound>;

    /// Propose a block. `Ok(None)` when the proposer or phase is wrong or
    /// the height is already final.
    fn propose_block(
        &self,
        height: u64,
        round: u32,
        proposer: &ValidatorId,
        parent_hash: ContentHash,
        state_root: ContentHash,
        txs_root: ContentHash,
    ) -> ConsensusResult<Option<BlockHeader>>;

    fn prevote(
        &self,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool;

    fn precommit(
        &self,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool;

    /// Poll a round for expiry. Returns `round + 1` if the round timed out,
    /// the unchanged round otherwise, `None` for an unknown round. Once the
    /// height is final no successor is opened and the finalizing round is
    /// returned instead.
    fn handle_timeout(&self, height: u64, round: u32) -> ConsensusResult<Option<ConsensusRound>>;

    fn get_round(&self, height: u64, round: u32) -> Option<ConsensusRound>;

    fn finalized_block(&self, height: u64) -> Option<BlockHeader>;

    fn latest_finalized_height(&self) -> Option<u64>;
}
