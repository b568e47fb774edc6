//! Audit event types emitted by consensus

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusEvent {
    RoundStarted,
    BlockProposed,
    InvalidProposal,
    NilPrevote,
    NilPrecommit,
    VoteRejected,
    PrevoteQuorumReached,
    BlockCommitted,
    BlockFinalized,
    RoundTimeout,
    RoundsEvicted,
    /// Emitted by the trajectory gate, not the engine.
    ProposalBlockedSuspended,
    ConsensusSuspended,
    ConsensusResumed,
}

impl ConsensusEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundStarted => "round_started",
            Self::BlockProposed => "block_proposed",
            Self::InvalidProposal => "invalid_proposal",
            Self::NilPrevote => "nil_prevote",
            Self::NilPrecommit => "nil_precommit",
            Self::VoteRejected => "vote_rejected",
            Self::PrevoteQuorumReached => "prevote_quorum_reached",
            Self::BlockCommitted => "block_committed",
            Self::BlockFinalized => "block_finalized",
            Self::RoundTimeout => "round_timeout",
            Self::RoundsEvicted => "rounds_evicted",
            Self::ProposalBlockedSuspended => "proposal_blocked_suspended",
            Self::ConsensusSuspended => "consensus_suspended",
            Self::ConsensusResumed => "consensus_resumed",
        }
    }
}
