//! # sn-02-bft-consensus
//!
//! BFT consensus subsystem for Sovereign-Net.
//!
//! ## Architecture
//!
//! Tendermint-style rounds with stake-weighted votes. The proposer for
//! `(height, round)` is the registry's rotation schedule at
//! `slot = height * 100 + round`; a block is final once more than two
//! thirds of the voting power, snapshotted when the block was proposed,
//! has precommitted it.
//!
//! ```text
//! ValidatorRegistry (1) ──VotingPowerSource──→ BftConsensus (2) ──finalized headers──→ Federation (3)
//!                                                   ↑
//!                                   TrajectoryAwareConsensus (gate on proposals)
//! ```
//!
//! ### Safety
//!
//! - Duplicate votes are rejected; a validator's power counts once per phase
//! - Only votes for the proposed block hash are tallied; others are kept
//!   as nil votes for equivocation analysis
//! - Quorum is `power * 3 > total * 2` in 128-bit arithmetic
//!
//! ### Liveness
//!
//! The engine has no internal timer. `handle_timeout` is polled by the
//! caller or by [`adapters::TimeoutDriver`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sn_02_bft_consensus::{BftConsensus, ConsensusApi, ConsensusConfig, RegistryVotingPower};
//!
//! let consensus = BftConsensus::new(
//!     Arc::new(RegistryVotingPower::new(registry)),
//!     ConsensusConfig::default(),
//!     audit,
//! );
//! let round = consensus.start_round(1, 0)?;
//! let header = consensus.propose_block(1, 0, &round.proposer, parent, state_root, txs_root)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;
pub mod trajectory;

pub use adapters::{RegistryVotingPower, StaticVotingPower, TimeoutDriver, TimeoutHandle};
pub use domain::{
    consensus_hash, BlockHeader, ConsensusConfig, ConsensusError, ConsensusResult,
    ConsensusRound, ConsensusVote, QuorumState, RoundPhase, VoteType,
};
pub use events::ConsensusEvent;
pub use ports::{ConsensusApi, VotingPowerSource};
pub use service::BftConsensus;
pub use trajectory::{TrajectoryAwareConsensus, TrajectoryConfig, TrajectoryState};
